// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BindingDraft, CompositeKey, DomainError, collect_draft_errors, validate_draft};
use time::macros::date;

fn draft(effective_date: time::Date, description: &str) -> BindingDraft {
    BindingDraft {
        key: CompositeKey::new(1, 2, 3),
        effective_date,
        active: true,
        description: description.to_string(),
    }
}

#[test]
fn test_valid_draft_passes() {
    let today = date!(2026 - 10 - 17);
    assert!(validate_draft(&draft(date!(2026 - 11 - 01), "Loop"), today).is_ok());
}

#[test]
fn test_collects_all_errors() {
    let today = date!(2026 - 10 - 17);
    let errors = collect_draft_errors(&draft(date!(2026 - 10 - 17), ""), today);

    assert_eq!(errors.len(), 2);
    assert!(matches!(
        errors[0],
        DomainError::EffectiveDateNotFuture { .. }
    ));
    assert_eq!(errors[1], DomainError::EmptyDescription);
}

#[test]
fn test_non_positive_identifiers_are_rejected() {
    let today = date!(2026 - 10 - 17);
    let mut d = draft(date!(2026 - 11 - 01), "Loop");
    d.key = CompositeKey::new(0, 2, -3);

    let errors = collect_draft_errors(&d, today);
    assert_eq!(
        errors,
        vec![
            DomainError::InvalidIdentifier {
                field: "branchId",
                value: String::from("0"),
            },
            DomainError::InvalidIdentifier {
                field: "deliveryRouteId",
                value: String::from("-3"),
            },
        ]
    );
}
