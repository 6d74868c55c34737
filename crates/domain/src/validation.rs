// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::effective_date::validate_effective_date;
use crate::error::DomainError;
use crate::types::BindingDraft;
use time::Date;

/// Collects every field-level rule a draft violates.
///
/// Reference existence is not checked here; that needs the database.
#[must_use]
pub fn collect_draft_errors(draft: &BindingDraft, today: Date) -> Vec<DomainError> {
    let mut errors: Vec<DomainError> = Vec::new();

    if let Err(e) = validate_effective_date(draft.effective_date, today) {
        errors.push(e);
    }

    if draft.description.is_empty() {
        errors.push(DomainError::EmptyDescription);
    }

    for (field, value) in [
        ("branchId", draft.key.branch_id()),
        ("subBranchId", draft.key.sub_branch_id()),
        ("deliveryRouteId", draft.key.route_id()),
    ] {
        if value <= 0 {
            errors.push(DomainError::InvalidIdentifier {
                field,
                value: value.to_string(),
            });
        }
    }

    errors
}

/// Validates a single-row draft, failing on the first violated rule.
///
/// # Errors
///
/// Returns the first error found by [`collect_draft_errors`].
pub fn validate_draft(draft: &BindingDraft, today: Date) -> Result<(), DomainError> {
    match collect_draft_errors(draft, today).into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
