// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod bulk;
mod effective_date;
mod error;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use bulk::{
    CandidateRow, InvalidBulkRow, NormalizedBatch, RawBulkRow, RawValue, candidate_reasons,
    coerce_reports_flag, normalize_bulk_rows,
};
pub use effective_date::{
    format_effective_date, parse_effective_date, today_utc, validate_effective_date,
};
pub use error::DomainError;
pub use types::{
    Binding, BindingDraft, BindingFields, BindingView, CompositeKey, UpsertKey, lock_order,
};
pub use validation::{collect_draft_errors, validate_draft};
