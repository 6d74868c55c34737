// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Effective date parsing and the strictly-future rule.
//!
//! Dates are calendar dates with no time component and travel as
//! `YYYY-MM-DD` both on the wire and in the database. "Today" is always
//! the UTC date; callers pass it in so the rule stays deterministic.

use crate::error::DomainError;
use time::Date;
use time::format_description::BorrowedFormatItem;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] =
    time::macros::format_description!("[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` effective date.
///
/// # Errors
///
/// Returns `InvalidEffectiveDate` if the value is not a valid calendar date.
pub fn parse_effective_date(value: &str) -> Result<Date, DomainError> {
    Date::parse(value.trim(), DATE_FORMAT).map_err(|e| DomainError::InvalidEffectiveDate {
        value: value.to_string(),
        error: e.to_string(),
    })
}

/// Formats a date as `YYYY-MM-DD`, the inverse of [`parse_effective_date`].
#[must_use]
pub fn format_effective_date(date: Date) -> String {
    // Every component is present in a `Date`, so formatting into a string cannot fail.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Checks that `effective_date` falls strictly after `today`.
///
/// # Errors
///
/// Returns `EffectiveDateNotFuture` for today or any earlier date.
pub fn validate_effective_date(effective_date: Date, today: Date) -> Result<(), DomainError> {
    if effective_date <= today {
        return Err(DomainError::EffectiveDateNotFuture {
            effective_date,
            today,
        });
    }
    Ok(())
}

/// The current UTC calendar date.
#[must_use]
pub fn today_utc() -> Date {
    time::OffsetDateTime::now_utc().date()
}
