// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

/// Errors that can occur during domain validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// One or more required fields were absent from the request.
    MissingFields(Vec<&'static str>),
    /// An identifier field could not be read as a positive integer.
    InvalidIdentifier {
        /// The field name as it appears on the wire.
        field: &'static str,
        /// The rejected value.
        value: String,
    },
    /// Failed to parse an effective date.
    InvalidEffectiveDate {
        /// The invalid date string.
        value: String,
        /// The parsing error message.
        error: String,
    },
    /// Effective date is today or in the past.
    EffectiveDateNotFuture {
        /// The rejected effective date.
        effective_date: time::Date,
        /// The UTC date the check was made against.
        today: time::Date,
    },
    /// Description is empty after trimming.
    EmptyDescription,
    /// Reports flag is something other than 0/1 or a boolean.
    InvalidReportsFlag(String),
    /// A bulk request carried no rows.
    EmptyBatch,
}

impl std::fmt::Display for DomainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            Self::InvalidIdentifier { field, value } => {
                write!(f, "{field} must be a positive integer, got '{value}'")
            }
            Self::InvalidEffectiveDate { value, error } => {
                write!(f, "Invalid effectiveDate '{value}': {error}")
            }
            Self::EffectiveDateNotFuture {
                effective_date,
                today,
            } => write!(
                f,
                "effectiveDate must be a future date ({effective_date} is not after {today})"
            ),
            Self::EmptyDescription => {
                write!(f, "correctDescriptionForReports cannot be empty")
            }
            Self::InvalidReportsFlag(value) => {
                write!(f, "requiredReportsFlag must be 0 or 1, got '{value}'")
            }
            Self::EmptyBatch => write!(f, "Bulk request contains no rows"),
        }
    }
}

impl std::error::Error for DomainError {}
