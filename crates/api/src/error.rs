// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use routebind::{CoreError, StoreError};
use routebind_domain::DomainError;
use routebind_persistence::PersistenceError;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::request_response::{
    BulkConflictDetail, ConflictDetail, ErrorConflicts, ErrorResponse, InvalidRowDetail,
};

/// Broad outcome class of an error, used by transports to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The request itself is wrong.
    BadRequest,
    /// The addressed resource does not exist.
    NotFound,
    /// The write needs explicit confirmation.
    Conflict,
    /// A lock or the database was busy. Safe to retry.
    Unavailable,
    /// Anything else.
    Internal,
}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Invalid input was provided.
    #[error("Invalid {field}: {message}")]
    InvalidInput {
        /// The field (or fields) that were invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// The effective date is malformed or not in the future.
    #[error("{message}")]
    InvalidDate { message: String },
    /// The CSV text could not be read.
    #[error("Invalid CSV format: {reason}")]
    InvalidCsvFormat { reason: String },
    /// A branch, sub-branch or route reference is missing or inconsistent.
    #[error("{message}")]
    InvalidReferences {
        message: String,
        /// One entry per problem found.
        reasons: Vec<String>,
    },
    /// A requested resource was not found.
    #[error("{message}")]
    ResourceNotFound { message: String },
    /// The write would displace the active binding.
    #[error(
        "Binding {} is active from {} and would be overwritten",
        .conflict.id,
        .conflict.existing_effective_date
    )]
    ConfirmOverwrite { conflict: ConflictDetail },
    /// At least one bulk row is invalid.
    #[error("{} bulk row(s) are invalid", .rows.len())]
    InvalidBulkRows { rows: Vec<InvalidRowDetail> },
    /// The batch would displace active bindings.
    #[error("{} active binding(s) would be overwritten", .conflicts.len())]
    ConfirmOverwriteBulk { conflicts: Vec<BulkConflictDetail> },
    /// A binding lock or the database stayed busy past the timeout.
    #[error("{message}")]
    LockTimeout { message: String },
    /// A database constraint rejected the write.
    #[error("Integrity error: {message}")]
    Integrity { message: String },
    /// An unexpected internal failure.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// The machine-readable code carried in every error body.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "VALIDATION_ERROR",
            Self::InvalidDate { .. } => "DATE_ERROR",
            Self::InvalidCsvFormat { .. } => "INVALID_CSV",
            Self::InvalidReferences { .. } => "REFERENCE_ERROR",
            Self::ResourceNotFound { .. } => "NOT_FOUND",
            Self::ConfirmOverwrite { .. } => "CONFIRM_OVERWRITE",
            Self::InvalidBulkRows { .. } => "INVALID_BULK_ROWS",
            Self::ConfirmOverwriteBulk { .. } => "CONFIRM_OVERWRITE_BULK",
            Self::LockTimeout { .. } => "LOCK_TIMEOUT",
            Self::Integrity { .. } => "INTEGRITY_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidInput { .. }
            | Self::InvalidDate { .. }
            | Self::InvalidCsvFormat { .. }
            | Self::InvalidReferences { .. }
            | Self::InvalidBulkRows { .. } => ErrorClass::BadRequest,
            Self::ResourceNotFound { .. } => ErrorClass::NotFound,
            Self::ConfirmOverwrite { .. } | Self::ConfirmOverwriteBulk { .. } => {
                ErrorClass::Conflict
            }
            Self::LockTimeout { .. } => ErrorClass::Unavailable,
            Self::Integrity { .. } | Self::Internal { .. } => ErrorClass::Internal,
        }
    }

    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    /// Builds the JSON error body.
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        let (conflict, conflicts) = match self {
            Self::ConfirmOverwrite { conflict } => (Some(conflict.clone()), None),
            Self::InvalidBulkRows { rows } => {
                (None, Some(ErrorConflicts::InvalidRows(rows.clone())))
            }
            Self::ConfirmOverwriteBulk { conflicts } => {
                (None, Some(ErrorConflicts::Overwrites(conflicts.clone())))
            }
            _ => (None, None),
        };

        ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            retryable: self.is_retryable(),
            conflict,
            conflicts,
        }
    }
}

const fn field_of(err: &DomainError) -> &'static str {
    match err {
        DomainError::InvalidIdentifier { field, .. } => *field,
        DomainError::EmptyDescription => "correctDescriptionForReports",
        DomainError::InvalidReportsFlag(_) => "requiredReportsFlag",
        DomainError::EmptyBatch => "payloads",
        DomainError::MissingFields(_)
        | DomainError::InvalidEffectiveDate { .. }
        | DomainError::EffectiveDateNotFuture { .. } => "request",
    }
}

/// Translates a domain error into an API error.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    match err {
        DomainError::InvalidEffectiveDate { .. } | DomainError::EffectiveDateNotFuture { .. } => {
            ApiError::InvalidDate {
                message: err.to_string(),
            }
        }
        DomainError::MissingFields(fields) => ApiError::InvalidInput {
            field: fields.join(", "),
            message: String::from("required field is missing"),
        },
        _ => ApiError::InvalidInput {
            field: field_of(&err).to_string(),
            message: err.to_string(),
        },
    }
}

/// Translates an engine error into an API error.
///
/// Confirmation outcomes and lock timeouts are expected traffic and are
/// logged below `error`.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::Domain(domain) => translate_domain_error(domain),
        CoreError::InvalidReferences(ref problems) => ApiError::InvalidReferences {
            message: err.to_string(),
            reasons: problems.iter().map(ToString::to_string).collect(),
        },
        CoreError::BindingNotFound(_) => ApiError::ResourceNotFound {
            message: err.to_string(),
        },
        CoreError::LockTimeout { ref lock_name, .. } => {
            warn!(%lock_name, "Binding lock timed out");
            ApiError::LockTimeout {
                message: err.to_string(),
            }
        }
        CoreError::Conflict(info) => {
            info!(
                binding_id = info.binding_id,
                "Write needs confirmation to displace active binding"
            );
            ApiError::ConfirmOverwrite {
                conflict: ConflictDetail::from(info),
            }
        }
        CoreError::BulkInvalid(rows) => ApiError::InvalidBulkRows {
            rows: rows.into_iter().map(InvalidRowDetail::from).collect(),
        },
        CoreError::BulkConflict(conflicts) => {
            info!(
                conflicts = conflicts.len(),
                "Batch needs confirmation to displace active bindings"
            );
            ApiError::ConfirmOverwriteBulk {
                conflicts: conflicts
                    .into_iter()
                    .map(BulkConflictDetail::from)
                    .collect(),
            }
        }
        CoreError::Store(StoreError::Integrity(message)) => {
            error!(%message, "Integrity violation during binding write");
            ApiError::Integrity { message }
        }
        CoreError::Store(StoreError::Database(message)) => {
            error!(%message, "Store failure during binding operation");
            ApiError::Internal { message }
        }
    }
}

/// Translates a persistence error into an API error.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::Binding(core) => translate_core_error(core),
        PersistenceError::NotFound(_) => ApiError::ResourceNotFound {
            message: err.to_string(),
        },
        PersistenceError::DatabaseBusy(_) => {
            warn!(error = %err, "Database stayed busy past the lock timeout");
            ApiError::LockTimeout {
                message: err.to_string(),
            }
        }
        PersistenceError::ConstraintViolation(message) => {
            error!(%message, "Constraint violation");
            ApiError::Integrity { message }
        }
        other => {
            error!(error = %other, "Persistence error");
            ApiError::Internal {
                message: other.to_string(),
            }
        }
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        translate_persistence_error(err)
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        translate_domain_error(err)
    }
}
