// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use diesel::result::DatabaseErrorKind;
use routebind::{CoreError, StoreError};

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// Initialization error.
    InitializationError(String),
    /// A uniqueness, foreign key, or check constraint rejected a write.
    ConstraintViolation(String),
    /// Another writer held the database past the busy timeout.
    DatabaseBusy(String),
    /// A stored value could not be turned back into a domain value.
    InvalidStoredValue(String),
    /// The in-process lock table was poisoned by a panicking holder.
    LockTablePoisoned,
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// The requested resource was not found.
    NotFound(String),
    /// The binding engine rejected the operation.
    Binding(CoreError),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ConstraintViolation(msg) => write!(f, "Constraint violation: {msg}"),
            Self::DatabaseBusy(msg) => write!(f, "Database busy: {msg}"),
            Self::InvalidStoredValue(msg) => write!(f, "Invalid stored value: {msg}"),
            Self::LockTablePoisoned => write!(f, "Binding lock table is poisoned"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::Binding(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                ref info,
            ) => Self::ConstraintViolation(info.message().to_string()),
            diesel::result::Error::DatabaseError(_, ref info)
                if info.message().contains("database is locked") =>
            {
                Self::DatabaseBusy(info.message().to_string())
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<CoreError> for PersistenceError {
    fn from(err: CoreError) -> Self {
        Self::Binding(err)
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::ConstraintViolation(msg) => Self::Integrity(msg),
            other => Self::Database(other.to_string()),
        }
    }
}
