// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::conflict::{BulkConflict, ConflictInfo};
use crate::reference::ReferenceError;
use crate::store::StoreError;
use routebind_domain::{DomainError, InvalidBulkRow};
use std::time::Duration;

/// Errors that can occur while resolving a binding write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// A field or date rule was violated.
    Domain(DomainError),
    /// One or more branch, sub-branch or route references are invalid.
    InvalidReferences(Vec<ReferenceError>),
    /// No binding exists with this id.
    BindingNotFound(i64),
    /// The advisory lock was not obtained in time. Nothing was written.
    LockTimeout {
        lock_name: String,
        timeout: Duration,
    },
    /// The write would displace the active binding and needs confirmation.
    Conflict(ConflictInfo),
    /// At least one bulk row is invalid. Nothing was written.
    BulkInvalid(Vec<InvalidBulkRow>),
    /// The batch would displace active bindings and needs confirmation.
    BulkConflict(Vec<BulkConflict>),
    /// The store failed.
    Store(StoreError),
}

impl CoreError {
    /// Whether the same request may succeed if simply retried.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout { .. })
    }

    /// Whether this is a confirm-overwrite outcome rather than a failure.
    #[must_use]
    pub const fn needs_confirmation(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::BulkConflict(_))
    }
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(err) => write!(f, "{err}"),
            Self::InvalidReferences(errors) => {
                let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "Invalid references: {}", joined.join("; "))
            }
            Self::BindingNotFound(id) => write!(f, "Binding {id} not found"),
            Self::LockTimeout { lock_name, timeout } => write!(
                f,
                "Timed out after {}ms waiting for lock '{lock_name}'",
                timeout.as_millis()
            ),
            Self::Conflict(info) => write!(
                f,
                "Binding {} is active from {} and would be overwritten",
                info.binding_id, info.existing_effective_date
            ),
            Self::BulkInvalid(rows) => write!(f, "{} bulk row(s) are invalid", rows.len()),
            Self::BulkConflict(conflicts) => write!(
                f,
                "{} active binding(s) would be overwritten",
                conflicts.len()
            ),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl From<DomainError> for CoreError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
