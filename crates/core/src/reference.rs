// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use crate::store::{BindingStore, ReferenceSnapshot};
use routebind_domain::CompositeKey;

/// A branch, sub-branch or route reference that is missing or inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    BranchNotFound(i64),
    SubBranchNotFound(i64),
    /// The sub-branch exists but belongs to another branch.
    SubBranchBranchMismatch {
        sub_branch_id: i64,
        branch_id: i64,
        owner_branch_id: i64,
    },
    RouteNotFound(i64),
    /// The route exists but belongs to another branch.
    RouteBranchMismatch {
        route_id: i64,
        branch_id: i64,
        owner_branch_id: i64,
    },
}

impl std::fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BranchNotFound(id) => write!(f, "Branch {id} not found"),
            Self::SubBranchNotFound(id) => write!(f, "Sub-branch {id} not found"),
            Self::SubBranchBranchMismatch {
                sub_branch_id,
                branch_id,
                owner_branch_id,
            } => write!(
                f,
                "Sub-branch {sub_branch_id} belongs to branch {owner_branch_id}, not branch {branch_id}"
            ),
            Self::RouteNotFound(id) => write!(f, "Delivery route {id} not found"),
            Self::RouteBranchMismatch {
                route_id,
                branch_id,
                owner_branch_id,
            } => write!(
                f,
                "Delivery route {route_id} belongs to branch {owner_branch_id}, not branch {branch_id}"
            ),
        }
    }
}

impl std::error::Error for ReferenceError {}

/// Returns every reference problem with `key`.
///
/// # Errors
///
/// Returns an error if the reference data cannot be read.
pub fn validate_references(
    store: &mut dyn BindingStore,
    key: &CompositeKey,
) -> Result<Vec<ReferenceError>, CoreError> {
    let snapshot: ReferenceSnapshot = store.load_references(std::slice::from_ref(key))?;
    Ok(snapshot.check(key))
}

/// Loads reference data for `keys` and fails unless every key is valid.
///
/// The returned snapshot carries the route numbers needed for writing.
///
/// # Errors
///
/// Returns `InvalidReferences` with every problem found across all keys.
pub fn ensure_references(
    store: &mut dyn BindingStore,
    keys: &[CompositeKey],
) -> Result<ReferenceSnapshot, CoreError> {
    let snapshot: ReferenceSnapshot = store.load_references(keys)?;
    let errors: Vec<ReferenceError> = keys.iter().flat_map(|key| snapshot.check(key)).collect();

    if errors.is_empty() {
        Ok(snapshot)
    } else {
        Err(CoreError::InvalidReferences(errors))
    }
}
