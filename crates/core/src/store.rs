// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The transaction-scoped storage seam the engine runs against.
//!
//! Every method on [`BindingStore`] executes inside the single transaction
//! the caller opened for the current operation. The engine never commits,
//! never rolls back, and never releases locks; the owner of the
//! transaction does all three once the engine returns.

use crate::reference::ReferenceError;
use routebind_domain::{Binding, BindingView, CompositeKey, UpsertKey};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use time::Date;

/// Result of an advisory lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Acquired,
    TimedOut,
}

/// Failures raised by a store implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A constraint the engine relies on was violated.
    Integrity(String),
    /// Any other database failure.
    Database(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integrity(msg) => write!(f, "Integrity violation: {msg}"),
            Self::Database(msg) => write!(f, "Database error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Column values for writing one binding row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBinding {
    pub key: CompositeKey,
    pub effective_date: Date,
    pub route_no: String,
    pub description: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RouteRef {
    branch_id: i64,
    route_no: String,
}

/// Reference master data for a set of keys, loaded in one round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSnapshot {
    branches: HashSet<i64>,
    sub_branch_owners: HashMap<i64, i64>,
    routes: HashMap<i64, RouteRef>,
}

impl ReferenceSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_branch(&mut self, branch_id: i64) {
        self.branches.insert(branch_id);
    }

    pub fn add_sub_branch(&mut self, sub_branch_id: i64, branch_id: i64) {
        self.sub_branch_owners.insert(sub_branch_id, branch_id);
    }

    pub fn add_route(&mut self, route_id: i64, branch_id: i64, route_no: String) {
        self.routes.insert(
            route_id,
            RouteRef {
                branch_id,
                route_no,
            },
        );
    }

    /// The current route number from the route master.
    #[must_use]
    pub fn route_no(&self, route_id: i64) -> Option<&str> {
        self.routes.get(&route_id).map(|r| r.route_no.as_str())
    }

    /// Every reference problem with `key`. Empty means valid.
    #[must_use]
    pub fn check(&self, key: &CompositeKey) -> Vec<ReferenceError> {
        let mut errors: Vec<ReferenceError> = Vec::new();
        let branch_id: i64 = key.branch_id();

        if !self.branches.contains(&branch_id) {
            errors.push(ReferenceError::BranchNotFound(branch_id));
        }

        match self.sub_branch_owners.get(&key.sub_branch_id()) {
            None => errors.push(ReferenceError::SubBranchNotFound(key.sub_branch_id())),
            Some(&owner) if owner != branch_id => {
                errors.push(ReferenceError::SubBranchBranchMismatch {
                    sub_branch_id: key.sub_branch_id(),
                    branch_id,
                    owner_branch_id: owner,
                });
            }
            Some(_) => {}
        }

        match self.routes.get(&key.route_id()) {
            None => errors.push(ReferenceError::RouteNotFound(key.route_id())),
            Some(route) if route.branch_id != branch_id => {
                errors.push(ReferenceError::RouteBranchMismatch {
                    route_id: key.route_id(),
                    branch_id,
                    owner_branch_id: route.branch_id,
                });
            }
            Some(_) => {}
        }

        errors
    }
}

/// Transaction-scoped access to binding rows and reference data.
pub trait BindingStore {
    /// Takes the named advisory lock, waiting at most `timeout`.
    ///
    /// The lock must stay held until the surrounding transaction ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock request itself fails.
    fn acquire_lock(&mut self, lock_name: &str, timeout: Duration)
    -> Result<LockOutcome, StoreError>;

    /// Loads branch, sub-branch and route master data for every key.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn load_references(&mut self, keys: &[CompositeKey]) -> Result<ReferenceSnapshot, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_binding(&mut self, binding_id: i64) -> Result<Option<Binding>, StoreError>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_by_upsert_key(&mut self, key: &UpsertKey) -> Result<Option<Binding>, StoreError>;

    /// All active rows for any of `keys`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn active_bindings_for_keys(
        &mut self,
        keys: &[CompositeKey],
    ) -> Result<Vec<Binding>, StoreError>;

    /// Clears the active flag on every row for `key` except `except`.
    /// Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn deactivate_bindings(
        &mut self,
        key: &CompositeKey,
        except: Option<i64>,
    ) -> Result<usize, StoreError>;

    /// Inserts a row and returns its new identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    fn insert_binding(&mut self, row: &NewBinding) -> Result<i64, StoreError>;

    /// Overwrites every column of an existing row.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn update_binding(&mut self, binding_id: i64, row: &NewBinding) -> Result<(), StoreError>;

    /// Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete_binding(&mut self, binding_id: i64) -> Result<bool, StoreError>;

    /// Joined views for `binding_ids`, in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn load_views(&mut self, binding_ids: &[i64]) -> Result<Vec<BindingView>, StoreError>;

    /// Every row for `key`, ordered by effective date.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn bindings_for_key(&mut self, key: &CompositeKey) -> Result<Vec<BindingView>, StoreError>;
}
