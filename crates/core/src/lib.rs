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

//! Effective-dated route binding resolution.
//!
//! The engine assigns delivery routes to (branch, sub-branch) pairs over
//! time and keeps at most one assignment per key active. It is storage
//! agnostic: every operation receives a [`BindingStore`] bound to a single
//! open transaction, and the caller commits or rolls back based on the
//! result.

mod bulk;
mod conflict;
mod enrich;
mod error;
mod lock;
mod reference;
mod resolver;
mod store;

#[cfg(test)]
mod tests;

pub use bulk::{BulkValidation, create_bulk_bindings, validate_bulk_rows};
pub use conflict::{BulkConflict, ConflictInfo, find_active_conflict, find_batch_conflicts};
pub use enrich::enrich_bindings;
pub use error::CoreError;
pub use lock::acquire_binding_locks;
pub use reference::{ReferenceError, ensure_references, validate_references};
pub use resolver::{
    DEFAULT_LOCK_TIMEOUT, EngineConfig, binding_history, create_binding, delete_binding,
    get_binding, update_binding,
};
pub use store::{BindingStore, LockOutcome, NewBinding, ReferenceSnapshot, StoreError};
