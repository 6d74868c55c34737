// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! Each query exists as a `_sqlite` and a `_mysql` function generated from
//! one body; `store.rs` picks the one matching its connection.
//!
//! - `bindings`: rows, views and counts by id, key or upsert key
//! - `references`: the master data snapshot used for reference checks

pub mod bindings;
pub mod references;

pub use bindings::{
    active_bindings_for_keys_mysql, active_bindings_for_keys_sqlite, bindings_for_key_mysql,
    bindings_for_key_sqlite, count_active_bindings_mysql, count_active_bindings_sqlite,
    find_binding_mysql, find_binding_sqlite, find_by_upsert_key_mysql, find_by_upsert_key_sqlite,
    load_views_mysql, load_views_sqlite,
};
pub use references::{load_references_mysql, load_references_sqlite};
