// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Writes, generated per backend like the queries.
//!
//! - `bindings`: insert, in-place update, deactivation and delete
//! - `reference_data`: branch, sub-branch and route seeding

pub mod bindings;
pub mod reference_data;

pub use bindings::{
    deactivate_bindings_mysql, deactivate_bindings_sqlite, delete_binding_mysql,
    delete_binding_sqlite, insert_binding_mysql, insert_binding_sqlite, update_binding_mysql,
    update_binding_sqlite,
};
pub use reference_data::{
    create_branch_mysql, create_branch_sqlite, create_delivery_route_mysql,
    create_delivery_route_sqlite, create_sub_branch_mysql, create_sub_branch_sqlite,
    rename_delivery_route_mysql, rename_delivery_route_sqlite,
};
