// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference master data maintenance.
//!
//! Master data is owned by other systems; these exist for seeding test
//! databases and local development.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::info;

use crate::backend::PersistenceBackend;
use crate::diesel_schema::{branches, delivery_routes, sub_branches};
use crate::error::PersistenceError;

backend_fn! {
/// Creates a branch and returns its ID.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn create_branch(
    conn: &mut _,
    name: &str,
    description: Option<&str>,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(branches::table)
        .values((
            branches::branch_name.eq(name),
            branches::branch_desc.eq(description),
        ))
        .execute(conn)?;

    let branch_id: i64 = conn.get_last_insert_rowid()?;
    info!(branch_id, name, "Created branch");
    Ok(branch_id)
}
}

backend_fn! {
/// Creates a sub-branch under `branch_id` and returns its ID.
///
/// # Errors
///
/// Returns `ConstraintViolation` if the branch does not exist, or another
/// error if the insert fails.
pub fn create_sub_branch(
    conn: &mut _,
    branch_id: i64,
    name: &str,
    description: Option<&str>,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(sub_branches::table)
        .values((
            sub_branches::branch_id.eq(branch_id),
            sub_branches::sub_branch_name.eq(name),
            sub_branches::sub_branch_desc.eq(description),
        ))
        .execute(conn)?;

    let sub_branch_id: i64 = conn.get_last_insert_rowid()?;
    info!(sub_branch_id, branch_id, name, "Created sub-branch");
    Ok(sub_branch_id)
}
}

backend_fn! {
/// Creates a delivery route under `branch_id` and returns its ID.
///
/// # Errors
///
/// Returns `ConstraintViolation` if the branch does not exist, or another
/// error if the insert fails.
pub fn create_delivery_route(
    conn: &mut _,
    branch_id: i64,
    route_no: &str,
    description: Option<&str>,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(delivery_routes::table)
        .values((
            delivery_routes::branch_id.eq(branch_id),
            delivery_routes::delivery_route_no.eq(route_no),
            delivery_routes::delivery_route_description.eq(description),
        ))
        .execute(conn)?;

    let delivery_route_id: i64 = conn.get_last_insert_rowid()?;
    info!(delivery_route_id, branch_id, route_no, "Created delivery route");
    Ok(delivery_route_id)
}
}

backend_fn! {
/// Changes a delivery route's number.
///
/// Existing bindings keep the number they copied until they are next
/// written.
///
/// # Errors
///
/// Returns `NotFound` if the route does not exist, or another error if the
/// update fails.
pub fn rename_delivery_route(
    conn: &mut _,
    delivery_route_id: i64,
    route_no: &str,
) -> Result<(), PersistenceError> {
    let exists: i64 = delivery_routes::table
        .filter(delivery_routes::delivery_route_id.eq(delivery_route_id))
        .count()
        .get_result(conn)?;
    if exists == 0 {
        return Err(PersistenceError::NotFound(format!(
            "Delivery route {delivery_route_id}"
        )));
    }

    diesel::update(
        delivery_routes::table.filter(delivery_routes::delivery_route_id.eq(delivery_route_id)),
    )
    .set(delivery_routes::delivery_route_no.eq(route_no))
    .execute(conn)?;

    info!(delivery_route_id, route_no, "Renamed delivery route");
    Ok(())
}
}
