// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Route binding mutations.
//!
//! These run inside the transaction the engine operation was given; none
//! of them commit on their own.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use routebind::NewBinding;
use routebind_domain::{CompositeKey, format_effective_date};
use tracing::{debug, info};

use crate::backend::PersistenceBackend;
use crate::diesel_schema::route_bindings;
use crate::error::PersistenceError;

backend_fn! {
/// Clears the active flag on every active binding for `key`, except
/// `except` when given.
///
/// Returns the number of rows changed.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn deactivate_bindings(
    conn: &mut _,
    key: &CompositeKey,
    except: Option<i64>,
) -> Result<usize, PersistenceError> {
    let targets = route_bindings::table
        .filter(route_bindings::branch_id.eq(key.branch_id()))
        .filter(route_bindings::sub_branch_id.eq(key.sub_branch_id()))
        .filter(route_bindings::delivery_route_id.eq(key.route_id()))
        .filter(route_bindings::required_reports_flag.eq(1));

    let changed: usize = match except {
        Some(keep_id) => diesel::update(targets.filter(route_bindings::binding_id.ne(keep_id)))
            .set(route_bindings::required_reports_flag.eq(0))
            .execute(conn)?,
        None => diesel::update(targets)
            .set(route_bindings::required_reports_flag.eq(0))
            .execute(conn)?,
    };

    if changed > 0 {
        info!(%key, changed, "Deactivated bindings");
    }
    Ok(changed)
}
}

backend_fn! {
/// Inserts a binding and returns its new ID.
///
/// # Errors
///
/// Returns `ConstraintViolation` if the upsert key is already taken, or
/// another error if the insert fails.
pub fn insert_binding(
    conn: &mut _,
    row: &NewBinding,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(route_bindings::table)
        .values((
            route_bindings::branch_id.eq(row.key.branch_id()),
            route_bindings::sub_branch_id.eq(row.key.sub_branch_id()),
            route_bindings::delivery_route_id.eq(row.key.route_id()),
            route_bindings::delivery_route_no.eq(&row.route_no),
            route_bindings::correct_description_for_reports.eq(&row.description),
            route_bindings::effective_date.eq(format_effective_date(row.effective_date)),
            route_bindings::required_reports_flag.eq(i32::from(row.active)),
        ))
        .execute(conn)?;

    let binding_id: i64 = conn.get_last_insert_rowid()?;

    debug!(binding_id, key = %row.key, "Inserted binding");
    Ok(binding_id)
}
}

backend_fn! {
/// Overwrites every column of an existing binding.
///
/// # Errors
///
/// Returns `NotFound` if no row has `binding_id`, `ConstraintViolation`
/// if the new upsert key is taken, or another error if the update fails.
pub fn update_binding(
    conn: &mut _,
    binding_id: i64,
    row: &NewBinding,
) -> Result<(), PersistenceError> {
    let changed: usize = diesel::update(
        route_bindings::table.filter(route_bindings::binding_id.eq(binding_id)),
    )
    .set((
        route_bindings::branch_id.eq(row.key.branch_id()),
        route_bindings::sub_branch_id.eq(row.key.sub_branch_id()),
        route_bindings::delivery_route_id.eq(row.key.route_id()),
        route_bindings::delivery_route_no.eq(&row.route_no),
        route_bindings::correct_description_for_reports.eq(&row.description),
        route_bindings::effective_date.eq(format_effective_date(row.effective_date)),
        route_bindings::required_reports_flag.eq(i32::from(row.active)),
    ))
    .execute(conn)?;

    // MySQL reports matched-but-unchanged rows as 0 affected.
    if changed == 0
        && route_bindings::table
            .filter(route_bindings::binding_id.eq(binding_id))
            .count()
            .get_result::<i64>(conn)?
            == 0
    {
        return Err(PersistenceError::NotFound(format!("Binding {binding_id}")));
    }

    debug!(binding_id, key = %row.key, "Updated binding");
    Ok(())
}
}

backend_fn! {
/// Deletes a binding. Returns `false` if it did not exist.
///
/// # Errors
///
/// Returns an error if the delete fails.
pub fn delete_binding(
    conn: &mut _,
    binding_id: i64,
) -> Result<bool, PersistenceError> {
    let deleted: usize = diesel::delete(
        route_bindings::table.filter(route_bindings::binding_id.eq(binding_id)),
    )
    .execute(conn)?;

    if deleted > 0 {
        info!(binding_id, "Deleted binding");
    }
    Ok(deleted > 0)
}
}
