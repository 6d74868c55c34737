// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Route binding queries.
//!
//! Effective dates are stored as `YYYY-MM-DD` text, so ordering by the
//! column orders by date on every backend.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use num_traits::ToPrimitive;
use routebind_domain::{
    Binding, BindingView, CompositeKey, UpsertKey, format_effective_date,
};
use std::collections::BTreeSet;
use tracing::debug;

use crate::data_models::{BindingRow, ViewColumns, into_view};
use crate::diesel_schema::{branches, delivery_routes, route_bindings, sub_branches};
use crate::error::PersistenceError;

backend_fn! {
/// Retrieves a binding by ID.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
/// Returns `Ok(None)` if the binding does not exist.
pub fn find_binding(
    conn: &mut _,
    binding_id: i64,
) -> Result<Option<Binding>, PersistenceError> {
    debug!(binding_id, "Looking up binding");

    let row: Option<BindingRow> = route_bindings::table
        .filter(route_bindings::binding_id.eq(binding_id))
        .select(BindingRow::as_select())
        .first(conn)
        .optional()?;

    row.map(BindingRow::into_binding).transpose()
}
}

backend_fn! {
/// Retrieves the binding occupying an upsert key, if any.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is malformed.
pub fn find_by_upsert_key(
    conn: &mut _,
    upsert_key: &UpsertKey,
) -> Result<Option<Binding>, PersistenceError> {
    let key: CompositeKey = upsert_key.key;

    let row: Option<BindingRow> = route_bindings::table
        .filter(route_bindings::branch_id.eq(key.branch_id()))
        .filter(route_bindings::sub_branch_id.eq(key.sub_branch_id()))
        .filter(route_bindings::delivery_route_id.eq(key.route_id()))
        .filter(route_bindings::effective_date.eq(format_effective_date(upsert_key.effective_date)))
        .select(BindingRow::as_select())
        .first(conn)
        .optional()?;

    row.map(BindingRow::into_binding).transpose()
}
}

backend_fn! {
/// Retrieves every active binding whose composite key is in `keys`.
///
/// The database filter is per column, so rows are narrowed to exact key
/// matches afterwards.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn active_bindings_for_keys(
    conn: &mut _,
    keys: &[CompositeKey],
) -> Result<Vec<Binding>, PersistenceError> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }

    let wanted: BTreeSet<CompositeKey> = keys.iter().copied().collect();
    let branch_ids: Vec<i64> = wanted.iter().map(CompositeKey::branch_id).collect();
    let sub_branch_ids: Vec<i64> = wanted.iter().map(CompositeKey::sub_branch_id).collect();
    let route_ids: Vec<i64> = wanted.iter().map(CompositeKey::route_id).collect();

    let rows: Vec<BindingRow> = route_bindings::table
        .filter(route_bindings::required_reports_flag.eq(1))
        .filter(route_bindings::branch_id.eq_any(branch_ids))
        .filter(route_bindings::sub_branch_id.eq_any(sub_branch_ids))
        .filter(route_bindings::delivery_route_id.eq_any(route_ids))
        .order(route_bindings::binding_id.asc())
        .select(BindingRow::as_select())
        .load(conn)?;

    let mut active: Vec<Binding> = Vec::with_capacity(rows.len());
    for row in rows {
        let binding: Binding = row.into_binding()?;
        if wanted.contains(&binding.key) {
            active.push(binding);
        }
    }
    Ok(active)
}
}

backend_fn! {
/// Loads enriched views for `binding_ids`, in no particular order.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn load_views(
    conn: &mut _,
    binding_ids: &[i64],
) -> Result<Vec<BindingView>, PersistenceError> {
    if binding_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows: Vec<ViewColumns> = route_bindings::table
        .inner_join(branches::table.on(branches::branch_id.eq(route_bindings::branch_id)))
        .inner_join(
            sub_branches::table.on(sub_branches::sub_branch_id.eq(route_bindings::sub_branch_id)),
        )
        .inner_join(
            delivery_routes::table
                .on(delivery_routes::delivery_route_id.eq(route_bindings::delivery_route_id)),
        )
        .filter(route_bindings::binding_id.eq_any(binding_ids.to_vec()))
        .select((
            BindingRow::as_select(),
            branches::branch_name,
            branches::branch_desc,
            sub_branches::sub_branch_name,
            sub_branches::sub_branch_desc,
            delivery_routes::delivery_route_description,
        ))
        .load(conn)?;

    rows.into_iter().map(into_view).collect()
}
}

backend_fn! {
/// Lists every binding for a composite key, oldest effective date first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is malformed.
pub fn bindings_for_key(
    conn: &mut _,
    key: &CompositeKey,
) -> Result<Vec<BindingView>, PersistenceError> {
    let rows: Vec<ViewColumns> = route_bindings::table
        .inner_join(branches::table.on(branches::branch_id.eq(route_bindings::branch_id)))
        .inner_join(
            sub_branches::table.on(sub_branches::sub_branch_id.eq(route_bindings::sub_branch_id)),
        )
        .inner_join(
            delivery_routes::table
                .on(delivery_routes::delivery_route_id.eq(route_bindings::delivery_route_id)),
        )
        .filter(route_bindings::branch_id.eq(key.branch_id()))
        .filter(route_bindings::sub_branch_id.eq(key.sub_branch_id()))
        .filter(route_bindings::delivery_route_id.eq(key.route_id()))
        .order((
            route_bindings::effective_date.asc(),
            route_bindings::binding_id.asc(),
        ))
        .select((
            BindingRow::as_select(),
            branches::branch_name,
            branches::branch_desc,
            sub_branches::sub_branch_name,
            sub_branches::sub_branch_desc,
            delivery_routes::delivery_route_description,
        ))
        .load(conn)?;

    debug!(%key, rows = rows.len(), "Loaded binding history");
    rows.into_iter().map(into_view).collect()
}
}

backend_fn! {
/// Counts active bindings for a composite key.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_active_bindings(
    conn: &mut _,
    key: &CompositeKey,
) -> Result<usize, PersistenceError> {
    let count: i64 = route_bindings::table
        .filter(route_bindings::branch_id.eq(key.branch_id()))
        .filter(route_bindings::sub_branch_id.eq(key.sub_branch_id()))
        .filter(route_bindings::delivery_route_id.eq(key.route_id()))
        .filter(route_bindings::required_reports_flag.eq(1))
        .count()
        .get_result(conn)?;

    count
        .to_usize()
        .ok_or_else(|| PersistenceError::DatabaseError("Count conversion failed".to_string()))
}
}
