// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Reference master data lookups.
//!
//! Branches, sub-branches and delivery routes are read-only here; the
//! engine only needs to know which exist and who owns them.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use routebind::ReferenceSnapshot;
use routebind_domain::CompositeKey;
use std::collections::BTreeSet;
use tracing::debug;

use crate::diesel_schema::{branches, delivery_routes, sub_branches};
use crate::error::PersistenceError;

fn distinct_ids(keys: &[CompositeKey], id: fn(&CompositeKey) -> i64) -> Vec<i64> {
    keys.iter().map(id).collect::<BTreeSet<i64>>().into_iter().collect()
}

backend_fn! {
/// Loads the reference rows mentioned by `keys` into a snapshot.
///
/// Rows that do not exist are simply absent from the snapshot; the engine
/// turns that into validation errors.
///
/// # Errors
///
/// Returns an error if any query fails.
pub fn load_references(
    conn: &mut _,
    keys: &[CompositeKey],
) -> Result<ReferenceSnapshot, PersistenceError> {
    let mut snapshot: ReferenceSnapshot = ReferenceSnapshot::new();
    if keys.is_empty() {
        return Ok(snapshot);
    }

    let branch_ids: Vec<i64> = branches::table
        .filter(branches::branch_id.eq_any(distinct_ids(keys, CompositeKey::branch_id)))
        .select(branches::branch_id)
        .load(conn)?;

    let sub_branch_rows: Vec<(i64, i64)> = sub_branches::table
        .filter(sub_branches::sub_branch_id.eq_any(distinct_ids(keys, CompositeKey::sub_branch_id)))
        .select((sub_branches::sub_branch_id, sub_branches::branch_id))
        .load(conn)?;

    let route_rows: Vec<(i64, i64, String)> = delivery_routes::table
        .filter(delivery_routes::delivery_route_id.eq_any(distinct_ids(keys, CompositeKey::route_id)))
        .select((
            delivery_routes::delivery_route_id,
            delivery_routes::branch_id,
            delivery_routes::delivery_route_no,
        ))
        .load(conn)?;

    debug!(
        branches = branch_ids.len(),
        sub_branches = sub_branch_rows.len(),
        routes = route_rows.len(),
        "Loaded reference snapshot"
    );

    for branch_id in branch_ids {
        snapshot.add_branch(branch_id);
    }
    for (sub_branch_id, owner) in sub_branch_rows {
        snapshot.add_sub_branch(sub_branch_id, owner);
    }
    for (route_id, owner, route_no) in route_rows {
        snapshot.add_route(route_id, owner, route_no);
    }

    Ok(snapshot)
}
}
