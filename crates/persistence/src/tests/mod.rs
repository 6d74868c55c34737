// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;

use crate::Persistence;
use routebind_domain::{BindingFields, CompositeKey, RawBulkRow, RawValue};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use time::Date;
use time::macros::date;

pub const TODAY: Date = date!(2026 - 10 - 17);

/// Reference rows seeded into a fresh database.
pub struct Fixture {
    pub north: i64,
    pub south: i64,
    pub north_a: i64,
    pub south_a: i64,
    pub route_101: i64,
    pub route_102: i64,
    pub route_201: i64,
}

impl Fixture {
    pub const fn key(&self) -> CompositeKey {
        CompositeKey::new(self.north, self.north_a, self.route_101)
    }

    pub fn fields(&self, effective_date: &str, active: bool) -> BindingFields {
        BindingFields {
            branch_id: Some(self.north),
            sub_branch_id: Some(self.north_a),
            route_id: Some(self.route_101),
            effective_date: Some(effective_date.to_string()),
            active: Some(active),
            description: Some(String::from("Morning delivery")),
        }
    }

    pub fn bulk_row(&self, route_id: i64, effective_date: &str, flag: i64) -> RawBulkRow {
        RawBulkRow {
            branch_id: Some(RawValue::Integer(self.north)),
            sub_branch_id: Some(RawValue::Integer(self.north_a)),
            delivery_route_id: Some(RawValue::Integer(route_id)),
            effective_date: Some(effective_date.to_string()),
            required_reports_flag: Some(RawValue::Integer(flag)),
            correct_description_for_reports: Some(String::from("Bulk delivery")),
        }
    }
}

/// North owns sub-branch North-A and routes 101/102. South owns South-A
/// and route 201.
pub fn seed(persistence: &mut Persistence) -> Fixture {
    let north: i64 = persistence
        .create_branch("North", Some("Northern depot"))
        .unwrap();
    let south: i64 = persistence.create_branch("South", None).unwrap();
    let north_a: i64 = persistence
        .create_sub_branch(north, "North-A", Some("North first shift"))
        .unwrap();
    let south_a: i64 = persistence
        .create_sub_branch(south, "South-A", None)
        .unwrap();
    let route_101: i64 = persistence
        .create_delivery_route(north, "R-101", Some("Harbour loop"))
        .unwrap();
    let route_102: i64 = persistence
        .create_delivery_route(north, "R-102", None)
        .unwrap();
    let route_201: i64 = persistence
        .create_delivery_route(south, "R-201", None)
        .unwrap();

    Fixture {
        north,
        south,
        north_a,
        south_a,
        route_101,
        route_102,
        route_201,
    }
}

pub fn seeded_in_memory() -> (Persistence, Fixture) {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    let fixture: Fixture = seed(&mut persistence);
    (persistence, fixture)
}

static TEMP_DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// A database file removed (with its WAL files) on drop.
pub struct TempDatabase {
    pub path: PathBuf,
}

impl TempDatabase {
    pub fn create() -> Self {
        let id: u64 = TEMP_DB_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path: PathBuf = std::env::temp_dir().join(format!(
            "routebind_test_{}_{id}.db",
            std::process::id()
        ));
        Self { path }
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
