// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Every other persistence test exercises connection setup and migrations
//! implicitly; these cover isolation, reopening, and the constraints the
//! schema is expected to enforce.

use crate::error::PersistenceError;
use crate::tests::{Fixture, TempDatabase, seed, seeded_in_memory};
use crate::{BackendConnection, Persistence, mutations};
use routebind::NewBinding;
use time::macros::date;

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_key_enforcement_is_enabled() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let (mut db1, fixture) = seeded_in_memory();
    let mut db2: Persistence = Persistence::new_in_memory().unwrap();

    db1.create_binding(super::TODAY, fixture.fields("2099-01-01", true), false)
        .unwrap();

    assert_eq!(db1.count_active_bindings(&fixture.key()).unwrap(), 1);
    assert_eq!(db2.count_active_bindings(&fixture.key()).unwrap(), 0);
}

#[test]
fn test_reopening_a_file_keeps_data_and_skips_applied_migrations() {
    let db: TempDatabase = TempDatabase::create();

    let fixture: Fixture = {
        let mut first: Persistence = Persistence::new_with_file(&db.path).unwrap();
        let fixture: Fixture = seed(&mut first);
        first
            .create_binding(super::TODAY, fixture.fields("2099-01-01", true), false)
            .unwrap();
        fixture
    };

    let mut reopened: Persistence = Persistence::new_with_file(&db.path).unwrap();
    assert_eq!(reopened.count_active_bindings(&fixture.key()).unwrap(), 1);
}

#[test]
fn test_sub_branch_requires_existing_branch() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();

    let result: Result<i64, PersistenceError> =
        persistence.create_sub_branch(9999, "Orphan", None);

    assert!(matches!(
        result,
        Err(PersistenceError::ConstraintViolation(_))
    ));
}

#[test]
fn test_duplicate_upsert_key_is_rejected_by_the_schema() {
    let (mut persistence, fixture) = seeded_in_memory();
    let row: NewBinding = NewBinding {
        key: fixture.key(),
        effective_date: date!(2099 - 01 - 01),
        route_no: String::from("R-101"),
        description: String::from("Direct insert"),
        active: false,
    };

    let BackendConnection::Sqlite(conn) = &mut persistence.conn else {
        panic!("expected SQLite backend");
    };
    mutations::insert_binding_sqlite(conn, &row).unwrap();
    let second: Result<i64, PersistenceError> = mutations::insert_binding_sqlite(conn, &row);

    assert!(matches!(
        second,
        Err(PersistenceError::ConstraintViolation(_))
    ));
    let store_error: routebind::StoreError = second.unwrap_err().into();
    assert!(matches!(store_error, routebind::StoreError::Integrity(_)));
}

#[test]
fn test_rename_of_missing_route_is_not_found() {
    let (mut persistence, _) = seeded_in_memory();

    assert!(matches!(
        persistence.rename_delivery_route(9999, "R-999"),
        Err(PersistenceError::NotFound(_))
    ));
}
