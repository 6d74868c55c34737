// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! `SQLite` connection setup, migrations, write transactions and the
//! in-process binding locks.
//!
//! Only things Diesel's DSL cannot express belong here. Binding queries
//! and mutations stay backend-agnostic in `queries/` and `mutations/`.

use std::time::Duration;

use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Integer};
use diesel::{Connection, RunQueryDsl, SqliteConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use num_traits::ToPrimitive;
use tracing::{debug, info};

use crate::backend::locks::{HeldLocks, process_lock_table};
use crate::error::PersistenceError;

/// Migrations written in `SQLite` syntax.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Row shape of `PRAGMA foreign_keys`.
#[derive(QueryableByName)]
struct PragmaRow {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}

/// Id of the row most recently inserted on `conn`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_last_insert_rowid(conn: &mut SqliteConnection) -> Result<i64, PersistenceError> {
    Ok(diesel::select(sql::<BigInt>("last_insert_rowid()")).get_result(conn)?)
}

/// Fails unless `PRAGMA foreign_keys` is on for this connection.
///
/// Sub-branch and route ownership rely on it.
///
/// # Errors
///
/// Returns `ForeignKeyEnforcementNotEnabled` if it is off.
pub fn verify_foreign_key_enforcement(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    let foreign_keys_enabled: i32 = diesel::sql_query("PRAGMA foreign_keys")
        .get_result::<PragmaRow>(conn)?
        .foreign_keys;

    if foreign_keys_enabled == 0 {
        return Err(PersistenceError::ForeignKeyEnforcementNotEnabled);
    }

    info!("SQLite foreign key enforcement is enabled");
    Ok(())
}

/// Applies any pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub fn run_migrations(
    conn: &mut SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Running SQLite database migrations");
    conn.run_pending_migrations(MIGRATIONS)?;
    Ok(())
}

/// Opens `database_url` (a path or `:memory:`), turns on foreign keys and
/// migrates.
///
/// # Errors
///
/// Returns an error if the connection or a migration fails.
pub fn initialize_database(database_url: &str) -> Result<SqliteConnection, PersistenceError> {
    info!("Initializing SQLite database at: {}", database_url);

    let mut conn: SqliteConnection = SqliteConnection::establish(database_url)
        .map_err(|e| PersistenceError::DatabaseConnectionFailed(e.to_string()))?;

    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;

    run_migrations(&mut conn).map_err(|e| PersistenceError::MigrationFailed(e.to_string()))?;

    Ok(conn)
}

/// Switches a file database to WAL so readers do not block on writers.
///
/// # Errors
///
/// Returns an error if the PRAGMA statement fails.
pub fn enable_wal_mode(conn: &mut SqliteConnection) -> Result<(), PersistenceError> {
    diesel::sql_query("PRAGMA journal_mode = WAL")
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;
    Ok(())
}

/// Sets how long a connection waits for another writer before failing.
///
/// `SQLite` stores the timeout as a 32-bit millisecond count, so longer
/// timeouts are clamped.
///
/// # Errors
///
/// Returns an error if the PRAGMA statement fails.
pub fn set_busy_timeout(conn: &mut SqliteConnection, timeout: Duration) -> Result<(), PersistenceError> {
    let millis: i32 = timeout.as_millis().to_i32().unwrap_or(i32::MAX);
    diesel::sql_query(format!("PRAGMA busy_timeout = {millis}"))
        .execute(conn)
        .map_err(|e| PersistenceError::QueryFailed(e.to_string()))?;
    Ok(())
}

/// Runs `f` inside a `BEGIN IMMEDIATE` transaction.
///
/// Taking the write lock up front means every transaction that may write
/// is fully serialized against other writers on the same file.
///
/// # Errors
///
/// Returns whatever `f` returns, or the error from beginning or
/// committing the transaction.
pub fn serializable_transaction<T, E, F>(conn: &mut SqliteConnection, f: F) -> Result<T, E>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, E>,
    E: From<diesel::result::Error>,
{
    conn.immediate_transaction(f)
}

/// Takes a named binding lock from the process-wide lock table.
///
/// `namespace` identifies the database so that unrelated databases never
/// contend.
///
/// # Errors
///
/// Returns an error if the lock table is poisoned.
pub fn acquire_binding_lock(
    held: &mut HeldLocks,
    namespace: &str,
    lock_name: &str,
    timeout: Duration,
) -> Result<bool, PersistenceError> {
    let scoped: String = format!("{namespace}|{lock_name}");
    if held.holds(&scoped) {
        return Ok(true);
    }

    match process_lock_table().acquire(&scoped, timeout)? {
        Some(guard) => {
            debug!(lock = %scoped, "Acquired in-process binding lock");
            held.push_guard(guard);
            Ok(true)
        }
        None => Ok(false),
    }
}
