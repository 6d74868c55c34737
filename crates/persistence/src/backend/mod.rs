// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Per-backend code behind one trait.
//!
//! Query and mutation modules are written once against Diesel's DSL and
//! made generic over [`PersistenceBackend`]. What the DSL cannot say lives
//! here: connection setup, migrations, last-insert ids, transaction
//! isolation and named locks.

pub mod locks;
pub mod mysql;
pub mod sqlite;

use std::time::Duration;

use diesel::{Connection, MysqlConnection, SqliteConnection};

use crate::backend::locks::HeldLocks;
use crate::error::PersistenceError;

/// Operations each backend implements in its own SQL.
pub trait PersistenceBackend: Connection {
    /// Id of the row most recently inserted on this connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError>;

    /// Startup check that the backend enforces foreign keys.
    ///
    /// # Errors
    ///
    /// Returns an error if foreign key enforcement is not enabled.
    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError>;

    /// Runs `f` in a transaction at the strongest isolation the backend
    /// offers, committing on `Ok` and rolling back on `Err`.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or a transaction error.
    fn serializable_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<diesel::result::Error>;

    /// Takes the named lock `lock_name`, waiting up to `timeout`.
    ///
    /// Returns `false` if the wait timed out. Acquired locks are recorded
    /// in `held`; a name already in `held` is granted immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock mechanism itself fails.
    fn acquire_binding_lock(
        &mut self,
        held: &mut HeldLocks,
        namespace: &str,
        lock_name: &str,
        timeout: Duration,
    ) -> Result<bool, PersistenceError>;

    /// Releases every lock recorded in `held`.
    ///
    /// # Errors
    ///
    /// Returns an error if a lock could not be released.
    fn release_binding_locks(&mut self, held: &mut HeldLocks) -> Result<(), PersistenceError>;
}

impl PersistenceBackend for SqliteConnection {
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError> {
        sqlite::get_last_insert_rowid(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        sqlite::verify_foreign_key_enforcement(self)
    }

    fn serializable_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<diesel::result::Error>,
    {
        sqlite::serializable_transaction(self, f)
    }

    fn acquire_binding_lock(
        &mut self,
        held: &mut HeldLocks,
        namespace: &str,
        lock_name: &str,
        timeout: Duration,
    ) -> Result<bool, PersistenceError> {
        sqlite::acquire_binding_lock(held, namespace, lock_name, timeout)
    }

    fn release_binding_locks(&mut self, held: &mut HeldLocks) -> Result<(), PersistenceError> {
        held.release_process_guards();
        Ok(())
    }
}

impl PersistenceBackend for MysqlConnection {
    fn get_last_insert_rowid(&mut self) -> Result<i64, PersistenceError> {
        mysql::get_last_insert_rowid(self)
    }

    fn verify_foreign_key_enforcement(&mut self) -> Result<(), PersistenceError> {
        mysql::verify_foreign_key_enforcement(self)
    }

    fn serializable_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<diesel::result::Error>,
    {
        mysql::serializable_transaction(self, f)
    }

    // Server-side locks are already scoped to the database server.
    fn acquire_binding_lock(
        &mut self,
        held: &mut HeldLocks,
        _namespace: &str,
        lock_name: &str,
        timeout: Duration,
    ) -> Result<bool, PersistenceError> {
        mysql::acquire_binding_lock(self, held, lock_name, timeout)
    }

    fn release_binding_locks(&mut self, held: &mut HeldLocks) -> Result<(), PersistenceError> {
        mysql::release_binding_locks(self, held)
    }
}
