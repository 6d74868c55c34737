// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Named binding locks held for the lifetime of one transaction.
//!
//! `MySQL` provides session-scoped named locks natively (`GET_LOCK`).
//! `SQLite` has nothing comparable, so connections in this process share
//! a lock table keyed by database and lock name. Either way the locks are
//! collected in [`HeldLocks`] and released once the transaction has
//! committed or rolled back.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use crate::error::PersistenceError;

/// A table of named locks shared by every connection in the process.
#[derive(Debug, Default)]
pub struct ProcessLockTable {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

/// Releases its lock on drop.
#[derive(Debug)]
pub struct ProcessLockGuard<'a> {
    table: &'a ProcessLockTable,
    name: String,
}

impl ProcessLockGuard<'_> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ProcessLockGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .table
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.name);
        drop(held);
        self.table.released.notify_all();
    }
}

impl ProcessLockTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `timeout` for `name` to become free and takes it.
    ///
    /// Returns `None` when the timeout elapses first. A timeout too large to
    /// represent as a deadline waits until the lock is free.
    ///
    /// # Errors
    ///
    /// Returns an error if the table was poisoned.
    pub fn acquire(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Option<ProcessLockGuard<'_>>, PersistenceError> {
        let deadline: Option<Instant> = Instant::now().checked_add(timeout);
        let mut held = self
            .held
            .lock()
            .map_err(|_| PersistenceError::LockTablePoisoned)?;

        loop {
            if !held.contains(name) {
                held.insert(name.to_string());
                return Ok(Some(ProcessLockGuard {
                    table: self,
                    name: name.to_string(),
                }));
            }

            held = match deadline {
                Some(deadline) => {
                    let now: Instant = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    self.released
                        .wait_timeout(held, deadline - now)
                        .map_err(|_| PersistenceError::LockTablePoisoned)?
                        .0
                }
                None => self
                    .released
                    .wait(held)
                    .map_err(|_| PersistenceError::LockTablePoisoned)?,
            };
        }
    }

    /// Reports whether `name` is currently held by anyone.
    #[must_use]
    pub fn is_held(&self, name: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(name)
    }
}

static PROCESS_LOCK_TABLE: OnceLock<ProcessLockTable> = OnceLock::new();

/// The lock table shared by all `SQLite` connections in this process.
pub fn process_lock_table() -> &'static ProcessLockTable {
    PROCESS_LOCK_TABLE.get_or_init(ProcessLockTable::new)
}

/// Locks acquired by one transaction.
#[derive(Debug, Default)]
pub struct HeldLocks {
    process_guards: Vec<ProcessLockGuard<'static>>,
    session_locks: Vec<String>,
}

impl HeldLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock names are re-entrant within one transaction.
    #[must_use]
    pub fn holds(&self, name: &str) -> bool {
        self.process_guards.iter().any(|guard| guard.name() == name)
            || self.session_locks.iter().any(|held| held == name)
    }

    pub fn push_guard(&mut self, guard: ProcessLockGuard<'static>) {
        self.process_guards.push(guard);
    }

    pub fn push_session_lock(&mut self, name: String) {
        self.session_locks.push(name);
    }

    /// Drops every in-process guard, waking waiters.
    pub fn release_process_guards(&mut self) {
        self.process_guards.clear();
    }

    /// Hands back the names of server-side locks so the caller can release them.
    pub fn take_session_locks(&mut self) -> Vec<String> {
        std::mem::take(&mut self.session_locks)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.process_guards.len() + self.session_locks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
