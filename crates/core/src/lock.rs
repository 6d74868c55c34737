// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use crate::store::{BindingStore, LockOutcome};
use routebind_domain::{CompositeKey, lock_order};
use std::time::Duration;
use tracing::{debug, warn};

/// Acquires the advisory locks for every distinct key in canonical order.
///
/// Nothing is released here. Locks already taken when a later one times out
/// are released by the transaction owner along with the rollback.
///
/// # Errors
///
/// Returns `LockTimeout` naming the first lock that could not be taken.
pub fn acquire_binding_locks(
    store: &mut dyn BindingStore,
    keys: &[CompositeKey],
    timeout: Duration,
) -> Result<(), CoreError> {
    for lock_name in lock_order(keys) {
        match store.acquire_lock(&lock_name, timeout)? {
            LockOutcome::Acquired => debug!(lock_name = %lock_name, "Acquired binding lock"),
            LockOutcome::TimedOut => {
                warn!(
                    lock_name = %lock_name,
                    timeout_ms = timeout.as_millis(),
                    "Timed out waiting for binding lock"
                );
                return Err(CoreError::LockTimeout { lock_name, timeout });
            }
        }
    }
    Ok(())
}
