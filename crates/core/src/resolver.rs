// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Single-row binding operations.
//!
//! Each function runs entirely inside the caller's open transaction and
//! follows the same order: field and date rules, reference checks, advisory
//! locks, conflict gate, then writes. Everything before the lock step is a
//! pure read, so a rejected request never waits on a lock.
//!
//! No binding row is read inside the transaction before its key is locked.
//! On `MySQL` at `SERIALIZABLE` such a read holds a shared row lock, and a
//! writer that owns the key's advisory lock would then wait on it while
//! this transaction waits on the advisory lock.

use crate::conflict::{ConflictInfo, find_active_conflict};
use crate::enrich::enrich_bindings;
use crate::error::CoreError;
use crate::lock::acquire_binding_locks;
use crate::reference::{ReferenceError, ensure_references};
use crate::store::{BindingStore, NewBinding, ReferenceSnapshot};
use routebind_domain::{
    Binding, BindingDraft, BindingFields, BindingView, CompositeKey, UpsertKey, validate_draft,
};
use std::time::Duration;
use time::Date;
use tracing::{debug, info};

/// Default wait for an advisory lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(10);

/// Engine knobs supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub lock_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// Column values for `draft`, with the route number from the route master.
///
/// # Errors
///
/// Returns `InvalidReferences` if the snapshot lacks the route.
pub fn new_binding(
    draft: &BindingDraft,
    snapshot: &ReferenceSnapshot,
) -> Result<NewBinding, CoreError> {
    let route_no: &str = snapshot
        .route_no(draft.key.route_id())
        .ok_or_else(|| {
            CoreError::InvalidReferences(vec![ReferenceError::RouteNotFound(
                draft.key.route_id(),
            )])
        })?;

    Ok(NewBinding {
        key: draft.key,
        effective_date: draft.effective_date,
        route_no: route_no.to_string(),
        description: draft.description.clone(),
        active: draft.active,
    })
}

/// Writes `row` by its upsert key and returns the id of the row now holding it.
///
/// When the row is active every other row for the key is deactivated first.
///
/// # Errors
///
/// Returns an error if the store fails.
pub fn upsert_row(
    store: &mut dyn BindingStore,
    row: &NewBinding,
) -> Result<i64, CoreError> {
    let occupant_id: Option<i64> = store
        .find_by_upsert_key(&UpsertKey::new(row.key, row.effective_date))?
        .map(|b| b.binding_id);

    if row.active {
        let deactivated: usize = store.deactivate_bindings(&row.key, occupant_id)?;
        if deactivated > 0 {
            debug!(key = %row.key, deactivated, "Deactivated sibling bindings");
        }
    }

    match occupant_id {
        Some(id) => {
            store.update_binding(id, row)?;
            Ok(id)
        }
        None => Ok(store.insert_binding(row)?),
    }
}

/// Creates a binding, or updates the row already at its upsert key.
///
/// # Errors
///
/// Returns a domain or reference error before any lock is taken,
/// `LockTimeout` if the key is busy, `Conflict` if an active row with a
/// different date exists and `force` is false, or a store error.
pub fn create_binding(
    store: &mut dyn BindingStore,
    config: &EngineConfig,
    today: Date,
    fields: BindingFields,
    force: bool,
) -> Result<BindingView, CoreError> {
    let draft: BindingDraft = fields.into_draft()?;
    validate_draft(&draft, today)?;
    let snapshot: ReferenceSnapshot = ensure_references(store, &[draft.key])?;

    acquire_binding_locks(store, &[draft.key], config.lock_timeout)?;

    if let Some(conflict) = find_active_conflict(store, &draft.key, draft.effective_date, None)? {
        gate_conflict(conflict, force)?;
    }

    let row: NewBinding = new_binding(&draft, &snapshot)?;
    let binding_id: i64 = upsert_row(store, &row)?;
    info!(binding_id, key = %draft.key, effective_date = %draft.effective_date, "Wrote binding");

    single_view(store, binding_id)
}

/// Draft and reference snapshot for applying `fields` onto `row`.
fn plan_update(
    store: &mut dyn BindingStore,
    today: Date,
    row: &Binding,
    fields: &BindingFields,
) -> Result<(BindingDraft, ReferenceSnapshot), CoreError> {
    let draft: BindingDraft = fields.clone().merge_onto(row)?;
    validate_draft(&draft, today)?;
    let snapshot: ReferenceSnapshot = ensure_references(store, &[draft.key])?;
    Ok((draft, snapshot))
}

/// Re-reads `prior` now that its key is locked.
///
/// If the row moved to another key in the meantime, that key is locked
/// too before the row is trusted.
fn relock_binding(
    store: &mut dyn BindingStore,
    config: &EngineConfig,
    prior: &Binding,
) -> Result<Binding, CoreError> {
    let current: Binding = store
        .find_binding(prior.binding_id)?
        .ok_or(CoreError::BindingNotFound(prior.binding_id))?;
    if current.key != prior.key {
        debug!(
            binding_id = prior.binding_id,
            from = %prior.key,
            to = %current.key,
            "Binding moved before its lock was taken"
        );
        acquire_binding_locks(store, &[current.key], config.lock_timeout)?;
    }
    Ok(current)
}

/// Edits an existing binding. Omitted fields keep their current values.
///
/// `prior` is the row as the caller read it before the transaction began,
/// without row locks. It decides which keys to lock. The row is then read
/// again under the lock and that copy is the one edited.
///
/// Editing the currently active row's effective date needs confirmation
/// just like displacing another active row does.
///
/// # Errors
///
/// Returns `BindingNotFound` if the row no longer exists, plus every
/// error [`create_binding`] can return.
pub fn update_binding(
    store: &mut dyn BindingStore,
    config: &EngineConfig,
    today: Date,
    prior: &Binding,
    fields: BindingFields,
    force: bool,
) -> Result<BindingView, CoreError> {
    let binding_id: i64 = prior.binding_id;
    let (mut draft, mut snapshot) = plan_update(store, today, prior, &fields)?;

    acquire_binding_locks(store, &[prior.key, draft.key], config.lock_timeout)?;

    let current: Binding = relock_binding(store, config, prior)?;
    if current != *prior {
        (draft, snapshot) = plan_update(store, today, &current, &fields)?;
        acquire_binding_locks(store, &[current.key, draft.key], config.lock_timeout)?;
    }

    let conflict: Option<ConflictInfo> =
        find_active_conflict(store, &draft.key, draft.effective_date, Some(binding_id))?.or_else(
            || {
                (current.active && current.effective_date != draft.effective_date)
                    .then(|| ConflictInfo::from(&current))
            },
        );
    if let Some(conflict) = conflict {
        gate_conflict(conflict, force)?;
    }

    let row: NewBinding = new_binding(&draft, &snapshot)?;
    let target_id: i64 = rewrite_row(store, binding_id, &row)?;
    info!(binding_id = target_id, edited = binding_id, key = %draft.key, "Updated binding");

    single_view(store, target_id)
}

/// Moves the edited row onto `row`'s upsert key.
///
/// If another row already holds that key, that row takes the new values and
/// the edited row is removed, so the upsert key stays unique.
fn rewrite_row(
    store: &mut dyn BindingStore,
    binding_id: i64,
    row: &NewBinding,
) -> Result<i64, CoreError> {
    let occupant_id: Option<i64> = store
        .find_by_upsert_key(&UpsertKey::new(row.key, row.effective_date))?
        .map(|b| b.binding_id);
    let target_id: i64 = occupant_id.unwrap_or(binding_id);

    if row.active {
        store.deactivate_bindings(&row.key, Some(target_id))?;
    }

    if target_id != binding_id {
        info!(
            superseded = binding_id,
            target = target_id,
            "Edited binding collides with an existing row; merging"
        );
        store.delete_binding(binding_id)?;
    }
    store.update_binding(target_id, row)?;

    Ok(target_id)
}

/// Reads one binding.
///
/// # Errors
///
/// Returns `BindingNotFound` if no such row exists.
pub fn get_binding(
    store: &mut dyn BindingStore,
    binding_id: i64,
) -> Result<BindingView, CoreError> {
    store
        .load_views(&[binding_id])?
        .into_iter()
        .next()
        .ok_or(CoreError::BindingNotFound(binding_id))
}

/// Deletes one binding while holding its key's lock.
///
/// `prior` is the row as read before the transaction, as for
/// [`update_binding`].
///
/// # Errors
///
/// Returns `BindingNotFound` if the row no longer exists, or `LockTimeout`.
pub fn delete_binding(
    store: &mut dyn BindingStore,
    config: &EngineConfig,
    prior: &Binding,
) -> Result<(), CoreError> {
    let binding_id: i64 = prior.binding_id;
    acquire_binding_locks(store, &[prior.key], config.lock_timeout)?;
    let current: Binding = relock_binding(store, config, prior)?;

    if !store.delete_binding(binding_id)? {
        return Err(CoreError::BindingNotFound(binding_id));
    }
    info!(binding_id, key = %current.key, "Deleted binding");
    Ok(())
}

/// Every binding for one key, oldest effective date first.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub fn binding_history(
    store: &mut dyn BindingStore,
    key: &CompositeKey,
) -> Result<Vec<BindingView>, CoreError> {
    Ok(store.bindings_for_key(key)?)
}

fn gate_conflict(conflict: ConflictInfo, force: bool) -> Result<(), CoreError> {
    if force {
        info!(
            binding_id = conflict.binding_id,
            existing_effective_date = %conflict.existing_effective_date,
            "Overwrite confirmed"
        );
        Ok(())
    } else {
        info!(
            binding_id = conflict.binding_id,
            existing_effective_date = %conflict.existing_effective_date,
            "Write requires overwrite confirmation"
        );
        Err(CoreError::Conflict(conflict))
    }
}

fn single_view(store: &mut dyn BindingStore, binding_id: i64) -> Result<BindingView, CoreError> {
    enrich_bindings(store, &[binding_id])?
        .into_iter()
        .next()
        .ok_or(CoreError::BindingNotFound(binding_id))
}
