// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Detection of writes that would displace the active binding.

use crate::error::CoreError;
use crate::store::BindingStore;
use routebind_domain::{Binding, CandidateRow, CompositeKey};
use std::collections::{BTreeSet, HashMap};
use time::Date;

/// The active row a single-row write would displace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictInfo {
    pub binding_id: i64,
    pub existing_effective_date: Date,
}

impl From<&Binding> for ConflictInfo {
    fn from(binding: &Binding) -> Self {
        Self {
            binding_id: binding.binding_id,
            existing_effective_date: binding.effective_date,
        }
    }
}

/// One displaced active row in a bulk batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkConflict {
    pub key: CompositeKey,
    pub existing_id: i64,
    pub existing_effective_date: Date,
    pub new_effective_date: Date,
}

/// Finds an active row for `key` whose date differs from `effective_date`.
///
/// `exclude` skips the row being edited on the update path.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub fn find_active_conflict(
    store: &mut dyn BindingStore,
    key: &CompositeKey,
    effective_date: Date,
    exclude: Option<i64>,
) -> Result<Option<ConflictInfo>, CoreError> {
    let active: Vec<Binding> = store.active_bindings_for_keys(std::slice::from_ref(key))?;

    Ok(active
        .iter()
        .filter(|b| b.key == *key)
        .find(|b| Some(b.binding_id) != exclude && b.effective_date != effective_date)
        .map(ConflictInfo::from))
}

/// Finds every existing active row displaced by a batch, in batch order.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub fn find_batch_conflicts(
    store: &mut dyn BindingStore,
    rows: &[CandidateRow],
) -> Result<Vec<BulkConflict>, CoreError> {
    let keys: Vec<CompositeKey> = rows
        .iter()
        .map(CandidateRow::key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut active_by_key: HashMap<CompositeKey, Vec<Binding>> = HashMap::new();
    for binding in store.active_bindings_for_keys(&keys)? {
        active_by_key.entry(binding.key).or_default().push(binding);
    }

    let mut conflicts: Vec<BulkConflict> = Vec::new();
    for row in rows {
        let Some(existing) = active_by_key.get(&row.key()) else {
            continue;
        };
        conflicts.extend(
            existing
                .iter()
                .filter(|b| b.effective_date != row.draft.effective_date)
                .map(|b| BulkConflict {
                    key: row.key(),
                    existing_id: b.binding_id,
                    existing_effective_date: b.effective_date,
                    new_effective_date: row.draft.effective_date,
                }),
        );
    }

    Ok(conflicts)
}
