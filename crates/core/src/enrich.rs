// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::error::CoreError;
use crate::store::{BindingStore, StoreError};
use routebind_domain::BindingView;
use std::collections::HashMap;

/// Loads joined views for `binding_ids`, returned in the same order.
///
/// # Errors
///
/// Returns an integrity error if any requested row is missing, since every
/// id passed here was written earlier in the same transaction.
pub fn enrich_bindings(
    store: &mut dyn BindingStore,
    binding_ids: &[i64],
) -> Result<Vec<BindingView>, CoreError> {
    let mut by_id: HashMap<i64, BindingView> = store
        .load_views(binding_ids)?
        .into_iter()
        .map(|view| (view.binding_id, view))
        .collect();

    binding_ids
        .iter()
        .map(|id| {
            by_id.remove(id).ok_or_else(|| {
                CoreError::Store(StoreError::Integrity(format!(
                    "binding {id} disappeared before it could be read back"
                )))
            })
        })
        .collect()
}
