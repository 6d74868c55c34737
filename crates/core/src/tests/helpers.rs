// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{BindingStore, LockOutcome, NewBinding, ReferenceSnapshot, StoreError};
use routebind_domain::{Binding, BindingFields, BindingView, CompositeKey, RawBulkRow, RawValue, UpsertKey};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;
use time::Date;
use time::macros::date;

pub const TODAY: Date = date!(2026 - 10 - 17);

/// An in-memory store standing in for one open transaction.
#[derive(Default)]
pub struct MemoryStore {
    branches: HashMap<i64, String>,
    sub_branches: HashMap<i64, (i64, String)>,
    routes: HashMap<i64, (i64, String)>,
    pub rows: BTreeMap<i64, Binding>,
    next_id: i64,
    /// Every lock requested, in request order.
    pub lock_requests: Vec<String>,
    /// Locks another transaction is holding.
    pub busy_locks: HashSet<String>,
}

impl MemoryStore {
    /// Branch 5 owns sub-branch 12 and routes 40/41. Branch 6 owns
    /// sub-branch 13 and route 50.
    pub fn seeded() -> Self {
        let mut store: Self = Self::default();
        store.branches.insert(5, String::from("North"));
        store.branches.insert(6, String::from("South"));
        store.sub_branches.insert(12, (5, String::from("North-A")));
        store.sub_branches.insert(13, (6, String::from("South-A")));
        store.routes.insert(40, (5, String::from("R-40")));
        store.routes.insert(41, (5, String::from("R-41")));
        store.routes.insert(50, (6, String::from("R-50")));
        store
    }

    pub fn active_count(&self, key: &CompositeKey) -> usize {
        self.rows
            .values()
            .filter(|b| b.key == *key && b.active)
            .count()
    }

    pub fn rows_for(&self, key: &CompositeKey) -> Vec<&Binding> {
        self.rows.values().filter(|b| b.key == *key).collect()
    }

    fn view(&self, binding: &Binding) -> BindingView {
        let branch_name: String = self
            .branches
            .get(&binding.key.branch_id())
            .cloned()
            .unwrap_or_default();
        let sub_branch_name: String = self
            .sub_branches
            .get(&binding.key.sub_branch_id())
            .map(|(_, name)| name.clone())
            .unwrap_or_default();
        BindingView {
            binding_id: binding.binding_id,
            branch_id: binding.key.branch_id(),
            branch_name,
            branch_desc: None,
            sub_branch_id: binding.key.sub_branch_id(),
            sub_branch_name,
            sub_branch_desc: None,
            delivery_route_id: binding.key.route_id(),
            delivery_route_no: binding.route_no.clone(),
            delivery_route_description: None,
            description: binding.description.clone(),
            effective_date: binding.effective_date,
            active: binding.active,
        }
    }
}

impl BindingStore for MemoryStore {
    fn acquire_lock(
        &mut self,
        lock_name: &str,
        _timeout: Duration,
    ) -> Result<LockOutcome, StoreError> {
        self.lock_requests.push(lock_name.to_string());
        if self.busy_locks.contains(lock_name) {
            Ok(LockOutcome::TimedOut)
        } else {
            Ok(LockOutcome::Acquired)
        }
    }

    fn load_references(&mut self, keys: &[CompositeKey]) -> Result<ReferenceSnapshot, StoreError> {
        let mut snapshot: ReferenceSnapshot = ReferenceSnapshot::new();
        for key in keys {
            if self.branches.contains_key(&key.branch_id()) {
                snapshot.add_branch(key.branch_id());
            }
            if let Some((owner, _)) = self.sub_branches.get(&key.sub_branch_id()) {
                snapshot.add_sub_branch(key.sub_branch_id(), *owner);
            }
            if let Some((owner, no)) = self.routes.get(&key.route_id()) {
                snapshot.add_route(key.route_id(), *owner, no.clone());
            }
        }
        Ok(snapshot)
    }

    fn find_binding(&mut self, binding_id: i64) -> Result<Option<Binding>, StoreError> {
        Ok(self.rows.get(&binding_id).cloned())
    }

    fn find_by_upsert_key(&mut self, key: &UpsertKey) -> Result<Option<Binding>, StoreError> {
        Ok(self
            .rows
            .values()
            .find(|b| b.upsert_key() == *key)
            .cloned())
    }

    fn active_bindings_for_keys(
        &mut self,
        keys: &[CompositeKey],
    ) -> Result<Vec<Binding>, StoreError> {
        Ok(self
            .rows
            .values()
            .filter(|b| b.active && keys.contains(&b.key))
            .cloned()
            .collect())
    }

    fn deactivate_bindings(
        &mut self,
        key: &CompositeKey,
        except: Option<i64>,
    ) -> Result<usize, StoreError> {
        let mut changed: usize = 0;
        for binding in self.rows.values_mut() {
            if binding.key == *key && binding.active && Some(binding.binding_id) != except {
                binding.active = false;
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn insert_binding(&mut self, row: &NewBinding) -> Result<i64, StoreError> {
        let upsert: UpsertKey = UpsertKey::new(row.key, row.effective_date);
        if self.rows.values().any(|b| b.upsert_key() == upsert) {
            return Err(StoreError::Integrity(String::from("duplicate upsert key")));
        }
        self.next_id += 1;
        let binding_id: i64 = self.next_id;
        self.rows.insert(
            binding_id,
            Binding {
                binding_id,
                key: row.key,
                route_no: row.route_no.clone(),
                description: row.description.clone(),
                effective_date: row.effective_date,
                active: row.active,
            },
        );
        Ok(binding_id)
    }

    fn update_binding(&mut self, binding_id: i64, row: &NewBinding) -> Result<(), StoreError> {
        let upsert: UpsertKey = UpsertKey::new(row.key, row.effective_date);
        if self
            .rows
            .values()
            .any(|b| b.binding_id != binding_id && b.upsert_key() == upsert)
        {
            return Err(StoreError::Integrity(String::from("duplicate upsert key")));
        }
        let binding: &mut Binding = self
            .rows
            .get_mut(&binding_id)
            .ok_or_else(|| StoreError::Database(format!("no row {binding_id}")))?;
        binding.key = row.key;
        binding.effective_date = row.effective_date;
        binding.route_no = row.route_no.clone();
        binding.description = row.description.clone();
        binding.active = row.active;
        Ok(())
    }

    fn delete_binding(&mut self, binding_id: i64) -> Result<bool, StoreError> {
        Ok(self.rows.remove(&binding_id).is_some())
    }

    fn load_views(&mut self, binding_ids: &[i64]) -> Result<Vec<BindingView>, StoreError> {
        Ok(binding_ids
            .iter()
            .filter_map(|id| self.rows.get(id))
            .map(|b| self.view(b))
            .collect())
    }

    fn bindings_for_key(&mut self, key: &CompositeKey) -> Result<Vec<BindingView>, StoreError> {
        let mut rows: Vec<&Binding> = self.rows.values().filter(|b| b.key == *key).collect();
        rows.sort_by_key(|b| b.effective_date);
        Ok(rows.into_iter().map(|b| self.view(b)).collect())
    }
}

pub fn fields(branch: i64, sub: i64, route: i64, effective_date: &str, active: bool) -> BindingFields {
    BindingFields {
        branch_id: Some(branch),
        sub_branch_id: Some(sub),
        route_id: Some(route),
        effective_date: Some(effective_date.to_string()),
        active: Some(active),
        description: Some(String::from("Route binding")),
    }
}

pub fn bulk_row(route: i64, effective_date: &str, active: i64) -> RawBulkRow {
    RawBulkRow {
        branch_id: Some(RawValue::Integer(5)),
        sub_branch_id: Some(RawValue::Integer(12)),
        delivery_route_id: Some(RawValue::Integer(route)),
        effective_date: Some(effective_date.to_string()),
        required_reports_flag: Some(RawValue::Integer(active)),
        correct_description_for_reports: Some(String::from("Bulk binding")),
    }
}
