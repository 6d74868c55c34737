// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Diesel-backed implementations of the engine's `BindingStore`.
//!
//! A store borrows a connection that is already inside a transaction,
//! plus the lock set for that transaction. One store type is generated per
//! backend so every call stays monomorphic.

use std::time::Duration;

use diesel::{MysqlConnection, SqliteConnection};
use routebind::{BindingStore, LockOutcome, NewBinding, ReferenceSnapshot, StoreError};
use routebind_domain::{Binding, BindingView, CompositeKey, UpsertKey};

use crate::backend::PersistenceBackend;
use crate::backend::locks::HeldLocks;
use crate::{mutations, queries};

macro_rules! binding_store {
    ($store:ident, $conn_ty:ty, $suffix:ident) => {
        pastey::paste! {
            /// A binding store over one open transaction.
            pub struct $store<'a> {
                conn: &'a mut $conn_ty,
                held: &'a mut HeldLocks,
                namespace: &'a str,
            }

            impl<'a> $store<'a> {
                pub fn new(conn: &'a mut $conn_ty, held: &'a mut HeldLocks, namespace: &'a str) -> Self {
                    Self {
                        conn,
                        held,
                        namespace,
                    }
                }
            }

            impl BindingStore for $store<'_> {
                fn acquire_lock(
                    &mut self,
                    lock_name: &str,
                    timeout: Duration,
                ) -> Result<LockOutcome, StoreError> {
                    let acquired: bool = self.conn.acquire_binding_lock(
                        &mut *self.held,
                        self.namespace,
                        lock_name,
                        timeout,
                    )?;
                    Ok(if acquired {
                        LockOutcome::Acquired
                    } else {
                        LockOutcome::TimedOut
                    })
                }

                fn load_references(
                    &mut self,
                    keys: &[CompositeKey],
                ) -> Result<ReferenceSnapshot, StoreError> {
                    Ok(queries::[<load_references_ $suffix>](self.conn, keys)?)
                }

                fn find_binding(&mut self, binding_id: i64) -> Result<Option<Binding>, StoreError> {
                    Ok(queries::[<find_binding_ $suffix>](self.conn, binding_id)?)
                }

                fn find_by_upsert_key(
                    &mut self,
                    key: &UpsertKey,
                ) -> Result<Option<Binding>, StoreError> {
                    Ok(queries::[<find_by_upsert_key_ $suffix>](self.conn, key)?)
                }

                fn active_bindings_for_keys(
                    &mut self,
                    keys: &[CompositeKey],
                ) -> Result<Vec<Binding>, StoreError> {
                    Ok(queries::[<active_bindings_for_keys_ $suffix>](self.conn, keys)?)
                }

                fn deactivate_bindings(
                    &mut self,
                    key: &CompositeKey,
                    except: Option<i64>,
                ) -> Result<usize, StoreError> {
                    Ok(mutations::[<deactivate_bindings_ $suffix>](self.conn, key, except)?)
                }

                fn insert_binding(&mut self, row: &NewBinding) -> Result<i64, StoreError> {
                    Ok(mutations::[<insert_binding_ $suffix>](self.conn, row)?)
                }

                fn update_binding(
                    &mut self,
                    binding_id: i64,
                    row: &NewBinding,
                ) -> Result<(), StoreError> {
                    Ok(mutations::[<update_binding_ $suffix>](self.conn, binding_id, row)?)
                }

                fn delete_binding(&mut self, binding_id: i64) -> Result<bool, StoreError> {
                    Ok(mutations::[<delete_binding_ $suffix>](self.conn, binding_id)?)
                }

                fn load_views(&mut self, binding_ids: &[i64]) -> Result<Vec<BindingView>, StoreError> {
                    Ok(queries::[<load_views_ $suffix>](self.conn, binding_ids)?)
                }

                fn bindings_for_key(
                    &mut self,
                    key: &CompositeKey,
                ) -> Result<Vec<BindingView>, StoreError> {
                    Ok(queries::[<bindings_for_key_ $suffix>](self.conn, key)?)
                }
            }
        }
    };
}

binding_store!(SqliteBindingStore, SqliteConnection, sqlite);
binding_store!(MysqlBindingStore, MysqlConnection, mysql);
