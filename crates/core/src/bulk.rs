// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk validation and bulk create.
//!
//! A batch is all-or-nothing twice over: one invalid row rejects the whole
//! batch before any lock is taken, and one unconfirmed conflict rejects it
//! before any write.

use crate::conflict::{BulkConflict, find_batch_conflicts};
use crate::enrich::enrich_bindings;
use crate::error::CoreError;
use crate::lock::acquire_binding_locks;
use crate::resolver::{EngineConfig, new_binding, upsert_row};
use crate::store::{BindingStore, NewBinding, ReferenceSnapshot};
use routebind_domain::{
    BindingView, CandidateRow, CompositeKey, DomainError, InvalidBulkRow, NormalizedBatch,
    RawBulkRow, candidate_reasons, normalize_bulk_rows,
};
use std::collections::BTreeSet;
use time::Date;
use tracing::{debug, info};

/// The pre-flight report for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkValidation {
    /// De-duplicated rows that may be written, in submission order.
    pub valid: Vec<CandidateRow>,
    /// Rejected rows ordered by position, each with all of its reasons.
    pub invalid: Vec<InvalidBulkRow>,
}

impl BulkValidation {
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }
}

fn distinct_keys(rows: &[CandidateRow]) -> Vec<CompositeKey> {
    rows.iter()
        .map(CandidateRow::key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn validate_batch(
    store: &mut dyn BindingStore,
    today: Date,
    rows: Vec<RawBulkRow>,
) -> Result<(BulkValidation, ReferenceSnapshot), CoreError> {
    if rows.is_empty() {
        return Err(DomainError::EmptyBatch.into());
    }

    let submitted: usize = rows.len();
    let NormalizedBatch {
        candidates,
        rejected,
    } = normalize_bulk_rows(rows);
    debug!(
        submitted,
        candidates = candidates.len(),
        rejected = rejected.len(),
        "Normalized bulk rows"
    );

    let snapshot: ReferenceSnapshot = store.load_references(&distinct_keys(&candidates))?;

    let mut report: BulkValidation = BulkValidation {
        valid: Vec::with_capacity(candidates.len()),
        invalid: rejected,
    };

    for row in candidates {
        let mut reasons: Vec<String> = candidate_reasons(&row, today);
        reasons.extend(snapshot.check(&row.key()).iter().map(ToString::to_string));

        if reasons.is_empty() {
            report.valid.push(row);
        } else {
            report.invalid.push(InvalidBulkRow {
                position: row.position,
                raw: row.raw,
                reasons,
            });
        }
    }
    report.invalid.sort_by_key(|row| row.position);

    Ok((report, snapshot))
}

/// Normalizes and validates a batch without writing anything.
///
/// # Errors
///
/// Returns `EmptyBatch` for an empty batch, or a store error.
pub fn validate_bulk_rows(
    store: &mut dyn BindingStore,
    today: Date,
    rows: Vec<RawBulkRow>,
) -> Result<BulkValidation, CoreError> {
    validate_batch(store, today, rows).map(|(report, _)| report)
}

/// Writes a whole batch in the caller's transaction.
///
/// Rows are applied in submission order, so when a batch holds several
/// active rows for one key the last one ends up active.
///
/// # Errors
///
/// Returns `BulkInvalid` if any row is invalid, `LockTimeout` if any key is
/// busy, `BulkConflict` if active rows would be displaced and `force` is
/// false, or a store error.
pub fn create_bulk_bindings(
    store: &mut dyn BindingStore,
    config: &EngineConfig,
    today: Date,
    rows: Vec<RawBulkRow>,
    force: bool,
) -> Result<Vec<BindingView>, CoreError> {
    let (report, snapshot) = validate_batch(store, today, rows)?;
    if !report.is_valid() {
        info!(
            invalid = report.invalid.len(),
            "Rejected bulk batch with invalid rows"
        );
        return Err(CoreError::BulkInvalid(report.invalid));
    }

    let keys: Vec<CompositeKey> = distinct_keys(&report.valid);
    acquire_binding_locks(store, &keys, config.lock_timeout)?;

    let conflicts: Vec<BulkConflict> = find_batch_conflicts(store, &report.valid)?;
    if !conflicts.is_empty() {
        if !force {
            info!(
                conflicts = conflicts.len(),
                "Bulk write requires overwrite confirmation"
            );
            return Err(CoreError::BulkConflict(conflicts));
        }
        info!(conflicts = conflicts.len(), "Bulk overwrite confirmed");
    }

    let mut affected: Vec<i64> = Vec::with_capacity(report.valid.len());
    for row in &report.valid {
        let new_row: NewBinding = new_binding(&row.draft, &snapshot)?;
        let binding_id: i64 = upsert_row(store, &new_row)?;
        if !affected.contains(&binding_id) {
            affected.push(binding_id);
        }
    }
    info!(
        rows = affected.len(),
        keys = keys.len(),
        "Wrote bulk bindings"
    );

    enrich_bindings(store, &affected)
}
