// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Bulk row normalization and de-duplication.
//!
//! Rows arrive loosely typed (spreadsheet exports send IDs as strings and
//! flags as strings, numbers, or booleans). Normalization coerces each row
//! into a [`BindingDraft`] and collapses rows sharing an [`UpsertKey`] to the
//! last occurrence. Rows for the same composite key with different dates are
//! distinct and are all kept.

use crate::effective_date::parse_effective_date;
use crate::error::DomainError;
use crate::types::{BindingDraft, CompositeKey, UpsertKey};
use crate::validation::collect_draft_errors;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use time::Date;

/// A JSON scalar as sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// One bulk row exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBulkRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_branch_id: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_route_id: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_reports_flag: Option<RawValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_description_for_reports: Option<String>,
}

/// A row that parsed cleanly and survived de-duplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    /// Zero-based index in the submitted batch.
    pub position: usize,
    pub raw: RawBulkRow,
    pub draft: BindingDraft,
}

impl CandidateRow {
    #[must_use]
    pub const fn key(&self) -> CompositeKey {
        self.draft.key
    }

    #[must_use]
    pub const fn upsert_key(&self) -> UpsertKey {
        self.draft.upsert_key()
    }
}

/// A row rejected by normalization or validation, with every reason found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidBulkRow {
    /// Zero-based index in the submitted batch.
    pub position: usize,
    pub raw: RawBulkRow,
    pub reasons: Vec<String>,
}

/// Output of [`normalize_bulk_rows`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    /// De-duplicated rows in submission order.
    pub candidates: Vec<CandidateRow>,
    /// Rows that could not be parsed.
    pub rejected: Vec<InvalidBulkRow>,
}

fn coerce_id(field: &'static str, value: &RawValue) -> Result<i64, DomainError> {
    let parsed: Option<i64> = match value {
        RawValue::Integer(n) => Some(*n),
        RawValue::Text(s) => s.trim().parse::<i64>().ok(),
        RawValue::Bool(_) => None,
    };

    match parsed {
        Some(id) if id > 0 => Ok(id),
        _ => Err(DomainError::InvalidIdentifier {
            field,
            value: value.to_string(),
        }),
    }
}

/// Reads the reports flag, accepting 0/1 in any scalar form and booleans.
///
/// # Errors
///
/// Returns `InvalidReportsFlag` for anything else.
pub fn coerce_reports_flag(value: &RawValue) -> Result<bool, DomainError> {
    match value {
        RawValue::Integer(1) | RawValue::Bool(true) => Ok(true),
        RawValue::Integer(0) | RawValue::Bool(false) => Ok(false),
        RawValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err(DomainError::InvalidReportsFlag(s.clone())),
        },
        RawValue::Integer(_) => Err(DomainError::InvalidReportsFlag(value.to_string())),
    }
}

fn parse_row(raw: &RawBulkRow) -> Result<BindingDraft, Vec<DomainError>> {
    let mut errors: Vec<DomainError> = Vec::new();
    let mut missing: Vec<&'static str> = Vec::new();

    let mut id = |field: &'static str, value: Option<&RawValue>| -> Option<i64> {
        match value {
            None => {
                missing.push(field);
                None
            }
            Some(v) => coerce_id(field, v).map_err(|e| errors.push(e)).ok(),
        }
    };

    let branch_id: Option<i64> = id("branchId", raw.branch_id.as_ref());
    let sub_branch_id: Option<i64> = id("subBranchId", raw.sub_branch_id.as_ref());
    let route_id: Option<i64> = id("deliveryRouteId", raw.delivery_route_id.as_ref());

    let effective_date: Option<Date> = match raw.effective_date.as_deref() {
        None => {
            missing.push("effectiveDate");
            None
        }
        Some(value) => parse_effective_date(value).map_err(|e| errors.push(e)).ok(),
    };

    let active: Option<bool> = match raw.required_reports_flag.as_ref() {
        None => Some(true),
        Some(value) => coerce_reports_flag(value).map_err(|e| errors.push(e)).ok(),
    };

    if !missing.is_empty() {
        errors.insert(0, DomainError::MissingFields(missing));
    }

    match (branch_id, sub_branch_id, route_id, effective_date, active) {
        (Some(branch_id), Some(sub_branch_id), Some(route_id), Some(effective_date), Some(active))
            if errors.is_empty() =>
        {
            Ok(BindingDraft {
                key: CompositeKey::new(branch_id, sub_branch_id, route_id),
                effective_date,
                active,
                description: raw
                    .correct_description_for_reports
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            })
        }
        _ => Err(errors),
    }
}

/// Parses and de-duplicates a batch.
///
/// When several rows share an [`UpsertKey`] only the last is kept, and it
/// keeps its own position in the batch.
#[must_use]
pub fn normalize_bulk_rows(rows: Vec<RawBulkRow>) -> NormalizedBatch {
    let mut parsed: Vec<CandidateRow> = Vec::with_capacity(rows.len());
    let mut rejected: Vec<InvalidBulkRow> = Vec::new();

    for (position, raw) in rows.into_iter().enumerate() {
        match parse_row(&raw) {
            Ok(draft) => parsed.push(CandidateRow {
                position,
                raw,
                draft,
            }),
            Err(errors) => rejected.push(InvalidBulkRow {
                position,
                raw,
                reasons: errors.iter().map(ToString::to_string).collect(),
            }),
        }
    }

    let mut seen: HashSet<UpsertKey> = HashSet::new();
    let mut candidates: Vec<CandidateRow> = parsed
        .into_iter()
        .rev()
        .filter(|row| seen.insert(row.upsert_key()))
        .collect();
    candidates.reverse();

    NormalizedBatch {
        candidates,
        rejected,
    }
}

/// Field-level reasons a parsed candidate cannot be written.
#[must_use]
pub fn candidate_reasons(row: &CandidateRow, today: Date) -> Vec<String> {
    collect_draft_errors(&row.draft, today)
        .iter()
        .map(ToString::to_string)
        .collect()
}
