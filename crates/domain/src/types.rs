// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::effective_date::parse_effective_date;
use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::Date;

/// The logical identity of a route assignment: (branch, sub-branch, route).
///
/// At most one binding per key may be active at any time, and every writer
/// touching a key serializes on the advisory lock named by [`Self::lock_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CompositeKey {
    branch_id: i64,
    sub_branch_id: i64,
    route_id: i64,
}

impl CompositeKey {
    /// Creates a new key.
    #[must_use]
    pub const fn new(branch_id: i64, sub_branch_id: i64, route_id: i64) -> Self {
        Self {
            branch_id,
            sub_branch_id,
            route_id,
        }
    }

    #[must_use]
    pub const fn branch_id(&self) -> i64 {
        self.branch_id
    }

    #[must_use]
    pub const fn sub_branch_id(&self) -> i64 {
        self.sub_branch_id
    }

    #[must_use]
    pub const fn route_id(&self) -> i64 {
        self.route_id
    }

    /// Returns the canonical advisory lock name for this key.
    ///
    /// `MySQL` caps lock names at 64 characters; three `i64` values plus the
    /// prefix stay well under that.
    #[must_use]
    pub fn lock_name(&self) -> String {
        format!(
            "rb:{}:{}:{}",
            self.branch_id, self.sub_branch_id, self.route_id
        )
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "branch {} / sub-branch {} / route {}",
            self.branch_id, self.sub_branch_id, self.route_id
        )
    }
}

/// Returns the de-duplicated lock names for `keys` in the order they must be
/// acquired.
///
/// Every multi-key writer acquires in this one lexical order so two writers
/// with overlapping key sets cannot deadlock.
#[must_use]
pub fn lock_order<'a, I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a CompositeKey>,
{
    keys.into_iter()
        .map(CompositeKey::lock_name)
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// A composite key plus effective date. Uniquely addresses one binding row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UpsertKey {
    pub key: CompositeKey,
    pub effective_date: Date,
}

impl UpsertKey {
    #[must_use]
    pub const fn new(key: CompositeKey, effective_date: Date) -> Self {
        Self {
            key,
            effective_date,
        }
    }
}

/// A persisted binding row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Surrogate identifier assigned by the database.
    pub binding_id: i64,
    pub key: CompositeKey,
    /// Copy of the route number taken from the route master at write time.
    pub route_no: String,
    pub description: String,
    pub effective_date: Date,
    /// The "required for reports" flag.
    pub active: bool,
}

impl Binding {
    #[must_use]
    pub const fn upsert_key(&self) -> UpsertKey {
        UpsertKey::new(self.key, self.effective_date)
    }
}

/// A validated, fully specified write request for a single binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingDraft {
    pub key: CompositeKey,
    pub effective_date: Date,
    pub active: bool,
    pub description: String,
}

impl BindingDraft {
    #[must_use]
    pub const fn upsert_key(&self) -> UpsertKey {
        UpsertKey::new(self.key, self.effective_date)
    }
}

/// Caller-supplied binding fields before defaults are applied.
///
/// Create requires every field except `active` (which defaults to true).
/// Update defaults every omitted field to the edited row's current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingFields {
    pub branch_id: Option<i64>,
    pub sub_branch_id: Option<i64>,
    pub route_id: Option<i64>,
    pub effective_date: Option<String>,
    pub active: Option<bool>,
    pub description: Option<String>,
}

impl BindingFields {
    /// Builds a draft for a new binding.
    ///
    /// # Errors
    ///
    /// Returns `MissingFields` listing every absent required field, or a
    /// parse error for a malformed effective date.
    pub fn into_draft(self) -> Result<BindingDraft, DomainError> {
        let mut missing: Vec<&'static str> = Vec::new();
        if self.branch_id.is_none() {
            missing.push("branchId");
        }
        if self.sub_branch_id.is_none() {
            missing.push("subBranchId");
        }
        if self.route_id.is_none() {
            missing.push("deliveryRouteId");
        }
        if self.effective_date.is_none() {
            missing.push("effectiveDate");
        }
        if self.description.is_none() {
            missing.push("correctDescriptionForReports");
        }

        match (
            self.branch_id,
            self.sub_branch_id,
            self.route_id,
            self.effective_date,
            self.description,
        ) {
            (
                Some(branch_id),
                Some(sub_branch_id),
                Some(route_id),
                Some(effective_date),
                Some(description),
            ) => Ok(BindingDraft {
                key: CompositeKey::new(branch_id, sub_branch_id, route_id),
                effective_date: parse_effective_date(&effective_date)?,
                active: self.active.unwrap_or(true),
                description: description.trim().to_string(),
            }),
            _ => Err(DomainError::MissingFields(missing)),
        }
    }

    /// Builds a draft for editing `current`, keeping its values for every
    /// omitted field.
    ///
    /// # Errors
    ///
    /// Returns a parse error for a malformed effective date.
    pub fn merge_onto(self, current: &Binding) -> Result<BindingDraft, DomainError> {
        let effective_date: Date = match self.effective_date {
            Some(value) => parse_effective_date(&value)?,
            None => current.effective_date,
        };

        Ok(BindingDraft {
            key: CompositeKey::new(
                self.branch_id.unwrap_or(current.key.branch_id()),
                self.sub_branch_id.unwrap_or(current.key.sub_branch_id()),
                self.route_id.unwrap_or(current.key.route_id()),
            ),
            effective_date,
            active: self.active.unwrap_or(current.active),
            description: self
                .description
                .map_or_else(|| current.description.clone(), |d| d.trim().to_string()),
        })
    }
}

/// A binding joined with its branch, sub-branch and route master data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingView {
    pub binding_id: i64,
    pub branch_id: i64,
    pub branch_name: String,
    pub branch_desc: Option<String>,
    pub sub_branch_id: i64,
    pub sub_branch_name: String,
    pub sub_branch_desc: Option<String>,
    pub delivery_route_id: i64,
    pub delivery_route_no: String,
    pub delivery_route_description: Option<String>,
    pub description: String,
    pub effective_date: Date,
    pub active: bool,
}

impl BindingView {
    #[must_use]
    pub const fn key(&self) -> CompositeKey {
        CompositeKey::new(self.branch_id, self.sub_branch_id, self.delivery_route_id)
    }
}
