// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Field names follow the wire contract (`camelCase`). Dates travel as
//! `YYYY-MM-DD` strings and the reports flag travels as `0` or `1`.

use routebind::{BulkConflict, ConflictInfo};
use routebind_domain::{
    BindingFields, BindingView, DomainError, InvalidBulkRow, RawBulkRow, RawValue,
    coerce_reports_flag, format_effective_date,
};
use serde::{Deserialize, Serialize};

/// API request to create or edit a single binding.
///
/// Every field is optional on the wire. Create reports the missing ones;
/// update keeps the edited row's value for each omitted field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingRequest {
    /// The branch identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<i64>,
    /// The sub-branch identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_branch_id: Option<i64>,
    /// The delivery route identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_route_id: Option<i64>,
    /// The effective date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    /// `0` or `1`. Defaults to `1` on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_reports_flag: Option<RawValue>,
    /// The description used on reports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_description_for_reports: Option<String>,
    /// Confirms displacing the currently active binding.
    #[serde(default)]
    pub force: bool,
}

impl BindingRequest {
    /// Converts the wire fields into engine fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidReportsFlag` if the flag is not 0/1 or a boolean.
    pub fn to_fields(&self) -> Result<BindingFields, DomainError> {
        let active: Option<bool> = self
            .required_reports_flag
            .as_ref()
            .map(coerce_reports_flag)
            .transpose()?;

        Ok(BindingFields {
            branch_id: self.branch_id,
            sub_branch_id: self.sub_branch_id,
            route_id: self.delivery_route_id,
            effective_date: self.effective_date.clone(),
            active,
            description: self.correct_description_for_reports.clone(),
        })
    }
}

/// A binding enriched with its branch, sub-branch and route details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingResponse {
    /// The binding identifier.
    pub id: i64,
    pub branch_id: i64,
    pub branch_name: String,
    pub branch_desc: Option<String>,
    pub sub_branch_id: i64,
    pub sub_branch_name: String,
    pub sub_branch_desc: Option<String>,
    pub delivery_route_id: i64,
    /// The route number copied onto the binding at write time.
    pub delivery_route_no: String,
    pub delivery_route_description: Option<String>,
    pub correct_description_for_reports: String,
    /// The effective date (`YYYY-MM-DD`).
    pub effective_date: String,
    /// `1` when this binding is the active one for its key.
    pub required_reports_flag: u8,
}

impl From<&BindingView> for BindingResponse {
    fn from(view: &BindingView) -> Self {
        Self {
            id: view.binding_id,
            branch_id: view.branch_id,
            branch_name: view.branch_name.clone(),
            branch_desc: view.branch_desc.clone(),
            sub_branch_id: view.sub_branch_id,
            sub_branch_name: view.sub_branch_name.clone(),
            sub_branch_desc: view.sub_branch_desc.clone(),
            delivery_route_id: view.delivery_route_id,
            delivery_route_no: view.delivery_route_no.clone(),
            delivery_route_description: view.delivery_route_description.clone(),
            correct_description_for_reports: view.description.clone(),
            effective_date: format_effective_date(view.effective_date),
            required_reports_flag: u8::from(view.active),
        }
    }
}

/// API request naming one composite key, used to list its history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingHistoryRequest {
    pub branch_id: i64,
    pub sub_branch_id: i64,
    pub delivery_route_id: i64,
}

/// API request to write or validate a batch of bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkBindingsRequest {
    /// The rows, exactly as exported by the client.
    #[serde(default)]
    pub payloads: Vec<RawBulkRow>,
    /// Confirms displacing every active binding the batch collides with.
    /// Ignored by validation.
    #[serde(default)]
    pub force: bool,
}

/// The active binding a single-row write would displace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictDetail {
    /// The active binding's identifier.
    pub id: i64,
    pub existing_effective_date: String,
}

impl From<ConflictInfo> for ConflictDetail {
    fn from(info: ConflictInfo) -> Self {
        Self {
            id: info.binding_id,
            existing_effective_date: format_effective_date(info.existing_effective_date),
        }
    }
}

/// One rejected bulk row: the row as submitted plus every reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidRowDetail {
    #[serde(flatten)]
    pub row: RawBulkRow,
    /// Zero-based position in the submitted batch.
    pub position: usize,
    pub reasons: Vec<String>,
}

impl From<InvalidBulkRow> for InvalidRowDetail {
    fn from(row: InvalidBulkRow) -> Self {
        Self {
            row: row.raw,
            position: row.position,
            reasons: row.reasons,
        }
    }
}

/// One active binding a batch would displace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkConflictDetail {
    pub branch_id: i64,
    pub sub_branch_id: i64,
    pub delivery_route_id: i64,
    pub existing_effective_date: String,
    pub new_effective_date: String,
    pub existing_id: i64,
}

impl From<BulkConflict> for BulkConflictDetail {
    fn from(conflict: BulkConflict) -> Self {
        Self {
            branch_id: conflict.key.branch_id(),
            sub_branch_id: conflict.key.sub_branch_id(),
            delivery_route_id: conflict.key.route_id(),
            existing_effective_date: format_effective_date(conflict.existing_effective_date),
            new_effective_date: format_effective_date(conflict.new_effective_date),
            existing_id: conflict.existing_id,
        }
    }
}

/// Structured payload attached to a bulk error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ErrorConflicts {
    InvalidRows(Vec<InvalidRowDetail>),
    Overwrites(Vec<BulkConflictDetail>),
}

/// The JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Whether resending the same request may succeed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<ConflictDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicts: Option<ErrorConflicts>,
}

/// Outcome of one submitted row in a pre-flight report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkRowStatus {
    /// The row would be written.
    Valid,
    /// The row has at least one problem.
    Invalid,
    /// A later row with the same key and date replaces this one.
    Superseded,
}

/// One row of a pre-flight report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRowPreview {
    /// Zero-based position in the submitted batch.
    pub position: usize,
    pub status: BulkRowStatus,
    pub reasons: Vec<String>,
}

/// Pre-flight report for a batch. Nothing is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkPreviewResponse {
    pub total_rows: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    pub superseded_count: usize,
    /// One entry per submitted row, in submission order.
    pub rows: Vec<BulkRowPreview>,
}
