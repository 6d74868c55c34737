// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! CSV parsing and pre-flight reports for bulk binding uploads.
//!
//! Nothing here writes. CSV rows become the same loosely typed rows the
//! JSON bulk endpoint accepts, so both paths share one validator.

use csv::StringRecord;
use routebind::BulkValidation;
use routebind_domain::{RawBulkRow, RawValue};
use std::collections::{HashMap, HashSet};

use crate::ApiResult;
use crate::error::ApiError;
use crate::request_response::{BulkPreviewResponse, BulkRowPreview, BulkRowStatus};

/// Required CSV column headers (normalized).
const REQUIRED_HEADERS: &[&str] = &[
    "branchid",
    "subbranchid",
    "deliveryrouteid",
    "effectivedate",
    "correctdescriptionforreports",
];

/// Optional CSV column headers (normalized). A missing flag defaults to 1.
const OPTIONAL_HEADERS: &[&str] = &["requiredreportsflag"];

/// Normalizes a CSV header so `branch_id`, `Branch ID` and `branchId` match.
fn normalize_header(header: &str) -> String {
    header
        .trim()
        .chars()
        .filter(|c| !matches!(c, '_' | ' ' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Validates that all required headers are present in the CSV.
fn validate_headers(headers: &StringRecord) -> ApiResult<HashMap<String, usize>> {
    let mut header_map: HashMap<String, usize> = HashMap::new();
    for (idx, header) in headers.iter().enumerate() {
        let normalized: String = normalize_header(header);
        if header_map.insert(normalized, idx).is_some() {
            return Err(ApiError::InvalidCsvFormat {
                reason: format!("Duplicate header '{}'", header.trim()),
            });
        }
    }

    let missing: Vec<&str> = REQUIRED_HEADERS
        .iter()
        .filter(|required| !header_map.contains_key(**required))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: format!("Missing required headers: {}", missing.join(", ")),
        });
    }

    let known: HashSet<&str> = REQUIRED_HEADERS
        .iter()
        .chain(OPTIONAL_HEADERS)
        .copied()
        .collect();
    header_map.retain(|name, _| known.contains(name.as_str()));

    Ok(header_map)
}

fn parse_csv_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> RawBulkRow {
    let get_field = |name: &str| -> Option<String> {
        header_map
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    RawBulkRow {
        branch_id: get_field("branchid").map(RawValue::Text),
        sub_branch_id: get_field("subbranchid").map(RawValue::Text),
        delivery_route_id: get_field("deliveryrouteid").map(RawValue::Text),
        effective_date: get_field("effectivedate"),
        required_reports_flag: get_field("requiredreportsflag").map(RawValue::Text),
        correct_description_for_reports: get_field("correctdescriptionforreports"),
    }
}

/// Parses CSV text into bulk rows.
///
/// Short rows are accepted; their missing cells are reported by
/// validation like any other absent field.
///
/// # Errors
///
/// Returns `InvalidCsvFormat` if the headers are missing or duplicated, a
/// record cannot be read, or there are no data rows.
pub fn parse_binding_csv(csv_content: &str) -> ApiResult<Vec<RawBulkRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_content.as_bytes());

    let headers: StringRecord = reader
        .headers()
        .map_err(|e| ApiError::InvalidCsvFormat {
            reason: format!("Failed to read CSV headers: {e}"),
        })?
        .clone();
    let header_map: HashMap<String, usize> = validate_headers(&headers)?;

    let mut rows: Vec<RawBulkRow> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let record: StringRecord = result.map_err(|e| ApiError::InvalidCsvFormat {
            reason: format!("Failed to read row {}: {e}", idx + 1),
        })?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(parse_csv_row(&record, &header_map));
    }

    if rows.is_empty() {
        return Err(ApiError::InvalidCsvFormat {
            reason: String::from("CSV contains no data rows"),
        });
    }

    Ok(rows)
}

/// Builds a per-row report from a batch validation.
///
/// Rows that appear in neither list were replaced by a later row with the
/// same key and date.
#[must_use]
pub fn build_preview(total_rows: usize, validation: &BulkValidation) -> BulkPreviewResponse {
    let mut rows: Vec<BulkRowPreview> = (0..total_rows)
        .map(|position| BulkRowPreview {
            position,
            status: BulkRowStatus::Superseded,
            reasons: Vec::new(),
        })
        .collect();

    for candidate in &validation.valid {
        if let Some(row) = rows.get_mut(candidate.position) {
            row.status = BulkRowStatus::Valid;
        }
    }
    for invalid in &validation.invalid {
        if let Some(row) = rows.get_mut(invalid.position) {
            row.status = BulkRowStatus::Invalid;
            row.reasons.clone_from(&invalid.reasons);
        }
    }

    let count = |status: BulkRowStatus| rows.iter().filter(|r| r.status == status).count();
    let valid_count: usize = count(BulkRowStatus::Valid);
    let invalid_count: usize = count(BulkRowStatus::Invalid);
    let superseded_count: usize = count(BulkRowStatus::Superseded);

    BulkPreviewResponse {
        total_rows,
        valid_count,
        invalid_count,
        superseded_count,
        rows,
    }
}
