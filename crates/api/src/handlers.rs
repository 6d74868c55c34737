// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API handler functions for binding writes, reads and bulk pre-flight.
//!
//! Every handler takes the date it treats as "today" so callers (and tests)
//! control the future-date rule.

use routebind::BulkValidation;
use routebind_domain::{BindingFields, BindingView, CompositeKey, DomainError, RawBulkRow};
use routebind_persistence::Persistence;
use time::Date;
use tracing::{debug, info};

use crate::ApiResult;
use crate::csv_preview::{build_preview, parse_binding_csv};
use crate::error::{translate_domain_error, translate_persistence_error};
use crate::request_response::{
    BindingHistoryRequest, BindingRequest, BindingResponse, BulkBindingsRequest,
    BulkPreviewResponse,
};

fn to_responses(views: &[BindingView]) -> Vec<BindingResponse> {
    views.iter().map(BindingResponse::from).collect()
}

/// Creates a binding, or updates the row already at its key and date.
///
/// # Errors
///
/// Returns an error if:
/// - A required field is missing or malformed
/// - The effective date is not after `today`
/// - A branch, sub-branch or route reference is invalid
/// - Another active binding exists and `force` is not set
/// - The key is locked by another writer past the lock timeout
pub fn create_binding(
    persistence: &mut Persistence,
    today: Date,
    request: &BindingRequest,
) -> ApiResult<BindingResponse> {
    let fields: BindingFields = request.to_fields().map_err(translate_domain_error)?;
    let view: BindingView = persistence
        .create_binding(today, fields, request.force)
        .map_err(translate_persistence_error)?;

    info!(binding_id = view.binding_id, "Created binding");
    Ok(BindingResponse::from(&view))
}

/// Edits an existing binding. Omitted fields keep their current values.
///
/// # Errors
///
/// Returns `ResourceNotFound` if the binding does not exist, plus every
/// error [`create_binding`] can return.
pub fn update_binding(
    persistence: &mut Persistence,
    today: Date,
    binding_id: i64,
    request: &BindingRequest,
) -> ApiResult<BindingResponse> {
    let fields: BindingFields = request.to_fields().map_err(translate_domain_error)?;
    let view: BindingView = persistence
        .update_binding(today, binding_id, fields, request.force)
        .map_err(translate_persistence_error)?;

    info!(
        requested_id = binding_id,
        binding_id = view.binding_id,
        "Updated binding"
    );
    Ok(BindingResponse::from(&view))
}

/// # Errors
///
/// Returns `ResourceNotFound` if the binding does not exist.
pub fn get_binding(persistence: &mut Persistence, binding_id: i64) -> ApiResult<BindingResponse> {
    let view: BindingView = persistence
        .get_binding(binding_id)
        .map_err(translate_persistence_error)?;
    Ok(BindingResponse::from(&view))
}

/// # Errors
///
/// Returns `ResourceNotFound` if the binding does not exist, or
/// `LockTimeout` if its key is busy.
pub fn delete_binding(persistence: &mut Persistence, binding_id: i64) -> ApiResult<()> {
    persistence
        .delete_binding(binding_id)
        .map_err(translate_persistence_error)?;

    info!(binding_id, "Deleted binding");
    Ok(())
}

/// Lists every binding for one key, oldest effective date first.
///
/// # Errors
///
/// Returns `InvalidInput` for a non-positive identifier.
pub fn binding_history(
    persistence: &mut Persistence,
    request: &BindingHistoryRequest,
) -> ApiResult<Vec<BindingResponse>> {
    for (field, value) in [
        ("branchId", request.branch_id),
        ("subBranchId", request.sub_branch_id),
        ("deliveryRouteId", request.delivery_route_id),
    ] {
        if value <= 0 {
            return Err(translate_domain_error(DomainError::InvalidIdentifier {
                field,
                value: value.to_string(),
            }));
        }
    }

    let key: CompositeKey = CompositeKey::new(
        request.branch_id,
        request.sub_branch_id,
        request.delivery_route_id,
    );
    let views: Vec<BindingView> = persistence
        .binding_history(&key)
        .map_err(translate_persistence_error)?;

    debug!(%key, count = views.len(), "Listed binding history");
    Ok(to_responses(&views))
}

/// Writes a whole batch atomically.
///
/// # Errors
///
/// Returns `InvalidBulkRows` listing every bad row, `ConfirmOverwriteBulk`
/// listing every displaced active binding when `force` is not set, or
/// `LockTimeout`. Nothing is written on any error.
pub fn create_bulk_bindings(
    persistence: &mut Persistence,
    today: Date,
    request: BulkBindingsRequest,
) -> ApiResult<Vec<BindingResponse>> {
    let submitted: usize = request.payloads.len();
    let views: Vec<BindingView> = persistence
        .create_bulk_bindings(today, request.payloads, request.force)
        .map_err(translate_persistence_error)?;

    info!(submitted, written = views.len(), "Created bulk bindings");
    Ok(to_responses(&views))
}

fn preview_rows(
    persistence: &mut Persistence,
    today: Date,
    rows: Vec<RawBulkRow>,
) -> ApiResult<BulkPreviewResponse> {
    let total_rows: usize = rows.len();
    let validation: BulkValidation = persistence
        .validate_bulk_bindings(today, rows)
        .map_err(translate_persistence_error)?;

    let preview: BulkPreviewResponse = build_preview(total_rows, &validation);
    debug!(
        total_rows,
        valid = preview.valid_count,
        invalid = preview.invalid_count,
        superseded = preview.superseded_count,
        "Built bulk preview"
    );
    Ok(preview)
}

/// Reports, row by row, what a bulk create would do. Nothing is written.
///
/// # Errors
///
/// Returns `InvalidInput` for an empty batch, or a database error.
pub fn validate_bulk_bindings(
    persistence: &mut Persistence,
    today: Date,
    request: BulkBindingsRequest,
) -> ApiResult<BulkPreviewResponse> {
    preview_rows(persistence, today, request.payloads)
}

/// Parses CSV text and reports, row by row, what a bulk create would do.
///
/// # Errors
///
/// Returns `InvalidCsvFormat` if the CSV cannot be read, or a database
/// error.
pub fn preview_csv_bindings(
    persistence: &mut Persistence,
    today: Date,
    csv_content: &str,
) -> ApiResult<BulkPreviewResponse> {
    let rows: Vec<RawBulkRow> = parse_binding_csv(csv_content)?;
    preview_rows(persistence, today, rows)
}
