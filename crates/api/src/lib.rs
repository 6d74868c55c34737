// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

//! API boundary for route bindings.
//!
//! Converts wire DTOs into engine inputs, runs them against a
//! [`routebind_persistence::Persistence`] adapter and translates every
//! outcome into a response DTO or an [`ApiError`] with a stable code.

mod csv_preview;
mod error;
mod handlers;
mod request_response;

#[cfg(test)]
mod tests;

pub use csv_preview::{build_preview, parse_binding_csv};
pub use error::{
    ApiError, ErrorClass, translate_core_error, translate_domain_error, translate_persistence_error,
};
pub use handlers::{
    binding_history, create_binding, create_bulk_bindings, delete_binding, get_binding,
    preview_csv_bindings, update_binding, validate_bulk_bindings,
};
pub use request_response::{
    BindingHistoryRequest, BindingRequest, BindingResponse, BulkBindingsRequest,
    BulkConflictDetail, BulkPreviewResponse, BulkRowPreview, BulkRowStatus, ConflictDetail,
    ErrorConflicts, ErrorResponse, InvalidRowDetail,
};

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
