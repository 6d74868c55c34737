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
    clippy::all
)]
#![allow(clippy::multiple_crate_versions)]

use axum::{
    Json, Router,
    extract::{
        Path, Query, State as AxumState,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::Parser;
use routebind_api::{
    ApiError, BindingHistoryRequest, BindingRequest, BindingResponse, BulkBindingsRequest,
    BulkPreviewResponse, ErrorClass, ErrorResponse, binding_history, create_binding,
    create_bulk_bindings, delete_binding, get_binding, preview_csv_bindings, update_binding,
    validate_bulk_bindings,
};
use routebind_domain::today_utc;
use routebind_persistence::{Persistence, PersistenceError};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use time::Date;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Route Binding Server - HTTP server for effective-dated route bindings
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If neither this nor `--mysql-url`
    /// is provided, uses an in-memory database.
    #[arg(short, long, env = "ROUTEBIND_DATABASE", conflicts_with = "mysql_url")]
    database: Option<String>,

    /// `MySQL`/`MariaDB` connection URL.
    #[arg(long, env = "DATABASE_URL")]
    mysql_url: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, env = "ROUTEBIND_PORT", default_value_t = 3000)]
    port: u16,

    /// Address to bind the server to
    #[arg(long, env = "ROUTEBIND_BIND", default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Seconds to wait for a busy binding key before giving up
    #[arg(long, env = "ROUTEBIND_LOCK_TIMEOUT_SECS", default_value_t = 10)]
    lock_timeout_secs: u64,
}

/// Application state shared across handlers.
///
/// Requests are serialized on one connection. Each binding operation runs in
/// its own transaction on that connection.
#[derive(Clone)]
struct AppState {
    persistence: Arc<Mutex<Persistence>>,
}

/// HTTP error wrapper that implements `IntoResponse`.
#[derive(Debug)]
struct HttpError {
    /// The HTTP status code.
    status: StatusCode,
    /// The JSON error body.
    body: ErrorResponse,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        if self.body.retryable {
            return (self.status, [(header::RETRY_AFTER, "1")], Json(self.body)).into_response();
        }
        (self.status, Json(self.body)).into_response()
    }
}

impl From<ApiError> for HttpError {
    fn from(err: ApiError) -> Self {
        let status: StatusCode = match err.class() {
            ErrorClass::BadRequest => StatusCode::BAD_REQUEST,
            ErrorClass::NotFound => StatusCode::NOT_FOUND,
            ErrorClass::Conflict => StatusCode::CONFLICT,
            ErrorClass::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorClass::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(code = err.code(), error = %err, "Request failed");
        }
        Self {
            status,
            body: err.to_response(),
        }
    }
}

fn invalid_request(field: &str, message: String) -> HttpError {
    HttpError::from(ApiError::InvalidInput {
        field: field.to_string(),
        message,
    })
}

impl From<JsonRejection> for HttpError {
    fn from(rejection: JsonRejection) -> Self {
        invalid_request("body", rejection.body_text())
    }
}

impl From<QueryRejection> for HttpError {
    fn from(rejection: QueryRejection) -> Self {
        invalid_request("query", rejection.body_text())
    }
}

impl From<PathRejection> for HttpError {
    fn from(rejection: PathRejection) -> Self {
        invalid_request("path", rejection.body_text())
    }
}

/// Handler for POST `/bindings` endpoint.
///
/// Creates a binding, or updates the row already at its key and date.
async fn handle_create_binding(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<BindingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BindingResponse>), HttpError> {
    let Json(req) = payload?;
    info!(
        branch_id = ?req.branch_id,
        sub_branch_id = ?req.sub_branch_id,
        delivery_route_id = ?req.delivery_route_id,
        force = req.force,
        "Handling create_binding request"
    );

    let today: Date = today_utc();
    let mut persistence = app_state.persistence.lock().await;
    let response: BindingResponse = create_binding(&mut persistence, today, &req)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for PUT `/bindings/{id}` endpoint.
async fn handle_update_binding(
    AxumState(app_state): AxumState<AppState>,
    binding_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<BindingRequest>, JsonRejection>,
) -> Result<Json<BindingResponse>, HttpError> {
    let Path(binding_id) = binding_id?;
    let Json(req) = payload?;
    info!(binding_id, force = req.force, "Handling update_binding request");

    let today: Date = today_utc();
    let mut persistence = app_state.persistence.lock().await;
    let response: BindingResponse = update_binding(&mut persistence, today, binding_id, &req)?;

    Ok(Json(response))
}

/// Handler for GET `/bindings/{id}` endpoint.
async fn handle_get_binding(
    AxumState(app_state): AxumState<AppState>,
    binding_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<BindingResponse>, HttpError> {
    let Path(binding_id) = binding_id?;

    let mut persistence = app_state.persistence.lock().await;
    let response: BindingResponse = get_binding(&mut persistence, binding_id)?;

    Ok(Json(response))
}

/// Handler for DELETE `/bindings/{id}` endpoint.
async fn handle_delete_binding(
    AxumState(app_state): AxumState<AppState>,
    binding_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, HttpError> {
    let Path(binding_id) = binding_id?;
    info!(binding_id, "Handling delete_binding request");

    let mut persistence = app_state.persistence.lock().await;
    delete_binding(&mut persistence, binding_id)?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET `/bindings/history` endpoint.
///
/// Lists every binding for the key in the query string.
async fn handle_binding_history(
    AxumState(app_state): AxumState<AppState>,
    query: Result<Query<BindingHistoryRequest>, QueryRejection>,
) -> Result<Json<Vec<BindingResponse>>, HttpError> {
    let Query(req) = query?;

    let mut persistence = app_state.persistence.lock().await;
    let response: Vec<BindingResponse> = binding_history(&mut persistence, &req)?;

    Ok(Json(response))
}

/// Handler for POST `/bindings/bulk` endpoint.
async fn handle_create_bulk_bindings(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<BulkBindingsRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<BindingResponse>>), HttpError> {
    let Json(req) = payload?;
    info!(
        rows = req.payloads.len(),
        force = req.force,
        "Handling create_bulk_bindings request"
    );

    let today: Date = today_utc();
    let mut persistence = app_state.persistence.lock().await;
    let response: Vec<BindingResponse> = create_bulk_bindings(&mut persistence, today, req)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handler for POST `/bindings/bulk/validate` endpoint.
async fn handle_validate_bulk_bindings(
    AxumState(app_state): AxumState<AppState>,
    payload: Result<Json<BulkBindingsRequest>, JsonRejection>,
) -> Result<Json<BulkPreviewResponse>, HttpError> {
    let Json(req) = payload?;

    let today: Date = today_utc();
    let mut persistence = app_state.persistence.lock().await;
    let response: BulkPreviewResponse = validate_bulk_bindings(&mut persistence, today, req)?;

    Ok(Json(response))
}

/// Handler for POST `/bindings/bulk/csv-preview` endpoint.
///
/// The request body is the raw CSV text.
async fn handle_preview_csv_bindings(
    AxumState(app_state): AxumState<AppState>,
    body: String,
) -> Result<Json<BulkPreviewResponse>, HttpError> {
    info!(bytes = body.len(), "Handling csv preview request");

    let today: Date = today_utc();
    let mut persistence = app_state.persistence.lock().await;
    let response: BulkPreviewResponse = preview_csv_bindings(&mut persistence, today, &body)?;

    Ok(Json(response))
}

/// Builds the application router with all endpoints.
fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/bindings", post(handle_create_binding))
        .route("/bindings/history", get(handle_binding_history))
        .route("/bindings/bulk", post(handle_create_bulk_bindings))
        .route("/bindings/bulk/validate", post(handle_validate_bulk_bindings))
        .route("/bindings/bulk/csv-preview", post(handle_preview_csv_bindings))
        .route(
            "/bindings/{id}",
            get(handle_get_binding)
                .put(handle_update_binding)
                .delete(handle_delete_binding),
        )
        .with_state(app_state)
}

fn open_persistence(args: &Args) -> Result<Persistence, PersistenceError> {
    let mut persistence: Persistence = if let Some(url) = &args.mysql_url {
        info!("Using MySQL/MariaDB database");
        Persistence::new_with_mysql(url)?
    } else if let Some(db_path) = &args.database {
        info!("Using file-based database at: {}", db_path);
        Persistence::new_with_file(db_path)?
    } else {
        info!("Using in-memory database");
        Persistence::new_in_memory()?
    };

    persistence.set_lock_timeout(Duration::from_secs(args.lock_timeout_secs))?;
    Ok(persistence)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Route Binding Server");

    let persistence: Persistence = open_persistence(&args)?;
    info!(
        lock_timeout_secs = args.lock_timeout_secs,
        "Binding lock timeout configured"
    );

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
    };

    // Build router
    let app: Router = build_router(app_state);

    let addr: SocketAddr = SocketAddr::new(args.bind, args.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests;
