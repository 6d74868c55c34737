// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode as HttpStatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

/// Reference ids seeded into the test database.
struct Seed {
    branch_id: i64,
    sub_branch_id: i64,
    route_id: i64,
    foreign_route_id: i64,
}

/// Helper to create test app state with seeded in-memory persistence.
fn create_test_app_state() -> (AppState, Seed) {
    let mut persistence: Persistence =
        Persistence::new_in_memory().expect("Failed to create in-memory persistence");
    let branch_id: i64 = persistence.create_branch("West", Some("West depot")).unwrap();
    let other_branch_id: i64 = persistence.create_branch("Harbour", None).unwrap();
    let sub_branch_id: i64 = persistence
        .create_sub_branch(branch_id, "West-1", None)
        .unwrap();
    let route_id: i64 = persistence
        .create_delivery_route(branch_id, "W-12", Some("Hill run"))
        .unwrap();
    let foreign_route_id: i64 = persistence
        .create_delivery_route(other_branch_id, "H-1", None)
        .unwrap();

    let app_state: AppState = AppState {
        persistence: Arc::new(Mutex::new(persistence)),
    };
    (
        app_state,
        Seed {
            branch_id,
            sub_branch_id,
            route_id,
            foreign_route_id,
        },
    )
}

fn binding_body(seed: &Seed, effective_date: &str, force: bool) -> Value {
    json!({
        "branchId": seed.branch_id,
        "subBranchId": seed.sub_branch_id,
        "deliveryRouteId": seed.route_id,
        "effectiveDate": effective_date,
        "requiredReportsFlag": 1,
        "correctDescriptionForReports": "Hill run mornings",
        "force": force
    })
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (HttpStatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status: HttpStatusCode = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_create_binding_returns_created_view() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);

    let (status, body) = send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-01-01", false)),
    )
    .await;

    assert_eq!(status, HttpStatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() > 0);
    assert_eq!(body["branchName"], "West");
    assert_eq!(body["branchDesc"], "West depot");
    assert_eq!(body["subBranchName"], "West-1");
    assert_eq!(body["deliveryRouteNo"], "W-12");
    assert_eq!(body["deliveryRouteDescription"], "Hill run");
    assert_eq!(body["effectiveDate"], "2099-01-01");
    assert_eq!(body["requiredReportsFlag"], 1);
}

#[tokio::test]
async fn test_unconfirmed_overwrite_returns_conflict() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);
    let (_, first) = send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-01-01", false)),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-03-01", false)),
    )
    .await;

    assert_eq!(status, HttpStatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFIRM_OVERWRITE");
    assert_eq!(body["conflict"]["id"], first["id"]);
    assert_eq!(body["conflict"]["existingEffectiveDate"], "2099-01-01");

    let (status, body) = send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-03-01", true)),
    )
    .await;
    assert_eq!(status, HttpStatusCode::CREATED);
    assert_eq!(body["requiredReportsFlag"], 1);
}

#[tokio::test]
async fn test_validation_errors_return_bad_request() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);
    let mut body: Value = binding_body(&seed, "2099-01-01", false);
    body["deliveryRouteId"] = json!(seed.foreign_route_id);

    let (status, response) = send(&app, json_request("POST", "/bindings", &body)).await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "REFERENCE_ERROR");

    let (status, response) = send(
        &app,
        json_request("POST", "/bindings", &json!({ "branchId": seed.branch_id })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "VALIDATION_ERROR");
    assert!(response["message"].as_str().unwrap().contains("effectiveDate"));
}

#[tokio::test]
async fn test_malformed_json_returns_error_body() {
    let (app_state, _) = create_test_app_state();
    let app: Router = build_router(app_state);

    let request: Request<Body> = Request::builder()
        .method("POST")
        .uri("/bindings")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_update_and_delete_binding() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);
    let (_, created) = send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-01-01", false)),
    )
    .await;
    let uri: String = format!("/bindings/{}", created["id"]);

    let (status, fetched) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &uri,
            &json!({ "correctDescriptionForReports": "Hill run evenings" }),
        ),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(updated["correctDescriptionForReports"], "Hill run evenings");
    assert_eq!(updated["effectiveDate"], "2099-01-01");

    let (status, _) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, HttpStatusCode::NO_CONTENT);

    let (status, body) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(status, HttpStatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_non_numeric_id_returns_bad_request() {
    let (app_state, _) = create_test_app_state();
    let app: Router = build_router(app_state);

    let (status, body) = send(&app, empty_request("GET", "/bindings/abc")).await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_history_lists_key_in_date_order() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);
    send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-06-01", false)),
    )
    .await;
    send(
        &app,
        json_request("POST", "/bindings", &binding_body(&seed, "2099-02-01", true)),
    )
    .await;

    let uri: String = format!(
        "/bindings/history?branchId={}&subBranchId={}&deliveryRouteId={}",
        seed.branch_id, seed.sub_branch_id, seed.route_id
    );
    let (status, body) = send(&app, empty_request("GET", &uri)).await;

    assert_eq!(status, HttpStatusCode::OK);
    let rows: &Vec<Value> = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["effectiveDate"], "2099-02-01");
    assert_eq!(rows[0]["requiredReportsFlag"], 1);
    assert_eq!(rows[1]["effectiveDate"], "2099-06-01");
    assert_eq!(rows[1]["requiredReportsFlag"], 0);

    let (status, body) = send(&app, empty_request("GET", "/bindings/history?branchId=1")).await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_bulk_create_and_rejections() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);
    let good: Value = binding_body(&seed, "2099-01-01", false);
    let mut past: Value = binding_body(&seed, "2020-01-01", false);
    past["deliveryRouteId"] = json!(seed.route_id.to_string());

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/bindings/bulk",
            &json!({ "payloads": [good.clone(), past] }),
        ),
    )
    .await;
    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BULK_ROWS");
    assert_eq!(body["conflicts"][0]["position"], 1);
    assert_eq!(body["conflicts"][0]["effectiveDate"], "2020-01-01");
    assert!(!body["conflicts"][0]["reasons"].as_array().unwrap().is_empty());

    let (status, body) = send(
        &app,
        json_request("POST", "/bindings/bulk", &json!({ "payloads": [good.clone(), good] })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let moved: Value = binding_body(&seed, "2099-08-01", false);
    let (status, body) = send(
        &app,
        json_request("POST", "/bindings/bulk", &json!({ "payloads": [moved] })),
    )
    .await;
    assert_eq!(status, HttpStatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFIRM_OVERWRITE_BULK");
    assert_eq!(body["conflicts"][0]["existingEffectiveDate"], "2099-01-01");
    assert_eq!(body["conflicts"][0]["newEffectiveDate"], "2099-08-01");
}

#[tokio::test]
async fn test_bulk_validate_and_csv_preview_write_nothing() {
    let (app_state, seed) = create_test_app_state();
    let app: Router = build_router(app_state);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/bindings/bulk/validate",
            &json!({ "payloads": [binding_body(&seed, "2099-01-01", false)] }),
        ),
    )
    .await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["validCount"], 1);
    assert_eq!(body["rows"][0]["status"], "valid");

    let csv: String = format!(
        "branch_id,sub_branch_id,delivery_route_id,effective_date,correct_description_for_reports\n\
         {},{},{},2099-01-01,Hill run\n",
        seed.branch_id, seed.sub_branch_id, seed.foreign_route_id
    );
    let request: Request<Body> = Request::builder()
        .method("POST")
        .uri("/bindings/bulk/csv-preview")
        .header("content-type", "text/csv")
        .body(Body::from(csv))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, HttpStatusCode::OK);
    assert_eq!(body["invalidCount"], 1);
    assert_eq!(body["rows"][0]["status"], "invalid");

    let uri: String = format!(
        "/bindings/history?branchId={}&subBranchId={}&deliveryRouteId={}",
        seed.branch_id, seed.sub_branch_id, seed.route_id
    );
    let (_, history) = send(&app, empty_request("GET", &uri)).await;
    assert!(history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_csv_returns_bad_request() {
    let (app_state, _) = create_test_app_state();
    let app: Router = build_router(app_state);

    let request: Request<Body> = Request::builder()
        .method("POST")
        .uri("/bindings/bulk/csv-preview")
        .body(Body::from("branch_id\n1\n"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, HttpStatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_CSV");
}

#[test]
fn test_lock_timeout_maps_to_retryable_unavailable() {
    let err: HttpError = HttpError::from(ApiError::LockTimeout {
        message: String::from("Timed out after 50ms waiting for lock 'rb:1:2:3'"),
    });
    assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(err.body.retryable);

    let response: Response = err.into_response();
    assert_eq!(
        response.headers().get(header::RETRY_AFTER).unwrap(),
        "1"
    );
}

#[test]
fn test_error_classes_map_to_statuses() {
    let cases: [(ApiError, StatusCode); 3] = [
        (
            ApiError::ResourceNotFound {
                message: String::from("Binding 1 not found"),
            },
            StatusCode::NOT_FOUND,
        ),
        (
            ApiError::Integrity {
                message: String::from("UNIQUE constraint failed"),
            },
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (
            ApiError::InvalidDate {
                message: String::from("effectiveDate must be a future date"),
            },
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (err, expected) in cases {
        let code: &str = err.code();
        let http: HttpError = HttpError::from(err);
        assert_eq!(http.status, expected);
        assert_eq!(http.body.code, code);
    }
}
