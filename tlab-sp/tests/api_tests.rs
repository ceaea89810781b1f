//! Integration tests for tlab-sp API endpoints
//!
//! Tests cover:
//! - Health endpoint (no token required)
//! - Token gate
//! - Prediction upload: format check, storage, one upload per token
//! - Evaluation of a stored upload

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::Value;
use tlab_common::config::StudentProjectConfig;
use tlab_common::db::init_in_memory;
use tlab_sp::scoring::LabelTable;
use tlab_sp::{build_router, AppState};
use tower::util::ServiceExt; // for `oneshot` method

const ANSWER_KEY: &str = "trip_id,label\nT1,Chute\nT2,Pas de chute\nT3,Manipulation\nT4,Chute\n";

fn project_config() -> StudentProjectConfig {
    StudentProjectConfig {
        tokens: vec!["team-a".to_string(), "team-b".to_string(), "result".to_string()],
        ..Default::default()
    }
}

/// Test helper: state over a fresh in-memory database, answer key loaded
async fn setup_state() -> AppState {
    let pool = init_in_memory().await.expect("Should create database");
    let state = AppState::with_sqlite(pool, &project_config());
    state
        .workbook
        .import_answer_key(&LabelTable::from_csv(ANSWER_KEY).unwrap())
        .await
        .expect("Should import answer key");
    state
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn upload(token: &str, csv: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/predictions")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(csv.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

// =============================================================================
// Health and token gate
// =============================================================================

#[tokio::test]
async fn test_health_endpoint_no_token_required() {
    let app = build_router(setup_state().await);

    let response = app.oneshot(get("/health", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "tlab-sp");
}

#[tokio::test]
async fn test_missing_or_unknown_token_refused() {
    let app = build_router(setup_state().await);

    for token in [None, Some("team-z"), Some("")] {
        let response = app
            .clone()
            .oneshot(get("/api/predictions", token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["error"], "Token is invalid");
    }
}

#[tokio::test]
async fn test_token_naming_answer_key_is_dropped() {
    let state = setup_state().await;
    assert!(!state.tokens.contains("result"));

    let app = build_router(state);
    let response = app.oneshot(upload("result", ANSWER_KEY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Upload and evaluation
// =============================================================================

#[tokio::test]
async fn test_no_upload_yet_is_404() {
    let app = build_router(setup_state().await);

    let response = app
        .oneshot(get("/api/predictions", Some("team-a")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_scored_and_stored() {
    let app = build_router(setup_state().await);
    let predictions = "trip_id,label\nT1,Chute\nT2,Chute\nT3,Manipulation\nT4,Chute\n";

    let response = app
        .clone()
        .oneshot(upload("team-a", predictions))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["score"], 75.0);
    assert_eq!(body["predictions"].as_array().unwrap().len(), 4);
    assert_eq!(
        body["confusion_matrix"]["rows"],
        serde_json::json!(["Chute", "Manipulation"])
    );
    assert_eq!(
        body["confusion_matrix"]["columns"],
        serde_json::json!(["Chute", "Manipulation", "Pas de chute"])
    );
    assert_eq!(
        body["confusion_matrix"]["counts"],
        serde_json::json!([[2, 0, 1], [0, 1, 0]])
    );

    // The stored upload evaluates the same way
    let response = app
        .clone()
        .oneshot(get("/api/predictions", Some("team-a")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let stored = extract_json(response.into_body()).await;
    assert_eq!(stored, body);

    // Other participants are unaffected
    let response = app
        .oneshot(get("/api/predictions", Some("team-b")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_second_upload_refused() {
    let app = build_router(setup_state().await);

    let response = app
        .clone()
        .oneshot(upload("team-a", ANSWER_KEY))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(upload("team-a", ANSWER_KEY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = extract_json(response.into_body()).await;
    assert_eq!(
        body["error"]["message"],
        "You have already submitted your predictions."
    );
}

#[tokio::test]
async fn test_wrong_columns_rejected_without_storing() {
    let state = setup_state().await;
    let app = build_router(state.clone());

    let response = app
        .oneshot(upload("team-a", "trip_id,score\nT1,1\nT2,0\nT3,0\nT4,1\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "csv_format_mismatch");
    assert_eq!(body["error"]["reason"], "wrong_columns");

    assert!(!state.workbook.has_predictions("team-a").await.unwrap());
}

#[tokio::test]
async fn test_missing_trips_rejected() {
    let app = build_router(setup_state().await);

    let response = app
        .oneshot(upload(
            "team-a",
            "trip_id,label\nT1,Chute\nT2,Chute\nT3,Chute\nT9,Chute\n",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["reason"], "missing_trips");
    assert_eq!(
        body["error"]["message"],
        "Missing trips: {T4}. Please upload a CSV file with all trips."
    );
}

#[tokio::test]
async fn test_unparseable_csv_is_400() {
    let app = build_router(setup_state().await);

    let response = app
        .oneshot(upload("team-a", "trip_id,label\nT1,Chute,extra\n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "invalid_csv");
}

#[tokio::test]
async fn test_upload_without_answer_key_is_503() {
    let pool = init_in_memory().await.unwrap();
    let app = build_router(AppState::with_sqlite(pool, &project_config()));

    let response = app.oneshot(upload("team-a", ANSWER_KEY)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "answer_key_missing");
}

#[tokio::test]
async fn test_answer_key_imported_once() {
    let state = setup_state().await;
    let err = state
        .workbook
        .import_answer_key(&LabelTable::from_csv(ANSWER_KEY).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, tlab_sp::error::ApiError::AnswerKeyExists(_)));
}

#[tokio::test]
async fn test_answer_key_needs_expected_columns() {
    let pool = init_in_memory().await.unwrap();
    let state = AppState::with_sqlite(pool, &project_config());
    let err = state
        .workbook
        .import_answer_key(&LabelTable::from_csv("trip,label\nT1,Chute\n").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, tlab_sp::error::ApiError::MalformedAnswerKey(_)));
}
