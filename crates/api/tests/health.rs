//! Tests for the root-level health check endpoint.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use proofrender_provider::mock::MockAidpProvider;

#[tokio::test]
async fn health_reports_ok_with_writable_storage() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockAidpProvider::with_timings(
        Duration::from_millis(5),
        Duration::from_millis(5),
    ));
    let app = common::build_test_app(dir.path(), provider).await;

    let response = common::get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = common::json_body(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage_healthy"], true);
    assert_eq!(json["provider"], "aidp");
    assert!(json["version"].as_str().is_some());
}

#[tokio::test]
async fn health_responses_carry_a_request_id() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockAidpProvider::with_timings(
        Duration::from_millis(5),
        Duration::from_millis(5),
    ));
    let app = common::build_test_app(dir.path(), provider).await;

    let response = common::get(&app, "/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
