//! Tests for GET /api/presets.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use proofrender_provider::mock::MockAidpProvider;

#[tokio::test]
async fn presets_endpoint_lists_builtin_presets() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockAidpProvider::with_timings(
        Duration::from_millis(5),
        Duration::from_millis(5),
    ));
    let app = common::build_test_app(dir.path(), provider).await;

    let response = common::get(&app, "/api/presets").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = common::json_body(response).await;
    let presets = json["data"].as_array().unwrap();

    let names: Vec<&str> = presets
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["studio", "sunset", "dramatic"]);

    // Each preset carries enough scene data to drive a render.
    for preset in presets {
        assert!(preset["displayName"].as_str().is_some());
        assert!(preset["description"].as_str().is_some());
        assert!(preset["cameraPosition"]["x"].is_number());
        assert!(!preset["lights"].as_array().unwrap().is_empty());
        assert!(preset["samples"].as_u64().unwrap() > 0);
    }
}
