//! Tests for the render workflow: dispatch, status polling, and downloads.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;

use proofrender_core::hashing;
use proofrender_provider::mock::MockAidpProvider;

fn fast_mock() -> Arc<MockAidpProvider> {
    Arc::new(MockAidpProvider::with_timings(
        Duration::from_millis(5),
        Duration::from_millis(20),
    ))
}

#[tokio::test]
async fn render_for_unknown_job_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": uuid::Uuid::new_v4(), "preset": "studio"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn render_with_unknown_preset_returns_400() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;
    let job_id = common::upload_job(&app).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "midnight"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    // The message lists the valid preset names.
    assert!(body["error"].as_str().unwrap().contains("studio"));
}

#[tokio::test]
async fn render_dispatch_moves_job_to_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;
    let job_id = common::upload_job(&app).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "studio"}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::json_body(response).await;
    let data = &body["data"];
    assert_eq!(data["jobId"], job_id);
    assert_eq!(data["status"], "rendering");
    assert_eq!(data["preset"], "studio");
    assert_eq!(data["provider"], "aidp");
    assert!(data["providerJobId"].as_str().unwrap().starts_with("aidp_"));
}

#[tokio::test]
async fn second_render_submission_conflicts() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;
    let job_id = common::upload_job(&app).await;

    let first = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "studio"}),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "sunset"}),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = common::json_body(second).await;
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn concurrent_submissions_dispatch_exactly_one_render() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;
    let job_id = common::upload_job(&app).await;

    let body = json!({"jobId": job_id, "preset": "studio"});
    let (a, b) = tokio::join!(
        common::post_json(&app, "/api/render", body.clone()),
        common::post_json(&app, "/api/render", body),
    );

    // One submission claims the job, the other conflicts; the guarded
    // transition decides the winner regardless of interleaving.
    let mut statuses = [a.status(), b.status()];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    let status = common::get(&app, &format!("/api/status/{job_id}")).await;
    let json = common::json_body(status).await;
    let observed = json["data"]["status"].as_str().unwrap();
    assert!(observed == "rendering" || observed == "complete");
}

#[tokio::test]
async fn status_for_unknown_job_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;

    let response = common::get(&app, &format!("/api/status/{}", uuid::Uuid::new_v4())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn full_workflow_produces_matching_render_and_proof() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;
    let job_id = common::upload_job(&app).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "studio"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let status = common::poll_until_terminal(&app, &job_id).await;
    assert_eq!(status["data"]["status"], "complete");
    assert_eq!(status["data"]["progressPercent"], 100);

    // Download the render and check the digest header against the bytes.
    let render = common::get(&app, &format!("/api/download/{job_id}?file=render")).await;
    assert_eq!(render.status(), StatusCode::OK);
    assert_eq!(
        render.headers().get("content-type").unwrap(),
        "image/png"
    );
    let digest_header = render
        .headers()
        .get("x-proof-sha256")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let png = common::body_bytes(render).await;
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(digest_header, hashing::sha256_hex(&png));

    // The proof document commits to the same output bytes.
    let proof = common::get(&app, &format!("/api/download/{job_id}?file=proof")).await;
    assert_eq!(proof.status(), StatusCode::OK);
    assert_eq!(
        proof.headers().get("content-type").unwrap(),
        "application/json"
    );
    let proof: serde_json::Value =
        serde_json::from_slice(&common::body_bytes(proof).await).unwrap();
    assert_eq!(proof["outputHash"], digest_header);
    assert_eq!(
        proof["assetHash"],
        hashing::sha256_hex(common::MINIMAL_GLTF.as_bytes())
    );
    assert_eq!(proof["metadata"]["presetName"], "studio");
    assert_eq!(proof["metadata"]["resolution"], "1024x1024");
    assert!(proof["providerJobId"].as_str().unwrap().starts_with("aidp_"));
}

#[tokio::test]
async fn download_before_completion_returns_not_ready() {
    let dir = tempfile::tempdir().unwrap();
    // Slow enough that the job is still in flight when we download.
    let provider = Arc::new(MockAidpProvider::with_timings(
        Duration::from_secs(30),
        Duration::from_secs(30),
    ));
    let app = common::build_test_app(dir.path(), provider).await;
    let job_id = common::upload_job(&app).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "studio"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let download = common::get(&app, &format!("/api/download/{job_id}")).await;
    assert_eq!(download.status(), StatusCode::CONFLICT);
    let body = common::json_body(download).await;
    assert_eq!(body["code"], "NOT_READY");
}

#[tokio::test]
async fn failed_render_surfaces_error_in_status_and_download() {
    let dir = tempfile::tempdir().unwrap();
    let provider = Arc::new(MockAidpProvider::failing("GPU ran out of memory"));
    let app = common::build_test_app(dir.path(), provider).await;
    let job_id = common::upload_job(&app).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "dramatic"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let status = common::poll_until_terminal(&app, &job_id).await;
    assert_eq!(status["data"]["status"], "failed");
    assert_eq!(status["data"]["error"], "GPU ran out of memory");

    let download = common::get(&app, &format!("/api/download/{job_id}?file=render")).await;
    assert_eq!(download.status(), StatusCode::NOT_FOUND);
    let body = common::json_body(download).await;
    assert_eq!(body["code"], "RENDER_FAILED");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("GPU ran out of memory"));
}

#[tokio::test]
async fn render_exceeding_the_deadline_fails_the_job() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(dir.path());
    config.render_timeout_secs = 1;
    // A backend that will not finish within the deadline.
    let provider = Arc::new(MockAidpProvider::with_timings(
        Duration::from_secs(60),
        Duration::from_secs(60),
    ));
    let app = common::build_test_app_with_config(config, provider).await;
    let job_id = common::upload_job(&app).await;

    let response = common::post_json(
        &app,
        "/api/render",
        json!({"jobId": job_id, "preset": "studio"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let status = common::poll_until_terminal(&app, &job_id).await;
    assert_eq!(status["data"]["status"], "failed");
    assert!(status["data"]["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
}

#[tokio::test]
async fn download_with_malformed_job_id_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = common::build_test_app(dir.path(), fast_mock()).await;

    let response = common::get(&app, "/api/download/..%2F..%2Fetc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = common::json_body(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
}
