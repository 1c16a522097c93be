use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use proofrender_core::preset::PresetCatalog;
use proofrender_core::rate_limit::RateLimiter;
use proofrender_provider::RenderProvider;

use proofrender_api::config::ServerConfig;
use proofrender_api::router::build_app_router;
use proofrender_api::state::AppState;
use proofrender_api::store::JobStore;

/// A small but structurally valid glTF document.
pub const MINIMAL_GLTF: &str = r#"{
    "asset": {"version": "2.0"},
    "scenes": [{"nodes": [0]}],
    "nodes": [{"name": "cube"}]
}"#;

/// Build a test `ServerConfig` rooted at `data_dir`, with fast polling so
/// tests can drive a full render lifecycle in milliseconds.
pub fn test_config(data_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        data_dir: data_dir.to_path_buf(),
        presets_path: None,
        max_upload_bytes: 10 * 1024 * 1024,
        file_ttl_hours: 24,
        rate_limit_requests: 10,
        rate_limit_window_secs: 3600,
        poll_interval_secs: 0,
        render_timeout_secs: 10,
        render_resolution: "1024x1024".to_string(),
        aidp_api_url: "http://127.0.0.1:9".to_string(),
        aidp_api_key: String::new(),
        use_mock_aidp: true,
    }
}

/// Build the full application router over a fresh store at `data_dir`,
/// wired to the given render backend.
///
/// Uses `build_app_router` so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses.
pub async fn build_test_app(data_dir: &Path, provider: Arc<dyn RenderProvider>) -> Router {
    build_test_app_with_config(test_config(data_dir), provider).await
}

pub async fn build_test_app_with_config(
    config: ServerConfig,
    provider: Arc<dyn RenderProvider>,
) -> Router {
    let store = Arc::new(JobStore::open(&config.data_dir).await.unwrap());

    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        presets: Arc::new(PresetCatalog::builtin()),
        provider,
        upload_limiter: Arc::new(RateLimiter::new(
            config.rate_limit_requests,
            Duration::from_secs(config.rate_limit_window_secs),
        )),
    };

    build_app_router(state, &config)
}

/// Build a multipart/form-data body with a single `file` field.
pub fn multipart_body(filename: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "x-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// POST a `.gltf` upload and return the response.
pub async fn post_upload(app: &Router, filename: &str, bytes: &[u8]) -> Response<Body> {
    let (content_type, body) = multipart_body(filename, "model/gltf+json", bytes);
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header("content-type", content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// POST a `.gltf` upload as a direct (un-proxied) client with the given
/// peer address, the way `into_make_service_with_connect_info` would
/// present it.
pub async fn post_upload_from(
    app: &Router,
    peer: SocketAddr,
    filename: &str,
    bytes: &[u8],
) -> Response<Body> {
    let (content_type, body) = multipart_body(filename, "model/gltf+json", bytes);
    let mut request = Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header("content-type", content_type)
        .body(Body::from(body))
        .unwrap();
    request
        .extensions_mut()
        .insert(axum::extract::ConnectInfo(peer));
    app.clone().oneshot(request).await.unwrap()
}

/// POST a JSON body and return the response.
pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

/// GET a URI and return the response.
pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// Collect a response body into parsed JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// Upload an asset and return the new job id.
pub async fn upload_job(app: &Router) -> String {
    let response = post_upload(app, "cube.gltf", MINIMAL_GLTF.as_bytes()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    json["data"]["jobId"].as_str().unwrap().to_string()
}

/// Poll `/api/status/{job_id}` until it reaches a terminal status or the
/// attempt budget runs out. Returns the final status payload.
pub async fn poll_until_terminal(app: &Router, job_id: &str) -> serde_json::Value {
    for _ in 0..200 {
        let response = get(app, &format!("/api/status/{job_id}")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        let status = json["data"]["status"].as_str().unwrap().to_string();
        if status == "complete" || status == "failed" {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal status");
}
