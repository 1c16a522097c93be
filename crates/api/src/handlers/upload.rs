//! Handler for `.gltf` asset uploads.
//!
//! Accepts a single multipart file field, enforces the size cap while
//! buffering (so an oversized body is rejected without being stored),
//! validates the glTF format, and creates the job record in `queued`.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use proofrender_core::gltf;
use proofrender_core::job::Job;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field name carrying the asset.
const FILE_FIELD: &str = "file";

/// Response body for a successful upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub job_id: uuid::Uuid,
    pub message: &'static str,
    pub asset_filename: String,
    pub asset_size: u64,
    /// Where to go next in the workflow.
    pub next_step: &'static str,
}

/// POST /api/upload
///
/// Upload a `.gltf` asset and receive a job id for the render workflow.
pub async fn upload_asset(
    State(state): State<AppState>,
    peer: Result<ConnectInfo<SocketAddr>, axum::extract::rejection::ExtensionRejection>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    state
        .upload_limiter
        .check(&client_key(&headers, peer.ok().map(|ConnectInfo(addr)| addr)))?;

    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        gltf::validate_filename(&filename).map_err(AppError::Core)?;
        gltf::validate_content_type(field.content_type()).map_err(AppError::Core)?;

        // Count while buffering so an oversized upload aborts early.
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > state.config.max_upload_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "File size exceeds {} byte limit",
                    state.config.max_upload_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        file = Some((filename, bytes));
        break;
    }

    let (filename, bytes) = file.ok_or_else(|| {
        AppError::BadRequest("No file provided. Please upload a .gltf file.".to_string())
    })?;

    if bytes.is_empty() {
        return Err(AppError::BadRequest(
            "Empty file uploaded. Please provide a valid .gltf file.".to_string(),
        ));
    }

    let summary = gltf::validate_structure(&bytes)?;

    let job = Job::new(filename, bytes.len() as u64, state.config.file_ttl_hours);
    state.store.create_job(&job, &bytes).await?;

    tracing::info!(
        job_id = %job.id,
        asset = %job.asset_filename,
        size = job.asset_size_bytes,
        scenes = summary.scene_count,
        nodes = summary.node_count,
        "Upload accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UploadResponse {
                job_id: job.id,
                message: "Upload successful",
                asset_filename: job.asset_filename,
                asset_size: job.asset_size_bytes,
                next_step: "/api/render",
            },
        }),
    ))
}

/// Rate-limit key for the client: first `x-forwarded-for` hop when behind
/// a proxy, otherwise the socket peer IP. Direct clients must not share a
/// bucket.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}
