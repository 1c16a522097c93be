//! Handler for downloading render outputs and proof documents.

use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use serde::Deserialize;
use uuid::Uuid;

use proofrender_core::error::CoreError;
use proofrender_core::hashing;
use proofrender_core::job::JobStatus;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Response header carrying the SHA-256 of the returned render bytes,
/// for comparison against `outputHash` in the proof document.
pub const PROOF_DIGEST_HEADER: &str = "x-proof-sha256";

/// Which artifact to download.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    #[default]
    Render,
    Proof,
}

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub file: DownloadKind,
}

/// GET /api/download/{job_id}?file=render|proof
///
/// Only complete jobs have artifacts. Failed jobs report the render error;
/// anything earlier in the lifecycle is "not ready yet".
pub async fn download_file(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> AppResult<(HeaderMap, Vec<u8>)> {
    // Parsing here (rather than Path<Uuid>) keeps traversal-looking ids
    // out of filesystem paths and reports them as not-found.
    let job_id = Uuid::parse_str(&job_id).map_err(|_| {
        AppError::Core(CoreError::Validation(format!(
            "Invalid job id: {job_id}"
        )))
    })?;

    let job = state.store.require_job(job_id).await?;

    match job.status {
        JobStatus::Complete => {}
        JobStatus::Failed => {
            return Err(AppError::RenderFailed(
                job.error.unwrap_or_else(|| "Unknown error".to_string()),
            ));
        }
        other => return Err(AppError::NotReady { status: other.to_string() }),
    }

    let (path, content_type, filename) = match query.file {
        DownloadKind::Render => (
            state.store.output_path(job_id),
            "image/png",
            format!("{job_id}_render.png"),
        ),
        DownloadKind::Proof => (
            state.store.proof_path(job_id),
            "application/json",
            format!("{job_id}_proof.json"),
        ),
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Artifact",
                id: job_id,
            }));
        }
        Err(e) => return Err(e.into()),
    };

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .map_err(|e| AppError::InternalError(e.to_string()))?,
    );

    if query.file == DownloadKind::Render {
        let digest = hashing::sha256_hex(&bytes);
        headers.insert(
            PROOF_DIGEST_HEADER,
            HeaderValue::from_str(&digest)
                .map_err(|e| AppError::InternalError(e.to_string()))?,
        );
    }

    tracing::info!(job_id = %job_id, kind = ?query.file, size = bytes.len(), "Download served");

    Ok((headers, bytes))
}
