//! Handlers for submitting a render and polling its status.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use proofrender_core::error::CoreError;
use proofrender_core::job::JobStatus;

use crate::background::monitor;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for POST /api/render.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    pub job_id: Uuid,
    pub preset: String,
}

/// Response body for a successful render submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub preset: String,
    pub provider: String,
    pub provider_job_id: String,
    pub message: &'static str,
}

/// Status payload returned by GET /api/status/{job_id}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/render
///
/// Dispatch an uploaded asset to the render backend under a named preset
/// and start the background monitor that tracks it to completion.
pub async fn submit_render(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> AppResult<Json<DataResponse<RenderResponse>>> {
    let job = state.store.require_job(req.job_id).await?;

    if job.status != JobStatus::Queued {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Render already submitted for job {} (status: {})",
            job.id, job.status
        ))));
    }

    let preset = state
        .presets
        .require(&req.preset)
        .map_err(AppError::Core)?
        .clone();

    let asset_path = state.store.asset_path(job.id);
    if !asset_path.exists() {
        return Err(AppError::BadRequest(format!(
            "Asset file for job {} is missing. Please re-upload.",
            job.id
        )));
    }

    // Claim the job under the store's guarded transition before talking to
    // the backend. Of two concurrent submissions only one claim succeeds;
    // the loser gets a 409 without dispatching an orphan render.
    let claimed = state
        .store
        .update_job(job.id, |j| {
            j.preset = Some(preset.name.clone());
            j.provider = Some(state.provider.name().to_string());
            j.transition(JobStatus::Rendering)
        })
        .await?;

    let provider_job_id = match state.provider.submit(claimed.id, &asset_path, &preset).await {
        Ok(id) => id,
        Err(e) => {
            // The claim cannot be unwound; a failed dispatch fails the job.
            let result = state
                .store
                .update_job(claimed.id, |j| {
                    j.error = Some(format!("Render submission failed: {e}"));
                    j.transition(JobStatus::Failed)
                })
                .await;
            if let Err(store_err) = result {
                tracing::error!(job_id = %claimed.id, error = %store_err, "Failed to record submission failure");
            }
            return Err(e.into());
        }
    };

    let updated = state
        .store
        .update_job(claimed.id, |j| {
            j.provider_job_id = Some(provider_job_id.clone());
            Ok(())
        })
        .await?;

    tracing::info!(
        job_id = %updated.id,
        preset = %preset.name,
        provider = state.provider.name(),
        provider_job_id = %provider_job_id,
        "Render dispatched"
    );

    tokio::spawn(monitor::run(monitor::MonitorParams {
        store: Arc::clone(&state.store),
        provider: Arc::clone(&state.provider),
        job_id: updated.id,
        provider_job_id: provider_job_id.clone(),
        preset,
        resolution: state.config.render_resolution.clone(),
        poll_interval: Duration::from_secs(state.config.poll_interval_secs),
        render_timeout: Duration::from_secs(state.config.render_timeout_secs),
    }));

    Ok(Json(DataResponse {
        data: RenderResponse {
            job_id: updated.id,
            status: updated.status,
            preset: req.preset,
            provider: state.provider.name().to_string(),
            provider_job_id,
            message: "Render started. Poll /api/status/{jobId} for progress.",
        },
    }))
}

/// GET /api/status/{job_id}
pub async fn get_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<DataResponse<StatusResponse>>> {
    let job = state.store.require_job(job_id).await?;

    Ok(Json(DataResponse {
        data: StatusResponse {
            job_id: job.id,
            status: job.status,
            progress_percent: job.progress_percent,
            preset: job.preset,
            provider: job.provider,
            provider_job_id: job.provider_job_id,
            error: job.error,
        },
    }))
}
