//! Per-job render monitor.
//!
//! Spawned once per dispatched render. Polls the backend on a fixed
//! interval, mirrors progress into the job record, and on completion
//! fetches the output, builds the proof document, and flips the job to
//! `complete`. Any terminal problem (backend failure, lost job, missing
//! output, overall timeout) flips the job to `failed` with a message the
//! status endpoint can surface.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;
use uuid::Uuid;

use proofrender_core::job::JobStatus;
use proofrender_core::preset::ScenePreset;
use proofrender_core::proof;
use proofrender_provider::{ProviderError, ProviderJobState, RenderProvider};

use crate::store::JobStore;

/// Everything the monitor loop needs, captured at dispatch time.
pub struct MonitorParams {
    pub store: Arc<JobStore>,
    pub provider: Arc<dyn RenderProvider>,
    pub job_id: Uuid,
    pub provider_job_id: String,
    pub preset: ScenePreset,
    /// Output resolution recorded in the proof, e.g. "1024x1024".
    pub resolution: String,
    pub poll_interval: Duration,
    pub render_timeout: Duration,
}

/// Poll the backend until the render reaches a terminal state.
pub async fn run(params: MonitorParams) {
    let MonitorParams {
        store,
        provider,
        job_id,
        provider_job_id,
        preset,
        resolution,
        poll_interval,
        render_timeout,
    } = params;

    let started = Instant::now();
    let deadline = started + render_timeout;

    loop {
        tokio::time::sleep(poll_interval).await;

        if Instant::now() >= deadline {
            mark_failed(
                &store,
                job_id,
                format!("Render timed out after {}s", render_timeout.as_secs()),
            )
            .await;
            return;
        }

        let status = match provider.status(&provider_job_id).await {
            Ok(status) => status,
            Err(ProviderError::JobNotFound(_)) => {
                mark_failed(
                    &store,
                    job_id,
                    "Render backend lost track of the job".to_string(),
                )
                .await;
                return;
            }
            Err(e) => {
                // Transient backend trouble; the deadline bounds retries.
                tracing::warn!(job_id = %job_id, error = %e, "Status poll failed, will retry");
                continue;
            }
        };

        let progress = status.progress_percent;
        if let Err(e) = store
            .update_job(job_id, |j| {
                j.progress_percent = progress;
                Ok(())
            })
            .await
        {
            tracing::warn!(job_id = %job_id, error = %e, "Failed to record progress");
        }

        match status.state {
            ProviderJobState::Queued | ProviderJobState::Rendering => continue,
            ProviderJobState::Failed => {
                mark_failed(
                    &store,
                    job_id,
                    status
                        .error
                        .unwrap_or_else(|| "Render backend reported failure".to_string()),
                )
                .await;
                return;
            }
            ProviderJobState::Complete => {
                let render_duration = status
                    .render_duration_secs
                    .unwrap_or_else(|| started.elapsed().as_secs_f64());
                finalize(
                    &store,
                    provider.as_ref(),
                    job_id,
                    &provider_job_id,
                    &preset,
                    &resolution,
                    render_duration,
                )
                .await;
                return;
            }
        }
    }
}

/// Fetch the output, persist it with its proof, and mark the job complete.
async fn finalize(
    store: &JobStore,
    provider: &dyn RenderProvider,
    job_id: Uuid,
    provider_job_id: &str,
    preset: &ScenePreset,
    resolution: &str,
    render_duration_secs: f64,
) {
    let output = match provider.result(provider_job_id).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            mark_failed(
                store,
                job_id,
                "Render backend reported completion but returned no output".to_string(),
            )
            .await;
            return;
        }
        Err(e) => {
            mark_failed(store, job_id, format!("Failed to fetch render output: {e}")).await;
            return;
        }
    };

    if let Err(e) = store.save_output(job_id, &output).await {
        mark_failed(store, job_id, format!("Failed to store render output: {e}")).await;
        return;
    }

    let proof = match proof::build_proof(
        &store.asset_path(job_id),
        preset,
        &output,
        provider_job_id,
        resolution,
        render_duration_secs,
        Utc::now(),
    )
    .await
    {
        Ok(proof) => proof,
        Err(e) => {
            mark_failed(store, job_id, format!("Failed to build proof: {e}")).await;
            return;
        }
    };

    if let Err(e) = store.save_proof(job_id, &proof).await {
        mark_failed(store, job_id, format!("Failed to store proof: {e}")).await;
        return;
    }

    let result = store
        .update_job(job_id, |j| {
            j.progress_percent = 100;
            j.output_file = Some(crate::store::OUTPUT_FILE.to_string());
            j.proof_file = Some(crate::store::PROOF_FILE.to_string());
            j.transition(JobStatus::Complete)
        })
        .await;

    match result {
        Ok(_) => tracing::info!(
            job_id = %job_id,
            provider_job_id = %provider_job_id,
            output_hash = %proof.output_hash,
            render_duration_secs,
            "Render complete"
        ),
        Err(e) => tracing::error!(job_id = %job_id, error = %e, "Failed to mark job complete"),
    }
}

/// Flip the job to `failed` with a message; log instead of erroring if the
/// record is gone (e.g. swept mid-render).
async fn mark_failed(store: &JobStore, job_id: Uuid, message: String) {
    tracing::warn!(job_id = %job_id, error = %message, "Render failed");
    let result = store
        .update_job(job_id, |j| {
            j.error = Some(message.clone());
            j.transition(JobStatus::Failed)
        })
        .await;
    if let Err(e) = result {
        tracing::error!(job_id = %job_id, error = %e, "Failed to record render failure");
    }
}
