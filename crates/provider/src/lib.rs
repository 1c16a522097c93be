//! Render backend abstraction.
//!
//! The API never talks to a renderer directly; it goes through the
//! [`RenderProvider`] trait so the backend can be swapped by
//! configuration. Two implementations exist:
//!
//! - [`aidp::AidpProvider`] -- HTTP client for the external AIDP GPU
//!   network (submit / poll / fetch result).
//! - [`mock::MockAidpProvider`] -- in-process simulation of the AIDP job
//!   lifecycle, used for development and tests.

pub mod aidp;
pub mod error;
pub mod mock;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use proofrender_core::preset::ScenePreset;

pub use error::ProviderError;

/// Backend-side lifecycle state of a submitted render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderJobState {
    Queued,
    Rendering,
    Complete,
    Failed,
}

impl ProviderJobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProviderJobState::Complete | ProviderJobState::Failed)
    }
}

/// Snapshot of a render job as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub state: ProviderJobState,
    /// 0-100 completion estimate.
    pub progress_percent: u8,
    /// Estimated seconds remaining, if the backend reports one.
    pub eta_secs: Option<u64>,
    /// Failure detail; set when `state` is `failed`.
    pub error: Option<String>,
    /// Wall-clock render time in seconds; set when `state` is `complete`.
    pub render_duration_secs: Option<f64>,
}

/// A render backend: submit a job, poll its status, fetch its output.
///
/// Retries and backoff toward the underlying network are the backend's
/// own responsibility; callers treat every method as a single attempt.
#[async_trait]
pub trait RenderProvider: Send + Sync {
    /// Short identifier recorded on jobs and returned in API responses.
    fn name(&self) -> &'static str;

    /// Submit a render and return the backend-assigned job id.
    ///
    /// Dispatch is asynchronous: the render runs out-of-process and this
    /// returns as soon as the backend has accepted the job.
    async fn submit(
        &self,
        job_id: Uuid,
        asset_path: &Path,
        preset: &ScenePreset,
    ) -> Result<String, ProviderError>;

    /// Current status of a previously submitted job.
    async fn status(&self, provider_job_id: &str) -> Result<ProviderStatus, ProviderError>;

    /// Rendered output bytes, or `None` while the job is not complete.
    async fn result(&self, provider_job_id: &str) -> Result<Option<Vec<u8>>, ProviderError>;
}
