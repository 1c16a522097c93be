//! Render job records and their status machine.
//!
//! A [`Job`] is created when an asset is uploaded and mutated by the
//! render orchestrator as the render progresses. Status transitions are
//! monotonic along `queued -> rendering -> {complete, failed}`; nothing
//! moves backwards.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Default job time-to-live. Expired jobs are removed by the cleanup sweep.
pub const DEFAULT_JOB_TTL_HOURS: i64 = 24;

/// Lifecycle state of a render job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Asset uploaded, waiting for a render submission.
    Queued,
    /// Dispatched to the render backend; output not yet available.
    Rendering,
    /// Render finished; output and proof are available.
    Complete,
    /// Render failed; see [`Job::error`].
    Failed,
}

impl JobStatus {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        match (self, next) {
            (JobStatus::Queued, JobStatus::Rendering) => true,
            // A submission failure may fail the job without ever rendering.
            (JobStatus::Queued, JobStatus::Failed) => true,
            (JobStatus::Rendering, JobStatus::Complete) => true,
            (JobStatus::Rendering, JobStatus::Failed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Rendering => "rendering",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single upload-to-render request tracked by id and status.
///
/// Serialized as the per-job `metadata.json` in the store and reused in
/// API status responses (camelCase on the wire).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub asset_filename: String,
    pub asset_size_bytes: u64,
    /// Preset name; set when the render is submitted.
    pub preset: Option<String>,
    /// Render backend identifier (`aidp` or `local`).
    pub provider: Option<String>,
    /// Backend-assigned job id used for status polling.
    pub provider_job_id: Option<String>,
    /// Last observed completion estimate, 0-100.
    pub progress_percent: u8,
    /// Output file name under the job's output directory; `complete` only.
    pub output_file: Option<String>,
    /// Proof file name under the job's output directory; `complete` only.
    pub proof_file: Option<String>,
    /// Failure detail; `failed` only.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a fresh `queued` job for an uploaded asset.
    pub fn new(asset_filename: String, asset_size_bytes: u64, ttl_hours: i64) -> Self {
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            asset_filename,
            asset_size_bytes,
            preset: None,
            provider: None,
            provider_job_id: None,
            progress_percent: 0,
            output_file: None,
            proof_file: None,
            error: None,
            created_at,
            expires_at: created_at + Duration::hours(ttl_hours),
            completed_at: None,
        }
    }

    /// Move the job to `next`, rejecting any non-forward transition.
    pub fn transition(&mut self, next: JobStatus) -> Result<(), CoreError> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::Conflict(format!(
                "Illegal job transition: {} -> {next}",
                self.status
            )));
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    /// Whether the job has outlived its TTL.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job() -> Job {
        Job::new("cube.gltf".to_string(), 1024, DEFAULT_JOB_TTL_HOURS)
    }

    #[test]
    fn new_job_is_queued_with_24h_expiry() {
        let job = new_job();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.expires_at - job.created_at, Duration::hours(24));
        assert!(job.output_file.is_none());
        assert!(job.proof_file.is_none());
    }

    #[test]
    fn forward_transitions_are_allowed() {
        let mut job = new_job();
        job.transition(JobStatus::Rendering).unwrap();
        job.transition(JobStatus::Complete).unwrap();
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn queued_job_can_fail_on_submission_error() {
        let mut job = new_job();
        job.transition(JobStatus::Failed).unwrap();
        assert_eq!(job.status, JobStatus::Failed);
    }

    #[test]
    fn transitions_never_reverse() {
        let mut job = new_job();
        job.transition(JobStatus::Rendering).unwrap();
        assert!(job.transition(JobStatus::Queued).is_err());

        job.transition(JobStatus::Complete).unwrap();
        assert!(job.transition(JobStatus::Rendering).is_err());
        assert!(job.transition(JobStatus::Failed).is_err());
    }

    #[test]
    fn terminal_states_admit_nothing() {
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Queued));
        assert!(!JobStatus::Complete.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn expiry_uses_ttl() {
        let job = new_job();
        assert!(!job.is_expired(Utc::now()));
        assert!(job.is_expired(job.created_at + Duration::hours(25)));
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Rendering).unwrap(),
            "\"rendering\""
        );
        let status: JobStatus = serde_json::from_str("\"complete\"").unwrap();
        assert_eq!(status, JobStatus::Complete);
    }
}
