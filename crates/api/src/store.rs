//! Filesystem-backed job store.
//!
//! Layout under the configured data directory:
//!
//! ```text
//! uploads/{job_id}/asset.gltf       uploaded model
//! jobs/{job_id}/metadata.json       Job record
//! outputs/{job_id}/render.png       rendered output (complete jobs)
//! outputs/{job_id}/proof.json       proof document (complete jobs)
//! ```
//!
//! Metadata updates are read-modify-write through a closure, serialized
//! by a store-wide async mutex and persisted with a temp-file + rename so
//! a crash never leaves a half-written record. Status changes go through
//! [`Job::transition`], so illegal transitions are rejected here rather
//! than at each call site.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use uuid::Uuid;

use proofrender_core::error::CoreError;
use proofrender_core::job::Job;
use proofrender_core::proof::RenderProof;

/// File name the uploaded asset is stored under.
pub const ASSET_FILE: &str = "asset.gltf";
/// File name of the rendered output.
pub const OUTPUT_FILE: &str = "render.png";
/// File name of the proof document.
pub const PROOF_FILE: &str = "proof.json";

/// Errors from the job store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt job metadata: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl From<StoreError> for crate::error::AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Core(core) => crate::error::AppError::Core(core),
            other => crate::error::AppError::InternalError(other.to_string()),
        }
    }
}

pub struct JobStore {
    base: PathBuf,
    /// Serializes metadata read-modify-write cycles across jobs.
    update_lock: Mutex<()>,
}

impl JobStore {
    /// Open (and create, if needed) the store under `base`.
    pub async fn open(base: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let base = base.into();
        for sub in ["uploads", "jobs", "outputs"] {
            tokio::fs::create_dir_all(base.join(sub)).await?;
        }
        Ok(Self {
            base,
            update_lock: Mutex::new(()),
        })
    }

    /// Whether the backing directory is present and writable.
    pub async fn healthy(&self) -> bool {
        tokio::fs::create_dir_all(self.base.join("jobs")).await.is_ok()
    }

    pub fn asset_path(&self, id: Uuid) -> PathBuf {
        self.base.join("uploads").join(id.to_string()).join(ASSET_FILE)
    }

    pub fn output_path(&self, id: Uuid) -> PathBuf {
        self.base.join("outputs").join(id.to_string()).join(OUTPUT_FILE)
    }

    pub fn proof_path(&self, id: Uuid) -> PathBuf {
        self.base.join("outputs").join(id.to_string()).join(PROOF_FILE)
    }

    fn metadata_path(&self, id: Uuid) -> PathBuf {
        self.base.join("jobs").join(id.to_string()).join("metadata.json")
    }

    /// Persist a freshly created job and its uploaded asset.
    pub async fn create_job(&self, job: &Job, asset_bytes: &[u8]) -> Result<(), StoreError> {
        let asset_path = self.asset_path(job.id);
        if let Some(parent) = asset_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&asset_path, asset_bytes).await?;

        self.write_metadata(job).await?;

        tracing::info!(
            job_id = %job.id,
            asset = %job.asset_filename,
            size = job.asset_size_bytes,
            "Job created"
        );
        Ok(())
    }

    /// Load a job record, if it exists.
    pub async fn load_job(&self, id: Uuid) -> Result<Option<Job>, StoreError> {
        let path = self.metadata_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Load a job record, failing with `NotFound` if it does not exist.
    pub async fn require_job(&self, id: Uuid) -> Result<Job, StoreError> {
        self.load_job(id)
            .await?
            .ok_or(StoreError::Core(CoreError::NotFound { entity: "Job", id }))
    }

    /// Apply `mutate` to the stored job record and persist the result.
    ///
    /// The closure may change any field; status changes must go through
    /// [`Job::transition`] inside the closure so forward-only ordering is
    /// enforced. Returns the updated record.
    pub async fn update_job<F>(&self, id: Uuid, mutate: F) -> Result<Job, StoreError>
    where
        F: FnOnce(&mut Job) -> Result<(), CoreError>,
    {
        let _guard = self.update_lock.lock().await;

        let mut job = self.require_job(id).await?;
        mutate(&mut job)?;
        self.write_metadata(&job).await?;
        Ok(job)
    }

    /// Save the rendered output bytes for a job.
    pub async fn save_output(&self, id: Uuid, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.output_path(id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::info!(job_id = %id, path = %path.display(), "Render output saved");
        Ok(path)
    }

    /// Save the proof document for a job, pretty-printed.
    pub async fn save_proof(&self, id: Uuid, proof: &RenderProof) -> Result<PathBuf, StoreError> {
        let path = self.proof_path(id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(proof)?;
        tokio::fs::write(&path, json).await?;
        tracing::info!(job_id = %id, path = %path.display(), "Proof saved");
        Ok(path)
    }

    /// All job ids with a metadata record, for the cleanup sweep.
    pub async fn list_job_ids(&self) -> Result<Vec<Uuid>, StoreError> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(self.base.join("jobs")).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(id) = Uuid::parse_str(name) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// Remove every directory belonging to a job.
    pub async fn remove_job(&self, id: Uuid) -> Result<(), StoreError> {
        for dir in [
            self.base.join("uploads").join(id.to_string()),
            self.base.join("jobs").join(id.to_string()),
            self.base.join("outputs").join(id.to_string()),
        ] {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Write the metadata record atomically (temp file + rename).
    async fn write_metadata(&self, job: &Job) -> Result<(), StoreError> {
        let path = self.metadata_path(job.id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(job)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Base data directory (used in logs).
    pub fn base(&self) -> &Path {
        &self.base
    }
}
