//! Periodic cleanup of expired jobs.
//!
//! Spawns a background task that removes job records and their files once
//! they pass their TTL. Runs on a fixed interval using
//! `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::store::JobStore;

/// How often the cleanup sweep runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the expired-job cleanup loop.
///
/// Removes jobs whose `expires_at` has passed, along with their uploaded
/// asset, output, and proof files. Runs until `cancel` is triggered.
pub async fn run(store: Arc<JobStore>, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        data_dir = %store.base().display(),
        "Cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match sweep(&store).await {
                    Ok(removed) => {
                        if removed > 0 {
                            tracing::info!(removed, "Cleanup: purged expired jobs");
                        } else {
                            tracing::debug!("Cleanup: no expired jobs");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Cleanup: sweep failed");
                    }
                }
            }
        }
    }
}

/// Remove every expired job. Returns how many were removed.
pub async fn sweep(store: &JobStore) -> Result<usize, crate::store::StoreError> {
    let now = Utc::now();
    let mut removed = 0;

    for id in store.list_job_ids().await? {
        let Some(job) = store.load_job(id).await? else {
            continue;
        };
        if job.is_expired(now) {
            store.remove_job(id).await?;
            tracing::debug!(job_id = %id, status = %job.status, "Cleanup: removed expired job");
            removed += 1;
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proofrender_core::job::Job;

    #[tokio::test]
    async fn sweep_removes_only_expired_jobs() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();

        let fresh = Job::new("fresh.gltf".to_string(), 10, 24);
        // A non-positive TTL expires immediately.
        let stale = Job::new("stale.gltf".to_string(), 10, -1);
        store.create_job(&fresh, b"{}").await.unwrap();
        store.create_job(&stale, b"{}").await.unwrap();

        let removed = sweep(&store).await.unwrap();
        assert_eq!(removed, 1);

        assert!(store.load_job(fresh.id).await.unwrap().is_some());
        assert!(store.load_job(stale.id).await.unwrap().is_none());
        assert!(!store.asset_path(stale.id).exists());
    }

    #[tokio::test]
    async fn sweep_on_empty_store_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let store = JobStore::open(dir.path()).await.unwrap();
        assert_eq!(sweep(&store).await.unwrap(), 0);
    }
}
