//! In-process simulation of the AIDP render lifecycle.
//!
//! Used as the default backend in development (`USE_MOCK_AIDP=true`) and
//! by the integration tests. Each submitted job moves through
//! `queued -> rendering -> complete` on its own tokio task, with a queue
//! delay and a progress ramp mimicking the real network's behaviour.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use uuid::Uuid;

use proofrender_core::preset::ScenePreset;

use crate::error::ProviderError;
use crate::{ProviderJobState, ProviderStatus, RenderProvider};

/// Smallest valid 1x1 transparent PNG, served as the mock render output.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // signature
    0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15,
    0xC4, 0x89, //
    0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, // IDAT
    0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, //
    0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82, // IEND
];

/// Progress ramp granularity during the simulated render.
const RENDER_STEPS: u32 = 10;

#[derive(Debug)]
struct MockJob {
    state: ProviderJobState,
    progress_percent: u8,
    error: Option<String>,
    started: Option<Instant>,
    render_duration_secs: Option<f64>,
}

/// Simulated AIDP backend holding an in-memory job table.
pub struct MockAidpProvider {
    jobs: Arc<Mutex<HashMap<String, MockJob>>>,
    queue_delay: (Duration, Duration),
    render_duration: Duration,
    /// When set, every job fails with this message after the queue delay.
    fail_with: Option<String>,
}

impl MockAidpProvider {
    /// Production-like timings: 2-5 s queue jitter, 3 s render.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            queue_delay: (Duration::from_secs(2), Duration::from_secs(5)),
            render_duration: Duration::from_secs(3),
            fail_with: None,
        }
    }

    /// Fixed timings, for tests that drive the full lifecycle quickly.
    pub fn with_timings(queue_delay: Duration, render_duration: Duration) -> Self {
        Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            queue_delay: (queue_delay, queue_delay),
            render_duration,
            fail_with: None,
        }
    }

    /// A backend where every render fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        let mut provider = Self::with_timings(Duration::from_millis(5), Duration::from_millis(5));
        provider.fail_with = Some(message.into());
        provider
    }

    fn pick_queue_delay(&self) -> Duration {
        let (min, max) = self.queue_delay;
        if min == max {
            return min;
        }
        let secs = rand::rng().random_range(min.as_secs_f64()..max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    async fn run_lifecycle(
        jobs: Arc<Mutex<HashMap<String, MockJob>>>,
        provider_job_id: String,
        queue_delay: Duration,
        render_duration: Duration,
        fail_with: Option<String>,
    ) {
        tokio::time::sleep(queue_delay).await;

        if let Some(message) = fail_with {
            if let Some(job) = jobs.lock().unwrap().get_mut(&provider_job_id) {
                job.state = ProviderJobState::Failed;
                job.error = Some(message.clone());
            }
            tracing::error!(provider_job_id, error = %message, "[mock-aidp] render failed");
            return;
        }

        let started = Instant::now();
        if let Some(job) = jobs.lock().unwrap().get_mut(&provider_job_id) {
            job.state = ProviderJobState::Rendering;
            job.started = Some(started);
            job.progress_percent = 5;
        }
        tracing::debug!(provider_job_id, "[mock-aidp] render started");

        let step = render_duration / RENDER_STEPS;
        for i in 1..=RENDER_STEPS {
            tokio::time::sleep(step).await;
            if let Some(job) = jobs.lock().unwrap().get_mut(&provider_job_id) {
                job.progress_percent = ((i * 100) / RENDER_STEPS).min(99) as u8;
            }
        }

        if let Some(job) = jobs.lock().unwrap().get_mut(&provider_job_id) {
            job.state = ProviderJobState::Complete;
            job.progress_percent = 100;
            job.render_duration_secs = Some(started.elapsed().as_secs_f64());
        }
        tracing::info!(provider_job_id, "[mock-aidp] render complete");
    }
}

impl Default for MockAidpProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RenderProvider for MockAidpProvider {
    fn name(&self) -> &'static str {
        "aidp"
    }

    async fn submit(
        &self,
        job_id: Uuid,
        asset_path: &Path,
        preset: &ScenePreset,
    ) -> Result<String, ProviderError> {
        if !asset_path.exists() {
            return Err(ProviderError::InvalidRequest(format!(
                "Asset file not found: {}",
                asset_path.display()
            )));
        }

        let provider_job_id = format!("aidp_{}", Uuid::new_v4());
        let queue_delay = self.pick_queue_delay();

        self.jobs.lock().unwrap().insert(
            provider_job_id.clone(),
            MockJob {
                state: ProviderJobState::Queued,
                progress_percent: 0,
                error: None,
                started: None,
                render_duration_secs: None,
            },
        );

        tracing::info!(
            %job_id,
            provider_job_id,
            preset = %preset.name,
            queue_delay_ms = queue_delay.as_millis() as u64,
            "[mock-aidp] render submitted"
        );

        tokio::spawn(Self::run_lifecycle(
            Arc::clone(&self.jobs),
            provider_job_id.clone(),
            queue_delay,
            self.render_duration,
            self.fail_with.clone(),
        ));

        Ok(provider_job_id)
    }

    async fn status(&self, provider_job_id: &str) -> Result<ProviderStatus, ProviderError> {
        let jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get(provider_job_id)
            .ok_or_else(|| ProviderError::JobNotFound(provider_job_id.to_string()))?;

        let eta_secs = match job.state {
            ProviderJobState::Rendering => {
                let remaining = 100u64.saturating_sub(job.progress_percent as u64);
                Some((self.render_duration.as_secs() * remaining) / 100)
            }
            _ => None,
        };

        Ok(ProviderStatus {
            state: job.state,
            progress_percent: job.progress_percent,
            eta_secs,
            error: job.error.clone(),
            render_duration_secs: job.render_duration_secs,
        })
    }

    async fn result(&self, provider_job_id: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        let jobs = self.jobs.lock().unwrap();
        let job = jobs
            .get(provider_job_id)
            .ok_or_else(|| ProviderError::JobNotFound(provider_job_id.to_string()))?;

        if job.state != ProviderJobState::Complete {
            return Ok(None);
        }
        Ok(Some(PLACEHOLDER_PNG.to_vec()))
    }
}
