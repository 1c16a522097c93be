use std::sync::Arc;

use proofrender_core::preset::PresetCatalog;
use proofrender_core::rate_limit::RateLimiter;
use proofrender_provider::RenderProvider;

use crate::config::ServerConfig;
use crate::store::JobStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Filesystem job store.
    pub store: Arc<JobStore>,
    /// Immutable preset catalog loaded at startup.
    pub presets: Arc<PresetCatalog>,
    /// Render backend (real AIDP network or the in-process mock).
    pub provider: Arc<dyn RenderProvider>,
    /// Per-IP upload rate limiter.
    pub upload_limiter: Arc<RateLimiter>,
}
