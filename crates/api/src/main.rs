use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use proofrender_core::preset::PresetCatalog;
use proofrender_core::rate_limit::RateLimiter;
use proofrender_provider::aidp::AidpProvider;
use proofrender_provider::mock::MockAidpProvider;
use proofrender_provider::RenderProvider;

use proofrender_api::config::ServerConfig;
use proofrender_api::router::build_app_router;
use proofrender_api::state::AppState;
use proofrender_api::store::JobStore;
use proofrender_api::background;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "proofrender_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Job store ---
    let store = Arc::new(
        JobStore::open(&config.data_dir)
            .await
            .expect("Failed to create data directory"),
    );
    tracing::info!(data_dir = %store.base().display(), "Job store ready");

    // --- Presets ---
    let presets = match &config.presets_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("Cannot read presets file {}: {e}", path.display()));
            Arc::new(
                PresetCatalog::from_json(&json)
                    .unwrap_or_else(|e| panic!("Invalid presets file {}: {e}", path.display())),
            )
        }
        None => Arc::new(PresetCatalog::builtin()),
    };
    tracing::info!(presets = ?presets.names(), "Preset catalog loaded");

    // --- Render backend ---
    let provider: Arc<dyn RenderProvider> = if config.use_mock_aidp {
        Arc::new(MockAidpProvider::new())
    } else {
        Arc::new(AidpProvider::new(
            config.aidp_api_url.clone(),
            config.aidp_api_key.clone(),
        ))
    };
    tracing::info!(provider = provider.name(), mock = config.use_mock_aidp, "Render backend ready");

    // --- Rate limiting ---
    let upload_limiter = Arc::new(RateLimiter::new(
        config.rate_limit_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));

    // --- Cleanup sweep ---
    let cleanup_cancel = tokio_util::sync::CancellationToken::new();
    let cleanup_handle = tokio::spawn(background::cleanup::run(
        Arc::clone(&store),
        cleanup_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        presets,
        provider,
        upload_limiter,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    // Connect info feeds the per-IP upload rate limit for direct clients.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cleanup_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), cleanup_handle).await;
    tracing::info!("Cleanup job stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
