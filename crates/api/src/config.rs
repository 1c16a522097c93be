use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Root directory for uploads, job metadata, and outputs.
    pub data_dir: PathBuf,
    /// Optional path to a preset catalog JSON file; the compiled-in
    /// catalog is used when unset.
    pub presets_path: Option<PathBuf>,
    /// Maximum accepted upload size in bytes (default: 10 MiB).
    pub max_upload_bytes: u64,
    /// Job time-to-live; expired job directories are swept.
    pub file_ttl_hours: i64,
    /// Uploads allowed per client per rate-limit window.
    pub rate_limit_requests: usize,
    /// Rate-limit window in seconds.
    pub rate_limit_window_secs: u64,
    /// Interval between provider status polls while a job renders.
    pub poll_interval_secs: u64,
    /// Maximum wall-clock time a render may take before the job is failed.
    pub render_timeout_secs: u64,
    /// Output resolution recorded in proofs.
    pub render_resolution: String,
    /// AIDP network base URL.
    pub aidp_api_url: String,
    /// AIDP network API key.
    pub aidp_api_key: String,
    /// Use the in-process mock backend instead of the real network.
    pub use_mock_aidp: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default                 |
    /// |---------------------------|-------------------------|
    /// | `HOST`                    | `0.0.0.0`               |
    /// | `PORT`                    | `3000`                  |
    /// | `CORS_ORIGINS`            | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`    | `30`                    |
    /// | `DATA_DIR`                | `/tmp/proofrender`      |
    /// | `PRESETS_PATH`            | (built-in catalog)      |
    /// | `MAX_UPLOAD_BYTES`        | `10485760`              |
    /// | `FILE_TTL_HOURS`          | `24`                    |
    /// | `RATE_LIMIT_REQUESTS`     | `10`                    |
    /// | `RATE_LIMIT_WINDOW_SECS`  | `3600`                  |
    /// | `POLL_INTERVAL_SECS`      | `2`                     |
    /// | `RENDER_TIMEOUT_SECS`     | `300`                   |
    /// | `RENDER_RESOLUTION`       | `1024x1024`             |
    /// | `AIDP_API_URL`            | `https://api.aidp.store`|
    /// | `AIDP_API_KEY`            | (empty)                 |
    /// | `USE_MOCK_AIDP`           | `true`                  |
    pub fn from_env() -> Self {
        Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", 3000),
            cors_origins: env_or("CORS_ORIGINS", "http://localhost:5173")
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30),
            data_dir: PathBuf::from(env_or("DATA_DIR", "/tmp/proofrender")),
            presets_path: std::env::var("PRESETS_PATH").ok().map(PathBuf::from),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            file_ttl_hours: parse_env("FILE_TTL_HOURS", 24),
            rate_limit_requests: parse_env("RATE_LIMIT_REQUESTS", 10),
            rate_limit_window_secs: parse_env("RATE_LIMIT_WINDOW_SECS", 3600),
            poll_interval_secs: parse_env("POLL_INTERVAL_SECS", 2),
            render_timeout_secs: parse_env("RENDER_TIMEOUT_SECS", 300),
            render_resolution: env_or("RENDER_RESOLUTION", "1024x1024"),
            aidp_api_url: env_or("AIDP_API_URL", "https://api.aidp.store"),
            aidp_api_key: env_or("AIDP_API_KEY", ""),
            use_mock_aidp: env_or("USE_MOCK_AIDP", "true")
                .eq_ignore_ascii_case("true"),
        }
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid value, got '{value}'")),
        Err(_) => default,
    }
}
