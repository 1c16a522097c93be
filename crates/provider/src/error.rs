/// Errors from the render backend layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned a non-2xx status code.
    #[error("Render backend error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The backend has no record of this job id.
    #[error("Provider job not found: {0}")]
    JobNotFound(String),

    /// The submission was rejected before reaching the backend
    /// (missing asset file, malformed input).
    #[error("Invalid render submission: {0}")]
    InvalidRequest(String),
}
