use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use proofrender_core::error::CoreError;
use proofrender_provider::ProviderError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and [`ProviderError`] for render
/// backend failures, and adds HTTP-specific variants. Implements
/// [`IntoResponse`] to produce consistent `{error, code}` JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `proofrender_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A render backend error.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upload exceeds the configured size cap.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Download requested before the job reached `complete`.
    #[error("Job not ready: current status {status}")]
    NotReady { status: String },

    /// Download requested for a job whose render failed.
    #[error("Render failed: {0}")]
    RenderFailed(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(format!("I/O error: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
                CoreError::RateLimited(msg) => {
                    (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", msg.clone())
                }
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- Render backend errors ---
            AppError::Provider(provider) => classify_provider_error(provider),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "FILE_TOO_LARGE", msg.clone())
            }
            AppError::NotReady { status } => (
                StatusCode::CONFLICT,
                "NOT_READY",
                format!("Job is still processing. Current status: {status}"),
            ),
            AppError::RenderFailed(msg) => (
                StatusCode::NOT_FOUND,
                "RENDER_FAILED",
                format!("Render failed: {msg}. File not available."),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a provider error into an HTTP status, error code, and message.
///
/// - An unreachable backend or a backend-side 5xx maps to 502 with a
///   sanitized message.
/// - An unknown provider job id maps to 404.
/// - Rejected submissions map to 400.
fn classify_provider_error(err: &ProviderError) -> (StatusCode, &'static str, String) {
    match err {
        ProviderError::Request(e) => {
            tracing::error!(error = %e, "Render backend unreachable");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAVAILABLE",
                "Render backend is unreachable".to_string(),
            )
        }
        ProviderError::Api { status, body } => {
            tracing::error!(status, body = %body, "Render backend error");
            (
                StatusCode::BAD_GATEWAY,
                "UPSTREAM_UNAVAILABLE",
                "Render backend returned an error".to_string(),
            )
        }
        ProviderError::JobNotFound(id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Provider job not found: {id}"),
        ),
        ProviderError::InvalidRequest(msg) => {
            (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone())
        }
    }
}
