//! HTTP client for the AIDP GPU rendering network.
//!
//! The network's public contract is a small bearer-authed JSON REST API:
//! `POST /v1/jobs` submits a render (multipart: asset file + scene
//! parameters), `GET /v1/jobs/{id}` reports status, and
//! `GET /v1/jobs/{id}/result` returns the rendered bytes once complete.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use proofrender_core::preset::ScenePreset;

use crate::error::ProviderError;
use crate::{ProviderStatus, RenderProvider};

/// HTTP client for a single AIDP endpoint.
pub struct AidpApi {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

/// Response returned by `POST /v1/jobs` after queuing a render.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AidpSubmitResponse {
    /// Network-assigned identifier for the queued render.
    pub job_id: String,
}

impl AidpApi {
    /// Create a new API client.
    ///
    /// * `api_url` - Base HTTP URL, e.g. `https://api.aidp.store`.
    /// * `api_key` - Bearer token for authentication.
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String, api_key: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
        }
    }

    /// Submit a render job.
    ///
    /// Uploads the asset and the scene parameters in one multipart
    /// request and returns the network-assigned job id.
    pub async fn submit_job(
        &self,
        job_id: Uuid,
        asset_path: &Path,
        preset: &ScenePreset,
    ) -> Result<AidpSubmitResponse, ProviderError> {
        let asset = tokio::fs::read(asset_path).await.map_err(|e| {
            ProviderError::InvalidRequest(format!(
                "Cannot read asset {}: {e}",
                asset_path.display()
            ))
        })?;

        let scene_params = serde_json::to_string(preset)
            .map_err(|e| ProviderError::InvalidRequest(format!("Unserializable preset: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("jobId", job_id.to_string())
            .text("sceneParams", scene_params)
            .part(
                "asset",
                reqwest::multipart::Part::bytes(asset)
                    .file_name("asset.gltf")
                    .mime_str("model/gltf+json")?,
            );

        let response = self
            .client
            .post(format!("{}/v1/jobs", self.api_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Retrieve the current status of a render job.
    pub async fn get_status(&self, provider_job_id: &str) -> Result<ProviderStatus, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/jobs/{provider_job_id}", self.api_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Download the rendered output for a completed job.
    pub async fn get_result(&self, provider_job_id: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self
            .client
            .get(format!("{}/v1/jobs/{provider_job_id}/result", self.api_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or [`ProviderError::Api`] carrying
    /// the status and body text on failure. A 404 becomes
    /// [`ProviderError::JobNotFound`].
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            let url = response.url().path().to_string();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(ProviderError::JobNotFound(url));
            }
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

/// [`RenderProvider`] backed by the real AIDP network.
pub struct AidpProvider {
    api: AidpApi,
}

impl AidpProvider {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            api: AidpApi::new(api_url, api_key),
        }
    }
}

#[async_trait]
impl RenderProvider for AidpProvider {
    fn name(&self) -> &'static str {
        "aidp"
    }

    async fn submit(
        &self,
        job_id: Uuid,
        asset_path: &Path,
        preset: &ScenePreset,
    ) -> Result<String, ProviderError> {
        let response = self.api.submit_job(job_id, asset_path, preset).await?;
        tracing::info!(
            %job_id,
            provider_job_id = %response.job_id,
            preset = %preset.name,
            "Render submitted to AIDP network"
        );
        Ok(response.job_id)
    }

    async fn status(&self, provider_job_id: &str) -> Result<ProviderStatus, ProviderError> {
        self.api.get_status(provider_job_id).await
    }

    async fn result(&self, provider_job_id: &str) -> Result<Option<Vec<u8>>, ProviderError> {
        let status = self.api.get_status(provider_job_id).await?;
        if !matches!(status.state, crate::ProviderJobState::Complete) {
            return Ok(None);
        }
        Ok(Some(self.api.get_result(provider_job_id).await?))
    }
}
