//! Hash-based proof of completion.
//!
//! A proof binds the uploaded asset, the scene parameters, and the
//! rendered output together with SHA-256 digests, so a verifier holding
//! the same inputs can recompute every hash and confirm the output was
//! produced for exactly this job.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::hashing::{sha256_file, sha256_hex};
use crate::preset::ScenePreset;

/// Render metadata recorded alongside the digests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofMetadata {
    pub preset_name: String,
    pub resolution: String,
    pub samples: u32,
    /// Wall-clock render time in seconds as reported by the backend.
    pub render_duration_secs: f64,
}

/// Proof document served as `proof.json` next to the rendered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProof {
    /// SHA-256 of the uploaded `.gltf` asset.
    pub asset_hash: String,
    /// SHA-256 of the canonical JSON form of the preset.
    pub scene_params_hash: String,
    /// SHA-256 of the rendered output bytes.
    pub output_hash: String,
    /// UTC completion timestamp, RFC 3339 with `Z` suffix.
    pub timestamp: String,
    /// Backend job id the render ran under.
    pub provider_job_id: String,
    pub metadata: ProofMetadata,
}

/// Canonical digest of a preset: compact JSON with sorted keys.
///
/// serde_json's default `Map` is BTreeMap-backed, so round-tripping
/// through `Value` sorts object keys deterministically.
pub fn scene_params_hash(preset: &ScenePreset) -> Result<String, CoreError> {
    let value = serde_json::to_value(preset)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize preset: {e}")))?;
    let canonical = serde_json::to_string(&value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize preset: {e}")))?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Build the proof for a completed render.
pub async fn build_proof(
    asset_path: &Path,
    preset: &ScenePreset,
    output_bytes: &[u8],
    provider_job_id: &str,
    resolution: &str,
    render_duration_secs: f64,
    completed_at: DateTime<Utc>,
) -> Result<RenderProof, CoreError> {
    let asset_hash = sha256_file(asset_path).await?;
    let scene_params_hash = scene_params_hash(preset)?;
    let output_hash = sha256_hex(output_bytes);

    Ok(RenderProof {
        asset_hash,
        scene_params_hash,
        output_hash,
        timestamp: completed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        provider_job_id: provider_job_id.to_string(),
        metadata: ProofMetadata {
            preset_name: preset.name.clone(),
            resolution: resolution.to_string(),
            samples: preset.samples,
            render_duration_secs,
        },
    })
}
