//! Upload validation for `.gltf` assets.
//!
//! glTF (JSON flavour, not GLB) is the only accepted interchange format.
//! The structure check is intentionally shallow: the file must parse as
//! JSON and declare at least one scene and one node. Deeper validation is
//! the renderer's job.

use crate::error::CoreError;

/// Content types accepted for `.gltf` uploads. Browsers and CLI clients
/// disagree on what to send, so generic fallbacks are allowed; the
/// structure check is the real gate.
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "model/gltf+json",
    "application/json",
    "application/octet-stream",
];

/// Summary of a structurally valid glTF document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GltfSummary {
    pub scene_count: usize,
    pub node_count: usize,
}

/// Validate the uploaded file name: present, with a `.gltf` extension.
pub fn validate_filename(filename: &str) -> Result<(), CoreError> {
    if filename.is_empty() {
        return Err(CoreError::Validation(
            "No file name provided. Please upload a .gltf file.".to_string(),
        ));
    }
    if !filename.to_ascii_lowercase().ends_with(".gltf") {
        return Err(CoreError::Validation(
            "Invalid file format. Only .gltf files are supported.".to_string(),
        ));
    }
    Ok(())
}

/// Validate the multipart content type, if the client sent one.
pub fn validate_content_type(content_type: Option<&str>) -> Result<(), CoreError> {
    match content_type {
        None | Some("") => Ok(()),
        Some(ct) if ACCEPTED_CONTENT_TYPES.contains(&ct) => Ok(()),
        Some(ct) => Err(CoreError::Validation(format!(
            "Invalid content type. Expected model/gltf+json, got {ct}"
        ))),
    }
}

/// Validate the glTF document structure: parseable JSON with non-empty
/// `scenes` and `nodes` arrays.
pub fn validate_structure(bytes: &[u8]) -> Result<GltfSummary, CoreError> {
    let doc: serde_json::Value = serde_json::from_slice(bytes)
        .map_err(|e| CoreError::Validation(format!("Corrupted .gltf file: {e}")))?;

    let scene_count = doc
        .get("scenes")
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0);
    if scene_count == 0 {
        return Err(CoreError::Validation(
            "Invalid .gltf file: No scenes found".to_string(),
        ));
    }

    let node_count = doc
        .get("nodes")
        .and_then(|v| v.as_array())
        .map(|a| a.len())
        .unwrap_or(0);
    if node_count == 0 {
        return Err(CoreError::Validation(
            "Invalid .gltf file: No nodes found".to_string(),
        ));
    }

    Ok(GltfSummary {
        scene_count,
        node_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal structurally valid glTF document for tests.
    pub const MINIMAL_GLTF: &str = r#"{
        "asset": {"version": "2.0"},
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "cube"}]
    }"#;

    #[test]
    fn filename_requires_gltf_extension() {
        assert!(validate_filename("cube.gltf").is_ok());
        assert!(validate_filename("CUBE.GLTF").is_ok());
        assert!(validate_filename("cube.glb").is_err());
        assert!(validate_filename("cube").is_err());
        assert!(validate_filename("").is_err());
    }

    #[test]
    fn content_type_accepts_known_and_missing() {
        assert!(validate_content_type(Some("model/gltf+json")).is_ok());
        assert!(validate_content_type(Some("application/json")).is_ok());
        assert!(validate_content_type(None).is_ok());
        assert!(validate_content_type(Some("")).is_ok());
        assert!(validate_content_type(Some("image/png")).is_err());
    }

    #[test]
    fn valid_document_passes() {
        let summary = validate_structure(MINIMAL_GLTF.as_bytes()).unwrap();
        assert_eq!(summary.scene_count, 1);
        assert_eq!(summary.node_count, 1);
    }

    #[test]
    fn non_json_is_rejected() {
        let err = validate_structure(b"not json at all").unwrap_err();
        assert!(err.to_string().contains("Corrupted"));
    }

    #[test]
    fn missing_scenes_is_rejected() {
        let doc = r#"{"asset": {"version": "2.0"}, "nodes": [{}]}"#;
        let err = validate_structure(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No scenes"));
    }

    #[test]
    fn empty_nodes_is_rejected() {
        let doc = r#"{"scenes": [{"nodes": []}], "nodes": []}"#;
        let err = validate_structure(doc.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No nodes"));
    }
}
