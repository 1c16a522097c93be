//! Scene preset catalog.
//!
//! A preset is a named, immutable bundle of renderer parameters (camera,
//! lighting, environment, sampling). The catalog is loaded once at
//! startup, either from the compiled-in default or from a JSON file on
//! disk, and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Compiled-in catalog shipped with the service.
const BUILTIN_PRESETS: &str = include_str!("../presets.json");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// One light source in a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LightConfig {
    /// Light type: `POINT`, `SUN`, `SPOT`, or `AREA`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Position; not meaningful for `SUN` lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Vector3>,
    /// Rotation in degrees; used by `SUN` and `SPOT` lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vector3>,
    /// Intensity in renderer units.
    pub energy: f64,
    /// Hex color string, e.g. `#ffffff`.
    pub color: String,
    /// Beam width for `SPOT` lights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

/// A complete named scene configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePreset {
    /// Unique identifier used in render submissions (`studio`, `sunset`, ...).
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub camera_position: Vector3,
    /// Camera rotation in Euler angles, degrees.
    pub camera_rotation: Vector3,
    /// World background color as a hex string.
    pub background_color: String,
    pub lights: Vec<LightConfig>,
    /// Render sample count (quality vs. speed).
    #[serde(default = "default_samples")]
    pub samples: u32,
    /// Reference color temperature in Kelvin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<u32>,
}

fn default_samples() -> u32 {
    128
}

/// The immutable set of presets known to this deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetCatalog {
    pub presets: Vec<ScenePreset>,
}

impl PresetCatalog {
    /// Parse a catalog from JSON, rejecting empty or duplicate entries.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let catalog: PresetCatalog = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid preset catalog: {e}")))?;

        if catalog.presets.is_empty() {
            return Err(CoreError::Validation(
                "Preset catalog must contain at least one preset".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for preset in &catalog.presets {
            if preset.name.is_empty() {
                return Err(CoreError::Validation(
                    "Preset name must not be empty".to_string(),
                ));
            }
            if !seen.insert(preset.name.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate preset name: {}",
                    preset.name
                )));
            }
        }

        Ok(catalog)
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Self {
        // The embedded catalog is validated by tests; a parse failure here
        // is a build defect.
        Self::from_json(BUILTIN_PRESETS).expect("embedded presets.json is invalid")
    }

    /// Look up a preset by name.
    pub fn get(&self, name: &str) -> Option<&ScenePreset> {
        self.presets.iter().find(|p| p.name == name)
    }

    /// All preset names, in catalog order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.iter().map(|p| p.name.as_str()).collect()
    }

    /// Validate that `name` names a known preset.
    pub fn require(&self, name: &str) -> Result<&ScenePreset, CoreError> {
        self.get(name).ok_or_else(|| {
            CoreError::Validation(format!(
                "Invalid preset '{name}'. Valid presets: {}",
                self.names().join(", ")
            ))
        })
    }
}
