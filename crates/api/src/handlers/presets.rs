//! Handler for listing the built-in scene presets.

use axum::extract::State;
use axum::Json;

use proofrender_core::preset::ScenePreset;

use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/presets
pub async fn list_presets(
    State(state): State<AppState>,
) -> Json<DataResponse<Vec<ScenePreset>>> {
    Json(DataResponse {
        data: state.presets.presets.clone(),
    })
}
