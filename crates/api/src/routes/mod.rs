pub mod download;
pub mod health;
pub mod presets;
pub mod render;
pub mod upload;

use axum::Router;

use crate::state::AppState;

/// All routes nested under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(upload::router())
        .merge(render::router())
        .merge(download::router())
        .merge(presets::router())
}
