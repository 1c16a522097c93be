use axum::routing::{get, post};
use axum::Router;

use crate::handlers::render;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/render", post(render::submit_render))
        .route("/status/{job_id}", get(render::get_status))
}
