use axum::routing::get;
use axum::Router;

use crate::handlers::download;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/download/{job_id}", get(download::download_file))
}
