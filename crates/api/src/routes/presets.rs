use axum::routing::get;
use axum::Router;

use crate::handlers::presets;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/presets", get(presets::list_presets))
}
