use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use super::handlers::{
    apply_preset, dispose_timer, get_timer, pause_timer, reset_timer, start_timer,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/sessions/:session_id/timer/start", post(start_timer))
        .route("/sessions/:session_id/timer/pause", post(pause_timer))
        .route("/sessions/:session_id/timer/reset", post(reset_timer))
        .route("/sessions/:session_id/timer/preset", post(apply_preset))
        .route("/sessions/:session_id/timer", delete(dispose_timer))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/sessions/:session_id/timer", get(get_timer))
        .merge(protected)
}
