use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{
    change_attempt_weight, declare_attempt, get_attempt, list_athlete_attempts,
    override_decision, record_decision, record_quick_decision,
};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/attempts", post(declare_attempt))
        .route("/attempts/:attempt_id/decisions", post(record_decision))
        .route("/attempts/:attempt_id/quick-decision", post(record_quick_decision))
        .route("/attempts/:attempt_id/jury-override", post(override_decision))
        .route("/attempts/:attempt_id/weight", put(change_attempt_weight))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/attempts/:attempt_id", get(get_attempt))
        .route("/athletes/:athlete_id/attempts", get(list_athlete_attempts))
        .merge(protected)
}
