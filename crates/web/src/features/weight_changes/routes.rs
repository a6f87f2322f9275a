use axum::{
    Router, middleware,
    routing::{get, post},
};

use super::handlers::{get_effective_weight, list_changes, request_change};
use crate::middleware::auth::{ApiKeys, require_auth};
use crate::state::AppState;

pub fn routes(api_keys: ApiKeys) -> Router<AppState> {
    let protected = Router::new()
        .route("/athletes/:athlete_id/weight-changes", post(request_change))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/athletes/:athlete_id/weight-changes", get(list_changes))
        .route("/athletes/:athlete_id/effective-weight", get(get_effective_weight))
        .merge(protected)
}
