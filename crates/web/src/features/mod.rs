use axum::Router;

use crate::middleware::auth::ApiKeys;
use crate::state::AppState;

pub mod attempts;
pub mod lifting_order;
pub mod standings;
pub mod timer;
pub mod weight_changes;

pub fn api_routes(api_keys: ApiKeys) -> Router<AppState> {
    Router::new()
        .merge(attempts::routes::routes(api_keys.clone()))
        .merge(weight_changes::routes::routes(api_keys.clone()))
        .merge(timer::routes::routes(api_keys))
        .merge(lifting_order::routes::routes())
        .merge(standings::routes::routes())
}
