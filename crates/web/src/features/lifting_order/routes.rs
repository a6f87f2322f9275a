use axum::{Router, routing::get};

use super::handlers::{get_lifting_order, get_lifting_positions};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions/:session_id/lifting-order", get(get_lifting_order))
        .route("/sessions/:session_id/lifting-positions", get(get_lifting_positions))
}
