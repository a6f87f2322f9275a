use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use control::{LiftingOrderEntry, LiftingPositions};
use storage::dto::attempt::LiftTypeQuery;
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/lifting-order",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
        LiftTypeQuery
    ),
    responses(
        (status = 200, description = "Athletes in the order they must lift", body = Vec<LiftingOrderEntry>),
        (status = 404, description = "Session not found")
    ),
    tag = "lifting-order"
)]
pub async fn get_lifting_order(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<LiftTypeQuery>,
) -> Result<Response, WebError> {
    let order = services::lifting_order(&state, session_id, query.lift_type).await?;

    Ok(Json(order).into_response())
}

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/lifting-positions",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
        LiftTypeQuery
    ),
    responses(
        (status = 200, description = "Current lifter, on deck and in the hole", body = LiftingPositions),
        (status = 404, description = "Session not found")
    ),
    tag = "lifting-order"
)]
pub async fn get_lifting_positions(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Query(query): Query<LiftTypeQuery>,
) -> Result<Response, WebError> {
    let positions = services::lifting_positions(&state, session_id, query.lift_type).await?;

    Ok(Json(positions).into_response())
}
