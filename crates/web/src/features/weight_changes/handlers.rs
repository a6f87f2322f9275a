use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::{
        attempt::LiftTypeQuery,
        weight_change::{CreateWeightChangeRequest, EffectiveWeightResponse},
    },
    models::WeightChangeRequest,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    post,
    path = "/api/athletes/{athlete_id}/weight-changes",
    params(
        ("athlete_id" = Uuid, Path, description = "Athlete id")
    ),
    request_body = CreateWeightChangeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Weight change approved", body = WeightChangeRequest),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Athlete not found"),
        (status = 409, description = "Change rejected by the weight change rules")
    ),
    tag = "weight-changes"
)]
pub async fn request_change(
    State(state): State<AppState>,
    Path(athlete_id): Path<Uuid>,
    Json(req): Json<CreateWeightChangeRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let change = services::request_change(&state, athlete_id, &req).await?;

    Ok((StatusCode::CREATED, Json(change)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/athletes/{athlete_id}/weight-changes",
    params(
        ("athlete_id" = Uuid, Path, description = "Athlete id"),
        LiftTypeQuery
    ),
    responses(
        (status = 200, description = "Approved changes, oldest first", body = Vec<WeightChangeRequest>),
        (status = 404, description = "Athlete not found")
    ),
    tag = "weight-changes"
)]
pub async fn list_changes(
    State(state): State<AppState>,
    Path(athlete_id): Path<Uuid>,
    Query(query): Query<LiftTypeQuery>,
) -> Result<Response, WebError> {
    let changes = services::list_changes(&state, athlete_id, query.lift_type).await?;

    Ok(Json(changes).into_response())
}

#[utoipa::path(
    get,
    path = "/api/athletes/{athlete_id}/effective-weight",
    params(
        ("athlete_id" = Uuid, Path, description = "Athlete id"),
        LiftTypeQuery
    ),
    responses(
        (status = 200, description = "Newest approved weight or the opening declaration", body = EffectiveWeightResponse),
        (status = 404, description = "Athlete not found")
    ),
    tag = "weight-changes"
)]
pub async fn get_effective_weight(
    State(state): State<AppState>,
    Path(athlete_id): Path<Uuid>,
    Query(query): Query<LiftTypeQuery>,
) -> Result<Response, WebError> {
    let effective = services::effective_weight(&state, athlete_id, query.lift_type).await?;

    Ok(Json(effective).into_response())
}
