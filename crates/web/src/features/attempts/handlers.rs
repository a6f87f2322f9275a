use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::{
    dto::attempt::{
        ChangeAttemptWeightRequest, DeclareAttemptRequest, JuryOverrideRequest, LiftTypeQuery,
        QuickDecisionRequest, RefereeDecisionRequest,
    },
    models::Attempt,
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services::{self, DeclarationResponse};

#[utoipa::path(
    post,
    path = "/api/attempts",
    request_body = DeclareAttemptRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Attempt declared and session clock armed", body = DeclarationResponse),
        (status = 400, description = "Invalid weight"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Athlete not found"),
        (status = 409, description = "Attempt not allowed by the competition rules")
    ),
    tag = "attempts"
)]
pub async fn declare_attempt(
    State(state): State<AppState>,
    Json(req): Json<DeclareAttemptRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let declaration = services::declare_attempt(&state, &req).await?;

    Ok((StatusCode::CREATED, Json(declaration)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/attempts/{attempt_id}",
    params(
        ("attempt_id" = Uuid, Path, description = "Attempt id")
    ),
    responses(
        (status = 200, description = "Attempt found", body = Attempt),
        (status = 404, description = "Attempt not found")
    ),
    tag = "attempts"
)]
pub async fn get_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let attempt = services::get_attempt(&state, attempt_id).await?;

    Ok(Json(attempt).into_response())
}

#[utoipa::path(
    get,
    path = "/api/athletes/{athlete_id}/attempts",
    params(
        ("athlete_id" = Uuid, Path, description = "Athlete id"),
        LiftTypeQuery
    ),
    responses(
        (status = 200, description = "Attempts of the athlete on one lift", body = Vec<Attempt>),
        (status = 404, description = "Athlete not found")
    ),
    tag = "attempts"
)]
pub async fn list_athlete_attempts(
    State(state): State<AppState>,
    Path(athlete_id): Path<Uuid>,
    Query(query): Query<LiftTypeQuery>,
) -> Result<Response, WebError> {
    let attempts = services::list_athlete_attempts(&state, athlete_id, query.lift_type).await?;

    Ok(Json(attempts).into_response())
}

#[utoipa::path(
    post,
    path = "/api/attempts/{attempt_id}/decisions",
    params(
        ("attempt_id" = Uuid, Path, description = "Attempt id")
    ),
    request_body = RefereeDecisionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Call recorded; result set once all three referees have called", body = Attempt),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Attempt already finalized or overridden")
    ),
    tag = "attempts"
)]
pub async fn record_decision(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<RefereeDecisionRequest>,
) -> Result<Response, WebError> {
    let attempt = services::record_decision(&state, attempt_id, &req).await?;

    Ok(Json(attempt).into_response())
}

#[utoipa::path(
    post,
    path = "/api/attempts/{attempt_id}/quick-decision",
    params(
        ("attempt_id" = Uuid, Path, description = "Attempt id")
    ),
    request_body = QuickDecisionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All three calls set and attempt finalized", body = Attempt),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Attempt already finalized or overridden")
    ),
    tag = "attempts"
)]
pub async fn record_quick_decision(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<QuickDecisionRequest>,
) -> Result<Response, WebError> {
    let attempt = services::record_quick_decision(&state, attempt_id, &req).await?;

    Ok(Json(attempt).into_response())
}

#[utoipa::path(
    post,
    path = "/api/attempts/{attempt_id}/jury-override",
    params(
        ("attempt_id" = Uuid, Path, description = "Attempt id")
    ),
    request_body = JuryOverrideRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Jury decision recorded", body = Attempt),
        (status = 400, description = "Missing reason"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Attempt already overridden")
    ),
    tag = "attempts"
)]
pub async fn override_decision(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<JuryOverrideRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let attempt = services::override_decision(&state, attempt_id, &req).await?;

    Ok(Json(attempt).into_response())
}

#[utoipa::path(
    put,
    path = "/api/attempts/{attempt_id}/weight",
    params(
        ("attempt_id" = Uuid, Path, description = "Attempt id")
    ),
    request_body = ChangeAttemptWeightRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Declared weight raised", body = Attempt),
        (status = 400, description = "Invalid weight"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Attempt not found"),
        (status = 409, description = "Change not allowed by the weight change rules")
    ),
    tag = "attempts"
)]
pub async fn change_attempt_weight(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<ChangeAttemptWeightRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let attempt = services::change_attempt_weight(&state, attempt_id, &req).await?;

    Ok(Json(attempt).into_response())
}
