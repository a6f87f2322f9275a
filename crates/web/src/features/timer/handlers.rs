use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use control::TimerSnapshot;
use storage::dto::timer::{ApplyPresetRequest, ResetTimerRequest, StartTimerRequest};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/timer",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Current clock state", body = TimerSnapshot),
        (status = 404, description = "Session not found")
    ),
    tag = "timer"
)]
pub async fn get_timer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let snapshot = services::snapshot(&state, session_id).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/timer/start",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    request_body = StartTimerRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Clock running; unchanged if it already was", body = TimerSnapshot),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "timer"
)]
pub async fn start_timer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<StartTimerRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let snapshot = services::start(&state, session_id, &req).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/timer/pause",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Clock paused", body = TimerSnapshot),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "timer"
)]
pub async fn pause_timer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let snapshot = services::pause(&state, session_id).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/timer/reset",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    request_body = ResetTimerRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Clock re-armed and stopped", body = TimerSnapshot),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "timer"
)]
pub async fn reset_timer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ResetTimerRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let snapshot = services::reset(&state, session_id, &req).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    post,
    path = "/api/sessions/{session_id}/timer/preset",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    request_body = ApplyPresetRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Clock re-armed with the preset duration", body = TimerSnapshot),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Session not found")
    ),
    tag = "timer"
)]
pub async fn apply_preset(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<ApplyPresetRequest>,
) -> Result<Response, WebError> {
    let snapshot = services::apply_preset(&state, session_id, &req).await?;

    Ok(Json(snapshot).into_response())
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{session_id}/timer",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Clock stopped and removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No clock for this session")
    ),
    tag = "timer"
)]
pub async fn dispose_timer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, WebError> {
    services::dispose(&state, session_id).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}
