use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use control::StandingsEntry;
use uuid::Uuid;

use crate::error::WebError;
use crate::state::AppState;

use super::services;

#[utoipa::path(
    get,
    path = "/api/sessions/{session_id}/standings",
    params(
        ("session_id" = Uuid, Path, description = "Session id")
    ),
    responses(
        (status = 200, description = "Ranked athletes first, then unranked by start number", body = Vec<StandingsEntry>),
        (status = 404, description = "Session not found")
    ),
    tag = "standings"
)]
pub async fn get_standings(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let standings = services::standings(&state, session_id).await?;

    Ok(Json(standings).into_response())
}
