use control::{Result, TimerHint, TimerSnapshot};
use serde::Serialize;
use storage::dto::attempt::{
    ChangeAttemptWeightRequest, DeclareAttemptRequest, JuryOverrideRequest, QuickDecisionRequest,
    RefereeDecisionRequest,
};
use storage::models::{Attempt, LiftType};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::lifting_order::services::publish_lifting_order;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct DeclarationResponse {
    pub attempt: Attempt,
    pub timer_hint: TimerHint,
    /// Clock after the hint was applied; absent when it could not be started.
    pub timer: Option<TimerSnapshot>,
}

/// Declares the attempt, then arms and starts the session clock from the
/// returned hint. A clock failure never fails the declaration.
pub async fn declare_attempt(
    state: &AppState,
    request: &DeclareAttemptRequest,
) -> Result<DeclarationResponse> {
    let declaration = state
        .attempts
        .declare_attempt(request.athlete_id, request.weight, request.lift_type)
        .await?;
    let session_id = declaration.attempt.session_id;

    let timer = match state
        .timers
        .apply_hint(session_id, &declaration.timer_hint)
        .await
    {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!(
                session_id = %session_id,
                attempt_id = %declaration.attempt.attempt_id,
                "Timer auto-start failed: {}",
                e
            );
            None
        }
    };

    publish_lifting_order(state, session_id, request.lift_type).await;

    Ok(DeclarationResponse {
        attempt: declaration.attempt,
        timer_hint: declaration.timer_hint,
        timer,
    })
}

pub async fn get_attempt(state: &AppState, attempt_id: Uuid) -> Result<Attempt> {
    state.attempts.attempt(attempt_id).await
}

pub async fn list_athlete_attempts(
    state: &AppState,
    athlete_id: Uuid,
    lift_type: LiftType,
) -> Result<Vec<Attempt>> {
    state.attempts.athlete_attempts(athlete_id, lift_type).await
}

pub async fn record_decision(
    state: &AppState,
    attempt_id: Uuid,
    request: &RefereeDecisionRequest,
) -> Result<Attempt> {
    let attempt = state
        .attempts
        .record_decision(attempt_id, request.position, request.decision)
        .await?;

    if !attempt.result.is_pending() {
        publish_lifting_order(state, attempt.session_id, attempt.lift_type).await;
    }

    Ok(attempt)
}

pub async fn record_quick_decision(
    state: &AppState,
    attempt_id: Uuid,
    request: &QuickDecisionRequest,
) -> Result<Attempt> {
    let attempt = state
        .attempts
        .record_quick_decision(attempt_id, request.decision)
        .await?;

    publish_lifting_order(state, attempt.session_id, attempt.lift_type).await;

    Ok(attempt)
}

pub async fn override_decision(
    state: &AppState,
    attempt_id: Uuid,
    request: &JuryOverrideRequest,
) -> Result<Attempt> {
    let attempt = state
        .attempts
        .override_decision(attempt_id, request.decision, &request.reason)
        .await?;

    publish_lifting_order(state, attempt.session_id, attempt.lift_type).await;

    Ok(attempt)
}

pub async fn change_attempt_weight(
    state: &AppState,
    attempt_id: Uuid,
    request: &ChangeAttemptWeightRequest,
) -> Result<Attempt> {
    let attempt = state
        .attempts
        .change_attempt_weight(attempt_id, request.weight)
        .await?;

    publish_lifting_order(state, attempt.session_id, attempt.lift_type).await;

    Ok(attempt)
}
