use control::Result;
use storage::dto::weight_change::{CreateWeightChangeRequest, EffectiveWeightResponse};
use storage::models::{LiftType, WeightChangeRequest};
use uuid::Uuid;

use crate::features::lifting_order::services::publish_lifting_order;
use crate::state::AppState;

/// Approves a raise and republishes the order it may have changed.
pub async fn request_change(
    state: &AppState,
    athlete_id: Uuid,
    request: &CreateWeightChangeRequest,
) -> Result<WeightChangeRequest> {
    let change = state
        .weight_changes
        .request_change(
            athlete_id,
            request.lift_type,
            request.old_weight,
            request.new_weight,
        )
        .await?;

    publish_lifting_order(state, change.session_id, change.lift_type).await;

    Ok(change)
}

pub async fn list_changes(
    state: &AppState,
    athlete_id: Uuid,
    lift_type: LiftType,
) -> Result<Vec<WeightChangeRequest>> {
    state
        .weight_changes
        .approved_changes(athlete_id, lift_type)
        .await
}

pub async fn effective_weight(
    state: &AppState,
    athlete_id: Uuid,
    lift_type: LiftType,
) -> Result<EffectiveWeightResponse> {
    let effective_weight = state
        .weight_changes
        .effective_weight(athlete_id, lift_type)
        .await?;
    let approved = list_changes(state, athlete_id, lift_type).await?;

    Ok(EffectiveWeightResponse {
        lift_type,
        effective_weight,
        approved_changes: approved.len(),
    })
}
