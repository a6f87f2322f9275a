use chrono::Utc;
use control::events::LiftingOrderPayload;
use control::{DomainEvent, LiftingOrderEntry, LiftingPositions, Result};
use storage::models::LiftType;
use uuid::Uuid;

use crate::state::AppState;

pub async fn lifting_order(
    state: &AppState,
    session_id: Uuid,
    lift_type: LiftType,
) -> Result<Vec<LiftingOrderEntry>> {
    state.lifting_order.order(session_id, lift_type).await
}

pub async fn lifting_positions(
    state: &AppState,
    session_id: Uuid,
    lift_type: LiftType,
) -> Result<LiftingPositions> {
    state
        .lifting_order
        .current_lifting_positions(session_id, lift_type)
        .await
}

/// Recomputes the order after a mutation and announces it. The mutation has
/// already been committed, so a failure here is only logged.
pub async fn publish_lifting_order(state: &AppState, session_id: Uuid, lift_type: LiftType) {
    match state.lifting_order.order(session_id, lift_type).await {
        Ok(order) => state
            .events
            .publish(DomainEvent::LiftingOrderUpdated(LiftingOrderPayload {
                session_id,
                lift_type,
                order,
                at: Utc::now(),
            })),
        Err(e) => tracing::warn!(
            session_id = %session_id,
            lift_type = %lift_type,
            "Lifting order could not be recomputed: {}",
            e
        ),
    }
}
