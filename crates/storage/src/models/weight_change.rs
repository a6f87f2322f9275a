use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::LiftType;
use crate::error::StorageError;

/// An approved raise of an athlete's declared weight for one lift type.
/// Rejected requests are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeightChangeRequest {
    pub request_id: Uuid,
    pub athlete_id: Uuid,
    pub session_id: Uuid,
    pub lift_type: LiftType,
    pub old_weight: Decimal,
    pub new_weight: Decimal,
    pub requested_at: DateTime<Utc>,
}

impl WeightChangeRequest {
    pub fn new(
        athlete_id: Uuid,
        session_id: Uuid,
        lift_type: LiftType,
        old_weight: Decimal,
        new_weight: Decimal,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            athlete_id,
            session_id,
            lift_type,
            old_weight,
            new_weight,
            requested_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WeightChangeRow {
    pub request_id: Uuid,
    pub athlete_id: Uuid,
    pub session_id: Uuid,
    pub lift_type: String,
    pub old_weight: Decimal,
    pub new_weight: Decimal,
    pub requested_at: DateTime<Utc>,
}

impl TryFrom<WeightChangeRow> for WeightChangeRequest {
    type Error = StorageError;

    fn try_from(row: WeightChangeRow) -> Result<Self, Self::Error> {
        Ok(Self {
            request_id: row.request_id,
            athlete_id: row.athlete_id,
            session_id: row.session_id,
            lift_type: row.lift_type.parse()?,
            old_weight: row.old_weight,
            new_weight: row.new_weight,
            requested_at: row.requested_at,
        })
    }
}
