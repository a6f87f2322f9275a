use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Decision, LiftType, RefereePosition};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeclareAttemptRequest {
    pub athlete_id: Uuid,
    pub lift_type: LiftType,
    #[validate(custom(function = "validate_positive_weight"))]
    pub weight: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefereeDecisionRequest {
    pub position: RefereePosition,
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuickDecisionRequest {
    pub decision: Decision,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JuryOverrideRequest {
    pub decision: Decision,
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ChangeAttemptWeightRequest {
    #[validate(custom(function = "validate_positive_weight"))]
    pub weight: Decimal,
}

/// Selects one lift type on session-scoped queries
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LiftTypeQuery {
    pub lift_type: LiftType,
}

pub(crate) fn validate_positive_weight(weight: &Decimal) -> Result<(), validator::ValidationError> {
    if weight.is_sign_positive() && !weight.is_zero() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("non_positive_weight"))
    }
}
