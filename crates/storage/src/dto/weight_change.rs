use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::attempt::validate_positive_weight;
use crate::models::LiftType;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateWeightChangeRequest {
    pub lift_type: LiftType,
    #[validate(custom(function = "validate_positive_weight"))]
    pub old_weight: Decimal,
    #[validate(custom(function = "validate_positive_weight"))]
    pub new_weight: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EffectiveWeightResponse {
    pub lift_type: LiftType,
    pub effective_weight: Decimal,
    pub approved_changes: usize,
}
