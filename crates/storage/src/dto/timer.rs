use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{TimerMode, TimerPreset};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct StartTimerRequest {
    #[validate(range(min = 1, max = 3600))]
    pub duration: Option<u32>,
    pub mode: Option<TimerMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ResetTimerRequest {
    #[validate(range(min = 1, max = 3600))]
    pub duration: u32,
    #[serde(default)]
    pub mode: TimerMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplyPresetRequest {
    pub preset: TimerPreset,
}
