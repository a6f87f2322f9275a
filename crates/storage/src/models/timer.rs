use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StorageError;

/// What the session clock is currently counting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Attempt,
    Break,
    Jury,
}

impl TimerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attempt => "attempt",
            Self::Break => "break",
            Self::Jury => "jury",
        }
    }
}

/// IWF clock presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerPreset {
    FirstAttempt,
    SubsequentAttempt,
    Break,
    JuryDecision,
    TechnicalTimeout,
    WarmUp,
}

impl TimerPreset {
    pub fn duration_secs(&self) -> u32 {
        match self {
            Self::FirstAttempt => 60,
            Self::SubsequentAttempt => 120,
            Self::Break => 600,
            Self::JuryDecision => 600,
            Self::TechnicalTimeout => 180,
            Self::WarmUp => 300,
        }
    }

    pub fn mode(&self) -> TimerMode {
        match self {
            Self::FirstAttempt | Self::SubsequentAttempt => TimerMode::Attempt,
            Self::JuryDecision => TimerMode::Jury,
            Self::Break | Self::TechnicalTimeout | Self::WarmUp => TimerMode::Break,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstAttempt => "FIRST_ATTEMPT",
            Self::SubsequentAttempt => "SUBSEQUENT_ATTEMPT",
            Self::Break => "BREAK",
            Self::JuryDecision => "JURY_DECISION",
            Self::TechnicalTimeout => "TECHNICAL_TIMEOUT",
            Self::WarmUp => "WARM_UP",
        }
    }
}

impl std::str::FromStr for TimerPreset {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "FIRST_ATTEMPT" => Ok(Self::FirstAttempt),
            "SUBSEQUENT_ATTEMPT" => Ok(Self::SubsequentAttempt),
            "BREAK" => Ok(Self::Break),
            "JURY_DECISION" => Ok(Self::JuryDecision),
            "TECHNICAL_TIMEOUT" => Ok(Self::TechnicalTimeout),
            "WARM_UP" => Ok(Self::WarmUp),
            _ => Err(StorageError::InvalidValue(format!("Unknown timer preset: '{}'", s))),
        }
    }
}
