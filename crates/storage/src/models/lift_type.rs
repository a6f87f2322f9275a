use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StorageError;

/// The two contested lifts. Every athlete gets three attempts on each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LiftType {
    Snatch,
    CleanAndJerk,
}

impl LiftType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Snatch => "snatch",
            Self::CleanAndJerk => "clean_and_jerk",
        }
    }

    pub fn all() -> &'static [LiftType] {
        &[Self::Snatch, Self::CleanAndJerk]
    }

    fn parse_str(s: &str) -> Result<Self, StorageError> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "snatch" => Ok(Self::Snatch),
            "clean_and_jerk" | "cleanandjerk" | "c&j" => Ok(Self::CleanAndJerk),
            _ => Err(StorageError::InvalidValue(format!(
                "Unknown lift type: '{}'. Expected snatch or clean_and_jerk",
                s
            ))),
        }
    }
}

impl std::str::FromStr for LiftType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl std::fmt::Display for LiftType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
