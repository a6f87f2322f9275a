use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::LiftType;
use crate::error::StorageError;

/// A binding verdict: either from a referee or from the jury.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Decision {
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "no-lift")]
    NoLift,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::NoLift => "no-lift",
        }
    }
}

impl std::str::FromStr for Decision {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "no-lift" | "no_lift" | "nolift" => Ok(Self::NoLift),
            other => Err(StorageError::InvalidValue(format!(
                "Unknown decision: '{}'. Expected good or no-lift",
                other
            ))),
        }
    }
}

/// Content of one referee slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum RefereeCall {
    #[default]
    #[serde(rename = "unset")]
    Unset,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "no-lift")]
    NoLift,
}

impl RefereeCall {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn as_db_value(&self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::Good => Some("good"),
            Self::NoLift => Some("no-lift"),
        }
    }

    pub fn from_db_value(value: Option<&str>) -> Result<Self, StorageError> {
        match value {
            None => Ok(Self::Unset),
            Some(v) => v.parse::<Decision>().map(Self::from),
        }
    }
}

impl From<Decision> for RefereeCall {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Good => Self::Good,
            Decision::NoLift => Self::NoLift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AttemptResult {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "good")]
    Good,
    #[serde(rename = "no-lift")]
    NoLift,
}

impl AttemptResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Good => "good",
            Self::NoLift => "no-lift",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<Decision> for AttemptResult {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Good => Self::Good,
            Decision::NoLift => Self::NoLift,
        }
    }
}

impl std::str::FromStr for AttemptResult {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            other => other.parse::<Decision>().map(Self::from),
        }
    }
}

impl std::fmt::Display for AttemptResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Referee chair, seen from the athlete facing the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RefereePosition {
    Left,
    Center,
    Right,
}

impl RefereePosition {
    pub fn all() -> &'static [RefereePosition] {
        &[Self::Left, Self::Center, Self::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// Lifecycle stage of an attempt.
///
/// `Resolved` is the in-memory stage where all three calls are in but the
/// result has not been written yet; finalization follows in the same call,
/// so a stored attempt is always `Declared`, `Finalized` or `Overridden`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AttemptState {
    Declared,
    Resolved,
    Finalized,
    Overridden,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub athlete_id: Uuid,
    pub session_id: Uuid,
    pub lift_type: LiftType,
    pub attempt_number: i16,
    pub weight: Decimal,
    pub referee_left: RefereeCall,
    pub referee_center: RefereeCall,
    pub referee_right: RefereeCall,
    pub result: AttemptResult,
    pub edit_count: i16,
    pub jury_decision: Option<Decision>,
    pub jury_reason: Option<String>,
    pub jury_overridden_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Attempt {
    pub fn new(
        athlete_id: Uuid,
        session_id: Uuid,
        lift_type: LiftType,
        attempt_number: i16,
        weight: Decimal,
    ) -> Self {
        let now = Utc::now();
        Self {
            attempt_id: Uuid::new_v4(),
            athlete_id,
            session_id,
            lift_type,
            attempt_number,
            weight,
            referee_left: RefereeCall::Unset,
            referee_center: RefereeCall::Unset,
            referee_right: RefereeCall::Unset,
            result: AttemptResult::Pending,
            edit_count: 0,
            jury_decision: None,
            jury_reason: None,
            jury_overridden_at: None,
            decided_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn referee_call(&self, position: RefereePosition) -> RefereeCall {
        match position {
            RefereePosition::Left => self.referee_left,
            RefereePosition::Center => self.referee_center,
            RefereePosition::Right => self.referee_right,
        }
    }

    pub fn set_referee_call(&mut self, position: RefereePosition, call: RefereeCall) {
        match position {
            RefereePosition::Left => self.referee_left = call,
            RefereePosition::Center => self.referee_center = call,
            RefereePosition::Right => self.referee_right = call,
        }
    }

    pub fn referee_calls(&self) -> [RefereeCall; 3] {
        [self.referee_left, self.referee_center, self.referee_right]
    }

    pub fn is_overridden(&self) -> bool {
        self.jury_decision.is_some()
    }

    pub fn state(&self) -> AttemptState {
        if self.is_overridden() {
            AttemptState::Overridden
        } else if self.result.is_pending() && self.referee_calls().iter().all(|c| c.is_set()) {
            AttemptState::Resolved
        } else if self.result.is_pending() {
            AttemptState::Declared
        } else {
            AttemptState::Finalized
        }
    }
}

/// Flat database row for `attempts`; enum columns are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptRow {
    pub attempt_id: Uuid,
    pub athlete_id: Uuid,
    pub session_id: Uuid,
    pub lift_type: String,
    pub attempt_number: i16,
    pub weight: Decimal,
    pub referee_left: Option<String>,
    pub referee_center: Option<String>,
    pub referee_right: Option<String>,
    pub result: String,
    pub edit_count: i16,
    pub jury_decision: Option<String>,
    pub jury_reason: Option<String>,
    pub jury_overridden_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AttemptRow> for Attempt {
    type Error = StorageError;

    fn try_from(row: AttemptRow) -> Result<Self, Self::Error> {
        Ok(Self {
            attempt_id: row.attempt_id,
            athlete_id: row.athlete_id,
            session_id: row.session_id,
            lift_type: row.lift_type.parse()?,
            attempt_number: row.attempt_number,
            weight: row.weight,
            referee_left: RefereeCall::from_db_value(row.referee_left.as_deref())?,
            referee_center: RefereeCall::from_db_value(row.referee_center.as_deref())?,
            referee_right: RefereeCall::from_db_value(row.referee_right.as_deref())?,
            result: row.result.parse()?,
            edit_count: row.edit_count,
            jury_decision: row.jury_decision.as_deref().map(str::parse).transpose()?,
            jury_reason: row.jury_reason,
            jury_overridden_at: row.jury_overridden_at,
            decided_at: row.decided_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Attempt {
        Attempt::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            LiftType::Snatch,
            1,
            Decimal::from(100),
        )
    }

    #[test]
    fn test_new_attempt_is_declared() {
        let attempt = sample();
        assert_eq!(attempt.state(), AttemptState::Declared);
        assert!(attempt.referee_calls().iter().all(|c| !c.is_set()));
    }

    #[test]
    fn test_state_follows_result_and_jury() {
        let mut attempt = sample();
        attempt.result = AttemptResult::Good;
        assert_eq!(attempt.state(), AttemptState::Finalized);

        attempt.jury_decision = Some(Decision::NoLift);
        attempt.result = AttemptResult::NoLift;
        assert_eq!(attempt.state(), AttemptState::Overridden);
    }

    #[test]
    fn test_all_calls_without_result_is_resolved() {
        let mut attempt = sample();
        for position in RefereePosition::all() {
            attempt.set_referee_call(*position, RefereeCall::Good);
        }
        assert_eq!(attempt.state(), AttemptState::Resolved);

        attempt.result = AttemptResult::Good;
        assert_eq!(attempt.state(), AttemptState::Finalized);
    }

    #[test]
    fn test_referee_slots_are_independent() {
        let mut attempt = sample();
        attempt.set_referee_call(RefereePosition::Center, RefereeCall::NoLift);
        assert_eq!(attempt.referee_left, RefereeCall::Unset);
        assert_eq!(attempt.referee_center, RefereeCall::NoLift);
        assert_eq!(attempt.referee_right, RefereeCall::Unset);
    }

    #[test]
    fn test_referee_call_db_mapping() {
        assert_eq!(RefereeCall::from_db_value(None).unwrap(), RefereeCall::Unset);
        assert_eq!(
            RefereeCall::from_db_value(Some("no-lift")).unwrap(),
            RefereeCall::NoLift
        );
        assert!(RefereeCall::from_db_value(Some("maybe")).is_err());
        assert_eq!(RefereeCall::Good.as_db_value(), Some("good"));
        assert_eq!(RefereeCall::Unset.as_db_value(), None);
    }
}
