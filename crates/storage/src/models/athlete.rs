use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use super::LiftType;
use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// Medal awarded for a final rank, if any.
    pub fn for_rank(rank: i32) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gold => "gold",
            Self::Silver => "silver",
            Self::Bronze => "bronze",
        }
    }
}

impl std::str::FromStr for Medal {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gold" => Ok(Self::Gold),
            "silver" => Ok(Self::Silver),
            "bronze" => Ok(Self::Bronze),
            other => Err(StorageError::InvalidValue(format!("Unknown medal: '{}'", other))),
        }
    }
}

/// An athlete entered in one competition session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Athlete {
    pub athlete_id: Uuid,
    pub session_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub bodyweight: Option<Decimal>,
    pub lot_number: Option<i32>,
    pub start_number: i32,
    pub opening_snatch: Decimal,
    pub opening_clean_and_jerk: Decimal,
    pub weighed_in: bool,
    pub is_disqualified: bool,
    pub disqualified_reason: Option<String>,
    pub best_snatch: Option<Decimal>,
    pub best_clean_and_jerk: Option<Decimal>,
    pub total: Option<Decimal>,
    pub rank: Option<i32>,
    pub medal: Option<Medal>,
    pub created_at: DateTime<Utc>,
}

impl Athlete {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Opening declaration made before the session started.
    pub fn opening_weight(&self, lift_type: LiftType) -> Decimal {
        match lift_type {
            LiftType::Snatch => self.opening_snatch,
            LiftType::CleanAndJerk => self.opening_clean_and_jerk,
        }
    }

    pub fn best_lift(&self, lift_type: LiftType) -> Option<Decimal> {
        match lift_type {
            LiftType::Snatch => self.best_snatch,
            LiftType::CleanAndJerk => self.best_clean_and_jerk,
        }
    }

    pub fn set_best_lift(&mut self, lift_type: LiftType, weight: Option<Decimal>) {
        match lift_type {
            LiftType::Snatch => self.best_snatch = weight,
            LiftType::CleanAndJerk => self.best_clean_and_jerk = weight,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct AthleteRow {
    pub athlete_id: Uuid,
    pub session_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub bodyweight: Option<Decimal>,
    pub lot_number: Option<i32>,
    pub start_number: i32,
    pub opening_snatch: Decimal,
    pub opening_clean_and_jerk: Decimal,
    pub weighed_in: bool,
    pub is_disqualified: bool,
    pub disqualified_reason: Option<String>,
    pub best_snatch: Option<Decimal>,
    pub best_clean_and_jerk: Option<Decimal>,
    pub total: Option<Decimal>,
    pub rank: Option<i32>,
    pub medal: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<AthleteRow> for Athlete {
    type Error = StorageError;

    fn try_from(row: AthleteRow) -> Result<Self, Self::Error> {
        Ok(Self {
            athlete_id: row.athlete_id,
            session_id: row.session_id,
            first_name: row.first_name,
            last_name: row.last_name,
            gender: row.gender,
            bodyweight: row.bodyweight,
            lot_number: row.lot_number,
            start_number: row.start_number,
            opening_snatch: row.opening_snatch,
            opening_clean_and_jerk: row.opening_clean_and_jerk,
            weighed_in: row.weighed_in,
            is_disqualified: row.is_disqualified,
            disqualified_reason: row.disqualified_reason,
            best_snatch: row.best_snatch,
            best_clean_and_jerk: row.best_clean_and_jerk,
            total: row.total,
            rank: row.rank,
            medal: row.medal.as_deref().map(str::parse).transpose()?,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_medal_for_rank() {
        assert_eq!(Medal::for_rank(1), Some(Medal::Gold));
        assert_eq!(Medal::for_rank(2), Some(Medal::Silver));
        assert_eq!(Medal::for_rank(3), Some(Medal::Bronze));
        assert_eq!(Medal::for_rank(4), None);
        assert_eq!(Medal::for_rank(0), None);
    }
}
