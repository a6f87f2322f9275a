use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Athlete, Attempt, LiftType, Session, WeightChangeRequest};

/// Durable home of sessions, athletes, attempts and weight changes.
///
/// The competition core only ever reads and writes through this trait, so the
/// same control logic runs against PostgreSQL ([`crate::Database`]) and the
/// in-memory [`crate::MemoryStore`].
///
/// Lookups by id return [`crate::error::StorageError::NotFound`] when the
/// record does not exist.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_session(&self, session: &Session) -> Result<()>;

    async fn find_session(&self, session_id: Uuid) -> Result<Session>;

    async fn insert_athlete(&self, athlete: &Athlete) -> Result<()>;

    async fn find_athlete(&self, athlete_id: Uuid) -> Result<Athlete>;

    /// Athletes of a session ordered by start number.
    async fn list_session_athletes(&self, session_id: Uuid) -> Result<Vec<Athlete>>;

    async fn update_athlete(&self, athlete: &Athlete) -> Result<()>;

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()>;

    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Attempt>;

    async fn update_attempt(&self, attempt: &Attempt) -> Result<()>;

    /// Attempts of one athlete on one lift type, ordered by attempt number.
    async fn list_athlete_attempts(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>>;

    /// Every attempt of a session on one lift type, in declaration order.
    async fn list_session_attempts(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>>;

    async fn insert_weight_change(&self, change: &WeightChangeRequest) -> Result<()>;

    /// Approved changes of one athlete on one lift type, oldest first.
    async fn list_weight_changes(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>>;

    /// Approved changes of a whole session on one lift type, oldest first.
    async fn list_session_weight_changes(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>>;
}
