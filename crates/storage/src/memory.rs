use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Athlete, Attempt, LiftType, Session, WeightChangeRequest};
use crate::store::RecordStore;

#[derive(Default)]
struct Tables {
    sessions: HashMap<Uuid, Session>,
    athletes: HashMap<Uuid, Athlete>,
    attempts: HashMap<Uuid, Attempt>,
    weight_changes: Vec<WeightChangeRequest>,
}

/// Process-local [`RecordStore`] used by tests and database-less deployments.
///
/// Enforces the same uniqueness rules as the PostgreSQL schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_session(&self, session: &Session) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.sessions.contains_key(&session.session_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "session {} already exists",
                session.session_id
            )));
        }
        tables.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Session> {
        self.tables
            .read()
            .await
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn insert_athlete(&self, athlete: &Athlete) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.sessions.contains_key(&athlete.session_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "session {} does not exist",
                athlete.session_id
            )));
        }
        if tables.athletes.contains_key(&athlete.athlete_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "athlete {} already exists",
                athlete.athlete_id
            )));
        }
        tables.athletes.insert(athlete.athlete_id, athlete.clone());
        Ok(())
    }

    async fn find_athlete(&self, athlete_id: Uuid) -> Result<Athlete> {
        self.tables
            .read()
            .await
            .athletes
            .get(&athlete_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_session_athletes(&self, session_id: Uuid) -> Result<Vec<Athlete>> {
        let tables = self.tables.read().await;
        let mut athletes: Vec<Athlete> = tables
            .athletes
            .values()
            .filter(|a| a.session_id == session_id)
            .cloned()
            .collect();
        athletes.sort_by_key(|a| a.start_number);
        Ok(athletes)
    }

    async fn update_athlete(&self, athlete: &Athlete) -> Result<()> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .athletes
            .get_mut(&athlete.athlete_id)
            .ok_or(StorageError::NotFound)?;
        *slot = athlete.clone();
        Ok(())
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.attempts.values().any(|a| {
            a.athlete_id == attempt.athlete_id
                && a.lift_type == attempt.lift_type
                && a.attempt_number == attempt.attempt_number
        });
        if duplicate {
            return Err(StorageError::ConstraintViolation(format!(
                "attempt {} of {} already declared for athlete {}",
                attempt.attempt_number, attempt.lift_type, attempt.athlete_id
            )));
        }
        tables.attempts.insert(attempt.attempt_id, attempt.clone());
        Ok(())
    }

    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Attempt> {
        self.tables
            .read()
            .await
            .attempts
            .get(&attempt_id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn update_attempt(&self, attempt: &Attempt) -> Result<()> {
        let mut tables = self.tables.write().await;
        let slot = tables
            .attempts
            .get_mut(&attempt.attempt_id)
            .ok_or(StorageError::NotFound)?;
        *slot = attempt.clone();
        Ok(())
    }

    async fn list_athlete_attempts(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<Attempt> = tables
            .attempts
            .values()
            .filter(|a| a.athlete_id == athlete_id && a.lift_type == lift_type)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.attempt_number);
        Ok(attempts)
    }

    async fn list_session_attempts(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>> {
        let tables = self.tables.read().await;
        let mut attempts: Vec<Attempt> = tables
            .attempts
            .values()
            .filter(|a| a.session_id == session_id && a.lift_type == lift_type)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| a.created_at);
        Ok(attempts)
    }

    async fn insert_weight_change(&self, change: &WeightChangeRequest) -> Result<()> {
        let mut tables = self.tables.write().await;
        if !tables.athletes.contains_key(&change.athlete_id) {
            return Err(StorageError::ConstraintViolation(format!(
                "athlete {} does not exist",
                change.athlete_id
            )));
        }
        tables.weight_changes.push(change.clone());
        Ok(())
    }

    async fn list_weight_changes(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .weight_changes
            .iter()
            .filter(|c| c.athlete_id == athlete_id && c.lift_type == lift_type)
            .cloned()
            .collect())
    }

    async fn list_session_weight_changes(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        let tables = self.tables.read().await;
        Ok(tables
            .weight_changes
            .iter()
            .filter(|c| c.session_id == session_id && c.lift_type == lift_type)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;

    fn athlete(session_id: Uuid, start_number: i32) -> Athlete {
        Athlete {
            athlete_id: Uuid::new_v4(),
            session_id,
            first_name: "Lasha".to_string(),
            last_name: "Talakhadze".to_string(),
            gender: "M".to_string(),
            bodyweight: Some(Decimal::from(168)),
            lot_number: Some(start_number),
            start_number,
            opening_snatch: Decimal::from(200),
            opening_clean_and_jerk: Decimal::from(240),
            weighed_in: true,
            is_disqualified: false,
            disqualified_reason: None,
            best_snatch: None,
            best_clean_and_jerk: None,
            total: None,
            rank: None,
            medal: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_unknown_records_are_not_found() {
        let store = MemoryStore::new();
        assert!(store.find_session(Uuid::new_v4()).await.unwrap_err().is_not_found());
        assert!(store.find_athlete(Uuid::new_v4()).await.unwrap_err().is_not_found());
        assert!(store.find_attempt(Uuid::new_v4()).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_athletes_listed_by_start_number() {
        let store = MemoryStore::new();
        let session = Session::new("Men 109+ A");
        store.insert_session(&session).await.unwrap();
        store.insert_athlete(&athlete(session.session_id, 3)).await.unwrap();
        store.insert_athlete(&athlete(session.session_id, 1)).await.unwrap();
        store.insert_athlete(&athlete(session.session_id, 2)).await.unwrap();

        let listed = store.list_session_athletes(session.session_id).await.unwrap();
        let numbers: Vec<i32> = listed.iter().map(|a| a.start_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_duplicate_attempt_number_is_rejected() {
        let store = MemoryStore::new();
        let session = Session::new("Women 49 B");
        store.insert_session(&session).await.unwrap();
        let lifter = athlete(session.session_id, 1);
        store.insert_athlete(&lifter).await.unwrap();

        let first = Attempt::new(
            lifter.athlete_id,
            session.session_id,
            LiftType::Snatch,
            1,
            Decimal::from(80),
        );
        store.insert_attempt(&first).await.unwrap();

        let again = Attempt::new(
            lifter.athlete_id,
            session.session_id,
            LiftType::Snatch,
            1,
            Decimal::from(81),
        );
        let err = store.insert_attempt(&again).await.unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
    }
}
