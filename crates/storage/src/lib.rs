use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

pub mod dto;
pub mod error;
pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

pub use memory::MemoryStore;
pub use store::RecordStore;

use error::Result;
use models::{Athlete, Attempt, LiftType, Session, WeightChangeRequest};
use repository::{
    athlete::AthleteRepository, attempt::AttemptRepository, session::SessionRepository,
    weight_change::WeightChangeRepository,
};

/// PostgreSQL-backed record store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for Database {
    async fn insert_session(&self, session: &Session) -> Result<()> {
        SessionRepository::new(&self.pool).create(session).await
    }

    async fn find_session(&self, session_id: Uuid) -> Result<Session> {
        SessionRepository::new(&self.pool).find_by_id(session_id).await
    }

    async fn insert_athlete(&self, athlete: &Athlete) -> Result<()> {
        AthleteRepository::new(&self.pool).create(athlete).await
    }

    async fn find_athlete(&self, athlete_id: Uuid) -> Result<Athlete> {
        AthleteRepository::new(&self.pool).find_by_id(athlete_id).await
    }

    async fn list_session_athletes(&self, session_id: Uuid) -> Result<Vec<Athlete>> {
        AthleteRepository::new(&self.pool)
            .list_by_session(session_id)
            .await
    }

    async fn update_athlete(&self, athlete: &Athlete) -> Result<()> {
        AthleteRepository::new(&self.pool).update(athlete).await
    }

    async fn insert_attempt(&self, attempt: &Attempt) -> Result<()> {
        AttemptRepository::new(&self.pool).create(attempt).await
    }

    async fn find_attempt(&self, attempt_id: Uuid) -> Result<Attempt> {
        AttemptRepository::new(&self.pool).find_by_id(attempt_id).await
    }

    async fn update_attempt(&self, attempt: &Attempt) -> Result<()> {
        AttemptRepository::new(&self.pool).update(attempt).await
    }

    async fn list_athlete_attempts(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>> {
        AttemptRepository::new(&self.pool)
            .list_by_athlete(athlete_id, lift_type)
            .await
    }

    async fn list_session_attempts(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>> {
        AttemptRepository::new(&self.pool)
            .list_by_session(session_id, lift_type)
            .await
    }

    async fn insert_weight_change(&self, change: &WeightChangeRequest) -> Result<()> {
        WeightChangeRepository::new(&self.pool).create(change).await
    }

    async fn list_weight_changes(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        WeightChangeRepository::new(&self.pool)
            .list_by_athlete(athlete_id, lift_type)
            .await
    }

    async fn list_session_weight_changes(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        WeightChangeRepository::new(&self.pool)
            .list_by_session(session_id, lift_type)
            .await
    }
}
