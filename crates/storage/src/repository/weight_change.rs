use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LiftType, WeightChangeRequest, WeightChangeRow};

pub struct WeightChangeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WeightChangeRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, change: &WeightChangeRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO weight_change_requests (
                request_id, athlete_id, session_id, lift_type, old_weight, new_weight, requested_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(change.request_id)
        .bind(change.athlete_id)
        .bind(change.session_id)
        .bind(change.lift_type.as_str())
        .bind(change.old_weight)
        .bind(change.new_weight)
        .bind(change.requested_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_by_athlete(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        let rows = sqlx::query_as::<_, WeightChangeRow>(
            r#"
            SELECT request_id, athlete_id, session_id, lift_type, old_weight, new_weight, requested_at
            FROM weight_change_requests
            WHERE athlete_id = $1 AND lift_type = $2
            ORDER BY requested_at
            "#,
        )
        .bind(athlete_id)
        .bind(lift_type.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(WeightChangeRequest::try_from).collect()
    }

    pub async fn list_by_session(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        let rows = sqlx::query_as::<_, WeightChangeRow>(
            r#"
            SELECT request_id, athlete_id, session_id, lift_type, old_weight, new_weight, requested_at
            FROM weight_change_requests
            WHERE session_id = $1 AND lift_type = $2
            ORDER BY requested_at
            "#,
        )
        .bind(session_id)
        .bind(lift_type.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(WeightChangeRequest::try_from).collect()
    }
}
