use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Attempt, AttemptRow, LiftType};

const ATTEMPT_COLUMNS: &str = r#"
    attempt_id, athlete_id, session_id, lift_type, attempt_number, weight,
    referee_left, referee_center, referee_right, result, edit_count,
    jury_decision, jury_reason, jury_overridden_at, decided_at,
    created_at, updated_at
"#;

pub struct AttemptRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AttemptRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Attempt> {
        let row = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE attempt_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Attempt::try_from(row)
    }

    pub async fn list_by_athlete(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts
             WHERE athlete_id = $1 AND lift_type = $2
             ORDER BY attempt_number"
        ))
        .bind(athlete_id)
        .bind(lift_type.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Attempt::try_from).collect()
    }

    pub async fn list_by_session(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<Attempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts
             WHERE session_id = $1 AND lift_type = $2
             ORDER BY created_at"
        ))
        .bind(session_id)
        .bind(lift_type.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Attempt::try_from).collect()
    }

    pub async fn create(&self, attempt: &Attempt) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attempts (
                attempt_id, athlete_id, session_id, lift_type, attempt_number, weight,
                referee_left, referee_center, referee_right, result, edit_count,
                jury_decision, jury_reason, jury_overridden_at, decided_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(attempt.attempt_id)
        .bind(attempt.athlete_id)
        .bind(attempt.session_id)
        .bind(attempt.lift_type.as_str())
        .bind(attempt.attempt_number)
        .bind(attempt.weight)
        .bind(attempt.referee_left.as_db_value())
        .bind(attempt.referee_center.as_db_value())
        .bind(attempt.referee_right.as_db_value())
        .bind(attempt.result.as_str())
        .bind(attempt.edit_count)
        .bind(attempt.jury_decision.map(|d| d.as_str()))
        .bind(&attempt.jury_reason)
        .bind(attempt.jury_overridden_at)
        .bind(attempt.decided_at)
        .bind(attempt.created_at)
        .bind(attempt.updated_at)
        .execute(self.pool)
        .await
        .map_err(|e| {
            let err = StorageError::from(e);
            if err.is_unique_violation() {
                StorageError::ConstraintViolation(format!(
                    "attempt {} of {} already declared",
                    attempt.attempt_number, attempt.lift_type
                ))
            } else {
                err
            }
        })?;

        Ok(())
    }

    pub async fn update(&self, attempt: &Attempt) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE attempts
            SET weight = $2,
                referee_left = $3,
                referee_center = $4,
                referee_right = $5,
                result = $6,
                edit_count = $7,
                jury_decision = $8,
                jury_reason = $9,
                jury_overridden_at = $10,
                decided_at = $11,
                updated_at = $12
            WHERE attempt_id = $1
            "#,
        )
        .bind(attempt.attempt_id)
        .bind(attempt.weight)
        .bind(attempt.referee_left.as_db_value())
        .bind(attempt.referee_center.as_db_value())
        .bind(attempt.referee_right.as_db_value())
        .bind(attempt.result.as_str())
        .bind(attempt.edit_count)
        .bind(attempt.jury_decision.map(|d| d.as_str()))
        .bind(&attempt.jury_reason)
        .bind(attempt.jury_overridden_at)
        .bind(attempt.decided_at)
        .bind(attempt.updated_at)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
