use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Athlete, AthleteRow};

const ATHLETE_COLUMNS: &str = r#"
    athlete_id, session_id, first_name, last_name, gender, bodyweight,
    lot_number, start_number, opening_snatch, opening_clean_and_jerk,
    weighed_in, is_disqualified, disqualified_reason, best_snatch,
    best_clean_and_jerk, total, rank, medal, created_at
"#;

pub struct AthleteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AthleteRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find athlete by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Athlete> {
        let row = sqlx::query_as::<_, AthleteRow>(&format!(
            "SELECT {ATHLETE_COLUMNS} FROM athletes WHERE athlete_id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Athlete::try_from(row)
    }

    /// List the athletes of a session in start order
    pub async fn list_by_session(&self, session_id: Uuid) -> Result<Vec<Athlete>> {
        let rows = sqlx::query_as::<_, AthleteRow>(&format!(
            "SELECT {ATHLETE_COLUMNS} FROM athletes WHERE session_id = $1 ORDER BY start_number"
        ))
        .bind(session_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Athlete::try_from).collect()
    }

    /// Register a new athlete
    pub async fn create(&self, athlete: &Athlete) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO athletes (
                athlete_id, session_id, first_name, last_name, gender, bodyweight,
                lot_number, start_number, opening_snatch, opening_clean_and_jerk,
                weighed_in, is_disqualified, disqualified_reason, best_snatch,
                best_clean_and_jerk, total, rank, medal, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(athlete.athlete_id)
        .bind(athlete.session_id)
        .bind(&athlete.first_name)
        .bind(&athlete.last_name)
        .bind(&athlete.gender)
        .bind(athlete.bodyweight)
        .bind(athlete.lot_number)
        .bind(athlete.start_number)
        .bind(athlete.opening_snatch)
        .bind(athlete.opening_clean_and_jerk)
        .bind(athlete.weighed_in)
        .bind(athlete.is_disqualified)
        .bind(&athlete.disqualified_reason)
        .bind(athlete.best_snatch)
        .bind(athlete.best_clean_and_jerk)
        .bind(athlete.total)
        .bind(athlete.rank)
        .bind(athlete.medal.map(|m| m.as_str()))
        .bind(athlete.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Persist competition-time fields (weigh-in, results, disqualification, standing)
    pub async fn update(&self, athlete: &Athlete) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE athletes
            SET bodyweight = $2,
                lot_number = $3,
                weighed_in = $4,
                is_disqualified = $5,
                disqualified_reason = $6,
                best_snatch = $7,
                best_clean_and_jerk = $8,
                total = $9,
                rank = $10,
                medal = $11
            WHERE athlete_id = $1
            "#,
        )
        .bind(athlete.athlete_id)
        .bind(athlete.bodyweight)
        .bind(athlete.lot_number)
        .bind(athlete.weighed_in)
        .bind(athlete.is_disqualified)
        .bind(&athlete.disqualified_reason)
        .bind(athlete.best_snatch)
        .bind(athlete.best_clean_and_jerk)
        .bind(athlete.total)
        .bind(athlete.rank)
        .bind(athlete.medal.map(|m| m.as_str()))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }
}
