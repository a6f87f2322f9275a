use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::Session;

pub struct SessionRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepository<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, session: &Session) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, name, created_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(session.session_id)
        .bind(&session.name)
        .bind(session.created_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT session_id, name, created_at
            FROM sessions
            WHERE session_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(session)
    }
}
