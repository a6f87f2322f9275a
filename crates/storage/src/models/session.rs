use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A competition session (one group lifting on one platform).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Session {
    pub session_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}
