use control::{Result, StandingsEntry};
use uuid::Uuid;

use crate::state::AppState;

pub async fn standings(state: &AppState, session_id: Uuid) -> Result<Vec<StandingsEntry>> {
    state.standings.standings(session_id).await
}
