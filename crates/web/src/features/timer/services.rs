use control::{ControlError, Result, TimerSnapshot};
use storage::dto::timer::{ApplyPresetRequest, ResetTimerRequest, StartTimerRequest};
use storage::error::StorageError;
use uuid::Uuid;

use crate::state::AppState;

/// Clocks are only created for sessions the record store knows.
async fn ensure_session(state: &AppState, session_id: Uuid) -> Result<()> {
    match state.store.find_session(session_id).await {
        Ok(_) => Ok(()),
        Err(StorageError::NotFound) => Err(ControlError::NotFound(format!("Session {}", session_id))),
        Err(e) => Err(e.into()),
    }
}

pub async fn snapshot(state: &AppState, session_id: Uuid) -> Result<TimerSnapshot> {
    ensure_session(state, session_id).await?;
    Ok(state.timers.snapshot(session_id).await)
}

pub async fn start(
    state: &AppState,
    session_id: Uuid,
    request: &StartTimerRequest,
) -> Result<TimerSnapshot> {
    ensure_session(state, session_id).await?;
    state
        .timers
        .start(session_id, request.duration, request.mode)
        .await
}

pub async fn pause(state: &AppState, session_id: Uuid) -> Result<TimerSnapshot> {
    ensure_session(state, session_id).await?;
    state.timers.pause(session_id).await
}

pub async fn reset(
    state: &AppState,
    session_id: Uuid,
    request: &ResetTimerRequest,
) -> Result<TimerSnapshot> {
    ensure_session(state, session_id).await?;
    state
        .timers
        .reset(session_id, request.duration, request.mode)
        .await
}

pub async fn apply_preset(
    state: &AppState,
    session_id: Uuid,
    request: &ApplyPresetRequest,
) -> Result<TimerSnapshot> {
    ensure_session(state, session_id).await?;
    state.timers.apply_preset(session_id, request.preset).await
}

/// Ends the session's clock.
pub async fn dispose(state: &AppState, session_id: Uuid) -> Result<()> {
    if state.timers.dispose(session_id).await {
        Ok(())
    } else {
        Err(ControlError::NotFound(format!("Timer for session {}", session_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use control::{InMemoryBroadcaster, TimerConfig};
    use storage::models::{Session, TimerMode, TimerPreset};
    use storage::{MemoryStore, RecordStore};

    async fn setup() -> (AppState, Session) {
        let store = Arc::new(MemoryStore::new());
        let session = Session::new("Men 61 A");
        store.insert_session(&session).await.unwrap();
        let state = AppState::new(store, Arc::new(InMemoryBroadcaster::new()), TimerConfig::default());
        (state, session)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_session_has_no_clock() {
        let (state, _session) = setup().await;
        let err = snapshot(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ControlError::NotFound(_)));
        assert!(state.timers.active_sessions().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preset_then_start() {
        let (state, session) = setup().await;

        let armed = apply_preset(
            &state,
            session.session_id,
            &ApplyPresetRequest {
                preset: TimerPreset::Break,
            },
        )
        .await
        .unwrap();
        assert_eq!((armed.max_secs, armed.mode), (600, TimerMode::Break));

        let running = start(&state, session.session_id, &StartTimerRequest::default())
            .await
            .unwrap();
        assert!(running.running);
        assert_eq!(running.max_secs, 600);

        dispose(&state, session.session_id).await.unwrap();
        assert!(matches!(
            dispose(&state, session.session_id).await,
            Err(ControlError::NotFound(_))
        ));
    }
}
