//! Per-session attempt clock.
//!
//! [`TimerState`] is the pure countdown; [`TimerRegistry`] owns one state per
//! session and drives it with a background tick task. Every arm, start, pause
//! and reset bumps the state's generation, and a tick task only emits while
//! its own generation is still current.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use storage::models::{TimerMode, TimerPreset};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ControlError, Result};
use crate::events::{DomainEvent, EventBroadcaster, TimerPayload, TimerWarningPayload};

pub const FIRST_WARNING_SECS: u32 = 30;
pub const FINAL_WARNING_SECS: u32 = 10;

#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    pub tick_period: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_secs(1),
        }
    }
}

impl TimerConfig {
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }
}

/// Which clock rule picked the duration of an auto-started attempt clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClockRule {
    FirstAttempt,
    /// Same lifter twice in a row: the two-minute rule.
    ConsecutiveAttempt,
    DifferentLifter,
}

/// Clock setting a declaration asks the orchestrator to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimerHint {
    pub duration_secs: u32,
    pub mode: TimerMode,
    pub rule: ClockRule,
}

impl TimerHint {
    pub fn for_rule(rule: ClockRule) -> Self {
        let duration_secs = match rule {
            ClockRule::ConsecutiveAttempt => TimerPreset::SubsequentAttempt.duration_secs(),
            ClockRule::FirstAttempt | ClockRule::DifferentLifter => {
                TimerPreset::FirstAttempt.duration_secs()
            }
        };
        Self {
            duration_secs,
            mode: TimerMode::Attempt,
            rule,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { remaining_secs: u32 },
    Warning { threshold_secs: u32 },
    Expired,
}

#[derive(Debug, Clone)]
pub struct TimerState {
    remaining_secs: u32,
    max_secs: u32,
    running: bool,
    mode: TimerMode,
    warned_first: bool,
    warned_final: bool,
    generation: u64,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(
            TimerPreset::FirstAttempt.duration_secs(),
            TimerMode::Attempt,
        )
    }
}

impl TimerState {
    pub fn new(duration_secs: u32, mode: TimerMode) -> Self {
        Self {
            remaining_secs: duration_secs,
            max_secs: duration_secs,
            running: false,
            mode,
            warned_first: false,
            warned_final: false,
            generation: 0,
        }
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn max_secs(&self) -> u32 {
        self.max_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stops the clock and loads a fresh full duration.
    pub fn arm(&mut self, duration_secs: u32, mode: TimerMode) {
        self.remaining_secs = duration_secs;
        self.max_secs = duration_secs;
        self.mode = mode;
        self.running = false;
        self.warned_first = false;
        self.warned_final = false;
        self.generation += 1;
    }

    pub fn set_mode(&mut self, mode: TimerMode) {
        self.mode = mode;
    }

    /// Sets the clock running and returns the generation the ticker must
    /// carry. An expired clock is re-armed to its max first.
    pub fn resume(&mut self) -> u64 {
        if self.remaining_secs == 0 {
            self.arm(self.max_secs, self.mode);
        }
        self.running = true;
        self.generation += 1;
        self.generation
    }

    pub fn halt(&mut self) {
        self.running = false;
        self.generation += 1;
    }

    /// Advances one second.
    pub fn tick(&mut self) -> Vec<TimerSignal> {
        if !self.running || self.remaining_secs == 0 {
            return Vec::new();
        }

        self.remaining_secs -= 1;
        let mut signals = vec![TimerSignal::Tick {
            remaining_secs: self.remaining_secs,
        }];

        if self.remaining_secs == FIRST_WARNING_SECS && !self.warned_first {
            self.warned_first = true;
            signals.push(TimerSignal::Warning {
                threshold_secs: FIRST_WARNING_SECS,
            });
        }

        if self.remaining_secs == FINAL_WARNING_SECS && !self.warned_final {
            self.warned_final = true;
            signals.push(TimerSignal::Warning {
                threshold_secs: FINAL_WARNING_SECS,
            });
        }

        if self.remaining_secs == 0 {
            self.halt();
            signals.push(TimerSignal::Expired);
        }

        signals
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimerSnapshot {
    pub session_id: Uuid,
    pub remaining_secs: u32,
    pub max_secs: u32,
    pub running: bool,
    pub mode: TimerMode,
}

struct TimerInner {
    state: TimerState,
    ticker: Option<JoinHandle<()>>,
}

impl TimerInner {
    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

struct SessionTimer {
    session_id: Uuid,
    inner: Mutex<TimerInner>,
}

impl SessionTimer {
    fn snapshot(&self, state: &TimerState) -> TimerSnapshot {
        TimerSnapshot {
            session_id: self.session_id,
            remaining_secs: state.remaining_secs(),
            max_secs: state.max_secs(),
            running: state.is_running(),
            mode: state.mode(),
        }
    }

    fn payload(&self, state: &TimerState) -> TimerPayload {
        TimerPayload {
            session_id: self.session_id,
            remaining_secs: state.remaining_secs(),
            max_secs: state.max_secs(),
            mode: state.mode(),
            at: Utc::now(),
        }
    }

    fn event_for(&self, signal: TimerSignal, state: &TimerState) -> DomainEvent {
        match signal {
            TimerSignal::Tick { .. } => DomainEvent::TimerTick(self.payload(state)),
            TimerSignal::Warning { threshold_secs } => {
                DomainEvent::TimerWarning(TimerWarningPayload {
                    session_id: self.session_id,
                    threshold_secs,
                    remaining_secs: state.remaining_secs(),
                    mode: state.mode(),
                    at: Utc::now(),
                })
            }
            TimerSignal::Expired => DomainEvent::TimerExpired(self.payload(state)),
        }
    }
}

/// Owns the clock of every live session. Clocks are created on first use
/// and removed with [`TimerRegistry::dispose`].
pub struct TimerRegistry {
    timers: Mutex<HashMap<Uuid, Arc<SessionTimer>>>,
    events: Arc<dyn EventBroadcaster>,
    config: TimerConfig,
}

impl TimerRegistry {
    pub fn new(events: Arc<dyn EventBroadcaster>, config: TimerConfig) -> Self {
        Self {
            timers: Mutex::new(HashMap::new()),
            events,
            config,
        }
    }

    async fn get_or_create(&self, session_id: Uuid) -> Arc<SessionTimer> {
        let mut timers = self.timers.lock().await;
        timers
            .entry(session_id)
            .or_insert_with(|| {
                debug!(session_id = %session_id, "Creating session timer");
                Arc::new(SessionTimer {
                    session_id,
                    inner: Mutex::new(TimerInner {
                        state: TimerState::default(),
                        ticker: None,
                    }),
                })
            })
            .clone()
    }

    pub async fn snapshot(&self, session_id: Uuid) -> TimerSnapshot {
        let timer = self.get_or_create(session_id).await;
        let inner = timer.inner.lock().await;
        timer.snapshot(&inner.state)
    }

    /// Starts the clock. A no-op while already running.
    pub async fn start(
        &self,
        session_id: Uuid,
        duration_secs: Option<u32>,
        mode: Option<TimerMode>,
    ) -> Result<TimerSnapshot> {
        if duration_secs == Some(0) {
            return Err(ControlError::InvalidInput(
                "timer duration must be positive".to_string(),
            ));
        }

        let timer = self.get_or_create(session_id).await;
        let mut inner = timer.inner.lock().await;

        if inner.state.is_running() {
            debug!(session_id = %session_id, "Timer already running, start ignored");
            return Ok(timer.snapshot(&inner.state));
        }

        match (duration_secs, mode) {
            (Some(duration), mode) => {
                let mode = mode.unwrap_or(inner.state.mode());
                inner.state.arm(duration, mode);
            }
            (None, Some(mode)) => inner.state.set_mode(mode),
            (None, None) => {}
        }

        let generation = inner.state.resume();
        inner.stop_ticker();
        inner.ticker = Some(self.spawn_ticker(timer.clone(), generation));

        info!(
            session_id = %session_id,
            remaining_secs = inner.state.remaining_secs(),
            mode = inner.state.mode().as_str(),
            "Timer started"
        );
        self.events
            .publish(DomainEvent::TimerStarted(timer.payload(&inner.state)));

        Ok(timer.snapshot(&inner.state))
    }

    pub async fn pause(&self, session_id: Uuid) -> Result<TimerSnapshot> {
        let timer = self.get_or_create(session_id).await;
        let mut inner = timer.inner.lock().await;

        if inner.state.is_running() {
            inner.state.halt();
            inner.stop_ticker();

            info!(
                session_id = %session_id,
                remaining_secs = inner.state.remaining_secs(),
                "Timer paused"
            );
            self.events
                .publish(DomainEvent::TimerPaused(timer.payload(&inner.state)));
        }

        Ok(timer.snapshot(&inner.state))
    }

    /// Stops the clock and re-arms it with a fresh duration.
    pub async fn reset(
        &self,
        session_id: Uuid,
        duration_secs: u32,
        mode: TimerMode,
    ) -> Result<TimerSnapshot> {
        if duration_secs == 0 {
            return Err(ControlError::InvalidInput(
                "timer duration must be positive".to_string(),
            ));
        }

        let timer = self.get_or_create(session_id).await;
        let mut inner = timer.inner.lock().await;

        inner.stop_ticker();
        inner.state.arm(duration_secs, mode);

        info!(
            session_id = %session_id,
            duration_secs,
            mode = mode.as_str(),
            "Timer reset"
        );
        self.events
            .publish(DomainEvent::TimerReset(timer.payload(&inner.state)));

        Ok(timer.snapshot(&inner.state))
    }

    pub async fn apply_preset(&self, session_id: Uuid, preset: TimerPreset) -> Result<TimerSnapshot> {
        self.reset(session_id, preset.duration_secs(), preset.mode())
            .await
    }

    /// Re-arms with the hinted duration and starts the clock.
    pub async fn apply_hint(&self, session_id: Uuid, hint: &TimerHint) -> Result<TimerSnapshot> {
        self.reset(session_id, hint.duration_secs, hint.mode).await?;
        self.start(session_id, None, None).await
    }

    /// Stops and forgets a session's clock. Returns false when none existed.
    pub async fn dispose(&self, session_id: Uuid) -> bool {
        let removed = self.timers.lock().await.remove(&session_id);
        match removed {
            Some(timer) => {
                let mut inner = timer.inner.lock().await;
                inner.state.halt();
                inner.stop_ticker();
                info!(session_id = %session_id, "Timer disposed");
                true
            }
            None => false,
        }
    }

    pub async fn active_sessions(&self) -> Vec<Uuid> {
        self.timers.lock().await.keys().copied().collect()
    }

    fn spawn_ticker(&self, timer: Arc<SessionTimer>, generation: u64) -> JoinHandle<()> {
        let events = self.events.clone();
        let period = self.config.tick_period;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);

            loop {
                interval.tick().await;

                let mut inner = timer.inner.lock().await;
                if inner.state.generation() != generation || !inner.state.is_running() {
                    break;
                }

                let signals = inner.state.tick();
                let expired = signals.contains(&TimerSignal::Expired);
                for signal in signals {
                    events.publish(timer.event_for(signal, &inner.state));
                }

                if expired {
                    info!(session_id = %timer.session_id, "Timer expired");
                    inner.ticker = None;
                    break;
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::InMemoryBroadcaster;

    fn running(duration: u32) -> TimerState {
        let mut state = TimerState::new(duration, TimerMode::Attempt);
        state.resume();
        state
    }

    fn warnings(signals: &[TimerSignal]) -> Vec<u32> {
        signals
            .iter()
            .filter_map(|s| match s {
                TimerSignal::Warning { threshold_secs } => Some(*threshold_secs),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_tick_from_31_warns_once_at_30() {
        let mut state = running(31);
        let signals = state.tick();
        assert_eq!(state.remaining_secs(), 30);
        assert_eq!(warnings(&signals), vec![30]);

        let signals = state.tick();
        assert!(warnings(&signals).is_empty());
    }

    #[test]
    fn test_full_countdown_signals() {
        let mut state = running(31);
        let mut all = Vec::new();
        while state.is_running() {
            all.extend(state.tick());
        }

        assert_eq!(warnings(&all), vec![30, 10]);
        assert_eq!(all.iter().filter(|s| **s == TimerSignal::Expired).count(), 1);
        assert_eq!(
            all.iter()
                .filter(|s| matches!(s, TimerSignal::Tick { .. }))
                .count(),
            31
        );
        assert_eq!(state.remaining_secs(), 0);
        assert!(!state.is_running());
        assert!(state.tick().is_empty());
    }

    #[test]
    fn test_paused_state_does_not_tick() {
        let mut state = TimerState::new(60, TimerMode::Attempt);
        assert!(state.tick().is_empty());
        assert_eq!(state.remaining_secs(), 60);
    }

    #[test]
    fn test_warning_flags_survive_pause_but_not_rearm() {
        let mut state = running(31);
        state.tick();
        state.halt();
        state.resume();
        // paused and resumed at 30: no second warning on the way down
        let mut all = Vec::new();
        for _ in 0..20 {
            all.extend(state.tick());
        }
        assert_eq!(warnings(&all), vec![10]);

        state.arm(31, TimerMode::Attempt);
        state.resume();
        assert_eq!(warnings(&state.tick()), vec![30]);
    }

    #[test]
    fn test_every_transition_bumps_generation() {
        let mut state = TimerState::default();
        let g0 = state.generation();
        let g1 = state.resume();
        state.halt();
        let g2 = state.generation();
        state.arm(120, TimerMode::Break);
        let g3 = state.generation();
        assert!(g0 < g1 && g1 < g2 && g2 < g3);
    }

    #[test]
    fn test_resume_after_expiry_rearms_to_max() {
        let mut state = running(2);
        state.tick();
        state.tick();
        assert_eq!(state.remaining_secs(), 0);
        state.resume();
        assert_eq!(state.remaining_secs(), 2);
        assert!(state.is_running());
    }

    #[test]
    fn test_hint_durations() {
        assert_eq!(TimerHint::for_rule(ClockRule::FirstAttempt).duration_secs, 60);
        assert_eq!(TimerHint::for_rule(ClockRule::ConsecutiveAttempt).duration_secs, 120);
        assert_eq!(TimerHint::for_rule(ClockRule::DifferentLifter).duration_secs, 60);
        assert_eq!(TimerHint::for_rule(ClockRule::ConsecutiveAttempt).mode, TimerMode::Attempt);
    }

    fn registry() -> (TimerRegistry, Arc<InMemoryBroadcaster>) {
        let events = Arc::new(InMemoryBroadcaster::new());
        let registry = TimerRegistry::new(events.clone(), TimerConfig::default());
        (registry, events)
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_clock_counts_down_and_warns() {
        let (registry, events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(60), None).await.unwrap();
        time::sleep(Duration::from_millis(30_500)).await;

        let snapshot = registry.snapshot(session).await;
        assert_eq!(snapshot.remaining_secs, 30);
        assert!(snapshot.running);
        assert_eq!(events.events_of_type("timer.tick").len(), 30);
        assert_eq!(events.events_of_type("timer.warning").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_running_is_a_noop() {
        let (registry, events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(60), None).await.unwrap();
        time::sleep(Duration::from_millis(5_500)).await;
        let snapshot = registry
            .start(session, Some(120), Some(TimerMode::Break))
            .await
            .unwrap();

        assert_eq!(snapshot.remaining_secs, 55);
        assert_eq!(snapshot.max_secs, 60);
        assert_eq!(snapshot.mode, TimerMode::Attempt);
        assert_eq!(events.events_of_type("timer.started").len(), 1);

        time::sleep(Duration::from_secs(1)).await;
        // a second ticker would double the rate
        assert_eq!(registry.snapshot(session).await.remaining_secs, 54);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_freezes_remaining_time() {
        let (registry, events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(60), None).await.unwrap();
        time::sleep(Duration::from_millis(3_500)).await;
        let paused = registry.pause(session).await.unwrap();
        assert_eq!(paused.remaining_secs, 57);
        assert!(!paused.running);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(registry.snapshot(session).await.remaining_secs, 57);
        assert_eq!(events.events_of_type("timer.tick").len(), 3);
        assert_eq!(events.events_of_type("timer.paused").len(), 1);

        registry.start(session, None, None).await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(registry.snapshot(session).await.remaining_secs, 55);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_supersedes_running_generation() {
        let (registry, events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(60), None).await.unwrap();
        time::sleep(Duration::from_millis(2_500)).await;
        let snapshot = registry.reset(session, 600, TimerMode::Break).await.unwrap();
        events.clear();

        assert_eq!(snapshot.remaining_secs, 600);
        assert_eq!(snapshot.mode, TimerMode::Break);
        assert!(!snapshot.running);

        time::sleep(Duration::from_secs(5)).await;
        assert!(events.events_of_type("timer.tick").is_empty());
        assert_eq!(registry.snapshot(session).await.remaining_secs, 600);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_stops_the_clock() {
        let (registry, events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(3), None).await.unwrap();
        time::sleep(Duration::from_millis(3_500)).await;

        let snapshot = registry.snapshot(session).await;
        assert_eq!(snapshot.remaining_secs, 0);
        assert!(!snapshot.running);
        assert_eq!(events.events_of_type("timer.expired").len(), 1);

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(events.events_of_type("timer.tick").len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_presets_rearm_with_derived_mode() {
        let (registry, _events) = registry();
        let session = Uuid::new_v4();

        let jury = registry
            .apply_preset(session, TimerPreset::JuryDecision)
            .await
            .unwrap();
        assert_eq!((jury.max_secs, jury.mode), (600, TimerMode::Jury));

        let timeout = registry
            .apply_preset(session, TimerPreset::TechnicalTimeout)
            .await
            .unwrap();
        assert_eq!((timeout.max_secs, timeout.mode), (180, TimerMode::Break));
        assert!(!timeout.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_hint_arms_and_starts() {
        let (registry, _events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(60), None).await.unwrap();
        time::sleep(Duration::from_millis(10_500)).await;

        let hint = TimerHint::for_rule(ClockRule::ConsecutiveAttempt);
        let snapshot = registry.apply_hint(session, &hint).await.unwrap();
        assert_eq!(snapshot.remaining_secs, 120);
        assert_eq!(snapshot.max_secs, 120);
        assert!(snapshot.running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_duration_is_invalid() {
        let (registry, _events) = registry();
        let session = Uuid::new_v4();
        assert!(matches!(
            registry.start(session, Some(0), None).await,
            Err(ControlError::InvalidInput(_))
        ));
        assert!(matches!(
            registry.reset(session, 0, TimerMode::Attempt).await,
            Err(ControlError::InvalidInput(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_and_forgets() {
        let (registry, events) = registry();
        let session = Uuid::new_v4();

        registry.start(session, Some(60), None).await.unwrap();
        assert_eq!(registry.active_sessions().await, vec![session]);

        assert!(registry.dispose(session).await);
        assert!(!registry.dispose(session).await);
        assert!(registry.active_sessions().await.is_empty());

        time::sleep(Duration::from_secs(5)).await;
        assert!(events.events_of_type("timer.tick").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_are_independent() {
        let (registry, _events) = registry();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        registry.start(a, Some(60), None).await.unwrap();
        time::sleep(Duration::from_millis(4_500)).await;
        registry.pause(b).await.unwrap();

        assert_eq!(registry.snapshot(a).await.remaining_secs, 56);
        assert_eq!(registry.snapshot(b).await.remaining_secs, 60);
        assert!(!registry.snapshot(b).await.running);
    }
}
