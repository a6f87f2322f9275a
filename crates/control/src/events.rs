//! Domain events published by the control core.
//!
//! The core never talks to a transport directly: every state change is
//! described by a [`DomainEvent`] handed to an [`EventBroadcaster`]. Fan-out
//! to scoreboards and displays is the broadcaster's business.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storage::models::{
    Athlete, Attempt, AttemptResult, Decision, LiftType, RefereeCall, TimerMode,
};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::lifting_order::LiftingOrderEntry;

/// Snapshot of one attempt, complete enough for a display to render it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptPayload {
    pub session_id: Uuid,
    pub attempt_id: Uuid,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub lift_type: LiftType,
    pub attempt_number: i16,
    pub weight: Decimal,
    pub referee_left: RefereeCall,
    pub referee_center: RefereeCall,
    pub referee_right: RefereeCall,
    pub result: AttemptResult,
    pub at: DateTime<Utc>,
}

impl AttemptPayload {
    pub fn new(attempt: &Attempt, athlete: &Athlete) -> Self {
        Self {
            session_id: attempt.session_id,
            attempt_id: attempt.attempt_id,
            athlete_id: attempt.athlete_id,
            athlete_name: athlete.full_name(),
            lift_type: attempt.lift_type,
            attempt_number: attempt.attempt_number,
            weight: attempt.weight,
            referee_left: attempt.referee_left,
            referee_center: attempt.referee_center,
            referee_right: attempt.referee_right,
            result: attempt.result,
            at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisqualificationPayload {
    pub session_id: Uuid,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub lift_type: LiftType,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JuryOverridePayload {
    pub attempt: AttemptPayload,
    /// Result the three referee calls produce on their own.
    pub previous_result: AttemptResult,
    pub jury_decision: Decision,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerPayload {
    pub session_id: Uuid,
    pub remaining_secs: u32,
    pub max_secs: u32,
    pub mode: TimerMode,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerWarningPayload {
    pub session_id: Uuid,
    pub threshold_secs: u32,
    pub remaining_secs: u32,
    pub mode: TimerMode,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftingOrderPayload {
    pub session_id: Uuid,
    pub lift_type: LiftType,
    pub order: Vec<LiftingOrderEntry>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightChangedPayload {
    pub session_id: Uuid,
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub lift_type: LiftType,
    /// Set when the change re-declared a pending attempt.
    pub attempt_id: Option<Uuid>,
    pub old_weight: Decimal,
    pub new_weight: Decimal,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    #[serde(rename = "attempt.created")]
    AttemptCreated(AttemptPayload),
    #[serde(rename = "attempt.updated")]
    AttemptUpdated(AttemptPayload),
    #[serde(rename = "attempt.validated")]
    AttemptValidated(AttemptPayload),
    #[serde(rename = "athlete.disqualified")]
    AthleteDisqualified(DisqualificationPayload),
    #[serde(rename = "jury.override")]
    JuryOverride(JuryOverridePayload),
    #[serde(rename = "timer.started")]
    TimerStarted(TimerPayload),
    #[serde(rename = "timer.tick")]
    TimerTick(TimerPayload),
    #[serde(rename = "timer.warning")]
    TimerWarning(TimerWarningPayload),
    #[serde(rename = "timer.expired")]
    TimerExpired(TimerPayload),
    #[serde(rename = "timer.paused")]
    TimerPaused(TimerPayload),
    #[serde(rename = "timer.reset")]
    TimerReset(TimerPayload),
    #[serde(rename = "liftingOrder.updated")]
    LiftingOrderUpdated(LiftingOrderPayload),
    #[serde(rename = "attempt.weightChanged")]
    WeightChanged(WeightChangedPayload),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AttemptCreated(_) => "attempt.created",
            Self::AttemptUpdated(_) => "attempt.updated",
            Self::AttemptValidated(_) => "attempt.validated",
            Self::AthleteDisqualified(_) => "athlete.disqualified",
            Self::JuryOverride(_) => "jury.override",
            Self::TimerStarted(_) => "timer.started",
            Self::TimerTick(_) => "timer.tick",
            Self::TimerWarning(_) => "timer.warning",
            Self::TimerExpired(_) => "timer.expired",
            Self::TimerPaused(_) => "timer.paused",
            Self::TimerReset(_) => "timer.reset",
            Self::LiftingOrderUpdated(_) => "liftingOrder.updated",
            Self::WeightChanged(_) => "attempt.weightChanged",
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            Self::AttemptCreated(p) | Self::AttemptUpdated(p) | Self::AttemptValidated(p) => {
                p.session_id
            }
            Self::AthleteDisqualified(p) => p.session_id,
            Self::JuryOverride(p) => p.attempt.session_id,
            Self::TimerStarted(p)
            | Self::TimerTick(p)
            | Self::TimerExpired(p)
            | Self::TimerPaused(p)
            | Self::TimerReset(p) => p.session_id,
            Self::TimerWarning(p) => p.session_id,
            Self::LiftingOrderUpdated(p) => p.session_id,
            Self::WeightChanged(p) => p.session_id,
        }
    }
}

/// Sink for domain events.
///
/// `publish` must not block: it is called from inside the timer tick.
pub trait EventBroadcaster: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

/// Fans events out over a tokio broadcast channel.
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<DomainEvent>,
}

impl ChannelBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBroadcaster for ChannelBroadcaster {
    fn publish(&self, event: DomainEvent) {
        let event_type = event.event_type();
        if self.sender.send(event).is_err() {
            tracing::trace!(event_type, "No subscribers for domain event");
        }
    }
}

/// Records every published event; used for assertions in tests.
#[derive(Default)]
pub struct InMemoryBroadcaster {
    published: Mutex<Vec<DomainEvent>>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_events(&self) -> Vec<DomainEvent> {
        self.published
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<DomainEvent> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.published.lock() {
            events.clear();
        }
    }
}

impl EventBroadcaster for InMemoryBroadcaster {
    fn publish(&self, event: DomainEvent) {
        if let Ok(mut events) = self.published.lock() {
            events.push(event);
        }
    }
}
