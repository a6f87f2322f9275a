//! Attempt lifecycle: declaration, referee decisions, jury overrides and the
//! finalization cascade (best lifts, total, three-failure disqualification).
//!
//! Every mutation of an attempt runs under that attempt's lock, and every
//! read-modify-write of an athlete runs under the athlete's lock. The attempt
//! lock is always taken first.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use storage::RecordStore;
use storage::models::{
    Athlete, Attempt, AttemptResult, Decision, LiftType, RefereePosition,
};
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ControlError, NotFoundExt, Result};
use crate::events::{
    AttemptPayload, DisqualificationPayload, DomainEvent, EventBroadcaster, JuryOverridePayload,
    WeightChangedPayload,
};
use crate::jury::JuryOverrideAuthority;
use crate::lifting_order::ATTEMPTS_PER_LIFT;
use crate::locks::KeyedLocks;
use crate::referee::RefereeDecisionAggregator;
use crate::timer::{ClockRule, TimerHint};
use crate::weight_change::WeightChangeGovernor;

/// Times a declared weight may be modified before the attempt is taken.
///
/// Every modification is also an approved weight change, so the two-change
/// budget of [`WeightChangeGovernor`] is reached first; this bounds the
/// stored counter itself.
pub const MAX_DECLARATION_CHANGES: i16 = 3;

pub const THREE_FAILURES_REASON: &str = "three failed attempts";

/// A new attempt plus the clock setting the orchestrator should apply.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Declaration {
    pub attempt: Attempt,
    pub timer_hint: TimerHint,
}

pub struct AttemptStateMachine {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventBroadcaster>,
    governor: Arc<WeightChangeGovernor>,
    attempt_locks: KeyedLocks,
    athlete_locks: Arc<KeyedLocks>,
}

impl AttemptStateMachine {
    pub fn new(
        store: Arc<dyn RecordStore>,
        events: Arc<dyn EventBroadcaster>,
        governor: Arc<WeightChangeGovernor>,
    ) -> Self {
        Self {
            store,
            events,
            governor,
            attempt_locks: KeyedLocks::new(),
            athlete_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Locks guarding athlete records, shared with other writers of athletes.
    pub fn athlete_locks(&self) -> Arc<KeyedLocks> {
        self.athlete_locks.clone()
    }

    pub async fn attempt(&self, attempt_id: Uuid) -> Result<Attempt> {
        self.store
            .find_attempt(attempt_id)
            .await
            .or_not_found("Attempt", attempt_id)
    }

    pub async fn athlete_attempts(&self, athlete_id: Uuid, lift_type: LiftType) -> Result<Vec<Attempt>> {
        self.find_athlete(athlete_id).await?;
        Ok(self.store.list_athlete_attempts(athlete_id, lift_type).await?)
    }

    /// Declares the athlete's next attempt on a lift type.
    ///
    /// The attempt number is one past the athlete's completed attempts. The
    /// returned hint carries 120s when the same athlete took the most recent
    /// decided attempt of the session and lift type, 60s otherwise.
    pub async fn declare_attempt(
        &self,
        athlete_id: Uuid,
        weight: Decimal,
        lift_type: LiftType,
    ) -> Result<Declaration> {
        validate_weight(weight)?;

        let _guard = self.athlete_locks.acquire(athlete_id).await;
        let athlete = self.find_athlete(athlete_id).await?;

        if athlete.is_disqualified {
            return Err(ControlError::RuleViolation(format!(
                "{} is disqualified and cannot declare attempts",
                athlete.full_name()
            )));
        }

        if !athlete.weighed_in {
            return Err(ControlError::RuleViolation(format!(
                "{} has not weighed in and cannot declare attempts",
                athlete.full_name()
            )));
        }

        let history = self.store.list_athlete_attempts(athlete_id, lift_type).await?;

        if let Some(pending) = history.iter().find(|a| a.result.is_pending()) {
            return Err(ControlError::RuleViolation(format!(
                "attempt {} of {} is still pending",
                pending.attempt_number, lift_type
            )));
        }

        let completed = history.len() as i16;
        if completed >= ATTEMPTS_PER_LIFT {
            return Err(ControlError::RuleViolation(format!(
                "all {} attempts of {} already taken",
                ATTEMPTS_PER_LIFT, lift_type
            )));
        }

        if let Some(previous) = history.iter().max_by_key(|a| a.attempt_number) {
            if previous.result == AttemptResult::NoLift && weight != previous.weight {
                return Err(ControlError::RuleViolation(format!(
                    "no weight change permitted after a failed attempt: attempt {} must repeat {}kg",
                    completed + 1,
                    previous.weight
                )));
            }

            let minimum = match previous.result {
                AttemptResult::Good => previous.weight + Decimal::ONE,
                _ => previous.weight,
            };
            if weight < minimum {
                return Err(ControlError::RuleViolation(format!(
                    "no decreases allowed: attempt {} needs at least {}kg after {}kg was {}",
                    completed + 1,
                    minimum,
                    previous.weight,
                    previous.result
                )));
            }
        }

        let attempt = Attempt::new(
            athlete_id,
            athlete.session_id,
            lift_type,
            completed + 1,
            weight,
        );
        self.store.insert_attempt(&attempt).await?;

        let timer_hint = TimerHint::for_rule(self.clock_rule(&attempt).await?);

        info!(
            attempt_id = %attempt.attempt_id,
            athlete_id = %athlete_id,
            lift_type = %lift_type,
            attempt_number = attempt.attempt_number,
            clock_secs = timer_hint.duration_secs,
            "Attempt declared at {}kg",
            weight
        );
        self.events
            .publish(DomainEvent::AttemptCreated(AttemptPayload::new(&attempt, &athlete)));

        Ok(Declaration {
            attempt,
            timer_hint,
        })
    }

    async fn clock_rule(&self, attempt: &Attempt) -> Result<ClockRule> {
        if attempt.attempt_number == 1 {
            return Ok(ClockRule::FirstAttempt);
        }

        let session_attempts = self
            .store
            .list_session_attempts(attempt.session_id, attempt.lift_type)
            .await?;
        let last_decided = session_attempts
            .iter()
            .filter(|a| !a.result.is_pending())
            .max_by_key(|a| a.decided_at);

        Ok(match last_decided {
            Some(last) if last.athlete_id == attempt.athlete_id => ClockRule::ConsecutiveAttempt,
            _ => ClockRule::DifferentLifter,
        })
    }

    /// Records one referee's call. The attempt is finalized by the call that
    /// fills the last slot.
    pub async fn record_decision(
        &self,
        attempt_id: Uuid,
        position: RefereePosition,
        decision: Decision,
    ) -> Result<Attempt> {
        let _guard = self.attempt_locks.acquire(attempt_id).await;
        let mut attempt = self.attempt(attempt_id).await?;

        let result = RefereeDecisionAggregator::record_decision(&mut attempt, position, decision)?;
        self.settle(attempt, result).await
    }

    /// Sets all three referee slots to the same call and finalizes.
    pub async fn record_quick_decision(&self, attempt_id: Uuid, decision: Decision) -> Result<Attempt> {
        let _guard = self.attempt_locks.acquire(attempt_id).await;
        let mut attempt = self.attempt(attempt_id).await?;

        let result = RefereeDecisionAggregator::record_quick_decision(&mut attempt, decision)?;
        self.settle(attempt, result).await
    }

    async fn settle(&self, attempt: Attempt, result: AttemptResult) -> Result<Attempt> {
        if result.is_pending() {
            self.store.update_attempt(&attempt).await?;
            let athlete = self.find_athlete(attempt.athlete_id).await?;
            self.events
                .publish(DomainEvent::AttemptUpdated(AttemptPayload::new(&attempt, &athlete)));
            return Ok(attempt);
        }

        self.finalize(attempt, result).await
    }

    /// Caller holds the attempt lock.
    async fn finalize(&self, mut attempt: Attempt, result: AttemptResult) -> Result<Attempt> {
        let now = Utc::now();
        attempt.result = result;
        attempt.decided_at = Some(now);
        attempt.updated_at = now;
        self.store.update_attempt(&attempt).await?;

        info!(
            attempt_id = %attempt.attempt_id,
            athlete_id = %attempt.athlete_id,
            lift_type = %attempt.lift_type,
            attempt_number = attempt.attempt_number,
            result = %result,
            "Attempt finalized at {}kg",
            attempt.weight
        );

        let _guard = self.athlete_locks.acquire(attempt.athlete_id).await;
        let mut athlete = self.find_athlete(attempt.athlete_id).await?;
        let history = self
            .store
            .list_athlete_attempts(attempt.athlete_id, attempt.lift_type)
            .await?;

        refresh_results(&mut athlete, attempt.lift_type, &history);
        let disqualified = result == AttemptResult::NoLift && disqualify_if_failed_out(&mut athlete, &history);
        self.store.update_athlete(&athlete).await?;

        self.events
            .publish(DomainEvent::AttemptValidated(AttemptPayload::new(&attempt, &athlete)));
        if disqualified {
            self.announce_disqualification(&athlete, attempt.lift_type);
        }

        Ok(attempt)
    }

    /// Applies a binding jury decision. The referee result is replaced for
    /// good, and the finalization cascade runs again on the new result.
    pub async fn override_decision(
        &self,
        attempt_id: Uuid,
        decision: Decision,
        reason: &str,
    ) -> Result<Attempt> {
        let _guard = self.attempt_locks.acquire(attempt_id).await;
        let mut attempt = self.attempt(attempt_id).await?;

        let outcome = JuryOverrideAuthority::apply(&mut attempt, decision, reason, Utc::now())?;
        self.store.update_attempt(&attempt).await?;

        info!(
            attempt_id = %attempt_id,
            athlete_id = %attempt.athlete_id,
            previous = %outcome.previous_result,
            decision = decision.as_str(),
            "Jury override recorded: {}",
            outcome.reason
        );

        let _athlete_guard = self.athlete_locks.acquire(attempt.athlete_id).await;
        let mut athlete = self.find_athlete(attempt.athlete_id).await?;
        let history = self
            .store
            .list_athlete_attempts(attempt.athlete_id, attempt.lift_type)
            .await?;

        refresh_results(&mut athlete, attempt.lift_type, &history);
        let disqualified = match decision {
            Decision::NoLift => disqualify_if_failed_out(&mut athlete, &history),
            Decision::Good => {
                self.reinstate_if_cleared(&mut athlete).await?;
                false
            }
        };
        self.store.update_athlete(&athlete).await?;

        self.events.publish(DomainEvent::JuryOverride(JuryOverridePayload {
            attempt: AttemptPayload::new(&attempt, &athlete),
            previous_result: outcome.previous_result,
            jury_decision: outcome.decision,
            reason: outcome.reason,
            at: outcome.at,
        }));
        if disqualified {
            self.announce_disqualification(&athlete, attempt.lift_type);
        }

        Ok(attempt)
    }

    /// Lifts a three-failure disqualification once no lift type still shows
    /// three failures. Disqualifications for other reasons stand.
    async fn reinstate_if_cleared(&self, athlete: &mut Athlete) -> Result<()> {
        if !athlete.is_disqualified
            || athlete.disqualified_reason.as_deref() != Some(THREE_FAILURES_REASON)
        {
            return Ok(());
        }

        for lift_type in LiftType::all() {
            let history = self
                .store
                .list_athlete_attempts(athlete.athlete_id, *lift_type)
                .await?;
            if failed_out(&history) {
                return Ok(());
            }
        }

        athlete.is_disqualified = false;
        athlete.disqualified_reason = None;
        info!(athlete_id = %athlete.athlete_id, "Disqualification lifted by jury override");
        Ok(())
    }

    /// Raises the weight of a pending attempt through the weight change
    /// rules. Not allowed on an attempt that repeats a failed weight.
    pub async fn change_attempt_weight(&self, attempt_id: Uuid, new_weight: Decimal) -> Result<Attempt> {
        validate_weight(new_weight)?;

        let _guard = self.attempt_locks.acquire(attempt_id).await;
        let mut attempt = self.attempt(attempt_id).await?;

        if !attempt.result.is_pending() || attempt.is_overridden() {
            return Err(ControlError::RuleViolation(format!(
                "attempt {} is already decided and its weight is fixed",
                attempt.attempt_number
            )));
        }

        if attempt.edit_count >= MAX_DECLARATION_CHANGES {
            return Err(ControlError::RuleViolation(format!(
                "maximum {} declaration changes already used on attempt {}",
                MAX_DECLARATION_CHANGES, attempt.attempt_number
            )));
        }

        let history = self
            .store
            .list_athlete_attempts(attempt.athlete_id, attempt.lift_type)
            .await?;
        let follows_failure = history.iter().any(|a| {
            a.attempt_number == attempt.attempt_number - 1 && a.result == AttemptResult::NoLift
        });
        if follows_failure {
            return Err(ControlError::RuleViolation(
                "no weight change permitted after a failed attempt".to_string(),
            ));
        }

        let old_weight = attempt.weight;
        let (athlete, change) = self
            .governor
            .approve(attempt.athlete_id, attempt.lift_type, old_weight, new_weight)
            .await?;

        attempt.weight = new_weight;
        attempt.edit_count += 1;
        attempt.updated_at = change.requested_at;
        self.store.update_attempt(&attempt).await?;

        self.events
            .publish(DomainEvent::WeightChanged(WeightChangedPayload {
                session_id: attempt.session_id,
                athlete_id: attempt.athlete_id,
                athlete_name: athlete.full_name(),
                lift_type: attempt.lift_type,
                attempt_id: Some(attempt.attempt_id),
                old_weight,
                new_weight,
                at: change.requested_at,
            }));

        Ok(attempt)
    }

    fn announce_disqualification(&self, athlete: &Athlete, lift_type: LiftType) {
        warn!(
            athlete_id = %athlete.athlete_id,
            lift_type = %lift_type,
            "{} disqualified: {}",
            athlete.full_name(),
            THREE_FAILURES_REASON
        );
        self.events
            .publish(DomainEvent::AthleteDisqualified(DisqualificationPayload {
                session_id: athlete.session_id,
                athlete_id: athlete.athlete_id,
                athlete_name: athlete.full_name(),
                lift_type,
                reason: THREE_FAILURES_REASON.to_string(),
                at: Utc::now(),
            }));
    }

    async fn find_athlete(&self, athlete_id: Uuid) -> Result<Athlete> {
        self.store
            .find_athlete(athlete_id)
            .await
            .or_not_found("Athlete", athlete_id)
    }
}

/// Positive whole kilograms.
fn validate_weight(weight: Decimal) -> Result<()> {
    if weight <= Decimal::ZERO {
        return Err(ControlError::InvalidInput(format!(
            "weight must be positive, got {}kg",
            weight
        )));
    }
    if !weight.fract().is_zero() {
        return Err(ControlError::InvalidInput(format!(
            "weight must be whole kilograms, got {}kg",
            weight
        )));
    }
    Ok(())
}

/// Best lift is the heaviest good attempt; the total needs both lifts.
fn refresh_results(athlete: &mut Athlete, lift_type: LiftType, history: &[Attempt]) {
    let best = history
        .iter()
        .filter(|a| a.result == AttemptResult::Good)
        .map(|a| a.weight)
        .max();
    athlete.set_best_lift(lift_type, best);

    athlete.total = match (athlete.best_snatch, athlete.best_clean_and_jerk) {
        (Some(snatch), Some(clean_and_jerk)) => Some(snatch + clean_and_jerk),
        _ => None,
    };
}

fn failed_out(history: &[Attempt]) -> bool {
    let decided: Vec<&Attempt> = history.iter().filter(|a| !a.result.is_pending()).collect();
    decided.len() == ATTEMPTS_PER_LIFT as usize
        && decided.iter().all(|a| a.result == AttemptResult::NoLift)
}

/// Returns true when this call is the one that disqualified the athlete.
fn disqualify_if_failed_out(athlete: &mut Athlete, history: &[Attempt]) -> bool {
    if athlete.is_disqualified || !failed_out(history) {
        return false;
    }
    athlete.is_disqualified = true;
    athlete.disqualified_reason = Some(THREE_FAILURES_REASON.to_string());
    true
}
