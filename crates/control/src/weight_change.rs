use std::sync::Arc;

use rust_decimal::Decimal;
use storage::RecordStore;
use storage::models::{Athlete, AttemptResult, LiftType, WeightChangeRequest};
use tracing::info;
use uuid::Uuid;

use crate::error::{ControlError, NotFoundExt, Result};
use crate::events::{DomainEvent, EventBroadcaster, WeightChangedPayload};
use crate::locks::KeyedLocks;

/// Approved changes allowed per athlete and lift type.
pub const MAX_CHANGES_PER_LIFT: usize = 2;

/// Smallest accepted raise, in kilograms.
pub const MINIMUM_INCREASE: Decimal = Decimal::ONE;

/// Validates and records raises of an athlete's declared weight.
pub struct WeightChangeGovernor {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventBroadcaster>,
    locks: KeyedLocks,
}

impl WeightChangeGovernor {
    pub fn new(store: Arc<dyn RecordStore>, events: Arc<dyn EventBroadcaster>) -> Self {
        Self {
            store,
            events,
            locks: KeyedLocks::new(),
        }
    }

    /// Checks a raise against the change rules, in order: no decreases, at
    /// least 1kg, at most two approved changes per lift type. The repeat rule
    /// after a failed attempt is checked by [`Self::request_change`] against
    /// the stored attempts.
    pub fn validate_change(
        old_weight: Decimal,
        new_weight: Decimal,
        approved_so_far: usize,
    ) -> Result<()> {
        if new_weight <= old_weight {
            return Err(ControlError::RuleViolation(format!(
                "no decreases allowed: requested {}kg does not exceed {}kg",
                new_weight, old_weight
            )));
        }

        if new_weight - old_weight < MINIMUM_INCREASE {
            return Err(ControlError::RuleViolation(format!(
                "minimum 1kg increase: {}kg to {}kg is only {}kg",
                old_weight,
                new_weight,
                new_weight - old_weight
            )));
        }

        if approved_so_far >= MAX_CHANGES_PER_LIFT {
            return Err(ControlError::RuleViolation(format!(
                "maximum {} changes per lift type already used",
                MAX_CHANGES_PER_LIFT
            )));
        }

        Ok(())
    }

    /// Newest approved weight, else the opening declaration.
    pub fn effective_from(opening_weight: Decimal, changes: &[WeightChangeRequest]) -> Decimal {
        changes
            .iter()
            .max_by_key(|c| c.requested_at)
            .map(|c| c.new_weight)
            .unwrap_or(opening_weight)
    }

    /// Validates, stores and announces a change.
    pub async fn request_change(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
        old_weight: Decimal,
        new_weight: Decimal,
    ) -> Result<WeightChangeRequest> {
        let (athlete, change) = self
            .approve(athlete_id, lift_type, old_weight, new_weight)
            .await?;

        self.events
            .publish(DomainEvent::WeightChanged(WeightChangedPayload {
                session_id: athlete.session_id,
                athlete_id,
                athlete_name: athlete.full_name(),
                lift_type,
                attempt_id: None,
                old_weight,
                new_weight,
                at: change.requested_at,
            }));

        Ok(change)
    }

    /// Validates and stores a change without publishing; callers that
    /// announce the change themselves use this.
    pub(crate) async fn approve(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
        old_weight: Decimal,
        new_weight: Decimal,
    ) -> Result<(Athlete, WeightChangeRequest)> {
        if old_weight <= Decimal::ZERO || new_weight <= Decimal::ZERO {
            return Err(ControlError::InvalidInput(
                "weights must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(athlete_id).await;

        let athlete = self
            .store
            .find_athlete(athlete_id)
            .await
            .or_not_found("Athlete", athlete_id)?;

        if athlete.is_disqualified {
            return Err(ControlError::RuleViolation(format!(
                "{} is disqualified and cannot change weights",
                athlete.full_name()
            )));
        }

        let history = self.store.list_athlete_attempts(athlete_id, lift_type).await?;
        let last_completed = history
            .iter()
            .filter(|a| !a.result.is_pending())
            .max_by_key(|a| a.attempt_number);
        if let Some(failed) = last_completed.filter(|a| a.result == AttemptResult::NoLift) {
            return Err(ControlError::RuleViolation(format!(
                "no weight change permitted after a failed attempt: {} must repeat {}kg",
                athlete.full_name(),
                failed.weight
            )));
        }

        let existing = self.store.list_weight_changes(athlete_id, lift_type).await?;
        Self::validate_change(old_weight, new_weight, existing.len())?;

        let change = WeightChangeRequest::new(
            athlete_id,
            athlete.session_id,
            lift_type,
            old_weight,
            new_weight,
        );
        self.store.insert_weight_change(&change).await?;

        info!(
            athlete_id = %athlete_id,
            lift_type = %lift_type,
            change_number = existing.len() + 1,
            "Weight change approved: {}kg -> {}kg",
            old_weight,
            new_weight
        );

        Ok((athlete, change))
    }

    pub async fn effective_weight(&self, athlete_id: Uuid, lift_type: LiftType) -> Result<Decimal> {
        let athlete = self
            .store
            .find_athlete(athlete_id)
            .await
            .or_not_found("Athlete", athlete_id)?;
        let changes = self.store.list_weight_changes(athlete_id, lift_type).await?;

        Ok(Self::effective_from(athlete.opening_weight(lift_type), &changes))
    }

    pub async fn approved_changes(
        &self,
        athlete_id: Uuid,
        lift_type: LiftType,
    ) -> Result<Vec<WeightChangeRequest>> {
        self.store
            .find_athlete(athlete_id)
            .await
            .or_not_found("Athlete", athlete_id)?;
        Ok(self.store.list_weight_changes(athlete_id, lift_type).await?)
    }
}
