//! Lifting order for one session and lift type.
//!
//! Lighter bars go first. Ties on weight fall to lot number, then attempt
//! number, then athletes repeating a failed weight, then start number.

use std::cmp::Ordering;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storage::RecordStore;
use storage::models::{Athlete, Attempt, AttemptResult, LiftType, WeightChangeRequest};
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{NotFoundExt, Result};
use crate::weight_change::WeightChangeGovernor;

/// Attempts each athlete gets per lift type.
pub const ATTEMPTS_PER_LIFT: i16 = 3;

/// Bar increase assumed after a good lift when no raise was requested.
pub const DEFAULT_INCREMENT: Decimal = Decimal::ONE;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LiftingOrderEntry {
    pub athlete_id: Uuid,
    pub athlete_name: String,
    pub start_number: i32,
    pub lot_number: Option<i32>,
    pub next_attempt_number: i16,
    pub requested_weight: Decimal,
    pub attempts_completed: i16,
    /// The previous attempt failed and the same weight is being repeated.
    pub repeating_after_failure: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LiftingPositions {
    /// Called to the platform.
    pub current: Option<LiftingOrderEntry>,
    pub on_deck: Option<LiftingOrderEntry>,
    pub in_hole: Option<LiftingOrderEntry>,
    pub full_order: Vec<LiftingOrderEntry>,
}

impl LiftingPositions {
    pub fn from_order(order: Vec<LiftingOrderEntry>) -> Self {
        let mut leading = order.iter().cloned();
        Self {
            current: leading.next(),
            on_deck: leading.next(),
            in_hole: leading.next(),
            full_order: order,
        }
    }
}

pub struct LiftingOrderCalculator {
    store: Arc<dyn RecordStore>,
}

impl LiftingOrderCalculator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Recomputed from the store on every call.
    pub async fn order(&self, session_id: Uuid, lift_type: LiftType) -> Result<Vec<LiftingOrderEntry>> {
        self.store
            .find_session(session_id)
            .await
            .or_not_found("Session", session_id)?;

        let athletes = self.store.list_session_athletes(session_id).await?;
        let attempts = self.store.list_session_attempts(session_id, lift_type).await?;
        let changes = self
            .store
            .list_session_weight_changes(session_id, lift_type)
            .await?;

        let order = Self::compute_order(&athletes, &attempts, &changes, lift_type);
        debug!(
            session_id = %session_id,
            lift_type = %lift_type,
            lifters = order.len(),
            "Lifting order recomputed"
        );

        Ok(order)
    }

    pub async fn current_lifting_positions(
        &self,
        session_id: Uuid,
        lift_type: LiftType,
    ) -> Result<LiftingPositions> {
        let order = self.order(session_id, lift_type).await?;
        Ok(LiftingPositions::from_order(order))
    }

    /// Pure ordering over already-loaded records.
    pub fn compute_order(
        athletes: &[Athlete],
        attempts: &[Attempt],
        changes: &[WeightChangeRequest],
        lift_type: LiftType,
    ) -> Vec<LiftingOrderEntry> {
        let mut order: Vec<LiftingOrderEntry> = athletes
            .iter()
            .filter(|a| a.weighed_in && !a.is_disqualified)
            .filter_map(|athlete| {
                let mut own_attempts: Vec<&Attempt> = attempts
                    .iter()
                    .filter(|t| t.athlete_id == athlete.athlete_id && t.lift_type == lift_type)
                    .collect();
                own_attempts.sort_by_key(|t| t.attempt_number);

                let own_changes: Vec<WeightChangeRequest> = changes
                    .iter()
                    .filter(|c| c.athlete_id == athlete.athlete_id && c.lift_type == lift_type)
                    .cloned()
                    .collect();

                Self::entry_for(athlete, &own_attempts, &own_changes, lift_type)
            })
            .collect();

        order.sort_by(Self::compare);
        order
    }

    fn entry_for(
        athlete: &Athlete,
        attempts: &[&Attempt],
        changes: &[WeightChangeRequest],
        lift_type: LiftType,
    ) -> Option<LiftingOrderEntry> {
        let completed: Vec<&Attempt> = attempts
            .iter()
            .copied()
            .filter(|t| !t.result.is_pending())
            .collect();
        let attempts_completed = completed.len() as i16;
        if attempts_completed >= ATTEMPTS_PER_LIFT {
            return None;
        }

        let next_attempt_number = attempts_completed + 1;
        let previous = completed.last().copied();
        let repeating_after_failure =
            matches!(previous, Some(p) if p.result == AttemptResult::NoLift);

        let declared = attempts
            .iter()
            .find(|t| t.result.is_pending() && t.attempt_number == next_attempt_number);

        // a failed weight is repeated as is, whatever was declared
        let requested_weight = match (declared, previous) {
            (_, Some(previous)) if previous.result == AttemptResult::NoLift => previous.weight,
            (Some(declared), _) => declared.weight,
            (None, None) => {
                WeightChangeGovernor::effective_from(athlete.opening_weight(lift_type), changes)
            }
            (None, Some(previous)) => changes
                .iter()
                .filter(|c| c.new_weight > previous.weight)
                .max_by_key(|c| c.requested_at)
                .map(|c| c.new_weight)
                .unwrap_or(previous.weight + DEFAULT_INCREMENT),
        };

        Some(LiftingOrderEntry {
            athlete_id: athlete.athlete_id,
            athlete_name: athlete.full_name(),
            start_number: athlete.start_number,
            lot_number: athlete.lot_number,
            next_attempt_number,
            requested_weight,
            attempts_completed,
            repeating_after_failure,
        })
    }

    /// Strict total order over lifters. Athlete id is the last resort so
    /// that duplicate start numbers still compare deterministically.
    pub fn compare(a: &LiftingOrderEntry, b: &LiftingOrderEntry) -> Ordering {
        a.requested_weight
            .cmp(&b.requested_weight)
            .then_with(|| compare_lot(a.lot_number, b.lot_number))
            .then_with(|| a.next_attempt_number.cmp(&b.next_attempt_number))
            .then_with(|| b.repeating_after_failure.cmp(&a.repeating_after_failure))
            .then_with(|| a.start_number.cmp(&b.start_number))
            .then_with(|| a.athlete_id.cmp(&b.athlete_id))
    }
}

/// Missing lot numbers sort last.
fn compare_lot(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
