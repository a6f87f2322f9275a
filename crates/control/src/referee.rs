use chrono::Utc;
use storage::models::{Attempt, AttemptResult, AttemptState, Decision, RefereeCall, RefereePosition};

use crate::error::{ControlError, Result};

/// Majority rule over the three referee slots.
///
/// Operates on an attempt value; persistence, finalization and events belong
/// to [`crate::attempts::AttemptStateMachine`].
pub struct RefereeDecisionAggregator;

impl RefereeDecisionAggregator {
    /// `good` with at least two good calls, `no-lift` otherwise. Stays
    /// `pending` while any slot is unset.
    pub fn aggregate(calls: &[RefereeCall; 3]) -> AttemptResult {
        if calls.iter().any(|c| !c.is_set()) {
            return AttemptResult::Pending;
        }

        let good = calls.iter().filter(|c| **c == RefereeCall::Good).count();
        if good >= 2 {
            AttemptResult::Good
        } else {
            AttemptResult::NoLift
        }
    }

    /// Writes one referee's call. Returns the aggregated result, which is
    /// `pending` until all three slots are filled.
    pub fn record_decision(
        attempt: &mut Attempt,
        position: RefereePosition,
        decision: Decision,
    ) -> Result<AttemptResult> {
        Self::ensure_open(attempt)?;

        attempt.set_referee_call(position, RefereeCall::from(decision));
        attempt.updated_at = Utc::now();

        Ok(Self::aggregate(&attempt.referee_calls()))
    }

    /// Fills all three slots with the same call at once.
    pub fn record_quick_decision(attempt: &mut Attempt, decision: Decision) -> Result<AttemptResult> {
        Self::ensure_open(attempt)?;

        for position in RefereePosition::all() {
            attempt.set_referee_call(*position, RefereeCall::from(decision));
        }
        attempt.updated_at = Utc::now();

        Ok(Self::aggregate(&attempt.referee_calls()))
    }

    fn ensure_open(attempt: &Attempt) -> Result<()> {
        match attempt.state() {
            AttemptState::Declared => Ok(()),
            AttemptState::Resolved => Err(ControlError::RuleViolation(format!(
                "decision recorded after all three calls: attempt {} awaits finalization",
                attempt.attempt_number
            ))),
            AttemptState::Finalized => Err(ControlError::RuleViolation(format!(
                "decision recorded after attempt finalized: attempt {} is already {}",
                attempt.attempt_number, attempt.result
            ))),
            AttemptState::Overridden => Err(ControlError::RuleViolation(format!(
                "decision recorded after jury override: attempt {} stands as {}",
                attempt.attempt_number, attempt.result
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storage::models::LiftType;
    use uuid::Uuid;

    use RefereeCall::{Good, NoLift, Unset};

    fn attempt() -> Attempt {
        Attempt::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            LiftType::CleanAndJerk,
            1,
            Decimal::from(120),
        )
    }

    #[test]
    fn test_partial_calls_stay_pending() {
        assert_eq!(RefereeDecisionAggregator::aggregate(&[Unset, Unset, Unset]), AttemptResult::Pending);
        assert_eq!(RefereeDecisionAggregator::aggregate(&[Good, Good, Unset]), AttemptResult::Pending);
        assert_eq!(RefereeDecisionAggregator::aggregate(&[NoLift, Unset, NoLift]), AttemptResult::Pending);
    }

    #[test]
    fn test_majority_of_three() {
        let cases = [
            ([Good, Good, Good], AttemptResult::Good),
            ([Good, Good, NoLift], AttemptResult::Good),
            ([NoLift, Good, Good], AttemptResult::Good),
            ([Good, NoLift, Good], AttemptResult::Good),
            ([Good, NoLift, NoLift], AttemptResult::NoLift),
            ([NoLift, NoLift, Good], AttemptResult::NoLift),
            ([NoLift, NoLift, NoLift], AttemptResult::NoLift),
        ];
        for (calls, expected) in cases {
            assert_eq!(RefereeDecisionAggregator::aggregate(&calls), expected, "{:?}", calls);
        }
    }

    #[test]
    fn test_record_decision_resolves_on_third_call() {
        let mut attempt = attempt();
        let r = RefereeDecisionAggregator::record_decision(&mut attempt, RefereePosition::Left, Decision::Good).unwrap();
        assert_eq!(r, AttemptResult::Pending);
        let r = RefereeDecisionAggregator::record_decision(&mut attempt, RefereePosition::Right, Decision::NoLift).unwrap();
        assert_eq!(r, AttemptResult::Pending);
        let r = RefereeDecisionAggregator::record_decision(&mut attempt, RefereePosition::Center, Decision::Good).unwrap();
        assert_eq!(r, AttemptResult::Good);
        // the aggregator never writes the finalized result itself
        assert_eq!(attempt.result, AttemptResult::Pending);
        assert_eq!(attempt.state(), AttemptState::Resolved);
    }

    #[test]
    fn test_resolved_attempt_takes_no_further_calls() {
        let mut attempt = attempt();
        RefereeDecisionAggregator::record_quick_decision(&mut attempt, Decision::Good).unwrap();
        assert_eq!(attempt.state(), AttemptState::Resolved);

        let err = RefereeDecisionAggregator::record_decision(&mut attempt, RefereePosition::Left, Decision::NoLift)
            .unwrap_err();
        assert!(matches!(err, ControlError::RuleViolation(_)));
        assert_eq!(attempt.referee_left, Good);
    }

    #[test]
    fn test_quick_decision_fills_every_slot() {
        let mut attempt = attempt();
        let r = RefereeDecisionAggregator::record_quick_decision(&mut attempt, Decision::NoLift).unwrap();
        assert_eq!(r, AttemptResult::NoLift);
        assert_eq!(attempt.referee_calls(), [NoLift, NoLift, NoLift]);
    }

    #[test]
    fn test_decision_after_finalization_is_rejected() {
        let mut attempt = attempt();
        attempt.result = AttemptResult::Good;

        let err = RefereeDecisionAggregator::record_decision(&mut attempt, RefereePosition::Left, Decision::NoLift)
            .unwrap_err();
        assert!(matches!(err, ControlError::RuleViolation(_)));
        assert_eq!(attempt.referee_left, Unset);
    }

    #[test]
    fn test_decision_after_override_is_rejected() {
        let mut attempt = attempt();
        attempt.jury_decision = Some(Decision::Good);
        attempt.result = AttemptResult::Good;

        let err = RefereeDecisionAggregator::record_quick_decision(&mut attempt, Decision::NoLift).unwrap_err();
        assert!(matches!(err, ControlError::RuleViolation(_)));
    }
}
