use chrono::{DateTime, Utc};
use storage::models::{Attempt, AttemptResult, Decision};

use crate::error::{ControlError, Result};
use crate::referee::RefereeDecisionAggregator;

/// Outcome of a jury override, carrying what the referees alone had decided.
#[derive(Debug, Clone, PartialEq)]
pub struct JuryOverride {
    pub previous_result: AttemptResult,
    pub decision: Decision,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Records binding jury decisions (IWF Rule 3.3.5).
///
/// An override is final: a second override of the same attempt is rejected
/// with a rule violation rather than re-stamped.
pub struct JuryOverrideAuthority;

impl JuryOverrideAuthority {
    pub fn apply(
        attempt: &mut Attempt,
        decision: Decision,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<JuryOverride> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ControlError::InvalidInput(
                "jury override requires a reason".to_string(),
            ));
        }

        if attempt.is_overridden() {
            return Err(ControlError::RuleViolation(format!(
                "attempt already overridden by jury: attempt {} stands as {}",
                attempt.attempt_number, attempt.result
            )));
        }

        let previous_result = RefereeDecisionAggregator::aggregate(&attempt.referee_calls());

        attempt.jury_decision = Some(decision);
        attempt.jury_reason = Some(reason.to_string());
        attempt.jury_overridden_at = Some(at);
        attempt.result = AttemptResult::from(decision);
        attempt.decided_at.get_or_insert(at);
        attempt.updated_at = at;

        Ok(JuryOverride {
            previous_result,
            decision,
            reason: reason.to_string(),
            at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storage::models::{AttemptState, LiftType, RefereeCall, RefereePosition};
    use uuid::Uuid;

    fn attempt() -> Attempt {
        Attempt::new(Uuid::new_v4(), Uuid::new_v4(), LiftType::Snatch, 2, Decimal::from(97))
    }

    #[test]
    fn test_override_replaces_referee_majority() {
        let mut attempt = attempt();
        for position in RefereePosition::all() {
            attempt.set_referee_call(*position, RefereeCall::Good);
        }
        attempt.result = AttemptResult::Good;

        let outcome =
            JuryOverrideAuthority::apply(&mut attempt, Decision::NoLift, "press-out", Utc::now()).unwrap();

        assert_eq!(outcome.previous_result, AttemptResult::Good);
        assert_eq!(attempt.result, AttemptResult::NoLift);
        assert_eq!(attempt.state(), AttemptState::Overridden);
        assert_eq!(attempt.jury_reason.as_deref(), Some("press-out"));
        assert!(attempt.jury_overridden_at.is_some());
    }

    #[test]
    fn test_override_on_pending_attempt_reports_pending() {
        let mut attempt = attempt();
        attempt.set_referee_call(RefereePosition::Left, RefereeCall::NoLift);

        let outcome =
            JuryOverrideAuthority::apply(&mut attempt, Decision::Good, "video review", Utc::now()).unwrap();

        assert_eq!(outcome.previous_result, AttemptResult::Pending);
        assert_eq!(attempt.result, AttemptResult::Good);
        assert!(attempt.decided_at.is_some());
    }

    #[test]
    fn test_blank_reason_is_invalid_input() {
        let mut attempt = attempt();
        let err = JuryOverrideAuthority::apply(&mut attempt, Decision::Good, "   \t", Utc::now()).unwrap_err();
        assert!(matches!(err, ControlError::InvalidInput(_)));
        assert!(!attempt.is_overridden());
    }

    #[test]
    fn test_reason_is_trimmed() {
        let mut attempt = attempt();
        let outcome =
            JuryOverrideAuthority::apply(&mut attempt, Decision::Good, "  elbow lockout ok ", Utc::now()).unwrap();
        assert_eq!(outcome.reason, "elbow lockout ok");
    }

    #[test]
    fn test_second_override_is_rejected_and_first_stands() {
        let mut attempt = attempt();
        JuryOverrideAuthority::apply(&mut attempt, Decision::NoLift, "knee touched", Utc::now()).unwrap();

        let err = JuryOverrideAuthority::apply(&mut attempt, Decision::Good, "changed our mind", Utc::now())
            .unwrap_err();

        assert!(matches!(err, ControlError::RuleViolation(_)));
        assert_eq!(attempt.result, AttemptResult::NoLift);
        assert_eq!(attempt.jury_decision, Some(Decision::NoLift));
        assert_eq!(attempt.jury_reason.as_deref(), Some("knee touched"));
    }
}
