//! Decision types produced by the planner and the reevaluator

use serde::{Deserialize, Serialize};

use super::plan::Plan;
use super::step::NextStep;
use crate::domain::draft::DraftId;

/// What the planner decided to do next
#[derive(Debug, Clone, PartialEq)]
pub enum PlannerDecision {
    /// Execute one more step
    Next(NextStep),

    /// The original request is satisfied; stop planning
    Complete,
}

/// Verdict after examining an executed step
#[derive(Debug, Clone, PartialEq)]
pub enum ReevalOutcome {
    /// Proceed to plan the next step normally
    Continue,

    /// Discard the remaining advisory plan and substitute a new one
    Replan(Plan),

    /// A draft was created; stop the loop and ask the user
    PauseForConfirmation { draft_id: DraftId, prompt: String },

    /// Stop early, successfully or not, with an explicit message
    Terminate { message: String },
}

impl ReevalOutcome {
    pub fn terminate(message: impl Into<String>) -> Self {
        Self::Terminate {
            message: message.into(),
        }
    }

    pub fn pause(draft_id: DraftId, prompt: impl Into<String>) -> Self {
        Self::PauseForConfirmation {
            draft_id,
            prompt: prompt.into(),
        }
    }
}

/// Why the loop stopped; drives the framing of the final message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminationReason {
    /// The planner signalled completion
    Completed,

    /// The hard iteration cap was reached with work remaining
    StepLimitReached,

    /// The reevaluator or driver stopped the loop early
    Terminated { message: String },
}

impl TerminationReason {
    pub fn terminated(message: impl Into<String>) -> Self {
        Self::Terminated {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reeval_constructors() {
        let outcome = ReevalOutcome::terminate("nothing left to do");
        assert!(matches!(outcome, ReevalOutcome::Terminate { .. }));

        let id = DraftId::new();
        let outcome = ReevalOutcome::pause(id, "Send it?");
        match outcome {
            ReevalOutcome::PauseForConfirmation { draft_id, prompt } => {
                assert_eq!(draft_id, id);
                assert_eq!(prompt, "Send it?");
            }
            _ => panic!("expected pause"),
        }
    }

    #[test]
    fn test_termination_reason_serialization() {
        let reason = TerminationReason::StepLimitReached;
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("step_limit_reached"));

        let reason = TerminationReason::terminated("backend offline");
        let json = serde_json::to_string(&reason).unwrap();
        assert!(json.contains("backend offline"));
    }
}
