//! Workflow domain module
//!
//! The state and decision types of the master orchestration loop: a
//! per-request [`WorkflowContext`] threaded through plan → execute →
//! reevaluate iterations, the append-only step history, advisory plans,
//! and the ports the loop's LLM-backed judgments hide behind.

mod context;
mod error;
mod outcome;
mod plan;
mod ports;
mod step;

pub use context::{UserContext, WorkflowContext, DEFAULT_MAX_STEPS};
pub use error::OrchestrationError;
pub use outcome::{PlannerDecision, ReevalOutcome, TerminationReason};
pub use plan::{Plan, PlannedStep};
pub use ports::{Reevaluator, ResponseComposer, StepPlanner};
pub use step::{NextStep, StepRecord, StepResult, StepStatus};

#[cfg(test)]
pub use ports::mock::{MockComposer, MockPlanner, MockReevaluator};
