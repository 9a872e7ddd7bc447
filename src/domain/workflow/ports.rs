//! Orchestration ports
//!
//! Every place the reference behavior uses an LLM call to decide control
//! flow is modeled as an injected trait, so the loop itself stays
//! deterministic and testable with scripted implementations.

use async_trait::async_trait;

use super::context::WorkflowContext;
use super::error::OrchestrationError;
use super::outcome::{PlannerDecision, ReevalOutcome, TerminationReason};
use super::step::StepResult;
use crate::domain::agent::AgentDescriptor;

/// Decides the single next unit of work, or signals completion.
///
/// Callers must stop invoking the planner once the context's step budget
/// is exhausted; the cap is enforced by the driver, not here.
#[async_trait]
pub trait StepPlanner: Send + Sync + std::fmt::Debug {
    async fn plan_next_step(
        &self,
        context: &WorkflowContext,
        agents: &[AgentDescriptor],
    ) -> Result<PlannerDecision, OrchestrationError>;
}

/// Judges an executed step and decides how the loop proceeds.
///
/// Infallible by contract: implementations degrade internally (continue
/// under budget, terminate otherwise) rather than surface an error, so a
/// mid-loop outage can never crash a request. The outcome must be a pure
/// function of `(context, latest)`.
#[async_trait]
pub trait Reevaluator: Send + Sync + std::fmt::Debug {
    async fn reevaluate(&self, context: &WorkflowContext, latest: &StepResult) -> ReevalOutcome;
}

/// Renders the accumulated step results into one final user-facing message.
///
/// Also infallible: a failed backing call degrades to a deterministic
/// summary built from the step records.
#[async_trait]
pub trait ResponseComposer: Send + Sync + std::fmt::Debug {
    async fn compose(&self, context: &WorkflowContext, reason: &TerminationReason) -> String;
}
