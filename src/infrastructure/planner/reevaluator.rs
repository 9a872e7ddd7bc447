//! LLM-backed progress reevaluation
//!
//! After each executed step the reevaluator decides whether the loop
//! continues, replans, pauses for confirmation or stops. Two rules are
//! deterministic and never reach the model: a step that created a draft
//! always pauses, and a failed backing call degrades to continue-or-
//! terminate depending on the remaining budget, so a provider outage can
//! never crash a request mid-loop.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use super::prompts;
use crate::domain::{
    DomainError, LlmProvider, LlmRequest, Plan, PlannedStep, ReevalOutcome, Reevaluator,
    StepResult, WorkflowContext,
};

const PARTIAL_COMPLETION_MESSAGE: &str =
    "I couldn't finish everything, but the work done so far is summarized below.";

/// LLM-backed implementation of Reevaluator
#[derive(Debug)]
pub struct LlmReevaluator {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmReevaluator {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    async fn judge(
        &self,
        context: &WorkflowContext,
        latest: &StepResult,
    ) -> Result<ReevalOutcome, DomainError> {
        let request = LlmRequest::builder()
            .system(prompts::reevaluator_system_prompt())
            .user(prompts::reevaluator_user_prompt(context, latest))
            .json_object()
            .temperature(0.0)
            .build();

        let response = self.provider.chat(&self.model, request).await?;

        let reply: ReevalReply = serde_json::from_str(response.content())
            .map_err(|e| DomainError::internal(format!("unparsable reevaluation reply: {}", e)))?;

        Ok(match reply.outcome {
            ReevalAction::Continue => ReevalOutcome::Continue,
            ReevalAction::Replan => {
                let steps = reply
                    .plan
                    .into_iter()
                    .map(|step| PlannedStep::new(step.agent, step.description))
                    .collect::<Vec<_>>();

                // A replan with nothing to substitute is just a continue
                if steps.is_empty() {
                    ReevalOutcome::Continue
                } else {
                    ReevalOutcome::Replan(Plan::new(steps))
                }
            }
            ReevalAction::Terminate => ReevalOutcome::terminate(
                reply
                    .message
                    .unwrap_or_else(|| "Work on this request has finished.".to_string()),
            ),
        })
    }

    fn fallback(context: &WorkflowContext) -> ReevalOutcome {
        if context.budget_exhausted() {
            ReevalOutcome::terminate(PARTIAL_COMPLETION_MESSAGE)
        } else {
            ReevalOutcome::Continue
        }
    }
}

#[async_trait]
impl Reevaluator for LlmReevaluator {
    async fn reevaluate(&self, context: &WorkflowContext, latest: &StepResult) -> ReevalOutcome {
        // A created draft always pauses; no judgment call involved.
        if let Some(draft_id) = latest.draft_id() {
            let prompt = latest
                .data
                .get("confirmation_prompt")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| {
                    format!("{} Reply 'yes' to confirm or 'no' to cancel.", latest.summary)
                });

            return ReevalOutcome::pause(draft_id, prompt);
        }

        match self.judge(context, latest).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Reevaluation failed, using safe default");
                Self::fallback(context)
            }
        }
    }
}

// Wire shapes for the reevaluation reply

#[derive(Debug, Deserialize)]
struct ReevalReply {
    outcome: ReevalAction,
    #[serde(default)]
    plan: Vec<RawPlannedStep>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReevalAction {
    Continue,
    Replan,
    Terminate,
}

#[derive(Debug, Deserialize)]
struct RawPlannedStep {
    agent: String,
    description: String,
}
