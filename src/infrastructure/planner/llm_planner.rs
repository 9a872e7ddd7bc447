//! LLM-backed step planner
//!
//! Maps natural language plus the structured workflow state onto the next
//! atomic step. Parsing is strict: an unparsable reply is retried a bounded
//! number of times and then reported as `PlanningUnavailable` — never
//! silently replaced with lexical guessing, which picks wrong agents.
//!
//! The planner also enforces the dependency-ordering invariant: any step
//! whose recipient parameters hold a bare person name gets a
//! contact-resolution step interposed before it. Downstream agents assume
//! pre-resolved addresses and never resolve names themselves.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::prompts;
use crate::domain::{
    AgentDescriptor, LlmProvider, LlmRequest, NextStep, OrchestrationError, PlannerDecision,
    StepPlanner, WorkflowContext,
};

/// Parameter keys that carry a message or event recipient
const RECIPIENT_KEYS: &[&str] = &["to", "recipient", "recipients", "attendee", "attendees", "cc", "bcc"];

/// Operation name of the interposed resolution step
pub const RESOLVE_CONTACT_OPERATION: &str = "resolve_contact";

/// Anything shaped like local@domain counts as already resolved
static ADDRESS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").unwrap());

/// LLM-backed implementation of StepPlanner
#[derive(Debug)]
pub struct LlmStepPlanner {
    provider: Arc<dyn LlmProvider>,
    model: String,

    /// Attempts beyond the first for unparsable or failed planning calls
    retries: u32,
}

impl LlmStepPlanner {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            retries: 2,
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    async fn request_decision(
        &self,
        context: &WorkflowContext,
        agents: &[AgentDescriptor],
    ) -> Result<PlannerReply, OrchestrationError> {
        let request = LlmRequest::builder()
            .system(prompts::planner_system_prompt(agents))
            .user(prompts::planner_user_prompt(context))
            .json_object()
            .temperature(0.0)
            .build();

        let mut last_error = String::new();

        for attempt in 0..=self.retries {
            match self.provider.chat(&self.model, request.clone()).await {
                Ok(response) => match serde_json::from_str::<PlannerReply>(response.content()) {
                    Ok(reply) => return Ok(reply),
                    Err(e) => {
                        warn!(attempt, error = %e, "Unparsable planning reply");
                        last_error = format!("unparsable reply: {}", e);
                    }
                },
                Err(e) => {
                    warn!(attempt, error = %e, "Planning call failed");
                    last_error = e.to_string();
                }
            }
        }

        Err(OrchestrationError::planning_unavailable(last_error))
    }

    /// Validate the selected agent against the manifest
    fn validate_agent(
        step: &NextStep,
        agents: &[AgentDescriptor],
    ) -> Result<(), OrchestrationError> {
        match agents.iter().find(|a| a.name == step.agent) {
            Some(descriptor) if descriptor.enabled => Ok(()),
            Some(descriptor) => Err(OrchestrationError::agent_disabled(&descriptor.name)),
            None => Err(OrchestrationError::agent_not_found(&step.agent)),
        }
    }

    /// When a recipient parameter holds a bare name, substitute a
    /// contact-resolution step for the planned one. The dependent step is
    /// re-planned on the next iteration with the resolved address in the
    /// gathered data.
    fn interpose_contact_resolution(
        step: NextStep,
        context: &WorkflowContext,
        agents: &[AgentDescriptor],
    ) -> Result<NextStep, OrchestrationError> {
        let Some(name) = first_unresolved_recipient(&step.parameters) else {
            return Ok(step);
        };

        if already_resolved(context, &name) {
            return Ok(step);
        }

        let contact_agent = find_contact_agent(agents).ok_or_else(|| {
            OrchestrationError::no_suitable_agent(format!("resolve contact '{}'", name))
        })?;

        debug!(name = %name, agent = %contact_agent.name, "Interposing contact resolution");

        let mut parameters = Map::new();
        parameters.insert("name".to_string(), Value::String(name.clone()));

        Ok(NextStep::new(
            contact_agent.name.clone(),
            format!("Resolve '{}' to an email address", name),
        )
        .with_operation(RESOLVE_CONTACT_OPERATION)
        .with_parameters(parameters))
    }
}

#[async_trait]
impl StepPlanner for LlmStepPlanner {
    async fn plan_next_step(
        &self,
        context: &WorkflowContext,
        agents: &[AgentDescriptor],
    ) -> Result<PlannerDecision, OrchestrationError> {
        let reply = self.request_decision(context, agents).await?;

        match reply.action {
            PlannerAction::Complete => Ok(PlannerDecision::Complete),
            PlannerAction::NextStep => {
                let raw = reply.step.ok_or_else(|| {
                    OrchestrationError::planning_unavailable("next_step reply without a step")
                })?;

                let mut step = NextStep::new(raw.agent, raw.description)
                    .with_parameters(raw.parameters);
                if let Some(operation) = raw.operation {
                    step = step.with_operation(operation);
                }

                Self::validate_agent(&step, agents)?;
                let step = Self::interpose_contact_resolution(step, context, agents)?;

                Ok(PlannerDecision::Next(step))
            }
        }
    }
}

/// First recipient-shaped parameter value that is not an address
fn first_unresolved_recipient(parameters: &Map<String, Value>) -> Option<String> {
    for key in RECIPIENT_KEYS {
        match parameters.get(*key) {
            Some(Value::String(value)) if !looks_like_address(value) => {
                return Some(value.clone());
            }
            Some(Value::Array(values)) => {
                for value in values {
                    if let Value::String(value) = value {
                        if !looks_like_address(value) {
                            return Some(value.clone());
                        }
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn looks_like_address(value: &str) -> bool {
    ADDRESS_PATTERN.is_match(value.trim())
}

/// Whether a successful resolution step for this name already ran
fn already_resolved(context: &WorkflowContext, name: &str) -> bool {
    context.completed_steps().iter().any(|record| {
        record.is_successful()
            && record.operation.as_deref() == Some(RESOLVE_CONTACT_OPERATION)
            && record
                .parameters
                .get("name")
                .and_then(Value::as_str)
                .map(|n| n.eq_ignore_ascii_case(name))
                .unwrap_or(false)
    })
}

/// The enabled agent that owns contact lookup
fn find_contact_agent(agents: &[AgentDescriptor]) -> Option<&AgentDescriptor> {
    agents.iter().find(|agent| {
        agent.enabled
            && (agent.name.contains("contact")
                || agent
                    .capabilities
                    .iter()
                    .any(|capability| capability.contains("contact")))
    })
}

// Wire shapes for the planning reply

#[derive(Debug, Deserialize)]
struct PlannerReply {
    action: PlannerAction,
    #[serde(default)]
    step: Option<RawStep>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum PlannerAction {
    NextStep,
    Complete,
}

#[derive(Debug, Deserialize)]
struct RawStep {
    agent: String,
    #[serde(default)]
    operation: Option<String>,
    #[serde(default)]
    parameters: Map<String, Value>,
    description: String,
}
