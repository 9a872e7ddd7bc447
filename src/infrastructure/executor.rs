//! Step executor
//!
//! Dispatches one planned step to its agent with a bounded timeout and
//! normalizes every outcome into a `StepResult`, so the rest of the
//! pipeline never branches on agent-specific error types. Appending the
//! finished record to the context is the executor's only mutation of
//! shared state. Dropping the returned future aborts the in-flight agent
//! call; completed prior steps are never rolled back.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::domain::{
    AgentContext, AgentRequest, Draft, DraftStore, NextStep, OrchestrationError, StepRecord,
    StepResult, SubAgent, TokenProvider, WorkflowContext,
};
use crate::infrastructure::agent::AgentRegistry;

/// Executes planned steps against registered agents
#[derive(Debug)]
pub struct StepExecutor {
    registry: Arc<AgentRegistry>,
    drafts: Arc<dyn DraftStore>,
    tokens: Arc<dyn TokenProvider>,

    /// Used when the agent declares no timeout of its own
    default_timeout: Duration,

    /// How long a created draft stays confirmable
    draft_ttl: chrono::Duration,
}

impl StepExecutor {
    pub fn new(
        registry: Arc<AgentRegistry>,
        drafts: Arc<dyn DraftStore>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            registry,
            drafts,
            tokens,
            default_timeout: Duration::from_millis(30_000),
            draft_ttl: chrono::Duration::minutes(15),
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_draft_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.draft_ttl = ttl;
        self
    }

    /// Execute one step and append its record to the context.
    ///
    /// Agent-level failures (timeouts, downstream errors, missing auth)
    /// come back as failed `StepResult`s for the reevaluator to act on.
    /// An unknown or disabled target is a planning bug and surfaces as an
    /// error without touching the history.
    pub async fn execute(
        &self,
        step: &NextStep,
        context: &mut WorkflowContext,
    ) -> Result<StepResult, OrchestrationError> {
        let agent = self
            .registry
            .get(&step.agent)
            .await
            .ok_or_else(|| OrchestrationError::agent_not_found(&step.agent))?;

        let descriptor = agent.descriptor().clone();
        if !descriptor.enabled {
            return Err(OrchestrationError::agent_disabled(&descriptor.name));
        }

        let mut record = StepRecord::planned(context.next_step_number(), step);
        record.mark_executing();

        let result = self.dispatch(&*agent, step, context).await;

        if let Some(data) = result.data.as_object() {
            for (key, value) in data {
                context.insert_data(key.clone(), value.clone());
            }
        }

        record.finish(result.clone());
        context.record_step(record);

        Ok(result)
    }

    async fn dispatch(
        &self,
        agent: &dyn SubAgent,
        step: &NextStep,
        context: &WorkflowContext,
    ) -> StepResult {
        let descriptor = agent.descriptor();
        let user = context.user();

        let mut agent_context = AgentContext::new(&user.session_id, &user.user_id);

        if let Some(ref service) = descriptor.requires_auth {
            match self.tokens.valid_token(&user.user_id, service).await {
                Ok(token) => {
                    agent_context = agent_context.with_auth_token(token);
                }
                Err(e) => {
                    warn!(agent = %descriptor.name, service = %service, error = %e, "Missing auth token");
                    return StepResult::failure(
                        step.description.clone(),
                        format!("not authenticated with {}", service),
                    );
                }
            }
        }

        let mut request =
            AgentRequest::new(step.description.clone(), agent_context).with_parameters(step.parameters.clone());
        if let Some(ref operation) = step.operation {
            request = request.with_operation(operation.clone());
        }

        let timeout = descriptor
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or(self.default_timeout);

        debug!(agent = %descriptor.name, ?timeout, "Dispatching step");

        let response = match tokio::time::timeout(timeout, agent.execute(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return StepResult::failure(step.description.clone(), e.to_string());
            }
            Err(_) => {
                return StepResult::failure(step.description.clone(), "timeout");
            }
        };

        if !response.success {
            return StepResult::failure(
                step.description.clone(),
                response
                    .error
                    .unwrap_or_else(|| "agent reported failure".to_string()),
            );
        }

        let summary = if response.response.is_empty() {
            step.description.clone()
        } else {
            response.response.clone()
        };

        let mut data = match response.structured_data {
            Some(Value::Object(map)) => Value::Object(map),
            Some(other) => json!({"result": other}),
            None => json!({}),
        };

        if let Some(proposal) = response.proposed_draft {
            let now = chrono::Utc::now();
            let draft = Draft::new(
                &user.session_id,
                agent.name(),
                &proposal.action,
                now,
                self.draft_ttl,
            )
            .with_parameters(proposal.parameters)
            .with_preview(&proposal.preview)
            .with_risk_level(proposal.risk_level);

            match self.drafts.create(draft).await {
                Ok(draft) => {
                    data["draft_id"] = json!(draft.id().to_string());
                    data["confirmation_prompt"] = json!(format!(
                        "{} Reply 'yes' to confirm or 'no' to cancel.",
                        draft.preview()
                    ));
                }
                Err(e) => {
                    return StepResult::failure(
                        step.description.clone(),
                        format!("failed to store draft: {}", e),
                    );
                }
            }
        }

        StepResult::success(summary, data)
    }
}
