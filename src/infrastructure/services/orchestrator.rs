//! Master orchestration service
//!
//! The outer driver of the step-by-step loop: gather context, plan one
//! step, execute it, reevaluate, and either iterate, pause for user
//! confirmation, or stop and compose the final reply. Steps of one
//! workflow run strictly sequentially; the iteration cap is enforced
//! here and never delegated to the planner.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};

use crate::domain::{
    DraftId, DraftStore, NextStep, OrchestrationError, PlannerDecision, ReevalOutcome,
    ResponseComposer, Reevaluator, StepPlanner, TerminationReason, UserContext, WorkflowContext,
};
use crate::infrastructure::agent::AgentRegistry;
use crate::infrastructure::context_gatherer::ContextGatherer;
use crate::infrastructure::executor::StepExecutor;

/// How one request ended
#[derive(Debug)]
pub enum OrchestrationOutcome {
    /// The loop ran to an end state and composed a reply
    Completed {
        message: String,
        context: WorkflowContext,
    },

    /// A draft needs the user's yes/no before work can continue
    AwaitingConfirmation {
        prompt: String,
        draft_id: DraftId,
        context: WorkflowContext,
    },
}

impl OrchestrationOutcome {
    /// The text to send back to the user
    pub fn message(&self) -> &str {
        match self {
            Self::Completed { message, .. } => message,
            Self::AwaitingConfirmation { prompt, .. } => prompt,
        }
    }

    pub fn context(&self) -> &WorkflowContext {
        match self {
            Self::Completed { context, .. } => context,
            Self::AwaitingConfirmation { context, .. } => context,
        }
    }
}

/// The master agent: coordinates planning, execution and reevaluation
pub struct Orchestrator {
    registry: Arc<AgentRegistry>,
    planner: Arc<dyn StepPlanner>,
    reevaluator: Arc<dyn Reevaluator>,
    composer: Arc<dyn ResponseComposer>,
    executor: StepExecutor,
    gatherer: ContextGatherer,
    drafts: Arc<dyn DraftStore>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish()
    }
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<AgentRegistry>,
        planner: Arc<dyn StepPlanner>,
        reevaluator: Arc<dyn Reevaluator>,
        composer: Arc<dyn ResponseComposer>,
        executor: StepExecutor,
        gatherer: ContextGatherer,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        Self {
            registry,
            planner,
            reevaluator,
            composer,
            executor,
            gatherer,
            drafts,
        }
    }

    /// Process one natural-language request end to end.
    ///
    /// Planning-level failures (`PlanningUnavailable` and friends) surface
    /// as errors whose `user_message()` is safe to show; everything that
    /// executed before the failure stays in the returned context's history
    /// otherwise.
    #[instrument(skip(self), fields(session = %user.session_id))]
    pub async fn handle_request(
        &self,
        request: &str,
        user: UserContext,
    ) -> Result<OrchestrationOutcome, OrchestrationError> {
        let mut context = self.gatherer.gather(request, user).await?;
        let agents = self.registry.list_enabled().await;

        info!(agents = agents.len(), "Starting workflow");

        let reason = loop {
            if context.budget_exhausted() {
                warn!(steps = context.current_step(), "Step limit reached");
                break TerminationReason::StepLimitReached;
            }

            let step = match self.planner.plan_next_step(&context, &agents).await {
                Ok(PlannerDecision::Complete) => break TerminationReason::Completed,
                Ok(PlannerDecision::Next(step)) => step,
                Err(e) if e.is_routing_failure() => {
                    // A nonexistent target is a planning bug: stop with
                    // partial results instead of crashing the request.
                    error!(error = %e, "Planner selected an invalid agent");
                    break TerminationReason::terminated(e.user_message());
                }
                Err(e) => return Err(e),
            };

            info!(agent = %step.agent, step = context.next_step_number(), "Executing step");

            let result = match self.executor.execute(&step, &mut context).await {
                Ok(result) => result,
                Err(e) if e.is_routing_failure() => {
                    error!(error = %e, "Step targeted an invalid agent");
                    break TerminationReason::terminated(e.user_message());
                }
                Err(e) => return Err(e),
            };

            self.advance_plan(&mut context, &step);

            match self.reevaluator.reevaluate(&context, &result).await {
                ReevalOutcome::Continue => continue,
                ReevalOutcome::Replan(plan) => {
                    info!(steps = plan.len(), "Replacing advisory plan");
                    context.set_plan(plan);
                }
                ReevalOutcome::PauseForConfirmation { draft_id, prompt } => {
                    info!(%draft_id, "Pausing for confirmation");
                    return Ok(OrchestrationOutcome::AwaitingConfirmation {
                        prompt,
                        draft_id,
                        context,
                    });
                }
                ReevalOutcome::Terminate { message } => {
                    break TerminationReason::terminated(message);
                }
            }
        };

        let message = self.composer.compose(&context, &reason).await;

        info!(steps = context.current_step(), ?reason, "Workflow finished");

        Ok(OrchestrationOutcome::Completed { message, context })
    }

    /// Resolve the user's yes/no reply against the most recent pending
    /// draft. Approval executes the draft exactly once; rejection discards
    /// it. Either way the draft is gone afterwards.
    #[instrument(skip(self), fields(session = %user.session_id))]
    pub async fn resolve_confirmation(
        &self,
        user: UserContext,
        approved: bool,
    ) -> Result<OrchestrationOutcome, OrchestrationError> {
        let now = chrono::Utc::now();

        let draft = self
            .drafts
            .take_latest_pending(&user.session_id, now)
            .await?
            .ok_or_else(|| OrchestrationError::no_pending_draft(&user.session_id))?;

        if !approved {
            info!(draft_id = %draft.id(), "Draft rejected");
            let context = WorkflowContext::new(draft.preview(), user);
            return Ok(OrchestrationOutcome::Completed {
                message: format!("Okay, cancelled: {}", draft.preview()),
                context,
            });
        }

        info!(draft_id = %draft.id(), action = %draft.action(), "Draft confirmed, executing");

        let mut context = WorkflowContext::new(
            format!("Confirmed: {}", draft.preview()),
            user,
        );

        let mut parameters = draft.parameters().clone();
        parameters.insert("confirmed".to_string(), serde_json::Value::Bool(true));

        let step = NextStep::new(draft.agent(), format!("Execute confirmed action: {}", draft.preview()))
            .with_operation(draft.action())
            .with_parameters(parameters);

        self.executor.execute(&step, &mut context).await?;

        let message = self
            .composer
            .compose(&context, &TerminationReason::Completed)
            .await;

        Ok(OrchestrationOutcome::Completed { message, context })
    }

    /// Consume the advisory plan's head once the matching step ran
    fn advance_plan(&self, context: &mut WorkflowContext, executed: &NextStep) {
        if let Some(plan) = context.plan_mut() {
            if plan.peek().map(|step| step.agent == executed.agent).unwrap_or(false) {
                plan.advance();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::MockAgent;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::workflow::{MockComposer, MockPlanner, MockReevaluator};
    use crate::domain::{AgentResponse, DraftProposal, Plan, PlannedStep, RiskLevel};
    use crate::infrastructure::auth::StaticTokenProvider;
    use crate::infrastructure::conversation::InMemoryConversationStore;
    use crate::infrastructure::draft::InMemoryDraftStore;
    use crate::infrastructure::planner::{LlmReevaluator, LlmResponseComposer, LlmStepPlanner};
    use serde_json::json;

    struct Fixture {
        registry: Arc<AgentRegistry>,
        drafts: Arc<InMemoryDraftStore>,
        max_steps: u32,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: Arc::new(AgentRegistry::new()),
                drafts: Arc::new(InMemoryDraftStore::new()),
                max_steps: 10,
            }
        }

        fn with_max_steps(mut self, max_steps: u32) -> Self {
            self.max_steps = max_steps;
            self
        }

        async fn register(&self, agent: MockAgent) {
            self.registry.register(Arc::new(agent)).await.unwrap();
        }

        fn orchestrator(
            &self,
            planner: Arc<dyn StepPlanner>,
            reevaluator: Arc<dyn Reevaluator>,
            composer: Arc<dyn ResponseComposer>,
        ) -> Orchestrator {
            let tokens = Arc::new(StaticTokenProvider::new());
            let executor = StepExecutor::new(
                self.registry.clone(),
                self.drafts.clone(),
                tokens,
            );
            let gatherer = ContextGatherer::new(
                Arc::new(InMemoryConversationStore::new()),
                self.drafts.clone(),
            )
            .with_max_steps(self.max_steps);

            Orchestrator::new(
                self.registry.clone(),
                planner,
                reevaluator,
                composer,
                executor,
                gatherer,
                self.drafts.clone(),
            )
        }
    }

    fn user() -> UserContext {
        UserContext::new("s1", "u1")
    }

    fn continue_reevaluator() -> Arc<MockReevaluator> {
        Arc::new(MockReevaluator::always(ReevalOutcome::Continue))
    }

    /// End-to-end: "Schedule a meeting with Sarah tomorrow at 2pm and email
    /// her the agenda" resolves the contact first, then creates the event,
    /// then sends the mail, in exactly three steps.
    #[tokio::test]
    async fn test_end_to_end_meeting_and_agenda() {
        let fixture = Fixture::new();

        fixture
            .register(
                MockAgent::named("contacts", "Look up people and their addresses").with_response(
                    AgentResponse::success("Found Sarah's address")
                        .with_structured_data(json!({"contact_email": "sarah@example.com"})),
                ),
            )
            .await;
        fixture
            .register(
                MockAgent::named("calendar", "Manage calendar events").with_response(
                    AgentResponse::success("Created the meeting for tomorrow at 2pm"),
                ),
            )
            .await;
        fixture
            .register(
                MockAgent::named("email", "Send and search email")
                    .with_response(AgentResponse::success("Sent the agenda to Sarah")),
            )
            .await;

        let planner_provider = MockLlmProvider::new("planner")
            .with_response(
                json!({
                    "action": "next_step",
                    "step": {
                        "agent": "calendar",
                        "operation": "create_event",
                        "parameters": {"attendees": ["Sarah"], "title": "Meeting", "time": "tomorrow 2pm"},
                        "description": "Create the meeting with Sarah"
                    }
                })
                .to_string(),
            )
            .with_response(
                json!({
                    "action": "next_step",
                    "step": {
                        "agent": "calendar",
                        "operation": "create_event",
                        "parameters": {"attendees": ["sarah@example.com"], "title": "Meeting", "time": "tomorrow 2pm"},
                        "description": "Create the meeting with Sarah"
                    }
                })
                .to_string(),
            )
            .with_response(
                json!({
                    "action": "next_step",
                    "step": {
                        "agent": "email",
                        "operation": "send_email",
                        "parameters": {"to": "sarah@example.com", "subject": "Agenda"},
                        "description": "Email Sarah the agenda"
                    }
                })
                .to_string(),
            )
            .with_response(json!({"action": "complete"}).to_string());

        let reevaluator_provider = MockLlmProvider::new("reevaluator")
            .with_default_response(json!({"outcome": "continue"}).to_string());

        let composer_provider = MockLlmProvider::new("composer").with_response(
            "I scheduled the meeting with Sarah for tomorrow at 2pm and emailed her the agenda.",
        );

        let orchestrator = fixture.orchestrator(
            Arc::new(LlmStepPlanner::new(Arc::new(planner_provider), "gpt-4o")),
            Arc::new(LlmReevaluator::new(Arc::new(reevaluator_provider), "gpt-4o")),
            Arc::new(LlmResponseComposer::new(
                Arc::new(composer_provider),
                "gpt-4o-mini",
            )),
        );

        let outcome = orchestrator
            .handle_request(
                "Schedule a meeting with Sarah tomorrow at 2pm and email her the agenda",
                user(),
            )
            .await
            .unwrap();

        let OrchestrationOutcome::Completed { message, context } = outcome else {
            panic!("expected completion");
        };

        assert_eq!(context.completed_steps().len(), 3);

        let agents: Vec<&str> = context
            .completed_steps()
            .iter()
            .map(|record| record.agent.as_str())
            .collect();
        assert_eq!(agents, vec!["contacts", "calendar", "email"]);

        assert!(context.completed_steps().iter().all(|r| r.is_successful()));
        assert!(message.contains("meeting"));
        assert!(message.contains("agenda"));
    }

    /// A planner that always wants another step is stopped at exactly
    /// max_steps with a partial result, not an error.
    #[tokio::test]
    async fn test_step_limit_halts_runaway_planner() {
        let fixture = Fixture::new().with_max_steps(3);

        fixture
            .register(
                MockAgent::named("search", "Web search")
                    .with_default_response(AgentResponse::success("Searched again")),
            )
            .await;

        let planner = Arc::new(
            MockPlanner::new().with_default(PlannerDecision::Next(NextStep::new(
                "search",
                "Search once more",
            ))),
        );

        let orchestrator =
            fixture.orchestrator(planner, continue_reevaluator(), Arc::new(MockComposer));

        let outcome = orchestrator
            .handle_request("search forever", user())
            .await
            .unwrap();

        let OrchestrationOutcome::Completed { message, context } = outcome else {
            panic!("expected completion");
        };

        assert_eq!(context.completed_steps().len(), 3);
        assert_eq!(context.current_step(), 3);
        assert!(message.contains("StepLimitReached"));
    }

    #[tokio::test]
    async fn test_draft_pauses_the_loop() {
        let fixture = Fixture::new();

        fixture
            .register(
                MockAgent::named("email", "Send and search email").with_response(
                    AgentResponse::success("Drafted the email").with_draft(
                        DraftProposal::new("send_email", "Send 'Agenda' to Sarah")
                            .with_risk_level(RiskLevel::Medium),
                    ),
                ),
            )
            .await;

        let planner = Arc::new(MockPlanner::new().with_decision(PlannerDecision::Next(
            NextStep::new("email", "Send the agenda").with_operation("send_email"),
        )));

        // The pause rule is deterministic; a provider call would fail loudly
        let reevaluator = Arc::new(LlmReevaluator::new(
            Arc::new(MockLlmProvider::new("reevaluator").with_error("must not be called")),
            "gpt-4o",
        ));

        let orchestrator = fixture.orchestrator(planner, reevaluator, Arc::new(MockComposer));

        let outcome = orchestrator
            .handle_request("email Sarah the agenda", user())
            .await
            .unwrap();

        let OrchestrationOutcome::AwaitingConfirmation { prompt, draft_id, context } = outcome
        else {
            panic!("expected pause");
        };

        assert!(prompt.contains("Send 'Agenda' to Sarah"));
        assert_eq!(context.completed_steps().len(), 1);

        let pending = fixture
            .drafts
            .latest_pending("s1", chrono::Utc::now())
            .await
            .unwrap()
            .expect("draft pending");
        assert_eq!(pending.id(), draft_id);
    }

    #[tokio::test]
    async fn test_confirmation_executes_draft_exactly_once() {
        let fixture = Fixture::new();

        fixture
            .register(
                MockAgent::named("email", "Send and search email")
                    .with_response(
                        AgentResponse::success("Drafted the email").with_draft(
                            DraftProposal::new("send_email", "Send 'Agenda' to Sarah"),
                        ),
                    )
                    .with_response(AgentResponse::success("Sent the email to Sarah")),
            )
            .await;

        let planner = Arc::new(MockPlanner::new().with_decision(PlannerDecision::Next(
            NextStep::new("email", "Send the agenda").with_operation("send_email"),
        )));
        let reevaluator = Arc::new(LlmReevaluator::new(
            Arc::new(MockLlmProvider::new("reevaluator").with_error("unused")),
            "gpt-4o",
        ));

        let orchestrator = fixture.orchestrator(planner, reevaluator, Arc::new(MockComposer));

        let outcome = orchestrator
            .handle_request("email Sarah the agenda", user())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            OrchestrationOutcome::AwaitingConfirmation { .. }
        ));

        // Approve: the draft executes and becomes a step record
        let outcome = orchestrator.resolve_confirmation(user(), true).await.unwrap();
        let OrchestrationOutcome::Completed { context, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(context.completed_steps().len(), 1);
        assert_eq!(context.completed_steps()[0].agent, "email");
        assert!(context.completed_steps()[0].is_successful());

        // A second confirmation finds nothing to confirm
        let result = orchestrator.resolve_confirmation(user(), true).await;
        assert!(matches!(
            result,
            Err(OrchestrationError::NoPendingDraft { .. })
        ));
    }

    #[tokio::test]
    async fn test_positive_confirmation_resolves_most_recent_draft() {
        let fixture = Fixture::new();
        let now = chrono::Utc::now();

        let older = crate::domain::Draft::new(
            "s1",
            "email",
            "send_email",
            now,
            chrono::Duration::minutes(10),
        )
        .with_preview("older draft");
        let newer = crate::domain::Draft::new(
            "s1",
            "email",
            "send_email",
            now + chrono::Duration::seconds(1),
            chrono::Duration::minutes(10),
        )
        .with_preview("newer draft");

        fixture.drafts.create(older).await.unwrap();
        fixture.drafts.create(newer).await.unwrap();

        fixture
            .register(
                MockAgent::named("email", "Email agent")
                    .with_default_response(AgentResponse::success("Sent")),
            )
            .await;

        let orchestrator = fixture.orchestrator(
            Arc::new(MockPlanner::new()),
            continue_reevaluator(),
            Arc::new(MockComposer),
        );

        let outcome = orchestrator.resolve_confirmation(user(), true).await.unwrap();
        let OrchestrationOutcome::Completed { context, .. } = outcome else {
            panic!("expected completion");
        };
        assert!(context.original_request().contains("newer draft"));

        // The older draft is still there for the next reply
        let remaining = fixture
            .drafts
            .latest_pending("s1", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(remaining.preview(), "older draft");
    }

    #[tokio::test]
    async fn test_negative_confirmation_discards_draft() {
        let fixture = Fixture::new();
        let now = chrono::Utc::now();

        fixture
            .drafts
            .create(
                crate::domain::Draft::new(
                    "s1",
                    "email",
                    "send_email",
                    now,
                    chrono::Duration::minutes(10),
                )
                .with_preview("Send 'Agenda' to Sarah"),
            )
            .await
            .unwrap();

        let orchestrator = fixture.orchestrator(
            Arc::new(MockPlanner::new()),
            continue_reevaluator(),
            Arc::new(MockComposer),
        );

        let outcome = orchestrator.resolve_confirmation(user(), false).await.unwrap();
        assert!(outcome.message().contains("cancelled"));

        assert!(fixture
            .drafts
            .latest_pending("s1", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_planning_unavailable_propagates() {
        let fixture = Fixture::new();
        let planner = Arc::new(MockPlanner::new().with_error("backend unreachable"));

        let orchestrator =
            fixture.orchestrator(planner, continue_reevaluator(), Arc::new(MockComposer));

        let result = orchestrator.handle_request("do something", user()).await;
        assert!(matches!(
            result,
            Err(OrchestrationError::PlanningUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_agent_terminates_with_partial_message() {
        let fixture = Fixture::new();

        let planner = Arc::new(
            MockPlanner::new()
                .with_decision(PlannerDecision::Next(NextStep::new("ghost", "Haunt"))),
        );

        let orchestrator =
            fixture.orchestrator(planner, continue_reevaluator(), Arc::new(MockComposer));

        let outcome = orchestrator.handle_request("do something", user()).await.unwrap();

        let OrchestrationOutcome::Completed { message, context } = outcome else {
            panic!("expected completion");
        };
        assert!(context.completed_steps().is_empty());
        assert!(message.contains("Terminated"));
    }

    #[tokio::test]
    async fn test_replan_substitutes_advisory_plan() {
        let fixture = Fixture::new();

        fixture
            .register(
                MockAgent::named("search", "Web search")
                    .with_default_response(AgentResponse::success("Nothing found")),
            )
            .await;

        let planner = Arc::new(
            MockPlanner::new()
                .with_decision(PlannerDecision::Next(NextStep::new("search", "Find the doc")))
                .with_default(PlannerDecision::Complete),
        );

        let new_plan = Plan::new(vec![PlannedStep::new(
            "email",
            "Tell the user nothing was found",
        )]);
        let reevaluator = Arc::new(
            MockReevaluator::always(ReevalOutcome::Continue)
                .with_outcome(ReevalOutcome::Replan(new_plan.clone())),
        );

        let orchestrator = fixture.orchestrator(planner, reevaluator, Arc::new(MockComposer));

        let outcome = orchestrator.handle_request("find the doc", user()).await.unwrap();

        let OrchestrationOutcome::Completed { context, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(context.plan(), Some(&new_plan));
    }

    #[tokio::test]
    async fn test_terminate_outcome_stops_loop() {
        let fixture = Fixture::new();

        fixture
            .register(
                MockAgent::named("search", "Web search")
                    .with_default_response(AgentResponse::success("Zero results")),
            )
            .await;

        let planner = Arc::new(
            MockPlanner::new()
                .with_decision(PlannerDecision::Next(NextStep::new("search", "Find it")))
                .with_default(PlannerDecision::Next(NextStep::new("search", "Keep looking"))),
        );

        let reevaluator = Arc::new(MockReevaluator::always(ReevalOutcome::terminate(
            "The search found nothing to work with.",
        )));

        let orchestrator = fixture.orchestrator(planner, reevaluator, Arc::new(MockComposer));

        let outcome = orchestrator.handle_request("find it", user()).await.unwrap();

        let OrchestrationOutcome::Completed { message, context } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(context.completed_steps().len(), 1);
        assert!(message.contains("The search found nothing"));
    }
}

