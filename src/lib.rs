//! PMP Agent Orchestrator
//!
//! Master-agent coordination core for multi-agent assistants. Takes a
//! natural-language user request, plans one atomic step at a time against
//! a registry of sub-agents (email, calendar, contacts, chat search, web
//! search), executes each step with a bounded timeout, reevaluates after
//! every result, and composes one natural-language reply. Destructive
//! actions pause as drafts until the user confirms them.
//!
//! The crate is invoked in-process by an upstream request handler; it has
//! no network surface of its own. All LLM-backed decisions sit behind
//! ports, so the loop runs deterministically under test.

pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use domain::{
    ConversationStore, DraftStore, LlmProvider, SubAgent, TokenProvider,
};
use infrastructure::agent::AgentRegistry;
use infrastructure::draft::InMemoryDraftStore;
use infrastructure::llm::{HttpClient, OpenAiProvider};
use infrastructure::planner::{LlmReevaluator, LlmResponseComposer, LlmStepPlanner};
use infrastructure::services::Orchestrator;
use infrastructure::{ContextGatherer, StepExecutor};

/// External collaborators the orchestrator needs from the host process
pub struct OrchestratorDeps {
    pub conversation: Arc<dyn ConversationStore>,
    pub tokens: Arc<dyn TokenProvider>,

    /// Draft persistence; defaults to in-memory when None
    pub drafts: Option<Arc<dyn DraftStore>>,

    /// Planning/composition backend; defaults to an OpenAI-compatible
    /// provider built from the config when None
    pub llm: Option<Arc<dyn LlmProvider>>,
}

/// Build a ready orchestrator from configuration, registered agents and
/// host-provided collaborators.
pub async fn build_orchestrator(
    config: &AppConfig,
    agents: Vec<Arc<dyn SubAgent>>,
    deps: OrchestratorDeps,
) -> anyhow::Result<Orchestrator> {
    let registry = Arc::new(AgentRegistry::new());
    for agent in agents {
        registry.register(agent).await?;
    }

    let llm: Arc<dyn LlmProvider> = match deps.llm {
        Some(llm) => llm,
        None => {
            let api_key = std::env::var(&config.llm.api_key_env).map_err(|_| {
                anyhow::anyhow!(
                    "{} environment variable is required for the LLM backend",
                    config.llm.api_key_env
                )
            })?;
            Arc::new(OpenAiProvider::with_base_url(
                HttpClient::new(),
                api_key,
                &config.llm.base_url,
            ))
        }
    };

    let drafts: Arc<dyn DraftStore> = deps
        .drafts
        .unwrap_or_else(|| Arc::new(InMemoryDraftStore::new()));

    let planner = Arc::new(
        LlmStepPlanner::new(llm.clone(), &config.llm.model)
            .with_retries(config.orchestrator.planner_retries),
    );
    let reevaluator = Arc::new(LlmReevaluator::new(llm.clone(), &config.llm.model));
    let composer = Arc::new(LlmResponseComposer::new(llm, &config.llm.composer_model));

    let executor = StepExecutor::new(registry.clone(), drafts.clone(), deps.tokens)
        .with_default_timeout(std::time::Duration::from_millis(
            config.orchestrator.step_timeout_ms,
        ))
        .with_draft_ttl(chrono::Duration::minutes(config.drafts.ttl_minutes));

    let gatherer = ContextGatherer::new(deps.conversation, drafts.clone())
        .with_window(config.orchestrator.conversation_window)
        .with_max_steps(config.orchestrator.max_steps);

    Ok(Orchestrator::new(
        registry,
        planner,
        reevaluator,
        composer,
        executor,
        gatherer,
        drafts,
    ))
}
