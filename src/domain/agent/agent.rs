//! Sub-agent trait and request/response types
//!
//! Every concrete capability (email, calendar, contacts, chat search, web
//! search, content creation) implements [`SubAgent`]. The orchestration core
//! never depends on agent-specific parameter shapes beyond what the planner
//! itself constructs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::AgentDescriptor;
use crate::domain::draft::RiskLevel;
use crate::domain::DomainError;

/// Per-request identity threaded into every agent call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContext {
    pub session_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

impl AgentContext {
    pub fn new(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: user_id.into(),
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// One natural-language dispatch to a sub-agent
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Natural-language instruction for this step
    pub instruction: String,

    /// Optional operation hint selected by the planner
    pub operation: Option<String>,

    /// Structured parameters the planner resolved
    pub parameters: Map<String, Value>,

    pub context: AgentContext,
}

impl AgentRequest {
    pub fn new(instruction: impl Into<String>, context: AgentContext) -> Self {
        Self {
            instruction: instruction.into(),
            operation: None,
            parameters: Map::new(),
            context,
        }
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }
}

/// A side-effecting action the agent proposes instead of executing,
/// pending user confirmation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftProposal {
    /// Action type, e.g. "send_email"
    pub action: String,

    /// Parameters needed to execute the action once confirmed
    pub parameters: Map<String, Value>,

    /// Human-readable preview shown to the user
    pub preview: String,

    pub risk_level: RiskLevel,
}

impl DraftProposal {
    pub fn new(action: impl Into<String>, preview: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            parameters: Map::new(),
            preview: preview.into(),
            risk_level: RiskLevel::Medium,
        }
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }
}

/// Normalized result of one agent dispatch
#[derive(Debug, Clone)]
pub struct AgentResponse {
    pub success: bool,

    /// Natural-language summary of what the agent did or found
    pub response: String,

    pub error: Option<String>,

    /// Machine-readable payload; object keys are merged into the
    /// workflow's gathered data
    pub structured_data: Option<Value>,

    /// Present when the agent proposes a confirmable action instead of
    /// executing it
    pub proposed_draft: Option<DraftProposal>,
}

impl AgentResponse {
    pub fn success(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: response.into(),
            error: None,
            structured_data: None,
            proposed_draft: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            response: String::new(),
            error: Some(error),
            structured_data: None,
            proposed_draft: None,
        }
    }

    pub fn with_structured_data(mut self, data: Value) -> Self {
        self.structured_data = Some(data);
        self
    }

    pub fn with_draft(mut self, proposal: DraftProposal) -> Self {
        self.proposed_draft = Some(proposal);
        self
    }
}

/// Uniform capability unit the orchestrator dispatches to
#[async_trait]
pub trait SubAgent: Send + Sync + std::fmt::Debug {
    /// The agent's capability descriptor
    fn descriptor(&self) -> &AgentDescriptor;

    /// The agent's unique name
    fn name(&self) -> &str {
        &self.descriptor().name
    }

    /// Execute one natural-language request
    async fn execute(&self, request: AgentRequest) -> Result<AgentResponse, DomainError>;
}
