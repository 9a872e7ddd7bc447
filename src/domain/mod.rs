//! Domain layer - Core business logic and entities

pub mod agent;
pub mod auth;
pub mod conversation;
pub mod draft;
mod error;
pub mod llm;
pub mod workflow;

pub use agent::{
    AgentContext, AgentDescriptor, AgentRequest, AgentResponse, DraftProposal, OperationDescriptor,
    SubAgent,
};
pub use auth::TokenProvider;
pub use conversation::{ConversationStore, ConversationTurn, TurnRole};
pub use draft::{Draft, DraftId, DraftStore, RiskLevel};
pub use error::DomainError;
pub use llm::{
    FinishReason, LlmJsonSchema, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse,
    LlmResponseFormat, Message, MessageRole, Usage,
};
pub use workflow::{
    NextStep, OrchestrationError, Plan, PlannedStep, PlannerDecision, ReevalOutcome, Reevaluator,
    ResponseComposer, StepPlanner, StepRecord, StepResult, StepStatus, TerminationReason,
    UserContext, WorkflowContext, DEFAULT_MAX_STEPS,
};
