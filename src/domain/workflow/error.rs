//! Orchestration error types

use thiserror::Error;

use crate::domain::DomainError;

/// Errors raised by the planning loop.
///
/// Agent-level failures are normalized into step results and never appear
/// here; these variants are the planning/coordination failures that either
/// end the request or surface a friendly message.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("Planning unavailable: {message}")]
    PlanningUnavailable { message: String },

    #[error("Agent not found: {name}")]
    AgentNotFound { name: String },

    #[error("Agent is disabled: {name}")]
    AgentDisabled { name: String },

    #[error("No suitable agent for: {description}")]
    NoSuitableAgent { description: String },

    #[error("Step execution failed in '{agent}': {message}")]
    StepExecution { agent: String, message: String },

    #[error("No pending draft for session: {session_id}")]
    NoPendingDraft { session_id: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl OrchestrationError {
    pub fn planning_unavailable(message: impl Into<String>) -> Self {
        Self::PlanningUnavailable {
            message: message.into(),
        }
    }

    pub fn agent_not_found(name: impl Into<String>) -> Self {
        Self::AgentNotFound { name: name.into() }
    }

    pub fn agent_disabled(name: impl Into<String>) -> Self {
        Self::AgentDisabled { name: name.into() }
    }

    pub fn no_suitable_agent(description: impl Into<String>) -> Self {
        Self::NoSuitableAgent {
            description: description.into(),
        }
    }

    pub fn step_execution(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepExecution {
            agent: agent.into(),
            message: message.into(),
        }
    }

    pub fn no_pending_draft(session_id: impl Into<String>) -> Self {
        Self::NoPendingDraft {
            session_id: session_id.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the planner targeted an agent that cannot serve the step.
    /// The loop ends these with partial results instead of propagating.
    pub fn is_routing_failure(&self) -> bool {
        matches!(
            self,
            Self::AgentNotFound { .. } | Self::AgentDisabled { .. } | Self::NoSuitableAgent { .. }
        )
    }

    /// The message shown to the end user. Internal detail stays in logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::PlanningUnavailable { .. } => {
                "I'm having trouble working out how to help with that right now. \
                 Please try again in a moment."
                    .to_string()
            }
            Self::AgentNotFound { .. }
            | Self::AgentDisabled { .. }
            | Self::NoSuitableAgent { .. } => {
                "I don't have a capability that can handle that request yet.".to_string()
            }
            Self::NoPendingDraft { .. } => {
                "There's nothing waiting for your confirmation right now.".to_string()
            }
            Self::StepExecution { .. } | Self::Internal { .. } => {
                "Something went wrong while working on your request. \
                 Please try again."
                    .to_string()
            }
        }
    }
}

impl From<DomainError> for OrchestrationError {
    fn from(err: DomainError) -> Self {
        Self::Internal {
            message: err.to_string(),
        }
    }
}
