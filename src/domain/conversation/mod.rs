//! Conversation history port
//!
//! The orchestrator reads recent turns for planning context; it never
//! writes. Persistence of the conversation belongs to the upstream
//! request handler.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Who produced a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One message in the session's conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            timestamp,
        }
    }

    pub fn assistant(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            timestamp,
        }
    }
}

/// Read-only access to recent conversation history
#[async_trait]
pub trait ConversationStore: Send + Sync + std::fmt::Debug {
    /// The most recent turns for a session, oldest first
    async fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, DomainError>;
}
