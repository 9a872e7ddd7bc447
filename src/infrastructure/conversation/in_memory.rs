//! In-memory conversation store implementation

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ConversationStore, ConversationTurn, DomainError};

/// In-memory implementation of ConversationStore
#[derive(Debug)]
pub struct InMemoryConversationStore {
    turns: RwLock<HashMap<String, Vec<ConversationTurn>>>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self {
            turns: RwLock::new(HashMap::new()),
        }
    }

    /// Append a turn to a session's history
    pub async fn append(&self, session_id: impl Into<String>, turn: ConversationTurn) {
        let mut turns = self.turns.write().await;
        turns.entry(session_id.into()).or_default().push(turn);
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn recent_turns(
        &self,
        session_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, DomainError> {
        let turns = self.turns.read().await;
        let history = turns.get(session_id).map(|t| t.as_slice()).unwrap_or(&[]);

        let start = history.len().saturating_sub(limit);
        Ok(history[start..].to_vec())
    }
}
