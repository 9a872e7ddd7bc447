//! Context gatherer
//!
//! Assembles the ambient state a new workflow starts from: recent
//! conversation turns, any pending draft for the session, and the
//! caller-supplied identity. A failing conversation read degrades to an
//! empty history rather than failing the request.

use std::sync::Arc;

use serde_json::json;
use tracing::warn;

use crate::domain::{
    ConversationStore, DomainError, DraftStore, UserContext, WorkflowContext,
};

#[derive(Debug)]
pub struct ContextGatherer {
    conversation: Arc<dyn ConversationStore>,
    drafts: Arc<dyn DraftStore>,

    /// How many conversation turns to carry into planning
    window: usize,

    /// Step budget stamped onto every new context
    max_steps: u32,
}

impl ContextGatherer {
    pub fn new(conversation: Arc<dyn ConversationStore>, drafts: Arc<dyn DraftStore>) -> Self {
        Self {
            conversation,
            drafts,
            window: 10,
            max_steps: crate::domain::DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Build the starting context for one user request
    pub async fn gather(
        &self,
        request: &str,
        user: UserContext,
    ) -> Result<WorkflowContext, DomainError> {
        let session_id = user.session_id.clone();

        let turns = match self.conversation.recent_turns(&session_id, self.window).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(error = %e, "Conversation history unavailable, planning without it");
                Vec::new()
            }
        };

        let mut context = WorkflowContext::new(request, user)
            .with_max_steps(self.max_steps)
            .with_conversation(turns);

        if let Some(draft) = self
            .drafts
            .latest_pending(&session_id, chrono::Utc::now())
            .await?
        {
            context.insert_data(
                "pending_draft",
                json!({
                    "action": draft.action(),
                    "preview": draft.preview(),
                }),
            );
        }

        Ok(context)
    }
}
