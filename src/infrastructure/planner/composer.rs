//! Final response composition
//!
//! Renders the accumulated step summaries into one user-facing message.
//! Only natural-language summaries reach the prompt; a redaction pass over
//! the output strips anything shaped like an internal identifier that the
//! model echoed anyway. A failed backing call degrades to a deterministic
//! summary so composition can never fail a request.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use super::prompts;
use crate::domain::{
    LlmProvider, LlmRequest, ResponseComposer, TerminationReason, WorkflowContext,
};

/// UUIDs read as internal identifiers wherever they appear
static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b")
        .unwrap()
});

/// Shortest token length treated as an opaque identifier when it mixes
/// letters and digits
const OPAQUE_TOKEN_MIN_LEN: usize = 20;

const NOTHING_DONE_MESSAGE: &str =
    "I wasn't able to take any action on that request. Could you rephrase or try again?";

/// LLM-backed implementation of ResponseComposer
#[derive(Debug)]
pub struct LlmResponseComposer {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl LlmResponseComposer {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Deterministic summary used when the backing call fails
    fn fallback(context: &WorkflowContext, reason: &TerminationReason) -> String {
        let summaries: Vec<String> = context
            .completed_steps()
            .iter()
            .filter_map(|record| record.result.as_ref())
            .map(|result| {
                if result.success {
                    result.summary.clone()
                } else {
                    format!("{} (failed)", result.summary)
                }
            })
            .collect();

        let done = summaries.join(". ");

        match reason {
            TerminationReason::Completed => format!("Here's what I did: {}.", done),
            TerminationReason::StepLimitReached => format!(
                "I reached the step limit before finishing. Here's what I completed: {}.",
                done
            ),
            TerminationReason::Terminated { message } => {
                if done.is_empty() {
                    message.clone()
                } else {
                    format!("{} Here's what I completed: {}.", message, done)
                }
            }
        }
    }
}

#[async_trait]
impl ResponseComposer for LlmResponseComposer {
    async fn compose(&self, context: &WorkflowContext, reason: &TerminationReason) -> String {
        if context.completed_steps().is_empty() {
            // Nothing executed: an explicit termination message explains
            // itself; otherwise tell the user nothing happened.
            let message = match reason {
                TerminationReason::Terminated { message } => message.clone(),
                _ => NOTHING_DONE_MESSAGE.to_string(),
            };
            return redact_identifiers(&message);
        }

        let request = LlmRequest::builder()
            .system(prompts::composer_system_prompt())
            .user(prompts::composer_user_prompt(context, reason))
            .temperature(0.4)
            .build();

        let message = match self.provider.chat(&self.model, request).await {
            Ok(response) => response.content().trim().to_string(),
            Err(e) => {
                warn!(error = %e, "Composition failed, using deterministic summary");
                Self::fallback(context, reason)
            }
        };

        redact_identifiers(&message)
    }
}

/// Strip identifier-shaped tokens from a user-facing message
pub fn redact_identifiers(text: &str) -> String {
    let text = UUID_PATTERN.replace_all(text, "");

    let words: Vec<&str> = text
        .split_whitespace()
        .filter(|token| !is_opaque_token(token))
        .collect();

    words.join(" ")
}

/// Long mixed letter-digit runs are opaque ids; plain words never are
fn is_opaque_token(token: &str) -> bool {
    let core = token.trim_matches(|c: char| !c.is_alphanumeric());

    core.len() >= OPAQUE_TOKEN_MIN_LEN
        && core.chars().any(|c| c.is_ascii_digit())
        && core.chars().any(|c| c.is_ascii_alphabetic())
        && core
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
