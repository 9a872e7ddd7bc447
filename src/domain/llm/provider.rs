use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Trait for LLM providers (OpenAI-compatible backends, etc.)
///
/// The planner, reevaluator and response composer all speak through this
/// port, so the control flow of the orchestration loop stays deterministic
/// and testable with a scripted implementation.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::domain::llm::Message;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted provider: returns queued responses in order, then falls back
    /// to the default response or configured error.
    #[derive(Debug)]
    pub struct MockLlmProvider {
        name: &'static str,
        queue: Mutex<VecDeque<String>>,
        default_response: Option<String>,
        error: Option<String>,
    }

    impl MockLlmProvider {
        pub fn new(name: &'static str) -> Self {
            Self {
                name,
                queue: Mutex::new(VecDeque::new()),
                default_response: None,
                error: None,
            }
        }

        /// Queue a response body to be returned by the next unanswered call
        pub fn with_response(self, content: impl Into<String>) -> Self {
            self.queue.lock().unwrap().push_back(content.into());
            self
        }

        /// Response returned once the queue is drained
        pub fn with_default_response(mut self, content: impl Into<String>) -> Self {
            self.default_response = Some(content.into());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn chat(
            &self,
            model: &str,
            _request: LlmRequest,
        ) -> Result<LlmResponse, DomainError> {
            if let Some(content) = self.queue.lock().unwrap().pop_front() {
                return Ok(LlmResponse::new(
                    "mock-id".to_string(),
                    model.to_string(),
                    Message::assistant(content),
                ));
            }

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.name, error));
            }

            self.default_response
                .clone()
                .map(|content| {
                    LlmResponse::new(
                        "mock-id".to_string(),
                        model.to_string(),
                        Message::assistant(content),
                    )
                })
                .ok_or_else(|| DomainError::provider(self.name, "No mock response configured"))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }
    }

    #[tokio::test]
    async fn test_mock_queue_order() {
        let provider = MockLlmProvider::new("mock")
            .with_response("first")
            .with_response("second")
            .with_default_response("fallback");

        let req = || LlmRequest::builder().user("hi").build();

        assert_eq!(provider.chat("m", req()).await.unwrap().content(), "first");
        assert_eq!(provider.chat("m", req()).await.unwrap().content(), "second");
        assert_eq!(provider.chat("m", req()).await.unwrap().content(), "fallback");
    }

    #[tokio::test]
    async fn test_mock_error_after_queue() {
        let provider = MockLlmProvider::new("mock")
            .with_response("only")
            .with_error("backend down");

        let req = || LlmRequest::builder().user("hi").build();

        assert!(provider.chat("m", req()).await.is_ok());
        assert!(provider.chat("m", req()).await.is_err());
    }
}
