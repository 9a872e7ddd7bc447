//! Static token provider
//!
//! Holds pre-issued tokens keyed by user and service. Used by tests and by
//! deployments where token refresh happens upstream of the orchestrator.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{DomainError, TokenProvider};

#[derive(Debug)]
pub struct StaticTokenProvider {
    tokens: RwLock<HashMap<(String, String), String>>,
}

impl StaticTokenProvider {
    pub fn new() -> Self {
        Self {
            tokens: RwLock::new(HashMap::new()),
        }
    }

    pub async fn set_token(
        &self,
        user_id: impl Into<String>,
        service: impl Into<String>,
        token: impl Into<String>,
    ) {
        let mut tokens = self.tokens.write().await;
        tokens.insert((user_id.into(), service.into()), token.into());
    }
}

impl Default for StaticTokenProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn valid_token(&self, user_id: &str, service: &str) -> Result<String, DomainError> {
        let tokens = self.tokens.read().await;
        tokens
            .get(&(user_id.to_string(), service.to_string()))
            .cloned()
            .ok_or_else(|| {
                DomainError::credential(format!(
                    "User '{}' is not authenticated with '{}'",
                    user_id, service
                ))
            })
    }
}
