//! Auth token port
//!
//! Consulted before dispatching to any agent that declares `requires_auth`.
//! Token acquisition and refresh live upstream; the core only asks whether
//! a valid token exists.

use async_trait::async_trait;

use crate::domain::DomainError;

/// Provides valid OAuth tokens per user and service
#[async_trait]
pub trait TokenProvider: Send + Sync + std::fmt::Debug {
    /// A currently valid token for `user_id` against `service`, or a
    /// `Credential` error when the user is not authenticated.
    async fn valid_token(&self, user_id: &str, service: &str) -> Result<String, DomainError>;
}
