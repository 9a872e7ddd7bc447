//! Draft store trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Draft, DraftId};
use crate::domain::DomainError;

/// Persistence port for pending drafts.
///
/// All read paths take `now` so expired drafts are filtered on access; an
/// expired draft is indistinguishable from a removed one. Implementations
/// must serialize mutating access per session while letting unrelated
/// sessions proceed concurrently.
#[async_trait]
pub trait DraftStore: Send + Sync + std::fmt::Debug {
    /// Persist a new draft
    async fn create(&self, draft: Draft) -> Result<Draft, DomainError>;

    /// Most recently created pending draft for the session, if any
    async fn latest_pending(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Draft>, DomainError>;

    /// Atomically remove and return the most recent pending draft.
    /// This is the resolution primitive: a draft taken here can never be
    /// taken again.
    async fn take_latest_pending(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Draft>, DomainError>;

    /// Remove a specific draft; returns whether it existed
    async fn remove(&self, id: DraftId) -> Result<bool, DomainError>;

    /// Drop all drafts past their expiry; returns the number swept
    async fn expire(&self, now: DateTime<Utc>) -> Result<usize, DomainError>;

    /// All pending drafts for a session, most recent first
    async fn list_pending(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Draft>, DomainError>;
}
