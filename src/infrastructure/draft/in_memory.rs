//! In-memory draft store implementation
//!
//! Drafts are bucketed per session behind their own lock, so resolution
//! for one session never blocks unrelated sessions. Expired drafts are
//! dropped lazily on every access as well as by the explicit sweep, which
//! makes expiry idempotent: once past its TTL a draft is unobservable no
//! matter how often the sweep runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::domain::{DomainError, Draft, DraftId, DraftStore};

type SessionDrafts = Arc<Mutex<Vec<Draft>>>;

/// In-memory implementation of DraftStore
#[derive(Debug)]
pub struct InMemoryDraftStore {
    sessions: RwLock<HashMap<String, SessionDrafts>>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, session_id: &str) -> Option<SessionDrafts> {
        let sessions = self.sessions.read().await;
        sessions.get(session_id).cloned()
    }

    async fn session_or_create(&self, session_id: &str) -> SessionDrafts {
        {
            let sessions = self.sessions.read().await;
            if let Some(drafts) = sessions.get(session_id) {
                return drafts.clone();
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Vec::new())))
            .clone()
    }
}

impl Default for InMemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn create(&self, draft: Draft) -> Result<Draft, DomainError> {
        let session = self.session_or_create(draft.session_id()).await;
        let mut drafts = session.lock().await;

        debug!(draft_id = %draft.id(), action = %draft.action(), "Created draft");
        drafts.push(draft.clone());

        Ok(draft)
    }

    async fn latest_pending(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Draft>, DomainError> {
        let Some(session) = self.session(session_id).await else {
            return Ok(None);
        };

        let mut drafts = session.lock().await;
        drafts.retain(|draft| !draft.is_expired(now));

        Ok(drafts.last().cloned())
    }

    async fn take_latest_pending(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Draft>, DomainError> {
        let Some(session) = self.session(session_id).await else {
            return Ok(None);
        };

        let mut drafts = session.lock().await;
        drafts.retain(|draft| !draft.is_expired(now));

        Ok(drafts.pop())
    }

    async fn remove(&self, id: DraftId) -> Result<bool, DomainError> {
        let sessions: Vec<SessionDrafts> = {
            let map = self.sessions.read().await;
            map.values().cloned().collect()
        };

        for session in sessions {
            let mut drafts = session.lock().await;
            let before = drafts.len();
            drafts.retain(|draft| draft.id() != id);
            if drafts.len() < before {
                return Ok(true);
            }
        }

        Ok(false)
    }

    async fn expire(&self, now: DateTime<Utc>) -> Result<usize, DomainError> {
        let sessions: Vec<SessionDrafts> = {
            let map = self.sessions.read().await;
            map.values().cloned().collect()
        };

        let mut swept = 0;
        for session in sessions {
            let mut drafts = session.lock().await;
            let before = drafts.len();
            drafts.retain(|draft| !draft.is_expired(now));
            swept += before - drafts.len();
        }

        if swept > 0 {
            debug!(swept, "Expired drafts swept");
        }

        Ok(swept)
    }

    async fn list_pending(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Draft>, DomainError> {
        let Some(session) = self.session(session_id).await else {
            return Ok(Vec::new());
        };

        let mut drafts = session.lock().await;
        drafts.retain(|draft| !draft.is_expired(now));

        let mut pending: Vec<Draft> = drafts.clone();
        pending.reverse();
        Ok(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn draft(session: &str, action: &str, now: DateTime<Utc>, ttl_minutes: i64) -> Draft {
        Draft::new(session, "email", action, now, Duration::minutes(ttl_minutes))
            .with_preview(format!("Preview of {}", action))
    }

    #[tokio::test]
    async fn test_latest_pending_is_most_recent() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        store.create(draft("s1", "send_email", now, 10)).await.unwrap();
        let second = store
            .create(draft("s1", "create_event", now + Duration::seconds(1), 10))
            .await
            .unwrap();

        let latest = store.latest_pending("s1", now).await.unwrap().unwrap();
        assert_eq!(latest.id(), second.id());
    }

    #[tokio::test]
    async fn test_take_latest_resolves_exactly_once() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        let first = store.create(draft("s1", "send_email", now, 10)).await.unwrap();
        let second = store.create(draft("s1", "send_email", now, 10)).await.unwrap();

        let taken = store.take_latest_pending("s1", now).await.unwrap().unwrap();
        assert_eq!(taken.id(), second.id());

        let taken = store.take_latest_pending("s1", now).await.unwrap().unwrap();
        assert_eq!(taken.id(), first.id());

        assert!(store.take_latest_pending("s1", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_drafts_never_resolve() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        store.create(draft("s1", "send_email", now, 5)).await.unwrap();
        let later = now + Duration::minutes(6);

        assert!(store.latest_pending("s1", later).await.unwrap().is_none());
        assert!(store.take_latest_pending("s1", later).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expiry_sweep_idempotent() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        store.create(draft("s1", "send_email", now, 5)).await.unwrap();
        store.create(draft("s2", "create_event", now, 5)).await.unwrap();
        store.create(draft("s2", "send_email", now, 60)).await.unwrap();

        let later = now + Duration::minutes(10);

        assert_eq!(store.expire(later).await.unwrap(), 2);
        assert_eq!(store.expire(later).await.unwrap(), 0);
        assert_eq!(store.expire(later).await.unwrap(), 0);

        // The long-TTL draft survives
        assert!(store.latest_pending("s2", later).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        store.create(draft("s1", "send_email", now, 10)).await.unwrap();
        store.create(draft("s2", "create_event", now, 10)).await.unwrap();

        let taken = store.take_latest_pending("s1", now).await.unwrap().unwrap();
        assert_eq!(taken.action(), "send_email");

        let s2 = store.latest_pending("s2", now).await.unwrap().unwrap();
        assert_eq!(s2.action(), "create_event");
    }

    #[tokio::test]
    async fn test_remove_by_id() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        let created = store.create(draft("s1", "send_email", now, 10)).await.unwrap();

        assert!(store.remove(created.id()).await.unwrap());
        assert!(!store.remove(created.id()).await.unwrap());
        assert!(store.latest_pending("s1", now).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_pending_most_recent_first() {
        let store = InMemoryDraftStore::new();
        let now = Utc::now();

        store.create(draft("s1", "first", now, 10)).await.unwrap();
        store.create(draft("s1", "second", now, 10)).await.unwrap();

        let pending = store.list_pending("s1", now).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].action(), "second");
        assert_eq!(pending[1].action(), "first");
    }

    #[tokio::test]
    async fn test_concurrent_creates_across_sessions() {
        let store = Arc::new(InMemoryDraftStore::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .create(draft(&format!("session-{}", i), "send_email", now, 10))
                        .await
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }

        for i in 0..10 {
            let session = format!("session-{}", i);
            assert!(store.latest_pending(&session, now).await.unwrap().is_some());
        }
    }
}
