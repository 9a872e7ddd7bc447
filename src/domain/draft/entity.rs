//! Draft domain entity
//!
//! A draft is a proposed side-effecting action (send an email, create an
//! event) held back until the user explicitly confirms it. Drafts expire
//! after a TTL and are then never executed.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Unique draft identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DraftId(Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How destructive the proposed action is
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// A proposed, not-yet-executed action awaiting user confirmation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    id: DraftId,

    session_id: String,

    /// Agent that proposed the action and will execute it once confirmed
    agent: String,

    /// Action type, e.g. "send_email"
    action: String,

    /// Parameters needed to execute the action
    parameters: Map<String, Value>,

    /// Human-readable preview shown to the user
    preview: String,

    risk_level: RiskLevel,

    created_at: DateTime<Utc>,

    expires_at: DateTime<Utc>,
}

impl Draft {
    /// Create a draft expiring `ttl` after `now`
    pub fn new(
        session_id: impl Into<String>,
        agent: impl Into<String>,
        action: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            id: DraftId::new(),
            session_id: session_id.into(),
            agent: agent.into(),
            action: action.into(),
            parameters: Map::new(),
            preview: String::new(),
            risk_level: RiskLevel::default(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    // Builder methods

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = preview.into();
        self
    }

    pub fn with_risk_level(mut self, risk_level: RiskLevel) -> Self {
        self.risk_level = risk_level;
        self
    }

    // Getters

    pub fn id(&self) -> DraftId {
        self.id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn parameters(&self) -> &Map<String, Value> {
        &self.parameters
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the draft has passed its TTL at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
