//! Agent capability descriptors
//!
//! Descriptors form the capability manifest the planner consults when
//! selecting a target agent for a step. Registration order of descriptors
//! is significant: it is the tie-break order for ambiguous selections.

use serde::{Deserialize, Serialize};

/// A single operation an agent can perform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationDescriptor {
    /// Operation name, e.g. "send_email"
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Whether this operation must be confirmed by the user before executing
    #[serde(default)]
    pub requires_confirmation: bool,
}

impl OperationDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            requires_confirmation: false,
        }
    }

    pub fn with_confirmation(mut self) -> Self {
        self.requires_confirmation = true;
        self
    }
}

/// Describes one agent's capabilities for planning and lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Unique agent name, e.g. "email"
    pub name: String,

    /// One-line capability summary
    pub description: String,

    /// Capability keywords used for lexical matching
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Example user phrasings this agent handles
    #[serde(default)]
    pub example_phrases: Vec<String>,

    /// Operations the agent exposes
    #[serde(default)]
    pub operations: Vec<OperationDescriptor>,

    /// Service name a token must exist for before dispatch, e.g. "google"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_auth: Option<String>,

    /// Whether the agent may be selected by the planner
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Per-step timeout override in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl AgentDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            capabilities: Vec::new(),
            example_phrases: Vec::new(),
            operations: Vec::new(),
            requires_auth: None,
            enabled: true,
            timeout_ms: None,
        }
    }

    // Builder methods

    pub fn with_capability(mut self, keyword: impl Into<String>) -> Self {
        self.capabilities.push(keyword.into());
        self
    }

    pub fn with_capabilities(mut self, keywords: Vec<String>) -> Self {
        self.capabilities = keywords;
        self
    }

    pub fn with_example_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.example_phrases.push(phrase.into());
        self
    }

    pub fn with_operation(mut self, operation: OperationDescriptor) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn with_required_auth(mut self, service: impl Into<String>) -> Self {
        self.requires_auth = Some(service.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Look up an operation by name
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.iter().find(|op| op.name == name)
    }

    /// Whether the named operation requires user confirmation.
    /// Unknown operations default to not requiring confirmation.
    pub fn requires_confirmation(&self, operation: &str) -> bool {
        self.operation(operation)
            .map(|op| op.requires_confirmation)
            .unwrap_or(false)
    }
}
