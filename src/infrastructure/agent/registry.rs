//! Agent Registry
//!
//! Process-wide catalog of sub-agents. Registration order is deterministic
//! and doubles as the tie-break order when several agents match a step
//! description equally well.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::domain::{AgentDescriptor, DomainError, SubAgent};

/// Central registry for sub-agent lookup and capability manifests
#[derive(Debug)]
pub struct AgentRegistry {
    /// Agents in registration order
    agents: RwLock<Vec<Arc<dyn SubAgent>>>,

    /// Index of agent names to positions for fast lookup
    index: RwLock<HashMap<String, usize>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self {
            agents: RwLock::new(Vec::new()),
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Register an agent. Names are unique; re-registering is a conflict.
    pub async fn register(&self, agent: Arc<dyn SubAgent>) -> Result<(), DomainError> {
        let name = agent.name().to_string();

        let mut agents = self.agents.write().await;
        let mut index = self.index.write().await;

        if index.contains_key(&name) {
            return Err(DomainError::conflict(format!(
                "Agent '{}' already registered",
                name
            )));
        }

        info!(agent = %name, "Registering agent");

        index.insert(name, agents.len());
        agents.push(agent);

        Ok(())
    }

    /// Get an agent by name
    pub async fn get(&self, name: &str) -> Option<Arc<dyn SubAgent>> {
        let index = self.index.read().await;
        let position = *index.get(name)?;
        let agents = self.agents.read().await;
        agents.get(position).cloned()
    }

    /// Descriptors of all enabled agents, in registration order.
    /// This is the capability manifest handed to the planner.
    pub async fn list_enabled(&self) -> Vec<AgentDescriptor> {
        let agents = self.agents.read().await;
        agents
            .iter()
            .map(|agent| agent.descriptor().clone())
            .filter(|descriptor| descriptor.enabled)
            .collect()
    }

    /// All descriptors regardless of enablement
    pub async fn list_all(&self) -> Vec<AgentDescriptor> {
        let agents = self.agents.read().await;
        agents.iter().map(|agent| agent.descriptor().clone()).collect()
    }

    /// Best enabled agent for a free-text step description, by lexical
    /// overlap between the description and the agent's declared keywords.
    /// Ties go to the earlier-registered agent. Returns None when nothing
    /// overlaps at all.
    pub async fn find_best_agent_for_description(&self, text: &str) -> Option<AgentDescriptor> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return None;
        }

        let agents = self.agents.read().await;
        let mut best: Option<(usize, AgentDescriptor)> = None;

        for agent in agents.iter() {
            let descriptor = agent.descriptor();
            if !descriptor.enabled {
                continue;
            }

            let score = keyword_overlap(&tokens, descriptor);
            debug!(agent = %descriptor.name, score, "Scored agent for description");

            // Strictly-greater keeps the earlier registration on ties
            if score > 0 && best.as_ref().map(|(s, _)| score > *s).unwrap_or(true) {
                best = Some((score, descriptor.clone()));
            }
        }

        best.map(|(_, descriptor)| descriptor)
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 3)
        .map(|token| token.to_string())
        .collect()
}

fn keyword_overlap(tokens: &[String], descriptor: &AgentDescriptor) -> usize {
    let mut keywords: Vec<String> = descriptor
        .capabilities
        .iter()
        .map(|keyword| keyword.to_lowercase())
        .collect();
    keywords.push(descriptor.name.to_lowercase());
    keywords.extend(tokenize(&descriptor.description));

    tokens
        .iter()
        .filter(|token| keywords.iter().any(|keyword| keyword == *token))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::MockAgent;
    use crate::domain::AgentDescriptor;

    fn agent(name: &str, description: &str, capabilities: &[&str]) -> Arc<MockAgent> {
        let mut descriptor = AgentDescriptor::new(name, description);
        for capability in capabilities {
            descriptor = descriptor.with_capability(*capability);
        }
        Arc::new(MockAgent::new(descriptor))
    }

    #[tokio::test]
    async fn test_register_and_get() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("email", "Send and search email", &["email", "mail"]))
            .await
            .unwrap();

        assert!(registry.get("email").await.is_some());
        assert!(registry.get("calendar").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("email", "Email agent", &[]))
            .await
            .unwrap();

        let result = registry.register(agent("email", "Another email agent", &[])).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("already registered"));
    }

    #[tokio::test]
    async fn test_list_enabled_preserves_registration_order() {
        let registry = AgentRegistry::new();
        registry.register(agent("contacts", "Contacts", &[])).await.unwrap();
        registry.register(agent("calendar", "Calendar", &[])).await.unwrap();
        registry.register(agent("email", "Email", &[])).await.unwrap();

        let names: Vec<String> = registry
            .list_enabled()
            .await
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec!["contacts", "calendar", "email"]);
    }

    #[tokio::test]
    async fn test_disabled_agents_excluded() {
        let registry = AgentRegistry::new();
        registry
            .register(Arc::new(MockAgent::new(
                AgentDescriptor::new("search", "Web search").with_enabled(false),
            )))
            .await
            .unwrap();
        registry.register(agent("email", "Email", &[])).await.unwrap();

        let enabled = registry.list_enabled().await;
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "email");

        assert_eq!(registry.list_all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_find_best_agent_by_overlap() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("calendar", "Manage calendar events", &["calendar", "meeting", "schedule"]))
            .await
            .unwrap();
        registry
            .register(agent("email", "Send and search email", &["email", "mail", "send"]))
            .await
            .unwrap();

        let best = registry
            .find_best_agent_for_description("schedule a meeting for tomorrow")
            .await
            .unwrap();
        assert_eq!(best.name, "calendar");

        let best = registry
            .find_best_agent_for_description("send an email to the team")
            .await
            .unwrap();
        assert_eq!(best.name, "email");
    }

    #[tokio::test]
    async fn test_find_best_agent_tie_break_by_registration_order() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("slack", "Read messages", &["messages"]))
            .await
            .unwrap();
        registry
            .register(agent("email", "Read messages", &["messages"]))
            .await
            .unwrap();

        // Both score 1 on "messages"; the earlier registration wins
        let best = registry
            .find_best_agent_for_description("check my messages")
            .await
            .unwrap();
        assert_eq!(best.name, "slack");
    }

    #[tokio::test]
    async fn test_find_best_agent_no_overlap() {
        let registry = AgentRegistry::new();
        registry
            .register(agent("email", "Send email", &["email"]))
            .await
            .unwrap();

        let best = registry
            .find_best_agent_for_description("water the plants")
            .await;
        assert!(best.is_none());
    }
}
