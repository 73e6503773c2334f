use std::collections::HashMap;

use super::MemoryAgent;

/// Independent agents keyed by name, typically one per end user.
#[derive(Default)]
pub struct AgentManager {
    agents: HashMap<String, MemoryAgent>,
}

impl AgentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `agent` under `name`, returning the agent it replaced, if any.
    pub fn add_agent(&mut self, name: impl Into<String>, agent: MemoryAgent) -> Option<MemoryAgent> {
        let name = name.into();
        tracing::debug!(%name, "adding agent");
        self.agents.insert(name, agent)
    }

    pub fn get_agent(&self, name: &str) -> Option<&MemoryAgent> {
        self.agents.get(name)
    }

    pub fn get_agent_mut(&mut self, name: &str) -> Option<&mut MemoryAgent> {
        self.agents.get_mut(name)
    }

    pub fn remove_agent(&mut self, name: &str) -> Option<MemoryAgent> {
        self.agents.remove(name)
    }

    /// Agent names, sorted.
    pub fn list_agents(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub async fn chat_with_agent(&mut self, name: &str, message: &str) -> String {
        match self.agents.get_mut(name) {
            Some(agent) => agent.chat(message).await,
            None => format!("Agent '{name}' not found"),
        }
    }
}
