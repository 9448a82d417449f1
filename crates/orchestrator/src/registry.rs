//! Fixed agent table: name → capability descriptor.

use crate::prompts;
use llm_relay_common::AgentConfig;
use std::collections::HashMap;

/// Immutable capability descriptor for one named agent role.
#[derive(Debug, Clone)]
pub struct AgentSpec {
    pub name: String,
    pub system_prompt: String,
    /// Tag wrapping this agent's output label, when it emits one.
    pub output_tag: Option<String>,
    /// Fallback tags tried in order when `output_tag` is absent from the
    /// output.
    pub output_tag_list: Option<Vec<String>>,
}

impl AgentSpec {
    fn new(name: &str, system_prompt: &str) -> Self {
        Self {
            name: name.to_string(),
            system_prompt: system_prompt.to_string(),
            output_tag: None,
            output_tag_list: None,
        }
    }

    fn with_output_tag(mut self, tag: &str) -> Self {
        self.output_tag = Some(tag.to_string());
        self
    }
}

/// Process-wide agent lookup. Built once at startup; concurrent reads are
/// unsynchronized and safe.
pub struct AgentRegistry {
    agents: HashMap<String, AgentSpec>,
}

impl AgentRegistry {
    /// Built-in table plus config overrides. An override with an existing
    /// name replaces the built-in entry.
    pub fn from_config(overrides: &[AgentConfig]) -> Self {
        let mut registry = Self::default();
        for config in overrides {
            registry.agents.insert(
                config.name.clone(),
                AgentSpec {
                    name: config.name.clone(),
                    system_prompt: config.system_prompt.clone(),
                    output_tag: config.output_tag.clone(),
                    output_tag_list: config.output_tag_list.clone(),
                },
            );
        }
        registry
    }

    /// O(1) lookup. `None` is a recoverable condition for the caller, not a
    /// fault.
    pub fn resolve(&self, name: &str) -> Option<&AgentSpec> {
        self.agents.get(name)
    }

    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        let mut agents = HashMap::new();
        for spec in [
            AgentSpec::new("advanced-agent", prompts::CLASSIFICATION_PROMPT)
                .with_output_tag(crate::interpreter::AGENT_NAME_TAG),
            AgentSpec::new("math", prompts::MATH_AGENT_PROMPT),
            AgentSpec::new("research", prompts::RESEARCH_AGENT_PROMPT),
            AgentSpec::new("writer", prompts::WRITER_AGENT_PROMPT),
        ] {
            agents.insert(spec.name.clone(), spec);
        }
        Self { agents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_resolves_known_agents() {
        let registry = AgentRegistry::default();
        assert!(registry.resolve("math").is_some());
        assert!(registry.resolve("research").is_some());
        let classifier = registry.resolve("advanced-agent").unwrap();
        assert_eq!(classifier.output_tag.as_deref(), Some("agent_name"));
    }

    #[test]
    fn unknown_name_is_none_not_a_fault() {
        let registry = AgentRegistry::default();
        assert!(registry.resolve("quantum-oracle").is_none());
        assert!(registry.resolve("").is_none());
    }

    #[test]
    fn config_override_replaces_builtin() {
        let overrides = vec![AgentConfig {
            name: "math".to_string(),
            system_prompt: "custom math prompt".to_string(),
            output_tag: None,
            output_tag_list: None,
        }];
        let registry = AgentRegistry::from_config(&overrides);
        assert_eq!(registry.resolve("math").unwrap().system_prompt, "custom math prompt");
        // Built-ins not named by the override survive.
        assert!(registry.resolve("writer").is_some());
    }
}
