//! Agent: an individual or group with situated experience

use serde::{Deserialize, Serialize};

/// What kind of experiencing entity an agent is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    #[default]
    Individual,
    Group,
    /// A stand-in such as a device or a synthetic persona
    Proxy,
}

/// An agent. Identity lives on the node; descriptive fields may be replaced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Agent {
    pub name: String,
    #[serde(default)]
    pub agent_kind: AgentKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Agent {
    pub fn individual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent_kind: AgentKind::Individual,
            description: None,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            agent_kind: AgentKind::Group,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
