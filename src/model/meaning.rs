//! Meaning: interpreted symbolic content tied to an agent and/or an extent

use crate::error::{check_range, ChoraResult};
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeaningType {
    #[default]
    Personal,
    Social,
    Cultural,
    Symbolic,
    Functional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meaning {
    #[serde(default)]
    pub meaning_type: MeaningType,
    /// None for cultural meanings shared beyond one agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent_id: Option<NodeId>,
    pub content: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    /// In [0, 1]
    pub strength: f64,
}

impl Meaning {
    pub fn personal(agent_id: NodeId, extent_id: NodeId, content: impl Into<String>) -> Self {
        Self {
            meaning_type: MeaningType::Personal,
            agent_id: Some(agent_id),
            extent_id: Some(extent_id),
            content: content.into(),
            symbols: Vec::new(),
            strength: 1.0,
        }
    }

    pub fn cultural(extent_id: NodeId, content: impl Into<String>) -> Self {
        Self {
            meaning_type: MeaningType::Cultural,
            agent_id: None,
            extent_id: Some(extent_id),
            content: content.into(),
            symbols: Vec::new(),
            strength: 1.0,
        }
    }

    pub fn functional(extent_id: NodeId, function: impl Into<String>) -> Self {
        Self {
            meaning_type: MeaningType::Functional,
            agent_id: None,
            extent_id: Some(extent_id),
            content: function.into(),
            symbols: Vec::new(),
            strength: 1.0,
        }
    }

    pub fn for_agent(mut self, agent_id: NodeId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols.extend(symbols.into_iter().map(Into::into));
        self
    }

    pub fn with_strength(mut self, strength: f64) -> ChoraResult<Self> {
        check_range("meaning.strength", strength, 0.0, 1.0)?;
        self.strength = strength;
        Ok(self)
    }

    /// Relevant to `agent_id` at `extent_id`: same extent, and either shared or the agent's own
    pub fn applies_to(&self, agent_id: &NodeId, extent_id: &NodeId) -> bool {
        self.extent_id.as_ref() == Some(extent_id) && self.agent_id.as_ref().map_or(true, |a| a == agent_id)
    }
}
