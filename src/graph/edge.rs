//! Typed, directed edges between nodes

use super::node::{EpistemicLevel, NodeId, Properties, PropertyValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Edge identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Fresh v4 id
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed relation vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Agent -> Encounter
    ParticipatesIn,
    /// Encounter -> SpatialExtent
    OccursAt,
    /// Encounter -> Context
    HasContext,
    /// Derived node -> its source
    DerivesFrom,
    /// Extent -> extent, in movement order
    TransitionsTo,
    /// Encounter -> Familiarity
    Reinforces,
    Decays,
    /// Encounter or extent -> Affect
    Expresses,
    /// Agent -> Meaning
    InterpretsAs,
    /// Encounter -> Practice
    BelongsTo,
    Bounds,
    /// Liminality -> extent
    Crosses,
    SimilarTo,
    ConflictsWith,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EdgeType::ParticipatesIn => "participates_in",
            EdgeType::OccursAt => "occurs_at",
            EdgeType::HasContext => "has_context",
            EdgeType::DerivesFrom => "derives_from",
            EdgeType::TransitionsTo => "transitions_to",
            EdgeType::Reinforces => "reinforces",
            EdgeType::Decays => "decays",
            EdgeType::Expresses => "expresses",
            EdgeType::InterpretsAs => "interprets_as",
            EdgeType::BelongsTo => "belongs_to",
            EdgeType::Bounds => "bounds",
            EdgeType::Crosses => "crosses",
            EdgeType::SimilarTo => "similar_to",
            EdgeType::ConflictsWith => "conflicts_with",
        };
        write!(f, "{}", s)
    }
}

/// A directed, typed edge. Exists only while both endpoints exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub edge_type: EdgeType,
    /// Relationship strength (0.0 - 1.0)
    pub weight: f64,
    pub epistemic_level: EpistemicLevel,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl Edge {
    /// Create a new observed edge with full weight
    pub fn new(source: NodeId, target: NodeId, edge_type: EdgeType) -> Self {
        Self {
            id: EdgeId::new(),
            source,
            target,
            edge_type,
            weight: 1.0,
            epistemic_level: EpistemicLevel::Observed,
            created_at: Utc::now(),
            properties: BTreeMap::new(),
        }
    }

    /// An edge written by a derivation operator
    pub fn derived(source: NodeId, target: NodeId, edge_type: EdgeType) -> Self {
        Self::new(source, target, edge_type).with_epistemic_level(EpistemicLevel::Derived)
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_epistemic_level(mut self, level: EpistemicLevel) -> Self {
        self.epistemic_level = level;
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}
