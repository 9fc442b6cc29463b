//! Node representation in the platial graph

use crate::model::{
    Affect, Agent, Context, Encounter, Familiarity, Liminality, Meaning, Practice, SpatialExtent,
};
use crate::temporal::Validity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Namespace for deterministic (v5) node identifiers
const CHORA_NAMESPACE: Uuid = Uuid::from_u128(0x6368_6f72_612d_4e53_8000_0000_0000_0001);

/// Node identity, stable across storage round trips
///
/// Serializes as a plain string (UUID or semantic ID like "agent:alice")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new random NodeId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a NodeId from a string (semantic ID)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Deterministic id for a derived node, stable across recomputation
    pub fn derived(namespace: &str, parts: &[&NodeId]) -> Self {
        let mut name = String::from(namespace);
        for part in parts {
            name.push('\u{1f}');
            name.push_str(&part.0);
        }
        let uuid = Uuid::new_v5(&CHORA_NAMESPACE, name.as_bytes());
        Self(format!("{}:{}", namespace, uuid))
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// How a node came to be known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpistemicLevel {
    /// Directly recorded
    Observed,
    /// Computed from other nodes by an operator
    Derived,
    /// Symbolic content attributed by an agent or analyst
    Interpreted,
}

impl EpistemicLevel {
    /// Higher is more certain: observed > derived > interpreted
    pub fn certainty_order(&self) -> u8 {
        match self {
            EpistemicLevel::Observed => 2,
            EpistemicLevel::Derived => 1,
            EpistemicLevel::Interpreted => 0,
        }
    }

    pub fn is_more_certain_than(&self, other: &EpistemicLevel) -> bool {
        self.certainty_order() > other.certainty_order()
    }
}

impl std::fmt::Display for EpistemicLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EpistemicLevel::Observed => "observed",
            EpistemicLevel::Derived => "derived",
            EpistemicLevel::Interpreted => "interpreted",
        };
        write!(f, "{}", s)
    }
}

/// Node category, used for the store's type index and for filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Agent,
    SpatialExtent,
    Encounter,
    Context,
    Affect,
    Familiarity,
    Practice,
    Liminality,
    Meaning,
}

impl NodeType {
    /// Level a node of this type must carry, if fixed
    pub fn required_epistemic_level(&self) -> Option<EpistemicLevel> {
        match self {
            NodeType::Encounter => Some(EpistemicLevel::Observed),
            NodeType::Familiarity | NodeType::Practice => Some(EpistemicLevel::Derived),
            _ => None,
        }
    }

    pub fn default_epistemic_level(&self) -> EpistemicLevel {
        match self {
            NodeType::Familiarity | NodeType::Practice => EpistemicLevel::Derived,
            NodeType::Meaning => EpistemicLevel::Interpreted,
            _ => EpistemicLevel::Observed,
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeType::Agent => "agent",
            NodeType::SpatialExtent => "spatial_extent",
            NodeType::Encounter => "encounter",
            NodeType::Context => "context",
            NodeType::Affect => "affect",
            NodeType::Familiarity => "familiarity",
            NodeType::Practice => "practice",
            NodeType::Liminality => "liminality",
            NodeType::Meaning => "meaning",
        };
        write!(f, "{}", s)
    }
}

/// Typed property values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<PropertyValue>),
    Object(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

/// Properties collection
pub type Properties = BTreeMap<String, PropertyValue>;

/// Which operator produced a derived or interpreted node, and from what
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub operator: String,
    #[serde(default)]
    pub sources: Vec<NodeId>,
    pub at: DateTime<Utc>,
}

impl Provenance {
    pub fn new(operator: impl Into<String>, sources: Vec<NodeId>, at: DateTime<Utc>) -> Self {
        Self {
            operator: operator.into(),
            sources,
            at,
        }
    }
}

/// Closed set of node payloads, tagged by `kind` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Agent(Agent),
    SpatialExtent(SpatialExtent),
    Encounter(Encounter),
    Context(Context),
    Affect(Affect),
    Familiarity(Familiarity),
    Practice(Practice),
    Liminality(Liminality),
    Meaning(Meaning),
}

impl NodeKind {
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Agent(_) => NodeType::Agent,
            NodeKind::SpatialExtent(_) => NodeType::SpatialExtent,
            NodeKind::Encounter(_) => NodeType::Encounter,
            NodeKind::Context(_) => NodeType::Context,
            NodeKind::Affect(_) => NodeType::Affect,
            NodeKind::Familiarity(_) => NodeType::Familiarity,
            NodeKind::Practice(_) => NodeType::Practice,
            NodeKind::Liminality(_) => NodeType::Liminality,
            NodeKind::Meaning(_) => NodeType::Meaning,
        }
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for NodeKind {
                fn from(payload: $variant) -> Self {
                    NodeKind::$variant(payload)
                }
            }
        )*
    };
}

impl_from_payload!(
    Agent,
    SpatialExtent,
    Encounter,
    Context,
    Affect,
    Familiarity,
    Practice,
    Liminality,
    Meaning,
);

/// A node in the platial graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier, stable for the node's lifetime
    pub id: NodeId,
    pub epistemic_level: EpistemicLevel,
    /// Unset means timeless: the node is valid at every instant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity: Option<Validity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<Provenance>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
    pub payload: NodeKind,
}

impl Node {
    /// Create a node with a random id and the default epistemic level for its type
    pub fn new(payload: impl Into<NodeKind>) -> Self {
        Self::with_id(NodeId::new(), payload)
    }

    /// Create a node with a specific id
    pub fn with_id(id: NodeId, payload: impl Into<NodeKind>) -> Self {
        let payload = payload.into();
        let validity = match &payload {
            NodeKind::Encounter(e) => Some(e.validity()),
            _ => None,
        };
        Self {
            id,
            epistemic_level: payload.node_type().default_epistemic_level(),
            validity,
            provenance: None,
            properties: BTreeMap::new(),
            payload,
        }
    }

    pub fn with_epistemic_level(mut self, level: EpistemicLevel) -> Self {
        self.epistemic_level = level;
        self
    }

    pub fn with_validity(mut self, validity: Validity) -> Self {
        self.validity = Some(validity);
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Attach a free-form property
    pub fn with_property(mut self, key: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn node_type(&self) -> NodeType {
        self.payload.node_type()
    }

    /// Valid iff timeless, or its validity covers `at`
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.validity.map_or(true, |v| v.is_valid_at(at))
    }

    pub fn as_agent(&self) -> Option<&Agent> {
        match &self.payload {
            NodeKind::Agent(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_extent(&self) -> Option<&SpatialExtent> {
        match &self.payload {
            NodeKind::SpatialExtent(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_encounter(&self) -> Option<&Encounter> {
        match &self.payload {
            NodeKind::Encounter(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match &self.payload {
            NodeKind::Context(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_affect(&self) -> Option<&Affect> {
        match &self.payload {
            NodeKind::Affect(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_familiarity(&self) -> Option<&Familiarity> {
        match &self.payload {
            NodeKind::Familiarity(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_practice(&self) -> Option<&Practice> {
        match &self.payload {
            NodeKind::Practice(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_liminality(&self) -> Option<&Liminality> {
        match &self.payload {
            NodeKind::Liminality(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_meaning(&self) -> Option<&Meaning> {
        match &self.payload {
            NodeKind::Meaning(m) => Some(m),
            _ => None,
        }
    }
}
