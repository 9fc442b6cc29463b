//! Error taxonomy shared by the store, the derivation operators and the stream detector

use crate::graph::{EdgeId, EpistemicLevel, GraphId, NodeId, NodeType};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur in chora operations
#[derive(Debug, Error)]
pub enum ChoraError {
    #[error("Node already exists: {0}")]
    DuplicateIdentity(NodeId),

    #[error("Edge already exists: {0}")]
    DuplicateEdge(EdgeId),

    #[error("Edge {edge} references missing node {missing}")]
    DanglingReference { edge: EdgeId, missing: NodeId },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),

    #[error("Node {id} is a {found}, expected {expected}")]
    KindMismatch {
        id: NodeId,
        expected: NodeType,
        found: NodeType,
    },

    #[error("Node {id} must be {expected}, got {found}")]
    EpistemicViolation {
        id: NodeId,
        expected: EpistemicLevel,
        found: EpistemicLevel,
    },

    #[error("Encounter {0} is immutable except for closing its end time")]
    ImmutableEncounter(NodeId),

    #[error("Out-of-order sample for agent {agent}: {received} precedes {last}")]
    OutOfOrderSample {
        agent: NodeId,
        last: DateTime<Utc>,
        received: DateTime<Utc>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: f64 },

    #[error("Invalid interval: end {end} precedes start {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for chora operations
pub type ChoraResult<T> = Result<T, ChoraError>;

/// Reject values outside `[min, max]` (NaN included).
pub(crate) fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ChoraResult<()> {
    if value.is_nan() || value < min || value > max {
        return Err(ChoraError::InvalidValue { field, value });
    }
    Ok(())
}
