//! Storage trait definitions

use crate::error::ChoraError;
use crate::graph::{GraphId, PlatialGraph};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph not found: {0}")]
    GraphNotFound(GraphId),

    #[error("Invalid stored graph: {0}")]
    Graph(#[from] ChoraError),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Boundary between the in-memory graph and a persistence backend.
///
/// Implementations must round-trip every node and edge field, epistemic
/// level and temporal validity included, and must be thread-safe
/// (Send + Sync) so one adapter can serve several engines.
pub trait GraphAdapter: Send + Sync {
    /// Create or replace the stored copy of a graph
    fn save_graph(&self, graph: &PlatialGraph) -> StorageResult<()>;

    /// Load a graph by id
    fn load_graph(&self, id: &GraphId) -> StorageResult<PlatialGraph>;

    /// List stored graph ids
    fn list_graphs(&self) -> StorageResult<Vec<GraphId>>;

    /// Delete a stored graph; returns whether it existed
    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool>;
}
