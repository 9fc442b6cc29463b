//! In-process adapter keeping JSON snapshots

use super::traits::{GraphAdapter, StorageError, StorageResult};
use crate::graph::{GraphId, GraphSnapshot, PlatialGraph};
use dashmap::DashMap;
use tracing::debug;

/// Stores each graph as a serialized JSON snapshot keyed by graph id
#[derive(Debug, Default)]
pub struct MemoryAdapter {
    graphs: DashMap<GraphId, String>,
}

impl MemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored JSON for a graph, if any
    pub fn raw(&self, id: &GraphId) -> Option<String> {
        self.graphs.get(id).map(|r| r.value().clone())
    }
}

impl GraphAdapter for MemoryAdapter {
    fn save_graph(&self, graph: &PlatialGraph) -> StorageResult<()> {
        let json = serde_json::to_string(graph)?;
        debug!(graph = %graph.id, bytes = json.len(), "save graph");
        self.graphs.insert(graph.id.clone(), json);
        Ok(())
    }

    fn load_graph(&self, id: &GraphId) -> StorageResult<PlatialGraph> {
        let json = self.raw(id).ok_or_else(|| StorageError::GraphNotFound(id.clone()))?;
        let snapshot: GraphSnapshot = serde_json::from_str(&json)?;
        Ok(PlatialGraph::try_from(snapshot)?)
    }

    fn list_graphs(&self) -> StorageResult<Vec<GraphId>> {
        let mut ids: Vec<GraphId> = self.graphs.iter().map(|r| r.key().clone()).collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(ids)
    }

    fn delete_graph(&self, id: &GraphId) -> StorageResult<bool> {
        Ok(self.graphs.remove(id).is_some())
    }
}
