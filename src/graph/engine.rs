//! PlatialEngine: named graphs behind a concurrent map
//!
//! `with_graph_mut` holds the shard write lock for the duration of the
//! closure, so writers to one graph are serialized while readers of other
//! graphs proceed.

use super::store::{GraphId, PlatialGraph};
use crate::error::{ChoraError, ChoraResult};
use dashmap::DashMap;

/// Manages graphs and provides serialized access to each
#[derive(Debug, Default)]
pub struct PlatialEngine {
    graphs: DashMap<GraphId, PlatialGraph>,
}

impl PlatialEngine {
    pub fn new() -> Self {
        Self {
            graphs: DashMap::new(),
        }
    }

    /// Create or replace a graph; returns its id
    pub fn upsert_graph(&self, graph: PlatialGraph) -> GraphId {
        let id = graph.id.clone();
        self.graphs.insert(id.clone(), graph);
        id
    }

    /// Clone of a graph by ID
    pub fn get_graph(&self, id: &GraphId) -> Option<PlatialGraph> {
        self.graphs.get(id).map(|r| r.clone())
    }

    pub fn remove_graph(&self, id: &GraphId) -> Option<PlatialGraph> {
        self.graphs.remove(id).map(|(_, graph)| graph)
    }

    pub fn list_graphs(&self) -> Vec<GraphId> {
        self.graphs.iter().map(|r| r.key().clone()).collect()
    }

    pub fn graph_count(&self) -> usize {
        self.graphs.len()
    }

    pub fn has_graph(&self, id: &GraphId) -> bool {
        self.graphs.contains_key(id)
    }

    /// Run a read-only closure against a graph
    pub fn with_graph<R>(&self, id: &GraphId, f: impl FnOnce(&PlatialGraph) -> R) -> ChoraResult<R> {
        let graph = self
            .graphs
            .get(id)
            .ok_or_else(|| ChoraError::GraphNotFound(id.clone()))?;
        Ok(f(graph.value()))
    }

    /// Run a mutating closure against a graph under its write lock
    pub fn with_graph_mut<R>(&self, id: &GraphId, f: impl FnOnce(&mut PlatialGraph) -> R) -> ChoraResult<R> {
        let mut graph = self
            .graphs
            .get_mut(id)
            .ok_or_else(|| ChoraError::GraphNotFound(id.clone()))?;
        Ok(f(graph.value_mut()))
    }
}
