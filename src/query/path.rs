//! Shortest paths between two nodes, breadth first

use super::types::{adjacent, Direction, PathResult};
use crate::graph::{Edge, EdgeType, NodeId, PlatialGraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// Shortest-path search from `source` to `target`
#[derive(Debug, Clone)]
pub struct PathQuery {
    pub source: NodeId,
    pub target: NodeId,
    /// Hop limit; `None` searches the whole component
    pub max_length: Option<usize>,
    pub direction: Direction,
    /// Empty follows every edge type
    pub edge_types: Vec<EdgeType>,
}

impl PathQuery {
    pub fn between(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            max_length: None,
            direction: Direction::Outgoing,
            edge_types: Vec::new(),
        }
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Restrict the search to `edge_type`; repeat to allow several
    pub fn with_edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_types.push(edge_type);
        self
    }

    /// Run the search. Missing endpoints give a not-found result
    pub fn execute(&self, graph: &PlatialGraph) -> PathResult {
        let (Some(source), Some(_)) = (graph.get_node(&self.source), graph.get_node(&self.target)) else {
            return PathResult::not_found();
        };
        if self.source == self.target {
            return PathResult::found(vec![source.clone()], vec![]);
        }

        let mut visited: HashSet<&NodeId> = HashSet::from([&source.id]);
        let mut queue: VecDeque<(&NodeId, usize)> = VecDeque::from([(&source.id, 0)]);
        let mut predecessors: HashMap<&NodeId, (&NodeId, &Edge)> = HashMap::new();

        while let Some((current, depth)) = queue.pop_front() {
            if self.max_length.is_some_and(|max| depth >= max) {
                continue;
            }
            for (edge, neighbor) in adjacent(graph, current, self.direction, &self.edge_types) {
                if !visited.insert(neighbor) {
                    continue;
                }
                predecessors.insert(neighbor, (current, edge));
                if neighbor == &self.target {
                    return self.reconstruct_path(graph, &predecessors);
                }
                queue.push_back((neighbor, depth + 1));
            }
        }
        PathResult::not_found()
    }

    /// Rebuild source..target from the predecessor map
    fn reconstruct_path(&self, graph: &PlatialGraph, predecessors: &HashMap<&NodeId, (&NodeId, &Edge)>) -> PathResult {
        let mut path_nodes = Vec::new();
        let mut path_edges = Vec::new();

        let mut current = &self.target;
        while let Some((pred, edge)) = predecessors.get(current) {
            if let Some(node) = graph.get_node(current) {
                path_nodes.push(node.clone());
            }
            path_edges.push((*edge).clone());
            current = *pred;
        }
        if let Some(source_node) = graph.get_node(&self.source) {
            path_nodes.push(source_node.clone());
        }

        path_nodes.reverse();
        path_edges.reverse();
        PathResult::found(path_nodes, path_edges)
    }
}

/// Shortest outgoing-edge path between two nodes, or not-found. Never fails.
pub fn find_path(graph: &PlatialGraph, start: &NodeId, end: &NodeId) -> PathResult {
    PathQuery::between(start.clone(), end.clone()).execute(graph)
}
