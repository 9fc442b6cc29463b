//! Breadth-first neighbourhood walks

use super::types::{adjacent, Direction, TraversalResult};
use crate::graph::{EdgeType, Node, NodeId, PlatialGraph};
use std::collections::{HashSet, VecDeque};

/// Layered BFS from one node with optional edge-type filter
#[derive(Debug, Clone)]
pub struct TraverseQuery {
    /// Starting node ID
    pub origin: NodeId,
    /// Hops from the origin; 0 returns the origin alone
    pub max_depth: usize,
    /// Which edge ends to follow
    pub direction: Direction,
    /// Edge types to follow; empty follows all
    pub edge_types: Vec<EdgeType>,
}

impl TraverseQuery {
    /// Walk outward from `origin`, one hop by default
    pub fn from(origin: NodeId) -> Self {
        Self {
            origin,
            max_depth: 1,
            direction: Direction::Outgoing,
            edge_types: Vec::new(),
        }
    }

    /// Hop limit
    pub fn depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Outgoing by default
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Only follow edges of this type (repeatable)
    pub fn with_edge_type(mut self, edge_type: EdgeType) -> Self {
        self.edge_types.push(edge_type);
        self
    }

    /// Lazy breadth-first walk
    pub fn iter<'g>(&self, graph: &'g PlatialGraph) -> Traversal<'g> {
        Traversal::new(graph, &self.origin, self.max_depth, self.direction, self.edge_types.clone())
    }

    /// Execute the traversal, grouping nodes by depth
    pub fn execute(&self, graph: &PlatialGraph) -> TraversalResult {
        let mut result = TraversalResult::new(self.origin.clone());
        for (node, depth) in self.iter(graph) {
            if result.levels.len() <= depth {
                result.levels.push(Vec::new());
            }
            result.levels[depth].push(node.clone());
        }
        result
    }
}

/// Breadth-first iterator of `(node, depth)` pairs.
///
/// Each reachable node is yielded once, depths never decrease, and siblings
/// come in edge insertion order. Nothing is computed until `next` is called.
pub struct Traversal<'g> {
    graph: &'g PlatialGraph,
    queue: VecDeque<(&'g NodeId, usize)>,
    visited: HashSet<&'g NodeId>,
    max_depth: usize,
    direction: Direction,
    edge_types: Vec<EdgeType>,
}

impl<'g> Traversal<'g> {
    fn new(
        graph: &'g PlatialGraph,
        start: &NodeId,
        max_depth: usize,
        direction: Direction,
        edge_types: Vec<EdgeType>,
    ) -> Self {
        let mut queue = VecDeque::new();
        let mut visited = HashSet::new();
        if let Some(node) = graph.get_node(start) {
            queue.push_back((&node.id, 0));
            visited.insert(&node.id);
        }
        Self {
            graph,
            queue,
            visited,
            max_depth,
            direction,
            edge_types,
        }
    }
}

impl<'g> Iterator for Traversal<'g> {
    type Item = (&'g Node, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (id, depth) = self.queue.pop_front()?;
        if depth < self.max_depth {
            for (_, neighbor) in adjacent(self.graph, id, self.direction, &self.edge_types) {
                if self.visited.insert(neighbor) {
                    self.queue.push_back((neighbor, depth + 1));
                }
            }
        }
        self.graph.get_node(id).map(|node| (node, depth))
    }
}

/// Breadth-first traversal along outgoing edges of any type, up to `max_depth` hops.
///
/// A missing start yields nothing.
pub fn traverse_from<'g>(graph: &'g PlatialGraph, start: &NodeId, max_depth: usize) -> Traversal<'g> {
    Traversal::new(graph, start, max_depth, Direction::Outgoing, Vec::new())
}
