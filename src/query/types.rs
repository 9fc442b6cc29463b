//! Shared query plumbing: edge direction, adjacency and result shapes

use crate::derive::EmergentPlace;
use crate::graph::{Edge, EdgeType, Node, NodeId, PlatialGraph};

/// Which way a query walks an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    /// source to target
    #[default]
    Outgoing,
    /// target back to source
    Incoming,
    /// Outgoing first, then incoming
    Both,
}

/// Edges leaving `id` in `direction` that pass the type filter, with the node at the far end.
///
/// Outgoing edges come first, then incoming, each in insertion order. An
/// empty `edge_types` accepts every type.
pub(crate) fn adjacent<'g>(
    graph: &'g PlatialGraph,
    id: &NodeId,
    direction: Direction,
    edge_types: &[EdgeType],
) -> Vec<(&'g Edge, &'g NodeId)> {
    let accepts = |e: &Edge| edge_types.is_empty() || edge_types.contains(&e.edge_type);
    let mut found = Vec::new();
    if matches!(direction, Direction::Outgoing | Direction::Both) {
        found.extend(graph.outgoing(id, None).filter(|e| accepts(e)).map(|e| (e, &e.target)));
    }
    if matches!(direction, Direction::Incoming | Direction::Both) {
        found.extend(graph.incoming(id, None).filter(|e| accepts(e)).map(|e| (e, &e.source)));
    }
    found
}

/// Page of places from a [`super::PlaceQuery`]
#[derive(Debug, Clone)]
pub struct PlaceQueryResult {
    /// Places matching the query, after offset and limit
    pub places: Vec<EmergentPlace>,
    /// Matches before offset and limit were applied
    pub total_count: usize,
}

impl PlaceQueryResult {
    pub fn empty() -> Self {
        Self {
            places: Vec::new(),
            total_count: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Breadth-first layers reached from `origin`
#[derive(Debug, Clone)]
pub struct TraversalResult {
    pub origin: NodeId,
    /// `levels[d]` holds the nodes first reached at hop `d`; `levels[0]` is the origin
    pub levels: Vec<Vec<Node>>,
}

impl TraversalResult {
    pub fn new(origin: NodeId) -> Self {
        Self {
            origin,
            levels: Vec::new(),
        }
    }

    /// Every reached node except the origin, shallowest first
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.levels.iter().skip(1).flatten().collect()
    }

    pub fn at_depth(&self, depth: usize) -> &[Node] {
        self.levels.get(depth).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Deepest non-empty layer
    pub fn max_depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }
}

/// Outcome of a path search. `length` counts edges
#[derive(Debug, Clone)]
pub struct PathResult {
    pub found: bool,
    /// Source and target included
    pub path: Vec<Node>,
    pub edges: Vec<Edge>,
    pub length: usize,
}

impl PathResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            path: Vec::new(),
            edges: Vec::new(),
            length: 0,
        }
    }

    pub fn found(path: Vec<Node>, edges: Vec<Edge>) -> Self {
        let length = edges.len();
        Self {
            found: true,
            path,
            edges,
            length,
        }
    }

    /// Ids along the path, source first
    pub fn node_ids(&self) -> Vec<&NodeId> {
        self.path.iter().map(|n| &n.id).collect()
    }
}
