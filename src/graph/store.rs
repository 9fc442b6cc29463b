//! PlatialGraph: the typed graph store
//!
//! Nodes are indexed by id and by type; edges by (type, source),
//! (type, target) and by endpoint. Iteration follows insertion order so
//! traversal tie-breaks are deterministic.

use super::edge::{Edge, EdgeId, EdgeType};
use super::node::{Node, NodeId, NodeKind, NodeType};
use crate::error::{ChoraError, ChoraResult};
use crate::model::{Encounter, Familiarity};
use crate::temporal::{TimeInterval, Validity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Unique identifier for a graph
///
/// Serializes as a plain string (UUID or semantic ID like "graph:city-walk")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GraphId(String);

impl GraphId {
    /// Create a new random GraphId (UUID-based)
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a GraphId from a string (semantic ID)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GraphId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GraphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for GraphId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Serialized form of a graph: nodes and edges in insertion order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub id: GraphId,
    pub name: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// A typed, temporally filtered graph of platial entities
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(into = "GraphSnapshot", try_from = "GraphSnapshot")]
pub struct PlatialGraph {
    pub id: GraphId,
    pub name: String,
    nodes: HashMap<NodeId, Node>,
    node_order: Vec<NodeId>,
    by_type: HashMap<NodeType, Vec<NodeId>>,
    edges: Vec<Edge>,
    edge_index: HashMap<EdgeId, usize>,
    by_type_source: HashMap<(EdgeType, NodeId), Vec<usize>>,
    by_type_target: HashMap<(EdgeType, NodeId), Vec<usize>>,
    outgoing_all: HashMap<NodeId, Vec<usize>>,
    incoming_all: HashMap<NodeId, Vec<usize>>,
}

impl PlatialGraph {
    /// Create a new empty graph with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(GraphId::new(), name)
    }

    /// Create a new graph with a specific ID and name
    pub fn with_id(id: GraphId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    /// Insert a node.
    ///
    /// Fails with `DuplicateIdentity` if the id exists, and with
    /// `EpistemicViolation` if an encounter is not OBSERVED or a
    /// derived-only type is not DERIVED.
    /// Encounter nodes get their validity from the encounter interval.
    pub fn add_node(&mut self, mut node: Node) -> ChoraResult<NodeId> {
        if self.nodes.contains_key(&node.id) {
            return Err(ChoraError::DuplicateIdentity(node.id));
        }
        check_epistemic(&node)?;
        validate_payload(&mut node)?;

        let id = node.id.clone();
        debug!(node = %id, node_type = %node.node_type(), "add node");
        self.insert_node(node);
        Ok(id)
    }

    /// Insert an edge. Both endpoints must already exist; nothing is
    /// mutated on failure.
    pub fn add_edge(&mut self, edge: Edge) -> ChoraResult<EdgeId> {
        if self.edge_index.contains_key(&edge.id) {
            return Err(ChoraError::DuplicateEdge(edge.id));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(ChoraError::DanglingReference {
                    edge: edge.id.clone(),
                    missing: endpoint.clone(),
                });
            }
        }

        let id = edge.id.clone();
        debug!(edge = %id, edge_type = %edge.edge_type, source = %edge.source, target = %edge.target, "add edge");
        self.insert_edge(edge);
        Ok(id)
    }

    /// Replace a node by id, keeping its identity stable.
    ///
    /// The replacement must have the same type and epistemic level.
    /// Encounters may only change by closing their end time.
    pub fn replace_node(&mut self, mut node: Node) -> ChoraResult<()> {
        let existing = self
            .nodes
            .get(&node.id)
            .ok_or_else(|| ChoraError::NodeNotFound(node.id.clone()))?;

        let (expected, found) = (existing.node_type(), node.node_type());
        if expected != found {
            return Err(ChoraError::KindMismatch {
                id: node.id,
                expected,
                found,
            });
        }
        if existing.epistemic_level != node.epistemic_level {
            return Err(ChoraError::EpistemicViolation {
                id: node.id,
                expected: existing.epistemic_level,
                found: node.epistemic_level,
            });
        }
        if let (Some(old), Some(new)) = (existing.as_encounter(), node.as_encounter()) {
            if !old.is_closure_of(new) {
                return Err(ChoraError::ImmutableEncounter(node.id));
            }
        }
        validate_payload(&mut node)?;

        debug!(node = %node.id, node_type = %node.node_type(), "replace node");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Insert `node`, or replace the existing node with the same id
    pub fn upsert_node(&mut self, node: Node) -> ChoraResult<NodeId> {
        if self.nodes.contains_key(&node.id) {
            let id = node.id.clone();
            self.replace_node(node)?;
            Ok(id)
        } else {
            self.add_node(node)
        }
    }

    /// Close an open encounter at `end`
    pub fn close_encounter(&mut self, id: &NodeId, end: DateTime<Utc>) -> ChoraResult<()> {
        let node = self.get_node(id).ok_or_else(|| ChoraError::NodeNotFound(id.clone()))?;
        let encounter = node.as_encounter().ok_or_else(|| ChoraError::KindMismatch {
            id: id.clone(),
            expected: NodeType::Encounter,
            found: node.node_type(),
        })?;
        if encounter.end_time.is_some() {
            return Err(ChoraError::ImmutableEncounter(id.clone()));
        }

        let closed = encounter.clone().ended_at(end)?;
        let mut replacement = node.clone();
        replacement.payload = NodeKind::Encounter(closed);
        self.replace_node(replacement)
    }

    /// Soft-delete a node by closing its validity at `at`.
    ///
    /// A timeless node becomes valid from the epoch (or `at`, if earlier) up to `at`.
    pub fn close_validity(&mut self, id: &NodeId, at: DateTime<Utc>) -> ChoraResult<()> {
        let node = self.get_node(id).ok_or_else(|| ChoraError::NodeNotFound(id.clone()))?;
        if node.as_encounter().is_some() {
            return self.close_encounter(id, at);
        }

        let mut replacement = node.clone();
        let mut validity = replacement.validity.unwrap_or(Validity {
            start: at.min(DateTime::<Utc>::UNIX_EPOCH),
            end: None,
        });
        validity.close(at)?;
        replacement.validity = Some(validity);
        self.replace_node(replacement)
    }

    /// Get a node by ID
    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get_edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edge_index.get(id).and_then(|&i| self.edges.get(i))
    }

    /// Nodes matching an optional type and valid at an optional instant
    pub fn nodes(
        &self,
        node_type: Option<NodeType>,
        at: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &Node> + '_ {
        let ids: &[NodeId] = match node_type {
            Some(t) => self.by_type.get(&t).map(Vec::as_slice).unwrap_or(&[]),
            None => &self.node_order,
        };
        ids.iter()
            .filter_map(move |id| self.nodes.get(id))
            .filter(move |node| at.map_or(true, |t| node.is_valid_at(t)))
    }

    /// Nodes whose validity intersects `interval` (timeless nodes always do)
    pub fn nodes_overlapping(
        &self,
        node_type: Option<NodeType>,
        interval: TimeInterval,
    ) -> impl Iterator<Item = &Node> + '_ {
        self.nodes(node_type, None)
            .filter(move |node| node.validity.map_or(true, |v| v.overlaps(&interval)))
    }

    /// Edges matching an optional type, in insertion order
    pub fn edges(&self, edge_type: Option<EdgeType>) -> impl Iterator<Item = &Edge> + '_ {
        self.edges
            .iter()
            .filter(move |e| edge_type.map_or(true, |t| e.edge_type == t))
    }

    /// Edges leaving `id`, optionally of one type, in insertion order
    pub fn outgoing(&self, id: &NodeId, edge_type: Option<EdgeType>) -> impl Iterator<Item = &Edge> + '_ {
        let positions = match edge_type {
            Some(t) => self.by_type_source.get(&(t, id.clone())),
            None => self.outgoing_all.get(id),
        };
        self.edges_at(positions)
    }

    /// Edges arriving at `id`, optionally of one type, in insertion order
    pub fn incoming(&self, id: &NodeId, edge_type: Option<EdgeType>) -> impl Iterator<Item = &Edge> + '_ {
        let positions = match edge_type {
            Some(t) => self.by_type_target.get(&(t, id.clone())),
            None => self.incoming_all.get(id),
        };
        self.edges_at(positions)
    }

    /// Distinct nodes adjacent to `id` in either direction
    pub fn neighbors(&self, id: &NodeId) -> Vec<&NodeId> {
        let mut seen = HashSet::new();
        self.outgoing(id, None)
            .map(|e| &e.target)
            .chain(self.incoming(id, None).map(|e| &e.source))
            .filter(|n| seen.insert(*n))
            .collect()
    }

    /// Nodes in the graph, all types
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges in the graph, all types
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn count(&self, node_type: NodeType) -> usize {
        self.by_type.get(&node_type).map_or(0, Vec::len)
    }

    /// An agent's encounters, optionally at one extent, ordered by start time
    pub fn encounters_for(&self, agent_id: &NodeId, extent_id: Option<&NodeId>) -> Vec<(&NodeId, &Encounter)> {
        let mut found: Vec<(&NodeId, &Encounter)> = self
            .nodes(Some(NodeType::Encounter), None)
            .filter_map(|n| n.as_encounter().map(|e| (&n.id, e)))
            .filter(|(_, e)| &e.agent_id == agent_id && extent_id.map_or(true, |x| &e.extent_id == x))
            .collect();
        found.sort_by(|a, b| a.1.start_time.cmp(&b.1.start_time).then_with(|| a.0.cmp(b.0)));
        found
    }

    /// Stored familiarity for a pair, if any
    pub fn familiarity_for(&self, agent_id: &NodeId, extent_id: &NodeId) -> Option<&Familiarity> {
        self.get_node(&Familiarity::node_id(agent_id, extent_id))
            .and_then(Node::as_familiarity)
    }

    /// Nodes valid at `at` and the edges between them
    pub fn snapshot(&self, at: DateTime<Utc>) -> PlatialGraph {
        let keep: HashSet<NodeId> = self.nodes(None, Some(at)).map(|n| n.id.clone()).collect();
        let mut graph = self.subgraph(&keep);
        graph.name = format!("{}@{}", self.name, at.to_rfc3339());
        graph
    }

    /// The induced subgraph on `ids`, preserving insertion order
    pub fn subgraph(&self, ids: &HashSet<NodeId>) -> PlatialGraph {
        let mut graph = PlatialGraph::with_id(GraphId::new(), self.name.clone());
        for id in &self.node_order {
            if ids.contains(id) {
                if let Some(node) = self.nodes.get(id) {
                    graph.insert_node(node.clone());
                }
            }
        }
        for edge in &self.edges {
            if ids.contains(&edge.source) && ids.contains(&edge.target) {
                graph.insert_edge(edge.clone());
            }
        }
        graph
    }

    fn edges_at<'a>(&'a self, positions: Option<&'a Vec<usize>>) -> impl Iterator<Item = &'a Edge> + 'a {
        positions
            .into_iter()
            .flatten()
            .filter_map(move |&i| self.edges.get(i))
    }

    fn insert_node(&mut self, node: Node) {
        let id = node.id.clone();
        self.by_type.entry(node.node_type()).or_default().push(id.clone());
        self.node_order.push(id.clone());
        self.nodes.insert(id, node);
    }

    fn insert_edge(&mut self, edge: Edge) {
        let position = self.edges.len();
        self.by_type_source
            .entry((edge.edge_type, edge.source.clone()))
            .or_default()
            .push(position);
        self.by_type_target
            .entry((edge.edge_type, edge.target.clone()))
            .or_default()
            .push(position);
        self.outgoing_all.entry(edge.source.clone()).or_default().push(position);
        self.incoming_all.entry(edge.target.clone()).or_default().push(position);
        self.edge_index.insert(edge.id.clone(), position);
        self.edges.push(edge);
    }
}

fn check_epistemic(node: &Node) -> ChoraResult<()> {
    match node.node_type().required_epistemic_level() {
        Some(required) if required != node.epistemic_level => Err(ChoraError::EpistemicViolation {
            id: node.id.clone(),
            expected: required,
            found: node.epistemic_level,
        }),
        _ => Ok(()),
    }
}

fn validate_payload(node: &mut Node) -> ChoraResult<()> {
    match &node.payload {
        NodeKind::Encounter(e) => {
            e.validate()?;
            node.validity = Some(e.validity());
        }
        NodeKind::Affect(a) => a.validate()?,
        _ => {}
    }
    Ok(())
}

impl From<PlatialGraph> for GraphSnapshot {
    fn from(graph: PlatialGraph) -> Self {
        let PlatialGraph {
            id,
            name,
            mut nodes,
            node_order,
            edges,
            ..
        } = graph;
        let nodes = node_order.iter().filter_map(|id| nodes.remove(id)).collect();
        Self { id, name, nodes, edges }
    }
}

impl TryFrom<GraphSnapshot> for PlatialGraph {
    type Error = ChoraError;

    /// Rebuild through the checked insert path so a corrupt snapshot is rejected
    fn try_from(snapshot: GraphSnapshot) -> ChoraResult<Self> {
        let mut graph = PlatialGraph::with_id(snapshot.id, snapshot.name);
        for node in snapshot.nodes {
            graph.add_node(node)?;
        }
        for edge in snapshot.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}

