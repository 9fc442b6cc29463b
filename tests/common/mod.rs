//! Shared fixtures for the integration tests
//!
//! Builds small platial graphs with the same node and edge layout the
//! derivation operators produce, plus an independent reachability check
//! for comparing against the query layer.

#![allow(dead_code)]

use chora::graph::{Edge, EdgeType, Node, NodeId, PlatialGraph};
use chora::model::{Agent, Encounter, SpatialExtent};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route `tracing` output through the test harness
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// June 2024; the 3rd is a Monday
pub fn june(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, minute, 0).unwrap()
}

// ============================================================================
// Graph fixtures
// ============================================================================

/// One agent and a handful of named extents, with helpers for recording visits
pub struct Fixture {
    pub graph: PlatialGraph,
    pub agent: NodeId,
}

impl Fixture {
    pub fn new(agent: &str, extents: &[&str]) -> Self {
        let mut graph = PlatialGraph::new("fixture");
        let agent = graph
            .add_node(Node::with_id(agent.into(), Agent::individual(agent)))
            .unwrap();
        for name in extents {
            graph
                .add_node(Node::with_id((*name).into(), SpatialExtent::named(*name)))
                .unwrap();
        }
        Self { graph, agent }
    }

    /// Record a closed encounter linked the way the extractors link them
    pub fn visit(&mut self, extent: &str, start: DateTime<Utc>, minutes: i64, activity: &str) -> NodeId {
        let encounter = Encounter::new(self.agent.clone(), extent.into(), start)
            .lasting(Duration::minutes(minutes))
            .unwrap()
            .with_activity(activity);
        self.record(encounter)
    }

    pub fn record(&mut self, encounter: Encounter) -> NodeId {
        let extent = encounter.extent_id.clone();
        let id = self.graph.add_node(Node::new(encounter)).unwrap();
        self.graph
            .add_edge(Edge::new(self.agent.clone(), id.clone(), EdgeType::ParticipatesIn))
            .unwrap();
        self.graph
            .add_edge(Edge::new(id.clone(), extent, EdgeType::OccursAt))
            .unwrap();
        id
    }
}

/// Extents linked in a chain `x0 -> x1 -> ... -> x{n-1}` by TRANSITIONS_TO edges
pub fn chain(n: usize) -> PlatialGraph {
    let mut graph = PlatialGraph::new("chain");
    for i in 0..n {
        let name = format!("x{}", i);
        graph
            .add_node(Node::with_id(name.as_str().into(), SpatialExtent::named(name.as_str())))
            .unwrap();
    }
    for i in 1..n {
        graph
            .add_edge(Edge::new(
                format!("x{}", i - 1).into(),
                format!("x{}", i).into(),
                EdgeType::TransitionsTo,
            ))
            .unwrap();
    }
    graph
}

// ============================================================================
// Reference metrics
// ============================================================================

/// Shortest outgoing hop count from `start` to every node within `max_depth`
pub fn hop_distances(graph: &PlatialGraph, start: &NodeId, max_depth: usize) -> HashMap<NodeId, usize> {
    let mut distances = HashMap::new();
    if !graph.has_node(start) {
        return distances;
    }
    distances.insert(start.clone(), 0);
    let mut queue = VecDeque::from([start.clone()]);
    while let Some(current) = queue.pop_front() {
        let depth = distances[&current];
        if depth == max_depth {
            continue;
        }
        for edge in graph.outgoing(&current, None) {
            if !distances.contains_key(&edge.target) {
                distances.insert(edge.target.clone(), depth + 1);
                queue.push_back(edge.target.clone());
            }
        }
    }
    distances
}
