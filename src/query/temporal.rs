//! Point-in-time and interval queries over node validity

use crate::error::ChoraResult;
use crate::graph::{Node, NodeType, PlatialGraph};
use crate::temporal::TimeInterval;
use chrono::{DateTime, Utc};

/// Nodes valid at `at`, timeless nodes included
pub fn snapshot_query(graph: &PlatialGraph, at: DateTime<Utc>) -> impl Iterator<Item = &Node> + '_ {
    graph.nodes(None, Some(at))
}

/// Nodes whose validity intersects `[start, end]`, timeless nodes included.
///
/// Fails with `InvalidInterval` if `end` precedes `start`.
pub fn temporal_range_query(
    graph: &PlatialGraph,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ChoraResult<impl Iterator<Item = &Node> + '_> {
    let interval = TimeInterval::bounded(start, end)?;
    Ok(graph.nodes_overlapping(None, interval))
}

/// Like [`temporal_range_query`], restricted to one node type
pub fn temporal_range_of(
    graph: &PlatialGraph,
    node_type: NodeType,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> ChoraResult<impl Iterator<Item = &Node> + '_> {
    let interval = TimeInterval::bounded(start, end)?;
    Ok(graph.nodes_overlapping(Some(node_type), interval))
}
