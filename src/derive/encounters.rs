//! Batch encounter extraction from recorded location traces
//!
//! The live counterpart is [`crate::stream::DwellDetector`]; both share the
//! ingestion helpers at the bottom of this module.

use super::require_kind;
use crate::config::TraceExtractionConfig;
use crate::error::ChoraResult;
use crate::graph::{Edge, EdgeType, Node, NodeId, NodeType, PlatialGraph, PropertyValue};
use crate::model::{Agent, Encounter, GeoPoint, SpatialExtent};
use crate::stream::geo::{nearest_covering_extent, Centroid};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One recorded location fix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
}

impl TracePoint {
    pub fn new(lat: f64, lon: f64, timestamp: DateTime<Utc>) -> Self {
        Self { lat, lon, timestamp }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

struct Stay {
    centroid: Centroid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Stay {
    fn open(p: &TracePoint) -> Self {
        Self {
            centroid: Centroid::new(p.point()),
            start: p.timestamp,
            end: p.timestamp,
        }
    }

    fn seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    fn qualifies(&self, config: &TraceExtractionConfig) -> bool {
        self.centroid.samples() >= config.min_points && self.seconds() >= config.min_duration_s
    }
}

/// Greedy radius clustering over time-ordered points, split at gaps
fn stays(points: &[TracePoint], config: &TraceExtractionConfig) -> Vec<Stay> {
    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.timestamp);

    let mut found = Vec::new();
    let mut current: Option<Stay> = None;
    for p in &ordered {
        if let Some(stay) = current.as_mut() {
            let gap = (p.timestamp - stay.end).num_milliseconds() as f64 / 1000.0;
            if gap <= config.max_gap_s && stay.centroid.distance_m(&p.point()) <= config.cluster_radius_m {
                stay.centroid.push(p.point());
                stay.end = p.timestamp;
                continue;
            }
        }
        if let Some(done) = current.replace(Stay::open(p)) {
            found.push(done);
        }
    }
    found.extend(current);
    found.retain(|s| s.qualifies(config));
    found
}

/// Cluster a recorded trace into stays and write one closed Encounter per stay.
///
/// Each stay is matched to the nearest covering extent or gets a new point
/// extent at its centroid. The agent node is created if missing. Returns the
/// new encounter ids in time order.
pub fn extract_encounters_from_trace(
    graph: &mut PlatialGraph,
    agent_id: &NodeId,
    points: &[TracePoint],
    config: &TraceExtractionConfig,
) -> ChoraResult<Vec<NodeId>> {
    config.validate()?;
    ensure_agent(graph, agent_id)?;

    let mut ids = Vec::new();
    for stay in stays(points, config) {
        let extent_id = resolve_extent(graph, stay.centroid.point(), config.cluster_radius_m, "trace")?;
        let encounter = Encounter::new(agent_id.clone(), extent_id, stay.start).ended_at(stay.end)?;
        ids.push(record_encounter(graph, encounter)?);
    }
    info!(agent = %agent_id, points = points.len(), encounters = ids.len(), "trace extraction");
    Ok(ids)
}

/// Merge consecutive encounters of one agent at one extent separated by at most `max_gap`.
///
/// The merged encounter keeps the earlier start, the later end (open if
/// either is open), the higher intensity and the first non-empty activity.
pub fn merge_nearby_encounters(mut encounters: Vec<Encounter>, max_gap: Duration) -> Vec<Encounter> {
    encounters.sort_by(|a, b| {
        a.agent_id
            .cmp(&b.agent_id)
            .then_with(|| a.start_time.cmp(&b.start_time))
    });

    let mut merged: Vec<Encounter> = Vec::with_capacity(encounters.len());
    for next in encounters {
        if let Some(last) = merged.last_mut() {
            let joins = last.agent_id == next.agent_id
                && last.extent_id == next.extent_id
                && last.end_time.map_or(true, |end| next.start_time - end <= max_gap);
            if joins {
                last.end_time = match (last.end_time, next.end_time) {
                    (Some(a), Some(b)) => Some(a.max(b)),
                    _ => None,
                };
                last.intensity = last.intensity.max(next.intensity);
                if last.activity.is_empty() {
                    last.activity = next.activity;
                }
                continue;
            }
        }
        merged.push(next);
    }
    merged
}

/// Create the agent node if it does not exist yet
pub(crate) fn ensure_agent(graph: &mut PlatialGraph, agent_id: &NodeId) -> ChoraResult<()> {
    if graph.has_node(agent_id) {
        require_kind(graph, agent_id, NodeType::Agent)?;
        return Ok(());
    }
    graph.add_node(Node::with_id(agent_id.clone(), Agent::individual(agent_id.as_str())))?;
    Ok(())
}

/// The nearest extent covering `point`, or a new point extent there
pub(crate) fn resolve_extent(
    graph: &mut PlatialGraph,
    point: GeoPoint,
    radius_m: f64,
    source: &str,
) -> ChoraResult<NodeId> {
    if let Some(id) = nearest_covering_extent(graph, &point, radius_m) {
        return Ok(id);
    }
    let name = format!("{:.5},{:.5}", point.lat, point.lon);
    let extent = SpatialExtent::point(point.lat, point.lon, name).with_hint("source", PropertyValue::from(source));
    let id = graph.add_node(Node::new(extent))?;
    debug!(extent = %id, source, "created point extent");
    Ok(id)
}

/// Store an encounter with its PARTICIPATES_IN and OCCURS_AT edges
pub(crate) fn record_encounter(graph: &mut PlatialGraph, encounter: Encounter) -> ChoraResult<NodeId> {
    let (agent_id, extent_id) = (encounter.agent_id.clone(), encounter.extent_id.clone());
    let id = graph.add_node(Node::new(encounter))?;
    graph.add_edge(Edge::new(agent_id, id.clone(), EdgeType::ParticipatesIn))?;
    graph.add_edge(Edge::new(id.clone(), extent_id, EdgeType::OccursAt))?;
    Ok(id)
}
