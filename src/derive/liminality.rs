//! Liminality inference from short transit stops
//!
//! A stop shorter than `max_transit_minutes`, sitting between visits to two
//! extents of different kinds, is a crossing through its extent. Extents
//! crossed at least `min_transitions` times become liminal zones.

use super::link_once;
use crate::config::LiminalityConfig;
use crate::error::ChoraResult;
use crate::graph::{EdgeType, Node, NodeId, NodeType, PlatialGraph, Provenance};
use crate::model::{Encounter, Liminality};
use crate::temporal::Validity;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

struct Crossing {
    encounter_id: NodeId,
    from: String,
    to: String,
    at: DateTime<Utc>,
}

fn kind_label(graph: &PlatialGraph, extent_id: &NodeId) -> String {
    graph
        .get_node(extent_id)
        .and_then(Node::as_extent)
        .map_or_else(|| "unknown".to_string(), |e| e.kind_label().to_string())
}

/// Most common label, ties broken alphabetically
fn most_common<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(label, _)| label.to_string())
        .unwrap_or_default()
}

fn crossings(graph: &PlatialGraph, config: &LiminalityConfig) -> BTreeMap<NodeId, Vec<Crossing>> {
    let agents: BTreeSet<NodeId> = graph
        .nodes(Some(NodeType::Encounter), None)
        .filter_map(Node::as_encounter)
        .map(|e| e.agent_id.clone())
        .collect();

    let mut by_extent: BTreeMap<NodeId, Vec<Crossing>> = BTreeMap::new();
    for agent_id in &agents {
        let history: Vec<(&NodeId, &Encounter)> = graph.encounters_for(agent_id, None);
        for window in history.windows(3) {
            let (prev, (id, stop), next) = (window[0].1, window[1], window[2].1);
            let is_transit = stop
                .duration_hours()
                .is_some_and(|h| h * 60.0 < config.max_transit_minutes);
            if !is_transit || stop.extent_id == prev.extent_id || stop.extent_id == next.extent_id {
                continue;
            }
            let (from, to) = (kind_label(graph, &prev.extent_id), kind_label(graph, &next.extent_id));
            if from == to {
                continue;
            }
            by_extent.entry(stop.extent_id.clone()).or_default().push(Crossing {
                encounter_id: id.clone(),
                from,
                to,
                at: stop.latest_time(),
            });
        }
    }
    by_extent
}

/// Infer DERIVED liminal zones across all agents' encounters.
///
/// Intensity is `min(1, crossings / (2 * min_transitions))`; the zone's
/// from/to labels are the most common extent kinds on either side. Each
/// zone is keyed by its extent and linked to it with a CROSSES edge.
pub fn infer_liminality(graph: &mut PlatialGraph, config: &LiminalityConfig) -> ChoraResult<Vec<NodeId>> {
    config.validate()?;
    let found = crossings(graph, config);

    let mut zones = Vec::new();
    for (extent_id, crossings) in found {
        if crossings.len() < config.min_transitions as usize {
            continue;
        }
        let intensity = (crossings.len() as f64 / (2.0 * f64::from(config.min_transitions))).min(1.0);
        let from = most_common(crossings.iter().map(|c| c.from.as_str()));
        let to = most_common(crossings.iter().map(|c| c.to.as_str()));
        let (Some(first), Some(last)) = (
            crossings.iter().map(|c| c.at).min(),
            crossings.iter().map(|c| c.at).max(),
        ) else {
            continue;
        };

        let mut zone = Liminality::spatial_boundary(from, to, vec![extent_id.clone()], intensity)?;
        zone.description = format!("{} crossings", crossings.len());
        let sources = crossings.into_iter().map(|c| c.encounter_id).collect();
        let node = Node::with_id(NodeId::derived("liminality", &[&extent_id]), zone)
            .with_validity(Validity::from(first))
            .with_provenance(Provenance::new("infer_liminality", sources, last));

        let id = graph.upsert_node(node)?;
        link_once(graph, &id, &extent_id, EdgeType::Crosses, intensity)?;
        zones.push(id);
    }

    info!(zones = zones.len(), "liminality inference");
    Ok(zones)
}
