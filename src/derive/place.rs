//! Place emergence: a computed, never-stored view of one agent's history with one extent
//!
//! [`extract_place`] gathers everything linking the pair (encounters,
//! familiarity, affect, meanings, practices and liminality) and labels the
//! result with a coarse character. It reads the graph and writes nothing,
//! so each call reflects the current store.

use super::familiarity::familiarity_as_of;
use crate::config::PlaceConfig;
use crate::error::ChoraResult;
use crate::graph::{EdgeType, Node, NodeId, NodeType, PlatialGraph};
use crate::model::{Affect, Encounter, Meaning, SpatialExtent};
use crate::temporal::{days_between, exponential_decay};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

/// How well the agent knows the place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FamiliarityBand {
    Novel,
    Acquainted,
    Familiar,
}

/// Overall tone of the agent's affect at the place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValenceBand {
    Negative,
    Neutral,
    Positive,
}

/// Fixed vocabulary of place characters, e.g. "familiar-positive" or "liminal"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceCharacter {
    Liminal,
    Rated(FamiliarityBand, ValenceBand),
}

impl std::fmt::Display for PlaceCharacter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceCharacter::Liminal => write!(f, "liminal"),
            PlaceCharacter::Rated(familiarity, valence) => {
                let familiarity = match familiarity {
                    FamiliarityBand::Novel => "novel",
                    FamiliarityBand::Acquainted => "acquainted",
                    FamiliarityBand::Familiar => "familiar",
                };
                let valence = match valence {
                    ValenceBand::Negative => "negative",
                    ValenceBand::Neutral => "neutral",
                    ValenceBand::Positive => "positive",
                };
                write!(f, "{}-{}", familiarity, valence)
            }
        }
    }
}

impl Serialize for PlaceCharacter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Confidence- and recency-weighted mean of the pair's affect observations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedAffect {
    pub valence: f64,
    pub arousal: f64,
    /// Sum of observation weights
    pub weight: f64,
    pub observations: usize,
}

/// Everything known about one agent at one extent
#[derive(Debug, Clone, Serialize)]
pub struct EmergentPlace {
    pub extent_id: NodeId,
    pub agent_id: NodeId,
    pub extent: SpatialExtent,
    /// The pair's encounters in start order
    pub encounters: Vec<(NodeId, Encounter)>,
    /// Stored familiarity, decayed to the query time when one is given
    pub familiarity: f64,
    pub affect: Option<AggregatedAffect>,
    pub meanings: Vec<Meaning>,
    /// Active practices of the agent involving the extent
    pub practice_ids: Vec<NodeId>,
    /// Strongest liminality covering the extent
    pub liminality: Option<f64>,
    pub character: PlaceCharacter,
}

impl EmergentPlace {
    pub fn encounter_count(&self) -> usize {
        self.encounters.len()
    }

    pub fn total_duration_hours(&self) -> f64 {
        self.encounters.iter().filter_map(|(_, e)| e.duration_hours()).sum()
    }

    pub fn first_encounter(&self) -> Option<DateTime<Utc>> {
        self.encounters.first().map(|(_, e)| e.start_time)
    }

    pub fn last_encounter(&self) -> Option<DateTime<Utc>> {
        self.encounters.iter().map(|(_, e)| e.latest_time()).max()
    }

    /// Meaning symbols, deduplicated, in first-seen order
    pub fn symbols(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.meanings
            .iter()
            .flat_map(|m| m.symbols.iter().map(String::as_str))
            .filter(|s| seen.insert(*s))
            .collect()
    }
}

fn valid_at(node: &Node, at: Option<DateTime<Utc>>) -> bool {
    at.map_or(true, |t| node.is_valid_at(t))
}

/// Affect nodes reached by EXPRESSES edges from `sources`, attributed to the agent or to nobody
fn pair_affects<'a>(
    graph: &'a PlatialGraph,
    sources: impl Iterator<Item = &'a NodeId>,
    agent_id: &NodeId,
    at: Option<DateTime<Utc>>,
) -> Vec<&'a Affect> {
    let mut seen = HashSet::new();
    let mut found = Vec::new();
    for source in sources {
        for edge in graph.outgoing(source, Some(EdgeType::Expresses)) {
            let Some(node) = graph.get_node(&edge.target) else {
                continue;
            };
            let Some(affect) = node.as_affect() else {
                continue;
            };
            let attributed = affect.agent_id.as_ref().map_or(true, |a| a == agent_id);
            let observed = at.map_or(true, |t| affect.observed_at <= t);
            if attributed && observed && valid_at(node, at) && seen.insert(&node.id) {
                found.push(affect);
            }
        }
    }
    found
}

fn aggregate_affect(affects: &[&Affect], reference: DateTime<Utc>, half_life_days: f64) -> Option<AggregatedAffect> {
    let mut weight = 0.0;
    let (mut valence, mut arousal) = (0.0, 0.0);
    for affect in affects {
        let age = days_between(affect.observed_at, reference);
        let w = exponential_decay(affect.confidence, age, half_life_days);
        weight += w;
        valence += w * affect.valence;
        arousal += w * affect.arousal;
    }
    if weight <= 0.0 {
        return None;
    }
    Some(AggregatedAffect {
        valence: valence / weight,
        arousal: arousal / weight,
        weight,
        observations: affects.len(),
    })
}

fn character(
    familiarity: f64,
    affect: Option<&AggregatedAffect>,
    liminality: Option<f64>,
    config: &PlaceConfig,
) -> PlaceCharacter {
    if liminality.is_some_and(|l| l >= config.liminal_threshold) {
        return PlaceCharacter::Liminal;
    }
    let familiarity = if familiarity >= config.familiar_threshold {
        FamiliarityBand::Familiar
    } else if familiarity < config.novel_threshold {
        FamiliarityBand::Novel
    } else {
        FamiliarityBand::Acquainted
    };
    let valence = match affect.map(|a| a.valence) {
        Some(v) if v > config.positive_valence => ValenceBand::Positive,
        Some(v) if v < config.negative_valence => ValenceBand::Negative,
        _ => ValenceBand::Neutral,
    };
    PlaceCharacter::Rated(familiarity, valence)
}

/// Synthesize the emergent place for (agent, extent).
///
/// With `at`, only history up to `at` counts: familiarity is replayed from
/// the encounters started by then and decayed to `at`. Without it, the stored familiarity is used as is and affect recency
/// is measured from the latest observation. Returns `None` if the extent
/// does not exist.
pub fn extract_place(
    graph: &PlatialGraph,
    extent_id: &NodeId,
    agent_id: &NodeId,
    at: Option<DateTime<Utc>>,
    config: &PlaceConfig,
) -> ChoraResult<Option<EmergentPlace>> {
    config.validate()?;
    let Some(extent) = graph.get_node(extent_id).and_then(Node::as_extent) else {
        return Ok(None);
    };

    let encounters: Vec<(NodeId, Encounter)> = graph
        .encounters_for(agent_id, Some(extent_id))
        .into_iter()
        .filter(|(_, e)| at.map_or(true, |t| e.start_time <= t))
        .map(|(id, e)| (id.clone(), e.clone()))
        .collect();

    let familiarity = graph.familiarity_for(agent_id, extent_id).map_or(0.0, |f| match at {
        Some(t) if t < f.last_update => {
            familiarity_as_of(graph, agent_id, extent_id, t, &config.familiarity())
        }
        Some(t) => f.value_at(t, config.half_life_days),
        None => f.value,
    });

    let affects = pair_affects(
        graph,
        encounters.iter().map(|(id, _)| id).chain(std::iter::once(extent_id)),
        agent_id,
        at,
    );
    let reference = at
        .or_else(|| affects.iter().map(|a| a.observed_at).max())
        .unwrap_or_else(Utc::now);
    let affect = aggregate_affect(&affects, reference, config.half_life_days);

    let meanings: Vec<Meaning> = graph
        .nodes(Some(NodeType::Meaning), at)
        .filter_map(Node::as_meaning)
        .filter(|m| m.applies_to(agent_id, extent_id))
        .cloned()
        .collect();

    let practice_ids: Vec<NodeId> = graph
        .nodes(Some(NodeType::Practice), at)
        .filter(|n| at.is_some() || n.validity.map_or(true, |v| v.is_active()))
        .filter(|n| {
            n.as_practice()
                .is_some_and(|p| &p.agent_id == agent_id && p.involves(extent_id))
        })
        .map(|n| n.id.clone())
        .collect();

    let liminality = graph
        .nodes(Some(NodeType::Liminality), at)
        .filter_map(Node::as_liminality)
        .filter(|l| l.covers(extent_id))
        .map(|l| l.intensity)
        .max_by(f64::total_cmp);

    let character = character(familiarity, affect.as_ref(), liminality, config);
    Ok(Some(EmergentPlace {
        extent_id: extent_id.clone(),
        agent_id: agent_id.clone(),
        extent: extent.clone(),
        encounters,
        familiarity,
        affect,
        meanings,
        practice_ids,
        liminality,
        character,
    }))
}

/// Emergent places for every extent the agent visited at least
/// `min_encounters` times, by descending familiarity.
///
/// Ties fall back to encounter count (descending), then extent id.
pub fn find_emergent_places(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    min_encounters: usize,
    at: Option<DateTime<Utc>>,
    config: &PlaceConfig,
) -> ChoraResult<Vec<EmergentPlace>> {
    config.validate()?;
    let mut counts: BTreeMap<&NodeId, usize> = BTreeMap::new();
    for (_, encounter) in graph.encounters_for(agent_id, None) {
        if at.map_or(true, |t| encounter.start_time <= t) {
            *counts.entry(&encounter.extent_id).or_default() += 1;
        }
    }

    let mut places = Vec::new();
    for (extent_id, count) in counts {
        if count < min_encounters.max(1) {
            continue;
        }
        if let Some(place) = extract_place(graph, extent_id, agent_id, at, config)? {
            places.push(place);
        }
    }
    places.sort_by(|a, b| {
        b.familiarity
            .total_cmp(&a.familiarity)
            .then_with(|| b.encounter_count().cmp(&a.encounter_count()))
            .then_with(|| a.extent_id.cmp(&b.extent_id))
    });
    Ok(places)
}
