//! Familiarity dynamics: exponential decay plus saturating reinforcement
//!
//! One DERIVED [`Familiarity`] node exists per (agent, extent) pair, under
//! [`Familiarity::node_id`]. Each encounter decays the prior value across
//! the time since `last_update` and then closes part of the remaining gap
//! to 1:
//!
//! ```text
//! decayed = prior * 2^(-Δdays / half_life_days)
//! gain    = intensity * tanh(duration_hours / duration_scale_hours)
//! value   = decayed + (1 - decayed) * reinforcement_rate * gain
//! ```

use super::{link_once, require_encounter};
use crate::config::FamiliarityConfig;
use crate::error::{ChoraError, ChoraResult};
use crate::graph::{EdgeType, Node, NodeId, NodeKind, NodeType, PlatialGraph, Provenance};
use crate::model::{Encounter, Familiarity};
use crate::temporal::{saturating_reinforcement, Validity};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Reinforcement strength of one encounter, in [0, 1]
fn encounter_gain(encounter: &Encounter, config: &FamiliarityConfig) -> (f64, f64) {
    let hours = encounter
        .duration_hours()
        .unwrap_or(config.default_duration_hours)
        .max(0.0);
    let gain = encounter.intensity * (hours / config.duration_scale_hours).tanh();
    (gain, hours)
}

/// Fold one encounter into a familiarity state. Returns the gain applied.
fn reinforce(state: &mut Familiarity, encounter: &Encounter, config: &FamiliarityConfig) -> f64 {
    let decayed = state.value_at(encounter.start_time, config.half_life_days);
    let (gain, hours) = encounter_gain(encounter, config);

    state.value = saturating_reinforcement(decayed, config.reinforcement_rate * gain, 1.0);
    state.encounter_count += 1;
    state.total_duration_hours += hours;
    state.first_encounter = Some(
        state
            .first_encounter
            .map_or(encounter.start_time, |first| first.min(encounter.start_time)),
    );
    state.last_update = state.last_update.max(encounter.latest_time());
    gain
}

fn familiarity_node(state: Familiarity, provenance: Provenance) -> Node {
    let id = Familiarity::node_id(&state.agent_id, &state.extent_id);
    let since = state.first_encounter.unwrap_or(state.last_update);
    Node::with_id(id, state)
        .with_validity(Validity::from(since))
        .with_provenance(provenance)
}

/// Apply one stored encounter to its pair's familiarity and return the new node.
///
/// A missing prior is the zero state. If the encounter predates the stored
/// `last_update`, or was already applied, the pair is recomputed from its
/// full history instead so the result never depends on arrival order.
pub fn update_familiarity(
    graph: &mut PlatialGraph,
    encounter_id: &NodeId,
    config: &FamiliarityConfig,
) -> ChoraResult<Node> {
    config.validate()?;
    let encounter = require_encounter(graph, encounter_id)?.clone();
    let fam_id = Familiarity::node_id(&encounter.agent_id, &encounter.extent_id);

    let already_applied = graph
        .outgoing(encounter_id, Some(EdgeType::Reinforces))
        .any(|e| e.target == fam_id);
    let prior = graph.familiarity_for(&encounter.agent_id, &encounter.extent_id).cloned();

    let out_of_order = prior
        .as_ref()
        .is_some_and(|p| encounter.start_time < p.last_update);
    if already_applied || out_of_order {
        debug!(encounter = %encounter_id, "familiarity update out of order, recomputing");
        return recompute_familiarity(graph, &encounter.agent_id, &encounter.extent_id, config)
            .and_then(|node| node.ok_or(ChoraError::NodeNotFound(fam_id)));
    }

    let mut state = prior.unwrap_or_else(|| {
        Familiarity::initial(
            encounter.agent_id.clone(),
            encounter.extent_id.clone(),
            encounter.start_time,
        )
    });
    let gain = reinforce(&mut state, &encounter, config);
    debug!(
        agent = %encounter.agent_id,
        extent = %encounter.extent_id,
        value = state.value,
        count = state.encounter_count,
        "familiarity reinforced"
    );

    let provenance = Provenance::new(
        "update_familiarity",
        vec![encounter_id.clone()],
        state.last_update,
    );
    let node = familiarity_node(state, provenance);
    graph.upsert_node(node.clone())?;
    link_once(graph, encounter_id, &fam_id, EdgeType::Reinforces, gain)?;
    Ok(node)
}

/// Rebuild a pair's familiarity from the zero state over all its encounters.
///
/// Returns `None` (and writes nothing) when the pair has no encounters.
pub fn recompute_familiarity(
    graph: &mut PlatialGraph,
    agent_id: &NodeId,
    extent_id: &NodeId,
    config: &FamiliarityConfig,
) -> ChoraResult<Option<Node>> {
    config.validate()?;
    let history: Vec<(NodeId, Encounter)> = graph
        .encounters_for(agent_id, Some(extent_id))
        .into_iter()
        .map(|(id, e)| (id.clone(), e.clone()))
        .collect();
    let Some((_, first)) = history.first() else {
        return Ok(None);
    };

    let mut state = Familiarity::initial(agent_id.clone(), extent_id.clone(), first.start_time);
    let mut gains = Vec::with_capacity(history.len());
    for (_, encounter) in &history {
        gains.push(reinforce(&mut state, encounter, config));
    }

    let sources: Vec<NodeId> = history.iter().map(|(id, _)| id.clone()).collect();
    let provenance = Provenance::new("recompute_familiarity", sources, state.last_update);
    let node = familiarity_node(state, provenance);
    let fam_id = node.id.clone();
    graph.upsert_node(node.clone())?;
    for ((encounter_id, _), gain) in history.iter().zip(gains) {
        link_once(graph, encounter_id, &fam_id, EdgeType::Reinforces, gain)?;
    }

    info!(agent = %agent_id, extent = %extent_id, encounters = history.len(), "familiarity recomputed");
    Ok(Some(node))
}

/// Decay every stored familiarity to `at` without reinforcement.
///
/// States already at or past `at` are left untouched, so repeating the
/// call at the same instant changes nothing. Returns every familiarity
/// node after the pass.
pub fn decay_all_familiarities(
    graph: &mut PlatialGraph,
    at: DateTime<Utc>,
    config: &FamiliarityConfig,
) -> ChoraResult<Vec<Node>> {
    config.validate()?;
    let ids: Vec<NodeId> = graph
        .nodes(Some(NodeType::Familiarity), None)
        .map(|n| n.id.clone())
        .collect();

    let mut decayed = 0usize;
    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        let Some(node) = graph.get_node(&id) else {
            continue;
        };
        let mut node = node.clone();
        if let NodeKind::Familiarity(state) = &mut node.payload {
            if at > state.last_update {
                state.value = state.value_at(at, config.half_life_days);
                state.last_update = at;
                node.provenance = Some(Provenance::new("decay_all_familiarities", Vec::new(), at));
                graph.replace_node(node.clone())?;
                decayed += 1;
            }
        }
        result.push(node);
    }

    info!(decayed, total = result.len(), at = %at, "familiarity decay pass");
    Ok(result)
}

/// Familiarity of a pair as of `at`, decayed but not written back.
///
/// An absent pair reads as zero.
pub fn familiarity_at(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    extent_id: &NodeId,
    at: DateTime<Utc>,
    config: &FamiliarityConfig,
) -> f64 {
    graph
        .familiarity_for(agent_id, extent_id)
        .map_or(0.0, |f| f.value_at(at, config.half_life_days))
}

/// Familiarity of a pair as it stood at `at`, replayed from the encounters
/// that had started by then and decayed to `at`. Nothing is written back.
///
/// An encounter still running at `at` counts in full.
pub fn familiarity_as_of(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    extent_id: &NodeId,
    at: DateTime<Utc>,
    config: &FamiliarityConfig,
) -> f64 {
    let history = graph.encounters_for(agent_id, Some(extent_id));
    let mut past = history.iter().filter(|(_, e)| e.start_time <= at).peekable();
    let Some(start) = past.peek().map(|(_, e)| e.start_time) else {
        return 0.0;
    };

    let mut state = Familiarity::initial(agent_id.clone(), extent_id.clone(), start);
    for (_, encounter) in past {
        reinforce(&mut state, encounter, config);
    }
    state.value_at(at, config.half_life_days)
}

/// How familiarity evolved across a pair's encounters: one
/// `(latest_time, value)` point per encounter, in start order.
pub fn familiarity_trajectory(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    extent_id: &NodeId,
    config: &FamiliarityConfig,
) -> Vec<(DateTime<Utc>, f64)> {
    let history = graph.encounters_for(agent_id, Some(extent_id));
    let Some((_, first)) = history.first() else {
        return Vec::new();
    };

    let mut state = Familiarity::initial(agent_id.clone(), extent_id.clone(), first.start_time);
    history
        .iter()
        .map(|(_, encounter)| {
            reinforce(&mut state, encounter, config);
            (encounter.latest_time(), state.value)
        })
        .collect()
}
