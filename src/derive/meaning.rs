//! Meaning attachment and practice-based meaning derivation

use super::{link_once, require_kind};
use crate::error::ChoraResult;
use crate::graph::{EdgeType, EpistemicLevel, Node, NodeId, NodeType, PlatialGraph, Provenance};
use crate::model::{Meaning, Practice};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Encounter total above which a place counts as personally significant
const SIGNIFICANT_ENCOUNTERS: u32 = 20;

/// Store an INTERPRETED meaning, linked from its agent with INTERPRETS_AS.
///
/// The referenced agent and extent must exist.
pub fn attach_meaning(graph: &mut PlatialGraph, meaning: Meaning) -> ChoraResult<NodeId> {
    if let Some(extent_id) = &meaning.extent_id {
        require_kind(graph, extent_id, NodeType::SpatialExtent)?;
    }
    if let Some(agent_id) = &meaning.agent_id {
        require_kind(graph, agent_id, NodeType::Agent)?;
    }

    let agent_id = meaning.agent_id.clone();
    let id = graph.add_node(Node::new(meaning).with_epistemic_level(EpistemicLevel::Interpreted))?;
    if let Some(agent_id) = agent_id {
        link_once(graph, &agent_id, &id, EdgeType::InterpretsAs, 1.0)?;
    }
    Ok(id)
}

/// Derive meanings for an (agent, extent) pair from the agent's active practices there.
///
/// The dominant routine yields a DERIVED functional meaning; more than 20
/// practice occurrences yield an INTERPRETED personal meaning. Meanings are
/// keyed by pair and type, so rerunning replaces them.
pub fn derive_meaning_from_practices(
    graph: &mut PlatialGraph,
    agent_id: &NodeId,
    extent_id: &NodeId,
) -> ChoraResult<Vec<NodeId>> {
    require_kind(graph, extent_id, NodeType::SpatialExtent)?;
    require_kind(graph, agent_id, NodeType::Agent)?;

    let practices: Vec<(NodeId, Practice, DateTime<Utc>)> = graph
        .nodes(Some(NodeType::Practice), None)
        .filter(|n| n.validity.map_or(true, |v| v.is_active()))
        .filter_map(|n| {
            let practice = n.as_practice()?;
            let at = n.provenance.as_ref().map(|p| p.at).or(n.validity.map(|v| v.start))?;
            Some((n.id.clone(), practice.clone(), at))
        })
        .filter(|(_, p, _)| &p.agent_id == agent_id && p.involves(extent_id))
        .collect();
    let Some(at) = practices.iter().map(|(_, _, at)| *at).max() else {
        return Ok(Vec::new());
    };

    let mut derived = Vec::new();
    let dominant = practices
        .iter()
        .filter(|(_, p, _)| p.is_routine())
        .max_by(|a, b| {
            a.1.occurrence_count
                .cmp(&b.1.occurrence_count)
                .then_with(|| a.1.regularity.total_cmp(&b.1.regularity))
                .then_with(|| b.0.cmp(&a.0))
        });
    if let Some((practice_id, practice, _)) = dominant {
        let meaning = Meaning::functional(extent_id.clone(), format!("Regular place for {}", practice.name))
            .for_agent(agent_id.clone())
            .with_symbols(["routine".to_string(), "regular".to_string(), practice.practice_type.to_string()])
            .with_strength(practice.regularity.min(1.0))?;
        let tag = NodeId::from_string("functional");
        let node = Node::with_id(NodeId::derived("meaning", &[agent_id, extent_id, &tag]), meaning)
            .with_epistemic_level(EpistemicLevel::Derived)
            .with_provenance(Provenance::new(
                "derive_meaning_from_practices",
                vec![practice_id.clone()],
                at,
            ));
        let id = graph.upsert_node(node)?;
        link_once(graph, agent_id, &id, EdgeType::InterpretsAs, 1.0)?;
        link_once(graph, &id, practice_id, EdgeType::DerivesFrom, 1.0)?;
        derived.push(id);
    }

    let total: u32 = practices.iter().map(|(_, p, _)| p.occurrence_count).sum();
    if total > SIGNIFICANT_ENCOUNTERS {
        let meaning = Meaning::personal(agent_id.clone(), extent_id.clone(), "A significant personal place")
            .with_symbols(["familiar", "personal", "significant"])
            .with_strength((f64::from(total) / 50.0).min(1.0))?;
        let tag = NodeId::from_string("personal");
        let sources = practices.iter().map(|(id, _, _)| id.clone()).collect();
        let node = Node::with_id(NodeId::derived("meaning", &[agent_id, extent_id, &tag]), meaning)
            .with_epistemic_level(EpistemicLevel::Interpreted)
            .with_provenance(Provenance::new("derive_meaning_from_practices", sources, at));
        let id = graph.upsert_node(node)?;
        link_once(graph, agent_id, &id, EdgeType::InterpretsAs, 1.0)?;
        derived.push(id);
    }

    debug!(agent = %agent_id, extent = %extent_id, meanings = derived.len(), "meanings derived from practices");
    Ok(derived)
}
