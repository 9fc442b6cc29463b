//! Affect attachment and context-based affect inference

use super::{link_once, require_encounter, require_kind};
use crate::error::ChoraResult;
use crate::graph::{EdgeType, EpistemicLevel, Node, NodeId, NodeType, PlatialGraph, PropertyValue, Provenance};
use crate::model::{Affect, AffectSource, Context, ContextType};
use tracing::debug;

/// What an affect observation is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffectTarget {
    Encounter(NodeId),
    Extent(NodeId),
}

impl AffectTarget {
    pub fn id(&self) -> &NodeId {
        match self {
            AffectTarget::Encounter(id) | AffectTarget::Extent(id) => id,
        }
    }
}

/// Store an affect and link it from its target with an EXPRESSES edge.
///
/// Self-reported and observed affect is OBSERVED; anything else is DERIVED.
/// Affect on an encounter without an agent is attributed to the encounter's agent.
pub fn attach_affect(graph: &mut PlatialGraph, target: AffectTarget, mut affect: Affect) -> ChoraResult<NodeId> {
    match &target {
        AffectTarget::Encounter(id) => {
            let encounter = require_encounter(graph, id)?;
            if affect.agent_id.is_none() {
                affect.agent_id = Some(encounter.agent_id.clone());
            }
        }
        AffectTarget::Extent(id) => {
            require_kind(graph, id, NodeType::SpatialExtent)?;
        }
    }

    let level = match affect.source {
        AffectSource::SelfReport | AffectSource::Observed => EpistemicLevel::Observed,
        AffectSource::Derived => EpistemicLevel::Derived,
    };
    let weight = affect.confidence;
    let id = graph.add_node(Node::new(affect).with_epistemic_level(level))?;
    link_once(graph, target.id(), &id, EdgeType::Expresses, weight)?;
    Ok(id)
}

fn lowercase(context: &Context) -> String {
    context.value_str().unwrap_or_default().to_lowercase()
}

/// Valence and arousal shifts suggested by one context
fn context_shift(context: &Context) -> (f64, f64) {
    match context.context_type {
        ContextType::Purposive => {
            let purpose = lowercase(context);
            if purpose.contains("leisure") || purpose.contains("recreation") {
                (0.3, 0.0)
            } else if purpose.contains("work") || purpose.contains("commute") {
                (-0.1, 0.1)
            } else if purpose.contains("explore") {
                (0.2, 0.2)
            } else {
                (0.0, 0.0)
            }
        }
        ContextType::Social => match &context.value {
            _ if context.is_alone() => (0.0, -0.1),
            Some(PropertyValue::Array(companions)) if !companions.is_empty() => {
                (0.1 * companions.len().min(3) as f64, 0.0)
            }
            _ => (0.0, 0.0),
        },
        ContextType::Environmental => {
            let conditions = lowercase(context);
            let mut shift = if conditions.contains("sunny") {
                (0.2, 0.0)
            } else if conditions.contains("rainy") {
                (-0.1, 0.0)
            } else {
                (0.0, 0.0)
            };
            if conditions.contains("crowded") {
                shift.0 -= 0.1;
                shift.1 += 0.2;
            }
            shift
        }
        ContextType::Temporal => {
            let label = lowercase(context);
            if label.contains("morning") {
                (0.0, 0.1)
            } else if label.contains("evening") {
                (0.05, -0.1)
            } else {
                (0.0, 0.0)
            }
        }
    }
}

/// Infer a DERIVED affect for an encounter from its HAS_CONTEXT contexts.
///
/// Starts from a neutral baseline (valence 0, arousal 0.5) and applies
/// environmental-psychology heuristics per context. Returns `None` when the
/// encounter has no context. Rerunning replaces the previous inference.
pub fn derive_affect_from_context(graph: &mut PlatialGraph, encounter_id: &NodeId) -> ChoraResult<Option<NodeId>> {
    let encounter = require_encounter(graph, encounter_id)?.clone();
    let contexts: Vec<(NodeId, Context)> = graph
        .outgoing(encounter_id, Some(EdgeType::HasContext))
        .filter_map(|e| {
            graph
                .get_node(&e.target)
                .and_then(Node::as_context)
                .map(|c| (e.target.clone(), c.clone()))
        })
        .collect();
    if contexts.is_empty() {
        return Ok(None);
    }

    let (valence, arousal) = contexts
        .iter()
        .map(|(_, c)| context_shift(c))
        .fold((0.0, 0.5), |(v, a), (dv, da)| (v + dv, a + da));
    let mut affect = Affect::new(valence.clamp(-1.0, 1.0), arousal.clamp(0.0, 1.0), encounter.latest_time())?
        .for_agent(encounter.agent_id.clone())
        .with_source(AffectSource::Derived)
        .with_description("inferred from context");
    affect.uncertainty = 0.2;

    let mut sources = vec![encounter_id.clone()];
    sources.extend(contexts.iter().map(|(id, _)| id.clone()));
    let id = NodeId::derived("affect", &[encounter_id]);
    let node = Node::with_id(id, affect)
        .with_epistemic_level(EpistemicLevel::Derived)
        .with_provenance(Provenance::new("derive_affect_from_context", sources, encounter.latest_time()));

    debug!(encounter = %encounter_id, contexts = contexts.len(), valence, arousal, "affect derived from context");
    let id = graph.upsert_node(node)?;
    link_once(graph, encounter_id, &id, EdgeType::Expresses, 1.0)?;
    Ok(Some(id))
}
