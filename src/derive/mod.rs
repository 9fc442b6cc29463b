//! Derivation operators
//!
//! Each operator reads observed nodes from a [`PlatialGraph`] and writes
//! DERIVED (or INTERPRETED) nodes back, stamped with [`Provenance`] and keyed
//! by deterministic ids so that rerunning an operator replaces rather than
//! duplicates its output.
//!
//! [`Provenance`]: crate::graph::Provenance

pub mod affect;
pub mod encounters;
pub mod familiarity;
pub mod liminality;
pub mod meaning;
pub mod place;
pub mod practices;

pub use affect::{attach_affect, derive_affect_from_context, AffectTarget};
pub use encounters::{extract_encounters_from_trace, merge_nearby_encounters, TracePoint};
pub use familiarity::{
    decay_all_familiarities, familiarity_as_of, familiarity_at, familiarity_trajectory,
    recompute_familiarity, update_familiarity,
};
pub use liminality::infer_liminality;
pub use meaning::{attach_meaning, derive_meaning_from_practices};
pub use place::{extract_place, find_emergent_places, AggregatedAffect, EmergentPlace, PlaceCharacter};
pub use practices::{derive_practices, detect_practices, detect_sequences, record_practices};

use crate::error::{ChoraError, ChoraResult};
use crate::graph::{Edge, EdgeType, Node, NodeId, NodeType, PlatialGraph};
use crate::model::Encounter;

/// Look up an encounter payload, failing if the id is missing or not an encounter
pub(crate) fn require_encounter<'a>(graph: &'a PlatialGraph, id: &NodeId) -> ChoraResult<&'a Encounter> {
    let node = graph.get_node(id).ok_or_else(|| ChoraError::NodeNotFound(id.clone()))?;
    node.as_encounter().ok_or_else(|| ChoraError::KindMismatch {
        id: id.clone(),
        expected: NodeType::Encounter,
        found: node.node_type(),
    })
}

/// Fail unless `id` exists and has type `expected`
pub(crate) fn require_kind<'a>(graph: &'a PlatialGraph, id: &NodeId, expected: NodeType) -> ChoraResult<&'a Node> {
    let node = graph.get_node(id).ok_or_else(|| ChoraError::NodeNotFound(id.clone()))?;
    if node.node_type() != expected {
        return Err(ChoraError::KindMismatch {
            id: id.clone(),
            expected,
            found: node.node_type(),
        });
    }
    Ok(node)
}

/// Add a derived edge unless one of the same type already joins the pair.
///
/// Returns whether an edge was added.
pub(crate) fn link_once(
    graph: &mut PlatialGraph,
    source: &NodeId,
    target: &NodeId,
    edge_type: EdgeType,
    weight: f64,
) -> ChoraResult<bool> {
    if graph.outgoing(source, Some(edge_type)).any(|e| &e.target == target) {
        return Ok(false);
    }
    graph.add_edge(Edge::derived(source.clone(), target.clone(), edge_type).with_weight(weight))?;
    Ok(true)
}
