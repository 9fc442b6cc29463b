//! Store contract and serialization tests

use serde_json::{json, Value};

/// Wire fixture: an encounter node as an adapter would hand it over
fn encounter_node_fixture() -> Value {
    json!({
        "id": "enc:alice-park-1",
        "epistemic_level": "observed",
        "validity": { "start": "2024-06-15T10:00:00Z", "end": "2024-06-15T11:00:00Z" },
        "payload": {
            "kind": "encounter",
            "agent_id": "agent:alice",
            "extent_id": "extent:park",
            "start_time": "2024-06-15T10:00:00Z",
            "end_time": "2024-06-15T11:00:00Z",
            "activity": "walking",
            "intensity": 0.8
        }
    })
}

#[cfg(test)]
mod serialization_tests {
    use super::*;
    use crate::graph::{Edge, EdgeType, EpistemicLevel, Node, NodeId, NodeKind, PlatialGraph, Provenance};
    use crate::model::{Agent, Familiarity, SpatialExtent};
    use chrono::{TimeZone, Utc};

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from_string("agent:alice");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"agent:alice\"");
    }

    #[test]
    fn derived_ids_are_deterministic() {
        let a = NodeId::from_string("agent:alice");
        let p = NodeId::from_string("extent:park");
        assert_eq!(NodeId::derived("familiarity", &[&a, &p]), NodeId::derived("familiarity", &[&a, &p]));
        assert_ne!(NodeId::derived("familiarity", &[&a, &p]), NodeId::derived("familiarity", &[&p, &a]));
        assert!(NodeId::derived("familiarity", &[&a, &p]).as_str().starts_with("familiarity:"));
    }

    #[test]
    fn encounter_node_deserializes_from_fixture() {
        let node: Node = serde_json::from_value(encounter_node_fixture()).unwrap();
        assert_eq!(node.id.as_str(), "enc:alice-park-1");
        assert_eq!(node.epistemic_level, EpistemicLevel::Observed);
        let enc = node.as_encounter().unwrap();
        assert_eq!(enc.activity, "walking");
        assert_eq!(enc.duration_hours(), Some(1.0));
    }

    #[test]
    fn payload_is_tagged_by_kind() {
        let node = Node::with_id(NodeId::from_string("agent:alice"), Agent::individual("Alice"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["payload"]["kind"], "agent");
        assert_eq!(value["payload"]["name"], "Alice");
        assert_eq!(value["epistemic_level"], "observed");

        let club = serde_json::to_value(Node::new(Agent::group("Book club"))).unwrap();
        assert_eq!(club["payload"]["agent_kind"], "group");
    }

    #[test]
    fn derived_node_round_trips_provenance_and_validity() {
        let at = Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).unwrap();
        let a = NodeId::from_string("agent:alice");
        let p = NodeId::from_string("extent:park");
        let mut fam = Familiarity::initial(a.clone(), p.clone(), at);
        fam.value = 0.42;
        let node = Node::with_id(Familiarity::node_id(&a, &p), fam)
            .with_provenance(Provenance::new("update_familiarity", vec![a, p], at))
            .with_validity(crate::temporal::Validity::from(at));

        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
        assert_eq!(back.epistemic_level, EpistemicLevel::Derived);
        assert!(matches!(back.payload, NodeKind::Familiarity(_)));
    }

    #[test]
    fn graph_round_trips_through_snapshot_form() {
        let mut graph = PlatialGraph::new("walks");
        let alice = graph
            .add_node(Node::new(Agent::individual("Alice")).with_property("source", "survey".into()))
            .unwrap();
        let park = graph.add_node(Node::new(SpatialExtent::point(51.5, -0.12, "park"))).unwrap();
        let edge = Edge::new(alice.clone(), park.clone(), EdgeType::SimilarTo).with_property("note", "shared walks".into());
        graph.add_edge(edge).unwrap();

        let json = serde_json::to_string(&graph).unwrap();
        let back: PlatialGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back.node_count(), 2);
        assert_eq!(back.edge_count(), 1);
        let edge = back.outgoing(&alice, None).next().unwrap();
        assert_eq!(edge.target, park);
        assert_eq!(edge.properties.get("note"), Some(&"shared walks".into()));
        assert_eq!(back.get_node(&alice).unwrap().properties, graph.get_node(&alice).unwrap().properties);
    }

    #[test]
    fn snapshot_with_dangling_edge_is_rejected() {
        let json = json!({
            "id": "g",
            "name": "broken",
            "nodes": [],
            "edges": [{
                "id": "e1",
                "source": "a",
                "target": "b",
                "edge_type": "occurs_at",
                "weight": 1.0,
                "epistemic_level": "observed",
                "created_at": "2024-06-15T10:00:00Z"
            }]
        });
        assert!(serde_json::from_value::<PlatialGraph>(json).is_err());
    }
}

#[cfg(test)]
mod store_tests {
    use crate::error::ChoraError;
    use crate::graph::{Edge, EdgeId, EdgeType, EpistemicLevel, Node, NodeId, NodeType, PlatialGraph};
    use crate::model::{Agent, Encounter, Familiarity, SpatialExtent};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    fn seeded() -> (PlatialGraph, NodeId, NodeId) {
        let mut g = PlatialGraph::new("test");
        let alice = g
            .add_node(Node::with_id(NodeId::from_string("alice"), Agent::individual("Alice")))
            .unwrap();
        let park = g
            .add_node(Node::with_id(NodeId::from_string("park"), SpatialExtent::named("park")))
            .unwrap();
        (g, alice, park)
    }

    #[test]
    fn duplicate_identity_is_rejected_without_mutation() {
        let (mut g, _, _) = seeded();
        let err = g
            .add_node(Node::with_id(NodeId::from_string("alice"), Agent::individual("Other")))
            .unwrap_err();
        assert!(matches!(err, ChoraError::DuplicateIdentity(_)));
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.get_node(&NodeId::from_string("alice")).unwrap().as_agent().unwrap().name, "Alice");
    }

    #[test]
    fn dangling_edge_is_rejected_without_mutation() {
        let (mut g, alice, _) = seeded();
        let ghost = NodeId::from_string("ghost");
        let err = g
            .add_edge(Edge::new(alice.clone(), ghost.clone(), EdgeType::ParticipatesIn))
            .unwrap_err();
        match err {
            ChoraError::DanglingReference { missing, .. } => assert_eq!(missing, ghost),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.outgoing(&alice, None).count(), 0);
    }

    #[test]
    fn duplicate_edge_id_is_rejected() {
        let (mut g, alice, park) = seeded();
        let edge = Edge::new(alice, park, EdgeType::SimilarTo);
        let again = edge.clone();
        let id = g.add_edge(edge).unwrap();
        assert!(matches!(g.add_edge(again), Err(ChoraError::DuplicateEdge(_))));
        assert_eq!(g.get_edge(&id).unwrap().edge_type, EdgeType::SimilarTo);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn edges_are_found_by_id_after_rebuilds() {
        let (mut g, alice, park) = seeded();
        let kinds = [EdgeType::SimilarTo, EdgeType::TransitionsTo, EdgeType::ParticipatesIn];
        let ids: Vec<EdgeId> = kinds
            .iter()
            .map(|&kind| g.add_edge(Edge::new(alice.clone(), park.clone(), kind)).unwrap())
            .collect();

        let copy: PlatialGraph = serde_json::from_str(&serde_json::to_string(&g).unwrap()).unwrap();
        let snapshot = g.snapshot(t(1, 0));
        for graph in [&g, &copy, &snapshot] {
            for (id, kind) in ids.iter().zip(kinds) {
                let edge = graph.get_edge(id).unwrap();
                assert_eq!((&edge.id, edge.edge_type), (id, kind));
            }
            assert!(graph.get_edge(&EdgeId::new()).is_none());
        }

        let alone: std::collections::HashSet<NodeId> = [alice].into_iter().collect();
        assert!(g.subgraph(&alone).get_edge(&ids[0]).is_none());
    }

    #[test]
    fn observations_outrank_derivations_and_interpretations() {
        assert!(EpistemicLevel::Observed.is_more_certain_than(&EpistemicLevel::Derived));
        assert!(EpistemicLevel::Derived.is_more_certain_than(&EpistemicLevel::Interpreted));
        assert!(!EpistemicLevel::Interpreted.is_more_certain_than(&EpistemicLevel::Interpreted));
    }

    #[test]
    fn familiarity_must_be_derived() {
        let (mut g, alice, park) = seeded();
        let node = Node::new(Familiarity::initial(alice, park, t(1, 0)))
            .with_epistemic_level(EpistemicLevel::Observed);
        assert!(matches!(g.add_node(node), Err(ChoraError::EpistemicViolation { .. })));
    }

    #[test]
    fn encounters_must_be_observed() {
        let (mut g, alice, park) = seeded();
        let before = (g.node_count(), g.edge_count());
        for level in [EpistemicLevel::Interpreted, EpistemicLevel::Derived] {
            let node = Node::new(Encounter::new(alice.clone(), park.clone(), t(10, 9)))
                .with_epistemic_level(level);
            let id = node.id.clone();
            let err = g.add_node(node).unwrap_err();
            assert!(matches!(
                err,
                ChoraError::EpistemicViolation { expected: EpistemicLevel::Observed, found, .. } if found == level
            ));
            assert!(!g.has_node(&id));
        }
        assert_eq!((g.node_count(), g.edge_count()), before);
        assert_eq!(g.count(NodeType::Encounter), 0);
    }

    #[test]
    fn nodes_filter_by_type_and_validity() {
        let (mut g, alice, park) = seeded();
        let enc = Encounter::new(alice.clone(), park.clone(), t(10, 9))
            .lasting(Duration::hours(2))
            .unwrap();
        g.add_node(Node::new(enc)).unwrap();

        assert_eq!(g.nodes(Some(NodeType::Encounter), None).count(), 1);
        assert_eq!(g.nodes(Some(NodeType::Encounter), Some(t(10, 10))).count(), 1);
        assert_eq!(g.nodes(Some(NodeType::Encounter), Some(t(10, 12))).count(), 0);
        // Timeless agent and extent are valid at every instant
        assert_eq!(g.nodes(None, Some(t(1, 0))).count(), 2);
        assert_eq!(g.count(NodeType::SpatialExtent), 1);
    }

    #[test]
    fn encounter_may_only_close_its_end_time() {
        let (mut g, alice, park) = seeded();
        let id = g.add_node(Node::new(Encounter::new(alice, park, t(10, 9)))).unwrap();

        let mut moved = g.get_node(&id).unwrap().clone();
        if let crate::graph::NodeKind::Encounter(e) = &mut moved.payload {
            e.intensity = 0.2;
        }
        assert!(matches!(g.replace_node(moved), Err(ChoraError::ImmutableEncounter(_))));

        g.close_encounter(&id, t(10, 10)).unwrap();
        let node = g.get_node(&id).unwrap();
        assert_eq!(node.as_encounter().unwrap().end_time, Some(t(10, 10)));
        assert_eq!(node.validity.unwrap().end, Some(t(10, 10)));
        assert!(matches!(g.close_encounter(&id, t(10, 11)), Err(ChoraError::ImmutableEncounter(_))));
    }

    #[test]
    fn replace_rejects_kind_change() {
        let (mut g, alice, _) = seeded();
        let impostor = Node::with_id(alice, SpatialExtent::named("not an agent"));
        assert!(matches!(g.replace_node(impostor), Err(ChoraError::KindMismatch { .. })));
    }

    #[test]
    fn close_validity_soft_deletes() {
        let (mut g, _, park) = seeded();
        g.close_validity(&park, t(5, 0)).unwrap();
        assert!(g.has_node(&park));
        assert!(g.get_node(&park).unwrap().is_valid_at(t(4, 0)));
        assert!(!g.get_node(&park).unwrap().is_valid_at(t(6, 0)));
        assert_eq!(g.snapshot(t(6, 0)).count(NodeType::SpatialExtent), 0);
    }

    #[test]
    fn adjacency_is_indexed_by_type() {
        let (mut g, alice, park) = seeded();
        let enc = g.add_node(Node::new(Encounter::new(alice.clone(), park.clone(), t(3, 8)))).unwrap();
        g.add_edge(Edge::new(alice.clone(), enc.clone(), EdgeType::ParticipatesIn)).unwrap();
        g.add_edge(Edge::new(enc.clone(), park.clone(), EdgeType::OccursAt)).unwrap();

        assert_eq!(g.outgoing(&enc, Some(EdgeType::OccursAt)).count(), 1);
        assert_eq!(g.outgoing(&enc, Some(EdgeType::ParticipatesIn)).count(), 0);
        assert_eq!(g.incoming(&park, Some(EdgeType::OccursAt)).next().unwrap().source, enc);
        assert_eq!(g.neighbors(&enc).len(), 2);
        assert_eq!(g.encounters_for(&alice, Some(&park)).len(), 1);
    }

    #[test]
    fn snapshot_keeps_only_edges_between_valid_nodes() {
        let (mut g, alice, park) = seeded();
        let enc = Encounter::new(alice.clone(), park.clone(), t(3, 8))
            .lasting(Duration::hours(1))
            .unwrap();
        let enc = g.add_node(Node::new(enc)).unwrap();
        g.add_edge(Edge::new(enc.clone(), park.clone(), EdgeType::OccursAt)).unwrap();
        g.add_edge(Edge::new(alice.clone(), park.clone(), EdgeType::SimilarTo)).unwrap();

        let during = g.snapshot(t(3, 8));
        assert_eq!(during.node_count(), 3);
        assert_eq!(during.edge_count(), 2);

        let after = g.snapshot(t(4, 0));
        assert_eq!(after.node_count(), 2);
        assert_eq!(after.edge_count(), 1);
    }
}
