//! Streaming dwell detection end to end: transitions, encounter writes and ordering

mod common;

use chora::config::DwellConfig;
use chora::graph::{EdgeType, NodeType, PlatialEngine, PlatialGraph};
use chora::{ChoraError, DwellDetector, DwellState, LocationSample, StreamEvent};
use chrono::{DateTime, Duration, Utc};
use common::{init_tracing, june};

const LAT: f64 = 51.5194;
const LON: f64 = -0.1270;

fn t(seconds: i64) -> DateTime<Utc> {
    june(3, 9, 0) + Duration::seconds(seconds)
}

/// A fix a few metres from the reference point; `k` picks the jitter
fn near(agent: &str, seconds: i64, k: i64) -> LocationSample {
    let jitter = (k % 3 - 1) as f64 * 0.00005;
    LocationSample::new(agent, LAT + jitter, LON - jitter, t(seconds))
}

fn far(agent: &str, seconds: i64) -> LocationSample {
    LocationSample::new(agent, LAT + 0.01, LON, t(seconds))
}

fn config() -> DwellConfig {
    DwellConfig {
        dwell_radius_m: 25.0,
        dwell_time_s: 60.0,
        min_dwell_for_encounter_s: 120.0,
        ..DwellConfig::default()
    }
}

fn encounters(events: &[StreamEvent]) -> usize {
    events.iter().filter(|e| e.is_encounter()).count()
}

#[test]
fn short_dwell_changes_state_without_an_encounter() {
    init_tracing();
    let mut graph = PlatialGraph::new("stream");
    let mut detector = DwellDetector::new(config()).unwrap();

    let mut events = Vec::new();
    for (k, s) in [0, 20, 40, 60, 70].into_iter().enumerate() {
        events.extend(detector.process(&mut graph, near("alice", s, k as i64)).unwrap());
    }

    assert_eq!(detector.state(&"alice".into()), DwellState::Dwelling);
    assert_eq!(
        events,
        vec![StreamEvent::StateChanged {
            agent_id: "alice".into(),
            from: DwellState::Moving,
            to: DwellState::Dwelling,
            at: t(60),
        }]
    );
    assert_eq!(graph.count(NodeType::Encounter), 0);
}

#[test]
fn crossing_min_dwell_fires_exactly_one_encounter() {
    init_tracing();
    let mut graph = PlatialGraph::new("stream");
    let mut detector = DwellDetector::new(config()).unwrap();

    let mut fired = Vec::new();
    for (k, s) in [0, 20, 40, 60, 70, 90, 110, 130, 150, 170].into_iter().enumerate() {
        let events = detector.process(&mut graph, near("alice", s, k as i64)).unwrap();
        if encounters(&events) > 0 {
            fired.push(s);
        }
    }
    assert_eq!(fired, vec![130]);
    assert_eq!(graph.count(NodeType::Encounter), 1);

    let (id, encounter) = graph.encounters_for(&"alice".into(), None)[0];
    assert_eq!(encounter.start_time, t(0));
    assert!(encounter.is_ongoing());
    assert_eq!(graph.outgoing(id, Some(EdgeType::OccursAt)).count(), 1);
    assert_eq!(graph.incoming(id, Some(EdgeType::ParticipatesIn)).count(), 1);

    let centroid = detector.dwell_centroid(&"alice".into()).unwrap();
    let extent = graph.get_node(&encounter.extent_id).unwrap().as_extent().unwrap();
    assert!(extent.covers(&centroid, 50.0));
}

#[test]
fn leaving_closes_the_encounter_at_the_last_fix_inside() {
    let mut graph = PlatialGraph::new("stream");
    let mut detector = DwellDetector::new(config()).unwrap();
    for (k, s) in (0..=200).step_by(20).enumerate() {
        detector.process(&mut graph, near("alice", s, k as i64)).unwrap();
    }

    let events = detector.process(&mut graph, far("alice", 260)).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, StreamEvent::EncounterClosed { end, .. } if *end == t(200))));
    assert!(events.iter().any(|e| matches!(
        e,
        StreamEvent::StateChanged {
            to: DwellState::Moving,
            ..
        }
    )));
    assert_eq!(detector.state(&"alice".into()), DwellState::Moving);

    let (_, encounter) = graph.encounters_for(&"alice".into(), None)[0];
    assert_eq!(encounter.end_time, Some(t(200)));
}

#[test]
fn returning_to_the_same_spot_reuses_its_extent() {
    let mut graph = PlatialGraph::new("stream");
    let mut detector = DwellDetector::new(config()).unwrap();
    let mut k = 0;
    for offset in [0, 3600] {
        for s in (0..=180).step_by(30) {
            detector.process(&mut graph, near("alice", offset + s, k)).unwrap();
            k += 1;
        }
        detector.process(&mut graph, far("alice", offset + 600)).unwrap();
    }

    assert_eq!(graph.count(NodeType::Encounter), 2);
    assert_eq!(graph.count(NodeType::SpatialExtent), 1);
}

#[test]
fn agents_are_tracked_independently() {
    let mut graph = PlatialGraph::new("stream");
    let mut detector = DwellDetector::new(config()).unwrap();

    for (k, s) in (0..=150).step_by(30).enumerate() {
        detector.process(&mut graph, near("alice", s, k as i64)).unwrap();
        let _ = detector.process(&mut graph, far("bob", 1000 - s));
    }
    // Bob's samples run backwards in time, so only his first was accepted
    assert_eq!(detector.tracked_agents(), 2);
    assert_eq!(detector.state(&"alice".into()), DwellState::Dwelling);
    assert_eq!(detector.state(&"bob".into()), DwellState::Moving);
    assert_eq!(graph.count(NodeType::Encounter), 1);
}

#[test]
fn out_of_order_sample_is_an_error_and_changes_nothing() {
    let mut graph = PlatialGraph::new("stream");
    let mut detector = DwellDetector::new(config()).unwrap();
    for (k, s) in [0, 30, 60].into_iter().enumerate() {
        detector.process(&mut graph, near("alice", s, k as i64)).unwrap();
    }
    let before = detector.dwell_centroid(&"alice".into());

    let err = detector.process(&mut graph, far("alice", 10)).unwrap_err();
    assert!(matches!(err, ChoraError::OutOfOrderSample { .. }));
    assert_eq!(detector.state(&"alice".into()), DwellState::Dwelling);
    assert_eq!(detector.dwell_centroid(&"alice".into()), before);

    // Equal timestamps are accepted
    assert!(detector.process(&mut graph, near("alice", 60, 0)).is_ok());
}

#[test]
fn detector_feeds_a_graph_held_by_the_engine() {
    let engine = PlatialEngine::new();
    let graph_id = engine.upsert_graph(PlatialGraph::new("live"));
    let mut detector = DwellDetector::new(config()).unwrap();

    let mut fired = 0;
    for (k, s) in (0..=180).step_by(30).enumerate() {
        let events = detector.process_in(&engine, &graph_id, near("alice", s, k as i64)).unwrap();
        fired += encounters(&events);
    }
    assert_eq!(fired, 1);
    let stored = engine.with_graph(&graph_id, |g| g.count(NodeType::Encounter)).unwrap();
    assert_eq!(stored, 1);

    let missing = detector.process_in(&engine, &"graph:none".into(), near("alice", 200, 0));
    assert!(matches!(missing, Err(ChoraError::GraphNotFound(_))));
}

#[test]
fn events_serialize_with_a_tag() {
    let event = StreamEvent::StateChanged {
        agent_id: "alice".into(),
        from: DwellState::Moving,
        to: DwellState::Dwelling,
        at: t(60),
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["event"], "state_changed");
    assert_eq!(json["to"], "dwelling");
}
