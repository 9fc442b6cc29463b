//! Familiarity reinforcement, decay and order independence over a stored graph

mod common;

use chora::config::FamiliarityConfig;
use chora::derive::{decay_all_familiarities, familiarity_at, recompute_familiarity, update_familiarity};
use chora::graph::{EdgeType, EpistemicLevel, NodeType};
use chora::model::{Encounter, Familiarity};
use chrono::Duration;
use common::{init_tracing, june, Fixture};

fn single_visit() -> (Fixture, chora::NodeId) {
    let mut fx = Fixture::new("alice", &["library"]);
    let encounter = Encounter::new(fx.agent.clone(), "library".into(), june(3, 10, 0))
        .lasting(Duration::hours(1))
        .unwrap()
        .with_intensity(0.8)
        .unwrap();
    let id = fx.record(encounter);
    (fx, id)
}

#[test]
fn first_hour_long_visit_reaches_documented_value() {
    init_tracing();
    let (mut fx, encounter) = single_visit();
    let node = update_familiarity(&mut fx.graph, &encounter, &FamiliarityConfig::default()).unwrap();

    let state = node.as_familiarity().unwrap();
    assert!(state.value > 0.0 && state.value <= 0.3);
    // 0.25 * 0.8 * tanh(1)
    assert!((state.value - 0.1523).abs() < 1e-3, "got {}", state.value);
    assert_eq!(state.encounter_count, 1);
    assert_eq!(node.epistemic_level, EpistemicLevel::Derived);
    assert_eq!(node.id, Familiarity::node_id(&fx.agent, &"library".into()));

    let reinforces: Vec<_> = fx.graph.outgoing(&encounter, Some(EdgeType::Reinforces)).collect();
    assert_eq!(reinforces.len(), 1);
    assert_eq!(reinforces[0].target, node.id);
}

#[test]
fn two_quiet_weeks_halve_familiarity() {
    init_tracing();
    let config = FamiliarityConfig::default();
    let (mut fx, encounter) = single_visit();
    let prior = update_familiarity(&mut fx.graph, &encounter, &config)
        .unwrap()
        .as_familiarity()
        .unwrap()
        .clone();

    let later = prior.last_update + Duration::days(14);
    let read = familiarity_at(&fx.graph, &fx.agent, &"library".into(), later, &config);
    assert!((read - prior.value / 2.0).abs() < 1e-9);
    assert!((0.075..=0.08).contains(&read), "got {}", read);

    let decayed = decay_all_familiarities(&mut fx.graph, later, &config).unwrap();
    assert_eq!(decayed.len(), 1);
    let stored = fx.graph.familiarity_for(&fx.agent, &"library".into()).unwrap();
    assert!((stored.value - read).abs() < 1e-12);
    assert_eq!(stored.last_update, later);
}

#[test]
fn repeated_decay_at_one_instant_is_stable() {
    let config = FamiliarityConfig::default();
    let (mut fx, encounter) = single_visit();
    update_familiarity(&mut fx.graph, &encounter, &config).unwrap();

    let at = june(20, 0, 0);
    decay_all_familiarities(&mut fx.graph, at, &config).unwrap();
    let once = fx.graph.familiarity_for(&fx.agent, &"library".into()).unwrap().value;
    decay_all_familiarities(&mut fx.graph, at, &config).unwrap();
    let twice = fx.graph.familiarity_for(&fx.agent, &"library".into()).unwrap().value;
    assert_eq!(once, twice);
}

#[test]
fn reapplying_an_encounter_changes_nothing() {
    let config = FamiliarityConfig::default();
    let (mut fx, encounter) = single_visit();
    let first = update_familiarity(&mut fx.graph, &encounter, &config).unwrap();
    let again = update_familiarity(&mut fx.graph, &encounter, &config).unwrap();

    let (a, b) = (first.as_familiarity().unwrap(), again.as_familiarity().unwrap());
    assert!((a.value - b.value).abs() < 1e-12);
    assert_eq!(a.encounter_count, b.encounter_count);
    assert_eq!(fx.graph.count(NodeType::Familiarity), 1);
    assert_eq!(fx.graph.edges(Some(EdgeType::Reinforces)).count(), 1);
}

#[test]
fn arrival_order_does_not_matter() {
    let config = FamiliarityConfig::default();
    let starts = [june(3, 9, 0), june(5, 9, 0), june(10, 9, 0)];

    let mut in_order = Fixture::new("alice", &["gym"]);
    let ids: Vec<_> = starts.iter().map(|s| in_order.visit("gym", *s, 45, "workout")).collect();
    for id in &ids {
        update_familiarity(&mut in_order.graph, id, &config).unwrap();
    }

    let mut shuffled = Fixture::new("alice", &["gym"]);
    let ids: Vec<_> = starts.iter().map(|s| shuffled.visit("gym", *s, 45, "workout")).collect();
    for id in [&ids[2], &ids[0], &ids[1]] {
        update_familiarity(&mut shuffled.graph, id, &config).unwrap();
    }

    let a = in_order.graph.familiarity_for(&in_order.agent, &"gym".into()).unwrap();
    let b = shuffled.graph.familiarity_for(&shuffled.agent, &"gym".into()).unwrap();
    assert!((a.value - b.value).abs() < 1e-12);
    assert_eq!(a.encounter_count, 3);
    assert_eq!(b.encounter_count, 3);
}

#[test]
fn recompute_without_history_writes_nothing() {
    let mut fx = Fixture::new("alice", &["gym"]);
    let result = recompute_familiarity(&mut fx.graph, &fx.agent.clone(), &"gym".into(), &FamiliarityConfig::default());
    assert!(result.unwrap().is_none());
    assert_eq!(fx.graph.count(NodeType::Familiarity), 0);
}

#[test]
fn negative_half_life_is_rejected() {
    let (mut fx, encounter) = single_visit();
    let config = FamiliarityConfig {
        half_life_days: -1.0,
        ..FamiliarityConfig::default()
    };
    let err = update_familiarity(&mut fx.graph, &encounter, &config).unwrap_err();
    assert!(matches!(err, chora::ChoraError::InvalidConfiguration(_)));
}
