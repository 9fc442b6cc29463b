//! Emergent places, liminality, structural queries and persistence over one commute history

mod common;

use chora::config::{
    ChoraConfig, FamiliarityConfig, LiminalityConfig, PlaceConfig, PracticeConfig, SequenceConfig, SimilarityWeights,
};
use chora::derive::{
    attach_affect, derive_practices, find_emergent_places, infer_liminality, update_familiarity, AffectTarget,
};
use chora::graph::{EdgeType, NodeType, PlatialEngine, PlatialGraph, PropertyValue};
use chora::model::{Affect, SpatialExtent};
use chora::query::{
    find_path, find_positive_places, find_routine_places, place_similarity, snapshot_query, temporal_range_of,
    temporal_range_query, traverse_from,
};
use chora::{GraphAdapter, MemoryAdapter, Node, NodeId, PathQuery, PlaceCharacter, PlaceQuery, TraverseQuery};
use common::{init_tracing, june, Fixture};

/// Five weekdays of home, a three-minute stop at the station, then the office.
/// Home feels good, the office does not.
fn commute() -> Fixture {
    commute_until(7)
}

/// The commute history cut off after June `last_day`
fn commute_until(last_day: u32) -> Fixture {
    let mut fx = Fixture::new("alice", &[]);
    for (name, kind) in [("home", "residential"), ("station", "transit"), ("office", "workplace")] {
        let extent = SpatialExtent::named(name).with_hint("type", PropertyValue::from(kind));
        fx.graph.add_node(Node::with_id(name.into(), extent)).unwrap();
    }

    let config = FamiliarityConfig::default();
    for day in 3..=last_day {
        let visits = [
            ("home", june(day, 7, 0), 60, "breakfast", Some(0.6)),
            ("station", june(day, 8, 5), 3, "transit", None),
            ("office", june(day, 8, 15), 480, "work", Some(-0.5)),
        ];
        for (extent, start, minutes, activity, valence) in visits {
            let id = fx.visit(extent, start, minutes, activity);
            update_familiarity(&mut fx.graph, &id, &config).unwrap();
            if let Some(valence) = valence {
                let affect = Affect::new(valence, 0.2, start).unwrap();
                attach_affect(&mut fx.graph, AffectTarget::Encounter(id), affect).unwrap();
            }
        }
    }
    infer_liminality(&mut fx.graph, &LiminalityConfig::default()).unwrap();
    fx
}

fn ids(places: &[chora::EmergentPlace]) -> Vec<&str> {
    places.iter().map(|p| p.extent_id.as_str()).collect()
}

#[test]
fn places_rank_by_familiarity_and_carry_a_character() {
    init_tracing();
    let fx = commute();
    let places = find_emergent_places(&fx.graph, &fx.agent, 3, None, &PlaceConfig::default()).unwrap();
    assert_eq!(ids(&places), vec!["office", "home", "station"]);

    let by_id = |id: &str| places.iter().find(|p| p.extent_id.as_str() == id).unwrap();
    assert_eq!(by_id("home").character.to_string(), "familiar-positive");
    assert_eq!(by_id("office").character.to_string(), "familiar-negative");
    assert_eq!(by_id("station").character, PlaceCharacter::Liminal);

    let home = by_id("home");
    assert_eq!(home.encounter_count(), 5);
    assert!((home.total_duration_hours() - 5.0).abs() < 1e-9);
    assert!((home.affect.as_ref().unwrap().valence - 0.6).abs() < 1e-9);
    assert_eq!(home.first_encounter(), Some(june(3, 7, 0)));
}

#[test]
fn places_as_of_an_earlier_instant_see_less_history() {
    let fx = commute();
    let config = PlaceConfig::default();
    let now = find_emergent_places(&fx.graph, &fx.agent, 1, None, &config).unwrap();
    let earlier = find_emergent_places(&fx.graph, &fx.agent, 1, Some(june(4, 12, 0)), &config).unwrap();

    let home_now = now.iter().find(|p| p.extent_id.as_str() == "home").unwrap();
    let home_then = earlier.iter().find(|p| p.extent_id.as_str() == "home").unwrap();
    assert_eq!(home_then.encounter_count(), 2);
    assert_eq!(home_now.encounter_count(), 5);
    // Latest end time: the 07:00 visit lasts an hour
    assert_eq!(home_then.last_encounter(), Some(june(4, 8, 0)));
}

#[test]
fn place_query_at_an_earlier_instant_replays_familiarity() {
    let fx = commute();
    let config = PlaceConfig::default();
    let home = |result: &chora::query::PlaceQueryResult| {
        result.places.iter().find(|p| p.extent_id.as_str() == "home").unwrap().familiarity
    };

    let current = PlaceQuery::new().for_agent("alice").execute(&fx.graph, &config).unwrap();
    let tuesday = PlaceQuery::new().for_agent("alice").at(june(4, 12, 0));
    let then = tuesday.execute(&fx.graph, &config).unwrap();
    assert!(home(&then) < home(&current));

    let cut = commute_until(4);
    let expected = tuesday.execute(&cut.graph, &config).unwrap();
    assert!((home(&then) - home(&expected)).abs() < 1e-9);
}

#[test]
fn place_query_composes_filters() {
    let fx = commute();
    let config = PlaceConfig::default();

    let positive = PlaceQuery::new().for_agent("alice").with_positive_affect().execute(&fx.graph, &config).unwrap();
    assert_eq!(ids(&positive.places), vec!["home"]);

    let liminal = PlaceQuery::new()
        .for_agent("alice")
        .with_character(PlaceCharacter::Liminal)
        .execute(&fx.graph, &config)
        .unwrap();
    assert_eq!(ids(&liminal.places), vec!["station"]);

    let paged = PlaceQuery::new().min_encounters(5).offset(1).limit(1).execute(&fx.graph, &config).unwrap();
    assert_eq!(paged.total_count, 3);
    assert_eq!(ids(&paged.places), vec!["home"]);

    let nothing = PlaceQuery::new().for_agent("bob").execute(&fx.graph, &config).unwrap();
    assert!(nothing.is_empty());
}

#[test]
fn canned_queries_see_affect_and_routines() {
    let mut fx = commute();
    let config = PlaceConfig::default();
    let positive = find_positive_places(&fx.graph, &fx.agent, &config).unwrap();
    assert_eq!(ids(&positive), vec!["home"]);

    assert!(find_routine_places(&fx.graph, &fx.agent, 1, &config).unwrap().is_empty());
    let agent = fx.agent.clone();
    derive_practices(&mut fx.graph, &agent, &PracticeConfig::default(), &SequenceConfig::default()).unwrap();
    let routines = find_routine_places(&fx.graph, &fx.agent, 5, &config).unwrap();
    assert_eq!(ids(&routines), vec!["office", "home", "station"]);
    assert!(find_routine_places(&fx.graph, &fx.agent, 6, &config).unwrap().is_empty());
}

#[test]
fn similar_feeling_places_score_higher() {
    let fx = commute();
    let places = find_emergent_places(&fx.graph, &fx.agent, 1, None, &PlaceConfig::default()).unwrap();
    let by_id = |id: &str| places.iter().find(|p| p.extent_id.as_str() == id).unwrap();
    let weights = SimilarityWeights::default();

    let same = place_similarity(by_id("home"), by_id("home"), &weights).unwrap();
    assert!((same - 1.0).abs() < 1e-12);
    let opposite = place_similarity(by_id("home"), by_id("office"), &weights).unwrap();
    assert!(opposite < same);
    assert!((0.0..=1.0).contains(&opposite));
}

#[test]
fn paths_follow_edge_direction_and_never_fail() {
    let fx = commute();
    let there = find_path(&fx.graph, &fx.agent, &"office".into());
    assert!(there.found);
    assert_eq!(there.length, 2);
    assert_eq!(there.node_ids().first().map(|id| id.as_str()), Some("alice"));
    assert_eq!(there.node_ids().last().map(|id| id.as_str()), Some("office"));

    let back = find_path(&fx.graph, &"office".into(), &fx.agent);
    assert!(!back.found);
    assert!(back.path.is_empty());

    let unknown = find_path(&fx.graph, &"nowhere".into(), &"office".into());
    assert!(!unknown.found);

    let undirected = PathQuery::between("office".into(), "alice".into())
        .direction(chora::Direction::Both)
        .execute(&fx.graph);
    assert_eq!(undirected.length, 2);
}

#[test]
fn traversal_levels_follow_the_typed_layout() {
    let fx = commute();
    let result = TraverseQuery::from(fx.agent.clone())
        .depth(2)
        .with_edge_type(EdgeType::ParticipatesIn)
        .with_edge_type(EdgeType::OccursAt)
        .execute(&fx.graph);
    assert_eq!(result.at_depth(1).len(), 15);
    assert_eq!(result.at_depth(2).len(), 3);
    assert_eq!(result.max_depth(), 2);

    let lazy: Vec<usize> = traverse_from(&fx.graph, &fx.agent, 1).map(|(_, depth)| depth).collect();
    assert_eq!(lazy.len(), 16);
    assert!(lazy.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn temporal_queries_select_by_validity() {
    let fx = commute();
    let at_work: Vec<&NodeId> = snapshot_query(&fx.graph, june(5, 10, 0))
        .filter(|n| n.node_type() == NodeType::Encounter)
        .map(|n| &n.id)
        .collect();
    assert_eq!(at_work.len(), 1);
    let encounter = fx.graph.get_node(at_work[0]).unwrap().as_encounter().unwrap();
    assert_eq!(encounter.extent_id.as_str(), "office");

    let two_days = temporal_range_of(&fx.graph, NodeType::Encounter, june(4, 0, 0), june(5, 23, 59)).unwrap();
    assert_eq!(two_days.count(), 6);

    assert!(temporal_range_query(&fx.graph, june(5, 0, 0), june(4, 0, 0)).is_err());
}

#[test]
fn stored_graphs_reload_with_the_same_places() {
    let fx = commute();
    let config = ChoraConfig::default();
    let adapter = MemoryAdapter::new();
    adapter.save_graph(&fx.graph).unwrap();
    let loaded = adapter.load_graph(&fx.graph.id).unwrap();

    let before = find_emergent_places(&fx.graph, &fx.agent, 1, None, &config.place).unwrap();
    let after = find_emergent_places(&loaded, &fx.agent, 1, None, &config.place).unwrap();
    assert_eq!(ids(&before), ids(&after));
    for (a, b) in before.iter().zip(&after) {
        assert!((a.familiarity - b.familiarity).abs() < 1e-12);
        assert_eq!(a.character, b.character);
    }
}

#[test]
fn engine_hosts_graphs_by_id() {
    let engine = PlatialEngine::new();
    let id = engine.upsert_graph(commute().graph);
    engine.upsert_graph(PlatialGraph::new("empty"));
    assert_eq!(engine.graph_count(), 2);

    let familiar = engine
        .with_graph(&id, |g| {
            chora::query::find_familiar_places(g, &"alice".into(), 0.5, &PlaceConfig::default())
        })
        .unwrap()
        .unwrap();
    assert_eq!(ids(&familiar), vec!["office", "home"]);

    assert!(engine.remove_graph(&id).is_some());
    assert!(!engine.has_graph(&id));
}
