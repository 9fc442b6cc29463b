//! Canned queries: common place, encounter and practice lookups

use super::find::PlaceQuery;
use super::similarity::practice_similarity;
use super::traverse::TraverseQuery;
use super::types::Direction;
use crate::config::{PlaceConfig, PracticeSimilarityWeights};
use crate::derive::EmergentPlace;
use crate::error::{ChoraError, ChoraResult};
use crate::graph::{EdgeType, Node, NodeId, NodeType, PlatialGraph};
use crate::model::{Encounter, PracticeType};
use crate::temporal::TimeInterval;
use std::collections::HashSet;

/// Places where the agent's familiarity is at least `min_familiarity`
pub fn find_familiar_places(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    min_familiarity: f64,
    config: &PlaceConfig,
) -> ChoraResult<Vec<EmergentPlace>> {
    let result = PlaceQuery::new()
        .for_agent(agent_id.clone())
        .with_familiarity(min_familiarity, 1.0)
        .execute(graph, config)?;
    Ok(result.places)
}

/// Places where the agent's aggregated valence is positive
pub fn find_positive_places(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    config: &PlaceConfig,
) -> ChoraResult<Vec<EmergentPlace>> {
    let result = PlaceQuery::new()
        .for_agent(agent_id.clone())
        .with_positive_affect()
        .execute(graph, config)?;
    Ok(result.places)
}

/// Places visited at least `min_encounters` times that anchor one of the agent's active routines
pub fn find_routine_places(
    graph: &PlatialGraph,
    agent_id: &NodeId,
    min_encounters: usize,
    config: &PlaceConfig,
) -> ChoraResult<Vec<EmergentPlace>> {
    let routines: HashSet<NodeId> = graph
        .nodes(Some(NodeType::Practice), None)
        .filter(|n| n.validity.map_or(true, |v| v.is_active()))
        .filter(|n| n.as_practice().is_some_and(|p| p.practice_type == PracticeType::Routine))
        .map(|n| n.id.clone())
        .collect();
    let result = PlaceQuery::new()
        .for_agent(agent_id.clone())
        .min_encounters(min_encounters)
        .filter(move |p| p.practice_ids.iter().any(|id| routines.contains(id)))
        .execute(graph, config)?;
    Ok(result.places)
}

/// Filter for [`query_encounters`]; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct EncounterFilter {
    pub agent_id: Option<NodeId>,
    pub extent_id: Option<NodeId>,
    /// Encounters overlapping this window
    pub during: Option<TimeInterval>,
    pub activity: Option<String>,
}

impl EncounterFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent_id: impl Into<NodeId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_extent(mut self, extent_id: impl Into<NodeId>) -> Self {
        self.extent_id = Some(extent_id.into());
        self
    }

    pub fn during(mut self, window: TimeInterval) -> Self {
        self.during = Some(window);
        self
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    fn matches(&self, encounter: &Encounter) -> bool {
        self.agent_id.as_ref().map_or(true, |a| &encounter.agent_id == a)
            && self.extent_id.as_ref().map_or(true, |x| &encounter.extent_id == x)
            && self.during.as_ref().map_or(true, |w| encounter.interval().overlaps(w))
            && self.activity.as_ref().map_or(true, |a| &encounter.activity == a)
    }
}

/// Encounters matching the filter, by start time
pub fn query_encounters<'g>(graph: &'g PlatialGraph, filter: &EncounterFilter) -> Vec<(&'g NodeId, &'g Encounter)> {
    let mut found: Vec<(&NodeId, &Encounter)> = graph
        .nodes(Some(NodeType::Encounter), None)
        .filter_map(|n| n.as_encounter().map(|e| (&n.id, e)))
        .filter(|(_, e)| filter.matches(e))
        .collect();
    found.sort_by(|a, b| a.1.start_time.cmp(&b.1.start_time).then_with(|| a.0.cmp(b.0)));
    found
}

/// Every node reachable from `id` within `max_depth` hops in either direction, excluding `id`
pub fn find_connected<'g>(
    graph: &'g PlatialGraph,
    id: &NodeId,
    edge_types: &[EdgeType],
    max_depth: usize,
) -> Vec<&'g Node> {
    let query = edge_types.iter().fold(
        TraverseQuery::from(id.clone()).depth(max_depth).direction(Direction::Both),
        |q, t| q.with_edge_type(*t),
    );
    query.iter(graph).skip(1).map(|(node, _)| node).collect()
}

/// Practices at least `min_similarity` similar to a reference practice, most similar first.
///
/// The reference itself is excluded. Fails if `practice_id` is not a practice.
pub fn find_practices_like(
    graph: &PlatialGraph,
    practice_id: &NodeId,
    min_similarity: f64,
    weights: &PracticeSimilarityWeights,
) -> ChoraResult<Vec<(NodeId, f64)>> {
    let node = graph
        .get_node(practice_id)
        .ok_or_else(|| ChoraError::NodeNotFound(practice_id.clone()))?;
    let template = node.as_practice().ok_or_else(|| ChoraError::KindMismatch {
        id: practice_id.clone(),
        expected: NodeType::Practice,
        found: node.node_type(),
    })?;

    let mut matches = Vec::new();
    for candidate in graph.nodes(Some(NodeType::Practice), None) {
        let Some(practice) = candidate.as_practice() else {
            continue;
        };
        if &candidate.id == practice_id {
            continue;
        }
        let score = practice_similarity(template, practice, weights)?;
        if score >= min_similarity {
            matches.push((candidate.id.clone(), score));
        }
    }
    matches.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::model::{Agent, DayType, Practice, SpatialExtent, TimeWindow};
    use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 9, 0, 0).unwrap()
    }

    fn create_test_graph() -> PlatialGraph {
        let mut g = PlatialGraph::new("matching");
        g.add_node(Node::with_id("alice".into(), Agent::individual("Alice"))).unwrap();
        for extent in ["cafe", "park"] {
            g.add_node(Node::with_id(extent.into(), SpatialExtent::named(extent))).unwrap();
        }
        for (extent, d, activity) in [("cafe", 3, "coffee"), ("cafe", 4, "coffee"), ("park", 4, "walk")] {
            let enc = Encounter::new("alice".into(), extent.into(), day(d))
                .lasting(Duration::hours(1))
                .unwrap()
                .with_activity(activity);
            let id = g.add_node(Node::new(enc)).unwrap();
            g.add_edge(Edge::new("alice".into(), id.clone(), EdgeType::ParticipatesIn)).unwrap();
            g.add_edge(Edge::new(id, extent.into(), EdgeType::OccursAt)).unwrap();
        }
        g
    }

    fn practice(hour: u32, regularity: f64) -> Node {
        let at = |h: u32| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        Node::new(Practice {
            practice_type: PracticeType::Routine,
            name: format!("weekday {:02}:00 coffee", hour),
            agent_id: "alice".into(),
            extent_ids: vec!["cafe".into()],
            regularity,
            frequency: 0.5,
            occurrence_count: 6,
            time_window: Some(TimeWindow::new(at(hour), at(hour + 1))),
            day_type: Some(DayType::Weekday),
            labels: vec!["routine".into(), "weekday".into()],
            encounter_ids: vec![],
        })
    }

    #[test]
    fn encounters_filter_by_extent_window_and_activity() {
        let g = create_test_graph();
        let at_cafe = query_encounters(&g, &EncounterFilter::new().with_extent("cafe"));
        assert_eq!(at_cafe.len(), 2);
        assert!(at_cafe[0].1.start_time < at_cafe[1].1.start_time);

        let window = TimeInterval::bounded(day(4), day(4) + Duration::hours(1)).unwrap();
        let on_day_four = query_encounters(&g, &EncounterFilter::new().with_agent("alice").during(window));
        assert_eq!(on_day_four.len(), 2);

        let walks = query_encounters(&g, &EncounterFilter::new().with_activity("walk"));
        assert_eq!(walks.len(), 1);
    }

    #[test]
    fn connected_nodes_span_both_directions() {
        let g = create_test_graph();
        let from_cafe = find_connected(&g, &"cafe".into(), &[], 2);
        // Two encounters, then alice
        assert_eq!(from_cafe.len(), 3);

        let occurs_only = find_connected(&g, &"cafe".into(), &[EdgeType::OccursAt], 5);
        assert_eq!(occurs_only.len(), 2);
    }

    #[test]
    fn similar_practices_rank_by_score() {
        let mut g = create_test_graph();
        let reference = g.add_node(practice(8, 0.9)).unwrap();
        let close = g.add_node(practice(9, 0.85)).unwrap();
        let far = g.add_node(practice(20, 0.3)).unwrap();

        let weights = PracticeSimilarityWeights::default();
        let all = find_practices_like(&g, &reference, 0.0, &weights).unwrap();
        assert_eq!(all.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![&close, &far]);

        let strict = find_practices_like(&g, &reference, 0.9, &weights).unwrap();
        assert_eq!(strict.len(), 1);
    }

    #[test]
    fn practices_like_a_non_practice_fails() {
        let g = create_test_graph();
        let err = find_practices_like(&g, &"cafe".into(), 0.5, &PracticeSimilarityWeights::default());
        assert!(matches!(err, Err(ChoraError::KindMismatch { .. })));
    }
}
