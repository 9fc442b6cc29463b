//! Fluent place queries over emergent place views

use super::types::PlaceQueryResult;
use crate::config::PlaceConfig;
use crate::derive::{find_emergent_places, EmergentPlace, PlaceCharacter};
use crate::error::ChoraResult;
use crate::graph::{NodeId, NodeType, PlatialGraph};
use crate::temporal::TimeInterval;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

type Predicate<'q> = Box<dyn Fn(&EmergentPlace) -> bool + 'q>;

/// Query for emergent places.
///
/// Builder methods only record predicates; nothing touches the graph until
/// [`PlaceQuery::execute`], which builds each candidate place once and keeps
/// those passing every predicate.
pub struct PlaceQuery<'q> {
    agent_id: Option<NodeId>,
    at: Option<DateTime<Utc>>,
    min_encounters: usize,
    predicates: Vec<Predicate<'q>>,
    /// Maximum number of results
    pub limit: Option<usize>,
    /// Number of results to skip
    pub offset: Option<usize>,
}

impl Default for PlaceQuery<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PlaceQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceQuery")
            .field("agent_id", &self.agent_id)
            .field("at", &self.at)
            .field("min_encounters", &self.min_encounters)
            .field("predicates", &self.predicates.len())
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .finish()
    }
}

impl<'q> PlaceQuery<'q> {
    /// Create a new empty query (every agent, every visited extent)
    pub fn new() -> Self {
        Self {
            agent_id: None,
            at: None,
            min_encounters: 1,
            predicates: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Restrict to one agent's places
    pub fn for_agent(mut self, agent_id: impl Into<NodeId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    /// Evaluate places as of `at`: later history is ignored and familiarity is replayed up to `at`
    pub fn at(mut self, at: DateTime<Utc>) -> Self {
        self.at = Some(at);
        self
    }

    pub fn min_encounters(mut self, n: usize) -> Self {
        self.min_encounters = n;
        self
    }

    /// Familiarity within `[min, max]`
    pub fn with_familiarity(self, min: f64, max: f64) -> Self {
        self.filter(move |p| (min..=max).contains(&p.familiarity))
    }

    /// Aggregated valence within `[min, max]`; places without affect never match
    pub fn with_valence(self, min: f64, max: f64) -> Self {
        self.filter(move |p| p.affect.as_ref().is_some_and(|a| (min..=max).contains(&a.valence)))
    }

    /// Aggregated arousal within `[min, max]`; places without affect never match
    pub fn with_arousal(self, min: f64, max: f64) -> Self {
        self.filter(move |p| p.affect.as_ref().is_some_and(|a| (min..=max).contains(&a.arousal)))
    }

    pub fn with_positive_affect(self) -> Self {
        self.with_valence(f64::MIN_POSITIVE, 1.0)
    }

    pub fn with_negative_affect(self) -> Self {
        self.with_valence(-1.0, -f64::MIN_POSITIVE)
    }

    /// At least one encounter overlapping the window
    pub fn during(self, window: TimeInterval) -> Self {
        self.filter(move |p| p.encounters.iter().any(|(_, e)| e.interval().overlaps(&window)))
    }

    pub fn with_character(self, character: PlaceCharacter) -> Self {
        self.filter(move |p| p.character == character)
    }

    pub fn at_extents(self, extent_ids: impl IntoIterator<Item = NodeId>) -> Self {
        let wanted: BTreeSet<NodeId> = extent_ids.into_iter().collect();
        self.filter(move |p| wanted.contains(&p.extent_id))
    }

    /// Add a custom predicate
    pub fn filter(mut self, predicate: impl Fn(&EmergentPlace) -> bool + 'q) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    /// Limit results
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip results
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Evaluate all predicates conjunctively.
    ///
    /// Results follow [`find_emergent_places`] order, agent by agent in id order.
    pub fn execute(&self, graph: &PlatialGraph, config: &PlaceConfig) -> ChoraResult<PlaceQueryResult> {
        let agents: Vec<NodeId> = match &self.agent_id {
            Some(agent_id) => vec![agent_id.clone()],
            None => graph
                .nodes(Some(NodeType::Encounter), None)
                .filter_map(|n| n.as_encounter())
                .map(|e| e.agent_id.clone())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };

        if agents.is_empty() {
            return Ok(PlaceQueryResult::empty());
        }

        let mut matching = Vec::new();
        for agent_id in &agents {
            let places = find_emergent_places(graph, agent_id, self.min_encounters, self.at, config)?;
            matching.extend(places.into_iter().filter(|p| self.predicates.iter().all(|pred| pred(p))));
        }

        let total_count = matching.len();
        let offset = self.offset.unwrap_or(0);
        let limit = self.limit.unwrap_or(usize::MAX);
        let places = matching.into_iter().skip(offset).take(limit).collect();
        Ok(PlaceQueryResult { places, total_count })
    }
}
