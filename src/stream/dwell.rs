//! Per-agent MOVING/DWELLING state machine over live location samples
//!
//! A MOVING agent accumulates a candidate stay: consecutive samples within
//! `dwell_radius_m` of their running centroid. Once the candidate spans
//! `dwell_time_s` the agent is DWELLING. When the dwell reaches
//! `min_dwell_for_encounter_s` an open Encounter is written, exactly once per
//! dwell; the first sample outside the radius closes it at the last in-radius
//! sample and the agent is MOVING again.

use super::events::{DwellState, LocationSample, StreamEvent};
use super::geo::Centroid;
use crate::config::DwellConfig;
use crate::derive::encounters::{ensure_agent, record_encounter, resolve_extent};
use crate::error::{check_range, ChoraError, ChoraResult};
use crate::graph::{GraphId, NodeId, PlatialEngine, PlatialGraph};
use crate::model::{Encounter, GeoPoint};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct Stay {
    centroid: Centroid,
    entered_at: DateTime<Utc>,
    last_in_radius: DateTime<Utc>,
}

impl Stay {
    fn open(sample: &LocationSample) -> Self {
        Self {
            centroid: Centroid::new(sample.point()),
            entered_at: sample.timestamp,
            last_in_radius: sample.timestamp,
        }
    }

    fn absorbs(&mut self, sample: &LocationSample, radius_m: f64) -> bool {
        let point = sample.point();
        if self.centroid.distance_m(&point) > radius_m {
            return false;
        }
        self.centroid.push(point);
        self.last_in_radius = sample.timestamp;
        true
    }

    fn seconds(&self) -> f64 {
        (self.last_in_radius - self.entered_at).num_milliseconds() as f64 / 1000.0
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Moving(Option<Stay>),
    Dwelling { stay: Stay, encounter_id: Option<NodeId> },
}

#[derive(Debug, Clone)]
struct AgentState {
    last_seen: DateTime<Utc>,
    phase: Phase,
}

/// Converts location samples into dwell transitions and Encounter nodes.
///
/// Owns the state of every agent it has seen; several detectors may feed one
/// graph as long as their agent sets are disjoint.
#[derive(Debug)]
pub struct DwellDetector {
    config: DwellConfig,
    agents: HashMap<NodeId, AgentState>,
}

impl DwellDetector {
    /// Fails with `InvalidConfiguration` if the config does not validate
    pub fn new(config: DwellConfig) -> ChoraResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            agents: HashMap::new(),
        })
    }

    pub fn config(&self) -> &DwellConfig {
        &self.config
    }

    /// Current state of an agent; unseen agents are MOVING
    pub fn state(&self, agent_id: &NodeId) -> DwellState {
        match self.agents.get(agent_id).map(|s| &s.phase) {
            Some(Phase::Dwelling { .. }) => DwellState::Dwelling,
            _ => DwellState::Moving,
        }
    }

    /// Running centroid of the current dwell, if the agent is DWELLING
    pub fn dwell_centroid(&self, agent_id: &NodeId) -> Option<GeoPoint> {
        match &self.agents.get(agent_id)?.phase {
            Phase::Dwelling { stay, .. } => Some(stay.centroid.point()),
            Phase::Moving(_) => None,
        }
    }

    pub fn tracked_agents(&self) -> usize {
        self.agents.len()
    }

    /// Process one sample and return the events it caused.
    ///
    /// A timestamp earlier than the agent's previous sample fails with
    /// `OutOfOrderSample` and leaves the agent's state untouched; equal
    /// timestamps are accepted.
    pub fn process(&mut self, graph: &mut PlatialGraph, sample: LocationSample) -> ChoraResult<Vec<StreamEvent>> {
        if let Err(e) = check_range("lat", sample.lat, -90.0, 90.0)
            .and_then(|_| check_range("lon", sample.lon, -180.0, 180.0))
        {
            warn!(agent = %sample.agent_id, error = %e, "rejected sample");
            return Err(e);
        }

        let mut state = match self.agents.get(&sample.agent_id) {
            Some(state) if sample.timestamp < state.last_seen => {
                warn!(
                    agent = %sample.agent_id,
                    last = %state.last_seen,
                    received = %sample.timestamp,
                    "rejected out-of-order sample"
                );
                return Err(ChoraError::OutOfOrderSample {
                    agent: sample.agent_id.clone(),
                    last: state.last_seen,
                    received: sample.timestamp,
                });
            }
            Some(state) => state.clone(),
            None => AgentState {
                last_seen: sample.timestamp,
                phase: Phase::Moving(None),
            },
        };

        let events = self.step(graph, &mut state, &sample)?;
        state.last_seen = sample.timestamp;
        self.agents.insert(sample.agent_id, state);
        Ok(events)
    }

    /// Process a sample against a graph held by an engine, under its write lock
    pub fn process_in(
        &mut self,
        engine: &PlatialEngine,
        graph_id: &GraphId,
        sample: LocationSample,
    ) -> ChoraResult<Vec<StreamEvent>> {
        engine.with_graph_mut(graph_id, |graph| self.process(graph, sample))?
    }

    /// Stop tracking an agent, closing any open dwell encounter
    pub fn finish_agent(&mut self, graph: &mut PlatialGraph, agent_id: &NodeId) -> ChoraResult<Vec<StreamEvent>> {
        let Some(state) = self.agents.remove(agent_id) else {
            return Ok(Vec::new());
        };
        let mut events = Vec::new();
        if let Phase::Dwelling { stay, encounter_id } = state.phase {
            close_dwell(graph, agent_id, &stay, encounter_id, state.last_seen, &mut events)?;
        }
        debug!(agent = %agent_id, events = events.len(), "agent finished");
        Ok(events)
    }

    fn step(
        &self,
        graph: &mut PlatialGraph,
        state: &mut AgentState,
        sample: &LocationSample,
    ) -> ChoraResult<Vec<StreamEvent>> {
        let radius = self.config.dwell_radius_m;
        let agent_id = &sample.agent_id;
        let mut events = Vec::new();

        let phase = std::mem::replace(&mut state.phase, Phase::Moving(None));
        state.phase = match phase {
            Phase::Moving(None) => Phase::Moving(Some(Stay::open(sample))),
            Phase::Moving(Some(mut stay)) => {
                if !stay.absorbs(sample, radius) {
                    Phase::Moving(Some(Stay::open(sample)))
                } else if stay.seconds() >= self.config.dwell_time_s {
                    debug!(agent = %agent_id, at = %sample.timestamp, "moving -> dwelling");
                    events.push(StreamEvent::StateChanged {
                        agent_id: agent_id.clone(),
                        from: DwellState::Moving,
                        to: DwellState::Dwelling,
                        at: sample.timestamp,
                    });
                    let encounter_id = self.maybe_record(graph, agent_id, &stay, None, &mut events)?;
                    Phase::Dwelling { stay, encounter_id }
                } else {
                    Phase::Moving(Some(stay))
                }
            }
            Phase::Dwelling { mut stay, encounter_id } => {
                if stay.absorbs(sample, radius) {
                    let encounter_id = self.maybe_record(graph, agent_id, &stay, encounter_id, &mut events)?;
                    Phase::Dwelling { stay, encounter_id }
                } else {
                    close_dwell(graph, agent_id, &stay, encounter_id, sample.timestamp, &mut events)?;
                    Phase::Moving(Some(Stay::open(sample)))
                }
            }
        };
        Ok(events)
    }

    /// Write the dwell's encounter once it is long enough, if not written yet
    fn maybe_record(
        &self,
        graph: &mut PlatialGraph,
        agent_id: &NodeId,
        stay: &Stay,
        encounter_id: Option<NodeId>,
        events: &mut Vec<StreamEvent>,
    ) -> ChoraResult<Option<NodeId>> {
        if encounter_id.is_some() || stay.seconds() < self.config.min_dwell_for_encounter_s {
            return Ok(encounter_id);
        }

        ensure_agent(graph, agent_id)?;
        let centroid = stay.centroid.point();
        let extent_id = resolve_extent(graph, centroid, self.config.extent_match_radius_m, "stream")?;
        let encounter = Encounter::new(agent_id.clone(), extent_id.clone(), stay.entered_at)
            .with_activity("dwell");
        let id = record_encounter(graph, encounter)?;

        debug!(agent = %agent_id, encounter = %id, extent = %extent_id, "dwell encounter");
        events.push(StreamEvent::Encounter {
            agent_id: agent_id.clone(),
            encounter_id: id.clone(),
            extent_id,
            start: stay.entered_at,
            centroid,
        });
        Ok(Some(id))
    }
}

fn close_dwell(
    graph: &mut PlatialGraph,
    agent_id: &NodeId,
    stay: &Stay,
    encounter_id: Option<NodeId>,
    at: DateTime<Utc>,
    events: &mut Vec<StreamEvent>,
) -> ChoraResult<()> {
    if let Some(encounter_id) = encounter_id {
        graph.close_encounter(&encounter_id, stay.last_in_radius)?;
        events.push(StreamEvent::EncounterClosed {
            agent_id: agent_id.clone(),
            encounter_id,
            end: stay.last_in_radius,
        });
    }
    debug!(agent = %agent_id, at = %at, "dwelling -> moving");
    events.push(StreamEvent::StateChanged {
        agent_id: agent_id.clone(),
        from: DwellState::Dwelling,
        to: DwellState::Moving,
        at,
    });
    Ok(())
}
