//! Samples consumed and events emitted by the dwell detector

use crate::graph::NodeId;
use crate::model::GeoPoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One location fix for one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub agent_id: NodeId,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(agent_id: impl Into<NodeId>, lat: f64, lon: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            agent_id: agent_id.into(),
            lat,
            lon,
            timestamp,
        }
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// Per-agent detector state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellState {
    Moving,
    Dwelling,
}

impl std::fmt::Display for DwellState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DwellState::Moving => write!(f, "moving"),
            DwellState::Dwelling => write!(f, "dwelling"),
        }
    }
}

/// Consequence of processing one sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StreamEvent {
    StateChanged {
        agent_id: NodeId,
        from: DwellState,
        to: DwellState,
        at: DateTime<Utc>,
    },
    /// An encounter was written for a dwell that reached the minimum duration
    Encounter {
        agent_id: NodeId,
        encounter_id: NodeId,
        extent_id: NodeId,
        start: DateTime<Utc>,
        centroid: GeoPoint,
    },
    /// A dwell's encounter was closed at its last in-radius sample
    EncounterClosed {
        agent_id: NodeId,
        encounter_id: NodeId,
        end: DateTime<Utc>,
    },
}

impl StreamEvent {
    pub fn agent_id(&self) -> &NodeId {
        match self {
            StreamEvent::StateChanged { agent_id, .. }
            | StreamEvent::Encounter { agent_id, .. }
            | StreamEvent::EncounterClosed { agent_id, .. } => agent_id,
        }
    }

    pub fn is_encounter(&self) -> bool {
        matches!(self, StreamEvent::Encounter { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn events_serialize_with_a_tag() {
        let event = StreamEvent::StateChanged {
            agent_id: "alice".into(),
            from: DwellState::Moving,
            to: DwellState::Dwelling,
            at: Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "state_changed");
        assert_eq!(json["to"], "dwelling");
        assert_eq!(event.agent_id().as_str(), "alice");
    }
}
