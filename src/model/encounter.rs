//! Encounter: the atomic, observed relation between an agent and an extent

use crate::error::{check_range, ChoraError, ChoraResult};
use crate::graph::NodeId;
use crate::temporal::{duration_hours, TimeInterval, Validity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An agent present at a spatial extent over an interval.
///
/// Immutable once recorded except for closing the end time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encounter {
    pub agent_id: NodeId,
    pub extent_id: NodeId,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub activity: String,
    /// Engagement intensity in [0, 1]
    pub intensity: f64,
}

impl Encounter {
    /// Open encounter with full intensity
    pub fn new(agent_id: NodeId, extent_id: NodeId, start_time: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            extent_id,
            start_time,
            end_time: None,
            activity: String::new(),
            intensity: 1.0,
        }
    }

    pub fn ended_at(mut self, end_time: DateTime<Utc>) -> ChoraResult<Self> {
        if end_time < self.start_time {
            return Err(ChoraError::InvalidInterval {
                start: self.start_time,
                end: end_time,
            });
        }
        self.end_time = Some(end_time);
        Ok(self)
    }

    /// Convenience for `ended_at(start + duration)`
    pub fn lasting(self, duration: Duration) -> ChoraResult<Self> {
        let end = self.start_time + duration;
        self.ended_at(end)
    }

    pub fn with_intensity(mut self, intensity: f64) -> ChoraResult<Self> {
        check_range("intensity", intensity, 0.0, 1.0)?;
        self.intensity = intensity;
        Ok(self)
    }

    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = activity.into();
        self
    }

    /// Check the field invariants (used by the store on insert)
    pub fn validate(&self) -> ChoraResult<()> {
        check_range("intensity", self.intensity, 0.0, 1.0)?;
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(ChoraError::InvalidInterval {
                    start: self.start_time,
                    end,
                });
            }
        }
        Ok(())
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end_time.map(|end| end - self.start_time)
    }

    pub fn duration_hours(&self) -> Option<f64> {
        self.duration().map(duration_hours)
    }

    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// End time if set, else start time
    pub fn latest_time(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }

    pub fn midpoint(&self) -> DateTime<Utc> {
        match self.duration() {
            Some(d) => self.start_time + d / 2,
            None => self.start_time,
        }
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: Some(self.start_time),
            end: self.end_time,
        }
    }

    pub fn overlaps(&self, other: &Encounter) -> bool {
        self.interval().overlaps(&other.interval())
    }

    /// Node validity mirrors the encounter interval
    pub fn validity(&self) -> Validity {
        Validity {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// True if `other` differs from `self` at most by closing the end time
    pub(crate) fn is_closure_of(&self, other: &Encounter) -> bool {
        self.agent_id == other.agent_id
            && self.extent_id == other.extent_id
            && self.start_time == other.start_time
            && self.activity == other.activity
            && self.intensity == other.intensity
            && (self.end_time == other.end_time || self.end_time.is_none())
    }
}
