//! Familiarity: derived, decaying state for one (agent, extent) pair
//!
//! Only the familiarity operators in `crate::derive::familiarity` produce these.

use crate::graph::NodeId;
use crate::temporal::{days_between, exponential_decay};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const FAMILIAR_THRESHOLD: f64 = 0.5;
pub const VERY_FAMILIAR_THRESHOLD: f64 = 0.8;
pub const NOVEL_THRESHOLD: f64 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Familiarity {
    pub agent_id: NodeId,
    pub extent_id: NodeId,
    /// In [0, 1]
    pub value: f64,
    pub last_update: DateTime<Utc>,
    pub encounter_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_encounter: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_duration_hours: f64,
}

impl Familiarity {
    /// Deterministic node id for the (agent, extent) pair
    pub fn node_id(agent_id: &NodeId, extent_id: &NodeId) -> NodeId {
        NodeId::derived("familiarity", &[agent_id, extent_id])
    }

    /// The zero state used when no prior familiarity exists
    pub fn initial(agent_id: NodeId, extent_id: NodeId, at: DateTime<Utc>) -> Self {
        Self {
            agent_id,
            extent_id,
            value: 0.0,
            last_update: at,
            encounter_count: 0,
            first_encounter: None,
            total_duration_hours: 0.0,
        }
    }

    /// Value decayed from `last_update` to `at` (never increased)
    pub fn value_at(&self, at: DateTime<Utc>, half_life_days: f64) -> f64 {
        exponential_decay(self.value, days_between(self.last_update, at), half_life_days)
    }

    pub fn is_familiar(&self) -> bool {
        self.value >= FAMILIAR_THRESHOLD
    }

    pub fn is_very_familiar(&self) -> bool {
        self.value >= VERY_FAMILIAR_THRESHOLD
    }

    pub fn is_novel(&self) -> bool {
        self.value < NOVEL_THRESHOLD
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn bands_follow_the_thresholds() {
        let at = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let mut fam = Familiarity::initial("alice".into(), "park".into(), at);
        assert!(fam.is_novel());
        fam.value = 0.85;
        assert!(fam.is_familiar() && fam.is_very_familiar());

        let later = fam.value_at(at + Duration::days(14), 14.0);
        assert!((later - 0.425).abs() < 1e-12);
        assert!(!Familiarity { value: later, ..fam }.is_familiar());
    }
}
