//! Practice: a derived recurring pattern mined from encounter history

use crate::graph::NodeId;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeType {
    Routine,
    Habit,
    Ritual,
    Sequence,
}

impl std::fmt::Display for PracticeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PracticeType::Routine => "routine",
            PracticeType::Habit => "habit",
            PracticeType::Ritual => "ritual",
            PracticeType::Sequence => "sequence",
        };
        write!(f, "{}", s)
    }
}

/// Coarse day-of-week bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => DayType::Weekend,
            _ => DayType::Weekday,
        }
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl std::fmt::Display for DayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayType::Weekday => write!(f, "weekday"),
            DayType::Weekend => write!(f, "weekend"),
        }
    }
}

/// Typical time-of-day window, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub earliest: NaiveTime,
    pub latest: NaiveTime,
}

impl TimeWindow {
    pub fn new(earliest: NaiveTime, latest: NaiveTime) -> Self {
        if latest < earliest {
            Self {
                earliest: latest,
                latest: earliest,
            }
        } else {
            Self { earliest, latest }
        }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.earliest <= time && time <= self.latest
    }

    pub fn spread_hours(&self) -> f64 {
        (self.latest - self.earliest).num_seconds() as f64 / 3600.0
    }

    /// "08:00-08:45"
    pub fn label(&self) -> String {
        format!(
            "{:02}:{:02}-{:02}:{:02}",
            self.earliest.hour(),
            self.earliest.minute(),
            self.latest.hour(),
            self.latest.minute()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Practice {
    pub practice_type: PracticeType,
    pub name: String,
    pub agent_id: NodeId,
    /// One extent for temporal practices, the ordered motif for sequences
    pub extent_ids: Vec<NodeId>,
    /// In [0, 1]
    pub regularity: f64,
    /// Occurrences per day over the analysis window
    pub frequency: f64,
    pub occurrence_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_type: Option<DayType>,
    /// Symbolic tags used by similarity: type, day type, extent names, activities
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub encounter_ids: Vec<NodeId>,
}

impl Practice {
    pub fn is_routine(&self) -> bool {
        self.practice_type == PracticeType::Routine
    }

    pub fn involves(&self, extent_id: &NodeId) -> bool {
        self.extent_ids.contains(extent_id)
    }
}
