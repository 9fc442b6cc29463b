//! Temporal primitives: intervals, node validity, decay and reinforcement curves
//!
//! Every node may carry a [`Validity`]. Familiarity and affect weighting
//! share the same half-life curve, so [`exponential_decay`] is the single
//! source of truth for "how much does the past still count".

use crate::error::{ChoraError, ChoraResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A time interval with optional bounds (None = unbounded on that side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeInterval {
    /// Create an interval, rejecting an end that precedes the start
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ChoraResult<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(ChoraError::InvalidInterval { start: s, end: e });
            }
        }
        Ok(Self { start, end })
    }

    /// Closed interval `[start, end]`
    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> ChoraResult<Self> {
        Self::new(Some(start), Some(end))
    }

    pub fn instant(at: DateTime<Utc>) -> Self {
        Self {
            start: Some(at),
            end: Some(at),
        }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if matches!(self.start, Some(s) if at < s) {
            return false;
        }
        !matches!(self.end, Some(e) if at > e)
    }

    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        if let (Some(end), Some(other_start)) = (self.end, other.start) {
            if end < other_start {
                return false;
            }
        }
        if let (Some(start), Some(other_end)) = (self.start, other.end) {
            if start > other_end {
                return false;
            }
        }
        true
    }

    /// Duration, or None when either bound is open
    pub fn duration(&self) -> Option<Duration> {
        Some(self.end? - self.start?)
    }

    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }
}

/// Temporal validity of a node: a start instant and an optional end.
///
/// A validity without an end is "still active". Soft deletion closes the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
}

impl Validity {
    pub fn from(start: DateTime<Utc>) -> Self {
        Self { start, end: None }
    }

    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> ChoraResult<Self> {
        if end < start {
            return Err(ChoraError::InvalidInterval { start, end });
        }
        Ok(Self {
            start,
            end: Some(end),
        })
    }

    /// Valid iff `start <= at` and (end unset or `end >= at`)
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && self.end.map_or(true, |end| end >= at)
    }

    pub fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// Close the validity at `at`. Closing before the start is rejected.
    pub fn close(&mut self, at: DateTime<Utc>) -> ChoraResult<()> {
        if at < self.start {
            return Err(ChoraError::InvalidInterval {
                start: self.start,
                end: at,
            });
        }
        self.end = Some(at);
        Ok(())
    }

    pub fn overlaps(&self, interval: &TimeInterval) -> bool {
        self.interval().overlaps(interval)
    }

    pub fn interval(&self) -> TimeInterval {
        TimeInterval {
            start: Some(self.start),
            end: self.end,
        }
    }
}

/// Fractional days from `from` to `to` (negative if `to` precedes `from`)
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_DAY
}

/// Fractional hours of a duration
pub fn duration_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}

/// `value * 2^(-elapsed_days / half_life_days)`.
///
/// Non-positive elapsed time returns `value` unchanged.
pub fn exponential_decay(value: f64, elapsed_days: f64, half_life_days: f64) -> f64 {
    if elapsed_days <= 0.0 || half_life_days <= 0.0 {
        return value;
    }
    value * (-elapsed_days / half_life_days).exp2()
}

/// Linear decay clamped at zero
pub fn linear_decay(value: f64, elapsed_days: f64, rate_per_day: f64) -> f64 {
    if elapsed_days <= 0.0 {
        return value;
    }
    (value - rate_per_day * elapsed_days).max(0.0)
}

/// `value / (offset + elapsed)^exponent`, a slower tail than exponential decay
pub fn power_law_decay(value: f64, elapsed_days: f64, exponent: f64, offset: f64) -> f64 {
    if elapsed_days <= 0.0 {
        return value;
    }
    value / (offset + elapsed_days).powf(exponent) * offset.powf(exponent)
}

/// Additive reinforcement clamped at `maximum`
pub fn linear_reinforcement(value: f64, increment: f64, maximum: f64) -> f64 {
    (value + increment).min(maximum)
}

/// `value + (maximum - value) * gain`: diminishing returns, never exceeds `maximum`
pub fn saturating_reinforcement(value: f64, gain: f64, maximum: f64) -> f64 {
    let gain = gain.clamp(0.0, 1.0);
    (value + (maximum - value).max(0.0) * gain).min(maximum)
}
