//! Uncertainty representation: values with error bars, distributions, fuzzy membership
//!
//! Vagueness is modelled, not suppressed.

use crate::error::{check_range, ChoraError, ChoraResult};
use crate::temporal::exponential_decay;
use serde::{Deserialize, Serialize};

/// A confidence interval around a central value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub confidence: f64,
}

impl ConfidenceInterval {
    pub fn new(lower: f64, upper: f64, confidence: f64) -> ChoraResult<Self> {
        if lower > upper {
            return Err(ChoraError::InvalidValue {
                field: "confidence_interval.lower",
                value: lower,
            });
        }
        check_range("confidence_interval.confidence", confidence, 0.0, 1.0)?;
        Ok(Self {
            lower,
            upper,
            confidence,
        })
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

/// A value with symmetric uncertainty and an optional confidence level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyValue {
    pub value: f64,
    #[serde(default)]
    pub uncertainty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl UncertaintyValue {
    pub fn new(value: f64, uncertainty: f64) -> ChoraResult<Self> {
        if uncertainty.is_nan() || uncertainty < 0.0 {
            return Err(ChoraError::InvalidValue {
                field: "uncertainty",
                value: uncertainty,
            });
        }
        Ok(Self {
            value,
            uncertainty,
            confidence: None,
        })
    }

    pub fn exact(value: f64) -> Self {
        Self {
            value,
            uncertainty: 0.0,
            confidence: None,
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> ChoraResult<Self> {
        check_range("confidence", confidence, 0.0, 1.0)?;
        self.confidence = Some(confidence);
        Ok(self)
    }

    /// `value ± uncertainty` as an interval
    pub fn as_interval(&self, confidence: f64) -> ChoraResult<ConfidenceInterval> {
        ConfidenceInterval::new(
            self.value - self.uncertainty,
            self.value + self.uncertainty,
            confidence,
        )
    }

    /// Confidence after `elapsed_days`; an unset confidence is treated as 1.0
    pub fn decay_confidence(&self, elapsed_days: f64, half_life_days: f64) -> Self {
        let confidence = exponential_decay(self.confidence.unwrap_or(1.0), elapsed_days, half_life_days);
        Self {
            confidence: Some(confidence),
            ..*self
        }
    }
}

/// Gaussian distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianDistribution {
    pub mu: f64,
    pub sigma: f64,
}

impl GaussianDistribution {
    pub fn new(mu: f64, sigma: f64) -> ChoraResult<Self> {
        if sigma.is_nan() || sigma <= 0.0 {
            return Err(ChoraError::InvalidValue {
                field: "sigma",
                value: sigma,
            });
        }
        Ok(Self { mu, sigma })
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let coefficient = 1.0 / (self.sigma * (2.0 * std::f64::consts::PI).sqrt());
        let z = (x - self.mu) / self.sigma;
        coefficient * (-0.5 * z * z).exp()
    }

    pub fn mean(&self) -> f64 {
        self.mu
    }

    pub fn variance(&self) -> f64 {
        self.sigma * self.sigma
    }

    /// Two-sided interval; 0.90, 0.95 and 0.99 use exact z-scores, anything else 0.95's
    pub fn confidence_interval(&self, confidence: f64) -> ChoraResult<ConfidenceInterval> {
        let z = match (confidence * 100.0).round() as u32 {
            90 => 1.645,
            99 => 2.576,
            _ => 1.96,
        };
        let margin = z * self.sigma;
        ConfidenceInterval::new(self.mu - margin, self.mu + margin, confidence)
    }
}

/// Categorical distribution over named outcomes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalDistribution {
    outcomes: Vec<(String, f64)>,
}

impl CategoricalDistribution {
    /// Probabilities must each lie in [0, 1] and sum to 1
    pub fn new(outcomes: Vec<(String, f64)>) -> ChoraResult<Self> {
        for (_, p) in &outcomes {
            check_range("category probability", *p, 0.0, 1.0)?;
        }
        let total: f64 = outcomes.iter().map(|(_, p)| p).sum();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ChoraError::InvalidValue {
                field: "category probability sum",
                value: total,
            });
        }
        Ok(Self { outcomes })
    }

    pub fn probability(&self, category: &str) -> f64 {
        self.outcomes
            .iter()
            .find(|(c, _)| c == category)
            .map_or(0.0, |(_, p)| *p)
    }

    /// Most likely category (first wins on ties)
    pub fn mode(&self) -> Option<&str> {
        let mut best: Option<&(String, f64)> = None;
        for outcome in &self.outcomes {
            if best.map_or(true, |b| outcome.1 > b.1) {
                best = Some(outcome);
            }
        }
        best.map(|(c, _)| c.as_str())
    }

    /// Shannon entropy in bits
    pub fn entropy(&self) -> f64 {
        -self
            .outcomes
            .iter()
            .filter(|(_, p)| *p > 0.0)
            .map(|(_, p)| p * p.log2())
            .sum::<f64>()
    }
}

/// Fuzzy membership function
pub trait FuzzyMembership {
    /// Membership degree in [0, 1]
    fn membership(&self, x: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TriangularFuzzy {
    pub left: f64,
    pub peak: f64,
    pub right: f64,
}

impl TriangularFuzzy {
    pub fn new(left: f64, peak: f64, right: f64) -> ChoraResult<Self> {
        if !(left <= peak && peak <= right) {
            return Err(ChoraError::InvalidValue {
                field: "triangular.peak",
                value: peak,
            });
        }
        Ok(Self { left, peak, right })
    }
}

impl FuzzyMembership for TriangularFuzzy {
    fn membership(&self, x: f64) -> f64 {
        if x == self.peak {
            return 1.0;
        }
        if x <= self.left || x >= self.right {
            return 0.0;
        }
        if x < self.peak {
            (x - self.left) / (self.peak - self.left)
        } else {
            (self.right - x) / (self.right - self.peak)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidalFuzzy {
    pub left_foot: f64,
    pub left_shoulder: f64,
    pub right_shoulder: f64,
    pub right_foot: f64,
}

impl TrapezoidalFuzzy {
    pub fn new(left_foot: f64, left_shoulder: f64, right_shoulder: f64, right_foot: f64) -> ChoraResult<Self> {
        if !(left_foot <= left_shoulder && left_shoulder <= right_shoulder && right_shoulder <= right_foot) {
            return Err(ChoraError::InvalidValue {
                field: "trapezoidal.shoulders",
                value: left_shoulder,
            });
        }
        Ok(Self {
            left_foot,
            left_shoulder,
            right_shoulder,
            right_foot,
        })
    }
}

impl FuzzyMembership for TrapezoidalFuzzy {
    fn membership(&self, x: f64) -> f64 {
        if self.left_shoulder <= x && x <= self.right_shoulder {
            return 1.0;
        }
        if x <= self.left_foot || x >= self.right_foot {
            return 0.0;
        }
        if x < self.left_shoulder {
            (x - self.left_foot) / (self.left_shoulder - self.left_foot)
        } else {
            (self.right_foot - x) / (self.right_foot - self.right_shoulder)
        }
    }
}
