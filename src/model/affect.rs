//! Affect: an experiential response attached to an encounter or an extent

use crate::error::{check_range, ChoraResult};
use crate::graph::NodeId;
use crate::uncertainty::UncertaintyValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where an affect observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectSource {
    SelfReport,
    Observed,
    #[default]
    Derived,
}

/// Circumplex quadrant of a valence/arousal pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectQuadrant {
    Excited,
    Calm,
    Distressed,
    Depressed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Affect {
    /// Whose response this is; None for collective or unattributed affect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<NodeId>,
    /// In [-1, 1]
    pub valence: f64,
    /// In [-1, 1]
    pub arousal: f64,
    /// Symmetric uncertainty on both dimensions
    #[serde(default)]
    pub uncertainty: f64,
    /// Weight of this observation in aggregation, in [0, 1]
    pub confidence: f64,
    pub observed_at: DateTime<Utc>,
    #[serde(default)]
    pub source: AffectSource,
    #[serde(default)]
    pub description: String,
}

impl Affect {
    pub fn new(valence: f64, arousal: f64, observed_at: DateTime<Utc>) -> ChoraResult<Self> {
        check_range("valence", valence, -1.0, 1.0)?;
        check_range("arousal", arousal, -1.0, 1.0)?;
        Ok(Self {
            agent_id: None,
            valence,
            arousal,
            uncertainty: 0.1,
            confidence: 1.0,
            observed_at,
            source: AffectSource::default(),
            description: String::new(),
        })
    }

    pub fn for_agent(mut self, agent_id: NodeId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> ChoraResult<Self> {
        check_range("affect.confidence", confidence, 0.0, 1.0)?;
        self.confidence = confidence;
        Ok(self)
    }

    pub fn with_source(mut self, source: AffectSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn validate(&self) -> ChoraResult<()> {
        check_range("valence", self.valence, -1.0, 1.0)?;
        check_range("arousal", self.arousal, -1.0, 1.0)?;
        check_range("affect.confidence", self.confidence, 0.0, 1.0)?;
        check_range("affect.uncertainty", self.uncertainty, 0.0, f64::MAX)
    }

    pub fn valence_value(&self) -> UncertaintyValue {
        UncertaintyValue {
            value: self.valence,
            uncertainty: self.uncertainty,
            confidence: Some(self.confidence),
        }
    }

    pub fn arousal_value(&self) -> UncertaintyValue {
        UncertaintyValue {
            value: self.arousal,
            uncertainty: self.uncertainty,
            confidence: Some(self.confidence),
        }
    }

    pub fn is_positive(&self) -> bool {
        self.valence > 0.0
    }

    pub fn quadrant(&self) -> AffectQuadrant {
        match (self.valence >= 0.0, self.arousal >= 0.5) {
            (true, true) => AffectQuadrant::Excited,
            (true, false) => AffectQuadrant::Calm,
            (false, true) => AffectQuadrant::Distressed,
            (false, false) => AffectQuadrant::Depressed,
        }
    }
}
