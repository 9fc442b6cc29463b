//! Liminality: the transitional quality between two named spaces

use crate::error::{check_range, ChoraResult};
use crate::graph::NodeId;
use crate::uncertainty::{FuzzyMembership, TriangularFuzzy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiminalityType {
    #[default]
    Spatial,
    Temporal,
    Social,
    Functional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liminality {
    #[serde(default)]
    pub liminality_type: LiminalityType,
    /// Extents this liminal zone covers
    #[serde(default)]
    pub extent_ids: Vec<NodeId>,
    /// In [0, 1]
    pub intensity: f64,
    pub transitional_from: String,
    pub transitional_to: String,
    /// Membership across the transition; defaults to a centred triangle scaled by intensity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<TriangularFuzzy>,
    #[serde(default)]
    pub description: String,
}

impl Liminality {
    pub fn spatial_boundary(
        from: impl Into<String>,
        to: impl Into<String>,
        extent_ids: Vec<NodeId>,
        intensity: f64,
    ) -> ChoraResult<Self> {
        check_range("liminality.intensity", intensity, 0.0, 1.0)?;
        Ok(Self {
            liminality_type: LiminalityType::Spatial,
            extent_ids,
            intensity,
            transitional_from: from.into(),
            transitional_to: to.into(),
            boundary: None,
            description: String::new(),
        })
    }

    pub fn with_boundary(mut self, boundary: TriangularFuzzy) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn covers(&self, extent_id: &NodeId) -> bool {
        self.extent_ids.contains(extent_id)
    }

    pub fn is_threshold(&self) -> bool {
        self.intensity >= 0.7
    }

    pub fn is_weak(&self) -> bool {
        self.intensity < 0.3
    }

    pub fn transition_label(&self) -> String {
        format!("{} -> {}", self.transitional_from, self.transitional_to)
    }

    /// Liminal membership at `position` in [0, 1] (0 = fully "from", 1 = fully "to")
    pub fn membership_at(&self, position: f64) -> f64 {
        match &self.boundary {
            Some(fuzzy) => fuzzy.membership(position),
            None => {
                let centred = TriangularFuzzy {
                    left: 0.0,
                    peak: 0.5,
                    right: 1.0,
                };
                centred.membership(position) * self.intensity
            }
        }
    }
}
