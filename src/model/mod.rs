//! Entity payloads carried by graph nodes
//!
//! Each payload is one variant of [`crate::graph::NodeKind`]. Place is
//! notably absent: it emerges as a computed view, never as a stored entity.

mod affect;
mod agent;
mod context;
mod encounter;
mod extent;
mod familiarity;
mod liminality;
mod meaning;
mod practice;

pub use affect::{Affect, AffectQuadrant, AffectSource};
pub use agent::{Agent, AgentKind};
pub use context::{Context, ContextType};
pub use encounter::Encounter;
pub use extent::{Bounds, GeoPoint, Geometry, SpatialExtent};
pub use familiarity::{Familiarity, FAMILIAR_THRESHOLD, NOVEL_THRESHOLD, VERY_FAMILIAR_THRESHOLD};
pub use liminality::{Liminality, LiminalityType};
pub use meaning::{Meaning, MeaningType};
pub use practice::{DayType, Practice, PracticeType, TimeWindow};
