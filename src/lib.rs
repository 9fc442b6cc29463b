//! Chora: Temporal Platial Graph Engine
//!
//! Models place as something that emerges from an agent's encounters with
//! spatial extents over time, rather than as a fixed location.
//!
//! # Core Concepts
//!
//! - **Encounters**: Observed, time-bounded presence of an agent at an extent
//! - **Familiarity**: Derived state that decays between encounters and saturates with repetition
//! - **Practices**: Routines, habits, rituals and sequences mined from encounter history
//! - **Emergent places**: Computed views over everything linking one agent to one extent
//!
//! Every node carries an epistemic level (observed, derived or interpreted)
//! and an optional temporal validity. Derivation operators in [`derive`]
//! stamp their output DERIVED or INTERPRETED with provenance.
//!
//! # Example
//!
//! ```
//! use chora::config::FamiliarityConfig;
//! use chora::derive::update_familiarity;
//! use chora::model::{Agent, Encounter, SpatialExtent};
//! use chora::{Node, PlatialGraph};
//! use chrono::{Duration, Utc};
//!
//! let mut graph = PlatialGraph::new("example");
//! let alice = graph.add_node(Node::new(Agent::individual("Alice"))).unwrap();
//! let park = graph.add_node(Node::new(SpatialExtent::named("park"))).unwrap();
//! let visit = Encounter::new(alice, park, Utc::now()).lasting(Duration::hours(1)).unwrap();
//! let visit = graph.add_node(Node::new(visit)).unwrap();
//!
//! let familiarity = update_familiarity(&mut graph, &visit, &FamiliarityConfig::default()).unwrap();
//! assert!(familiarity.as_familiarity().unwrap().value > 0.0);
//! ```

pub mod config;
pub mod derive;
pub mod error;
pub mod graph;
pub mod model;
pub mod query;
pub mod storage;
pub mod stream;
pub mod temporal;
pub mod uncertainty;

pub use config::ChoraConfig;
pub use derive::{EmergentPlace, PlaceCharacter};
pub use error::{ChoraError, ChoraResult};
pub use graph::{
    Edge, EdgeId, EdgeType, EpistemicLevel, GraphId, Node, NodeId, NodeKind, NodeType, PlatialEngine,
    PlatialGraph, PropertyValue, Provenance,
};
pub use query::{Direction, PathQuery, PathResult, PlaceQuery, TraversalResult, TraverseQuery};
pub use storage::{GraphAdapter, MemoryAdapter, StorageError, StorageResult};
pub use stream::{DwellDetector, DwellState, LocationSample, StreamEvent};
pub use temporal::{TimeInterval, Validity};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
