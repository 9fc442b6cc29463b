//! Core graph data structures

mod edge;
mod engine;
mod node;
mod store;

#[cfg(test)]
mod tests;

pub use edge::{Edge, EdgeId, EdgeType};
pub use engine::PlatialEngine;
pub use node::{EpistemicLevel, Node, NodeId, NodeKind, NodeType, Properties, PropertyValue, Provenance};
pub use store::{GraphId, GraphSnapshot, PlatialGraph};
