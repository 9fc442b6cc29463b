//! Live ingestion: dwell detection over streamed location samples
//!
//! [`DwellDetector::process`] is the single entry point a transport layer
//! needs: feed it one sample, relay the events it returns.

mod dwell;
mod events;
pub mod geo;

pub use dwell::DwellDetector;
pub use events::{DwellState, LocationSample, StreamEvent};
pub use geo::{nearest_covering_extent, Centroid};
