//! Persistence boundary for platial graphs
//!
//! Backends implement [`GraphAdapter`]. The crate ships only
//! [`MemoryAdapter`], which keeps serialized snapshots in process and
//! exercises the same lossless JSON round-trip a durable backend needs.

mod memory;
mod traits;

pub use memory::MemoryAdapter;
pub use traits::{GraphAdapter, StorageError, StorageResult};
