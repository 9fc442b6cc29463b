//! Query system for platial graphs
//!
//! Place queries evaluate over emergent place views; traversal and path
//! queries walk typed edges; temporal queries filter by validity. Nothing in
//! this module mutates the graph.

mod find;
mod matching;
mod path;
mod similarity;
mod temporal;
mod traverse;
mod types;

pub use find::PlaceQuery;
pub use matching::{
    find_connected, find_familiar_places, find_positive_places, find_practices_like, find_routine_places,
    query_encounters, EncounterFilter,
};
pub use path::{find_path, PathQuery};
pub use similarity::{jaccard, place_similarity, practice_similarity};
pub use temporal::{snapshot_query, temporal_range_of, temporal_range_query};
pub use traverse::{traverse_from, Traversal, TraverseQuery};
pub use types::{Direction, PathResult, PlaceQueryResult, TraversalResult};
