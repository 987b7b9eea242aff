//! Spatial indexing and query utilities.

pub mod grid;
pub mod index;
pub mod queries;

pub use index::{NetworkBuildStats, RailNetworkIndex, Segment, SegmentMatch, DEFAULT_CELL_SIZE_DEG};
pub use queries::{distance_to_segment_km, haversine_km, project_onto_segment};
