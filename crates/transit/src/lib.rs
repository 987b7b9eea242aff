//! # rail-sim-transit
//!
//! Prepares train schedules for round-the-clock simulation.
//!
//! ## Features
//!
//! - **Track snapping**: Grid-partitioned index over rail segments with exact
//!   nearest-segment queries
//! - **Route alignment**: Densify sparse routes, then snap every point onto track
//! - **Periodic schedules**: Expand a base trip into daily runs by frequency tier
//! - **Coverage**: 24-bucket activity histogram with midnight wraparound and
//!   greedy backfilling of under-covered hours
//!
//! ## Example
//!
//! ```
//! use rail_sim_transit::prelude::*;
//! use geo::{LineString, Point};
//!
//! let network = RailNetworkIndex::from_lines(
//!     vec![LineString::from(vec![(77.0, 28.0), (78.0, 28.0)])],
//!     DEFAULT_CELL_SIZE_DEG,
//! );
//!
//! // Snap a two-point route onto the track
//! let aligner = RouteAligner::new(&network, AlignmentConfig::default());
//! let aligned = aligner.align_route(&[Point::new(77.0, 28.01), Point::new(78.0, 28.01)]);
//! assert_eq!(aligned.stats.aligned_points, aligned.stats.total_points);
//!
//! // Repeat a 12 hour trip every 8 hours
//! let base = ScheduleBase::new("06:00:00".parse().unwrap(), "18:00:00".parse().unwrap());
//! let runs = expand(&base, FrequencyTier::Medium);
//! let histogram = CoverageHistogram::compute(&runs);
//! assert!(histogram.find_gaps(1).is_empty());
//! ```

pub mod alignment;
pub mod coverage;
pub mod identifiers;
pub mod models;
pub mod spatial;

// Re-exports for convenience
pub mod prelude {
    pub use crate::alignment::{
        align, densify, AlignedPoint, AlignedRoute, AlignmentConfig, AlignmentStats, RouteAligner,
        DEFAULT_BULGE,
    };
    pub use crate::coverage::{
        backfill, compute_duration, expand, BackfillReport, CoverageConfig, CoverageHistogram,
        CoverageReport, CoverageScheduler,
    };
    pub use crate::identifiers::*;
    pub use crate::models::*;
    pub use crate::spatial::{
        NetworkBuildStats, RailNetworkIndex, Segment, SegmentMatch, DEFAULT_CELL_SIZE_DEG,
    };
}

pub use prelude::*;
