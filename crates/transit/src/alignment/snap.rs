//! Snap route points onto the rail network.

use geo::Point;

use crate::alignment::stats::AlignmentStats;
use crate::models::types::RailError;
use crate::spatial::index::RailNetworkIndex;

/// A route point after snapping.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignedPoint {
    /// Snapped position, or the original when nothing was close enough.
    pub point: Point,
    pub original: Point,
    /// Distance moved, `None` for unaligned points.
    pub snap_km: Option<f64>,
}

impl AlignedPoint {
    pub fn is_aligned(&self) -> bool {
        self.snap_km.is_some()
    }
}

#[derive(Clone, Debug, Default)]
pub struct AlignedRoute {
    pub points: Vec<AlignedPoint>,
    pub stats: AlignmentStats,
}

impl AlignedRoute {
    /// Final coordinates in travel order.
    pub fn coordinates(&self) -> Vec<Point> {
        self.points.iter().map(|p| p.point).collect()
    }
}

/// Replace each point by its projection onto the nearest segment when that
/// segment is within `snap_threshold_km`.
///
/// Points are never dropped, added or reordered. A point with no segment inside
/// `max_search_km`, or whose nearest segment is beyond the threshold, is kept
/// as is and counted as unaligned.
pub fn align(
    route: &[Point],
    network: &RailNetworkIndex,
    snap_threshold_km: f64,
    max_search_km: f64,
) -> AlignedRoute {
    let mut stats = AlignmentStats::default();
    let points = route
        .iter()
        .map(|&original| match network.query(original, max_search_km) {
            Ok(m) if m.distance_km <= snap_threshold_km => {
                stats.record_aligned(m.distance_km);
                AlignedPoint {
                    point: m.projected,
                    original,
                    snap_km: Some(m.distance_km),
                }
            }
            Ok(m) => {
                log::trace!(
                    "Nearest track {:.2} km from ({:.4}, {:.4}) exceeds threshold",
                    m.distance_km,
                    original.y(),
                    original.x()
                );
                stats.record_unaligned();
                unaligned(original)
            }
            Err(e @ RailError::NotFound { .. }) => {
                log::trace!("{}", e);
                stats.record_unaligned();
                unaligned(original)
            }
            Err(e) => {
                log::debug!("Query failed: {}", e);
                stats.record_unaligned();
                unaligned(original)
            }
        })
        .collect();

    AlignedRoute { points, stats }
}

fn unaligned(original: Point) -> AlignedPoint {
    AlignedPoint {
        point: original,
        original,
        snap_km: None,
    }
}
