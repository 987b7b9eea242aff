//! Make route geometry follow the rail network.
//!
//! Sparse routes are densified first and every point, original or synthesized,
//! is then snapped. Densifying after snapping would interpolate between track
//! points and pull the route off the rails again.

pub mod densify;
pub mod snap;
pub mod stats;

use geo::Point;

use crate::spatial::index::RailNetworkIndex;

pub use densify::{densify, densify_with_bulge, DEFAULT_BULGE};
pub use snap::{align, AlignedPoint, AlignedRoute};
pub use stats::AlignmentStats;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlignmentConfig {
    /// Points farther than this from the nearest segment are left in place.
    pub snap_threshold_km: f64,
    /// Radius of the nearest-segment search.
    pub max_search_km: f64,
    /// Routes with fewer points are densified up to this count.
    pub min_points: usize,
    pub bulge: f64,
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            snap_threshold_km: 5.0,
            max_search_km: 20.0,
            min_points: 8,
            bulge: DEFAULT_BULGE,
        }
    }
}

/// Densify-then-snap pipeline over a shared network.
#[derive(Clone, Copy)]
pub struct RouteAligner<'a> {
    network: &'a RailNetworkIndex,
    config: AlignmentConfig,
}

impl<'a> RouteAligner<'a> {
    pub fn new(network: &'a RailNetworkIndex, config: AlignmentConfig) -> Self {
        Self { network, config }
    }

    pub fn config(&self) -> &AlignmentConfig {
        &self.config
    }

    pub fn align_route(&self, route: &[Point]) -> AlignedRoute {
        let sparse = route.len() >= 2 && route.len() < self.config.min_points;
        let points = if sparse {
            densify_with_bulge(route, self.config.min_points, self.config.bulge)
        } else {
            route.to_vec()
        };

        let mut aligned = align(
            &points,
            self.network,
            self.config.snap_threshold_km,
            self.config.max_search_km,
        );
        if sparse {
            aligned.stats.synthesized_points = self.config.min_points - 2;
        }
        aligned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::index::DEFAULT_CELL_SIZE_DEG;
    use geo::LineString;

    fn straight_track() -> RailNetworkIndex {
        // Delhi-ish east-west line.
        RailNetworkIndex::from_lines(
            vec![LineString::from(vec![(77.0, 28.0), (77.5, 28.0), (78.0, 28.0)])],
            DEFAULT_CELL_SIZE_DEG,
        )
    }

    #[test]
    fn test_sparse_route_is_densified_then_snapped() {
        let network = straight_track();
        let aligner = RouteAligner::new(&network, AlignmentConfig::default());

        let route = vec![Point::new(77.0, 28.01), Point::new(78.0, 28.01)];
        let aligned = aligner.align_route(&route);

        assert_eq!(aligned.points.len(), 8);
        assert_eq!(aligned.stats.synthesized_points, 6);
        // Peak bulge sits ~4.4 km off the track, inside the 5 km threshold.
        assert!(aligned.points.iter().all(AlignedPoint::is_aligned));
        assert!(aligned.coordinates().iter().all(|p| (p.y() - 28.0).abs() < 1e-9));
        // Travel order survives.
        assert!(aligned.coordinates().windows(2).all(|w| w[0].x() < w[1].x()));
    }

    #[test]
    fn test_dense_route_is_only_snapped() {
        let network = straight_track();
        let config = AlignmentConfig {
            min_points: 3,
            ..Default::default()
        };
        let aligner = RouteAligner::new(&network, config);

        let route = vec![
            Point::new(77.1, 28.02),
            Point::new(77.4, 27.99),
            Point::new(77.9, 28.3),
        ];
        let aligned = aligner.align_route(&route);

        assert_eq!(aligned.points.len(), 3);
        assert_eq!(aligned.stats.synthesized_points, 0);
        assert_eq!(aligned.stats.aligned_points, 2);
        assert_eq!(aligned.points[2].point, route[2]);
    }
}
