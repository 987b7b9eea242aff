//! Rail network segments and the grid index used to snap points onto them.
//!
//! ## Two-Stage Search
//!
//! A query walks square rings of grid cells outward from the cell holding the
//! point:
//! 1. **Grid filter**: only segments registered in visited cells are considered
//! 2. **Exact distance**: each candidate is projected and measured with Haversine
//!
//! The walk stops once the nearest edge of the next ring is farther than the
//! best candidate so far, or farther than the search radius. Any segment not
//! yet visited lies entirely in cells at or beyond that ring, so the result is
//! the true minimum over the radius.

use geo::{BoundingRect, Coord, Intersects, Line, LineString, MultiLineString, Point, Rect};
use geojson::{Feature, Value};

use crate::models::types::{RailError, Result};
use crate::spatial::grid::{CellCoord, GridPartition};
use crate::spatial::queries::{degrees_to_km_floor, distance_to_segment_km};

pub const DEFAULT_CELL_SIZE_DEG: f64 = 0.05;

// ============================================================================
// Segments
// ============================================================================

/// One straight piece of track between two consecutive geometry vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub line: Line,
    /// Index of the source line this segment was cut from.
    pub line_index: u32,
}

impl Segment {
    pub fn new(line: Line, line_index: u32) -> Self {
        Self { line, line_index }
    }

    pub fn envelope(&self) -> Rect {
        self.line.bounding_rect()
    }
}

/// Closest segment to a query point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentMatch {
    pub segment: Segment,
    pub projected: Point,
    pub distance_km: f64,
}

// ============================================================================
// Build statistics
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkBuildStats {
    pub features_read: usize,
    pub lines_indexed: usize,
    pub segments_indexed: usize,
    /// Features with no geometry or a non-line geometry.
    pub features_skipped: usize,
    /// Lines dropped for a bad position or fewer than two vertices.
    pub malformed_lines: usize,
}

impl NetworkBuildStats {
    pub fn log_summary(&self) {
        log::info!("=== Rail Network ===");
        log::info!("Features read: {}", self.features_read);
        log::info!("Lines indexed: {}", self.lines_indexed);
        log::info!("Segments indexed: {}", self.segments_indexed);
        if self.features_skipped > 0 {
            log::warn!("Unusable features skipped: {}", self.features_skipped);
        }
        if self.malformed_lines > 0 {
            log::warn!("Malformed lines skipped: {}", self.malformed_lines);
        }
    }
}

// ============================================================================
// Index
// ============================================================================

/// Immutable, grid-partitioned rail network.
///
/// Built once, then shared read-only across worker threads.
#[derive(Clone, Debug)]
pub struct RailNetworkIndex {
    segments: Vec<Segment>,
    grid: Option<GridPartition>,
    bounds: Option<Rect>,
}

impl RailNetworkIndex {
    /// Build from GeoJSON features, keeping only `LineString` and `MultiLineString`.
    pub fn from_features(features: &[Feature], cell_size_deg: f64) -> (Self, NetworkBuildStats) {
        let mut stats = NetworkBuildStats {
            features_read: features.len(),
            ..Default::default()
        };
        let mut lines = Vec::new();

        for feature in features {
            let Some(geometry) = &feature.geometry else {
                stats.features_skipped += 1;
                continue;
            };

            let raw_lines: Vec<&Vec<Vec<f64>>> = match &geometry.value {
                Value::LineString(coords) => vec![coords],
                Value::MultiLineString(parts) => parts.iter().collect(),
                _ => {
                    stats.features_skipped += 1;
                    continue;
                }
            };

            for raw in raw_lines {
                match positions_to_linestring(raw) {
                    Ok(line) => lines.push(line),
                    Err(e) => {
                        log::debug!("Skipping line: {}", e);
                        stats.malformed_lines += 1;
                    }
                }
            }
        }

        let index = Self::from_lines(lines, cell_size_deg);
        stats.lines_indexed = index.line_count();
        stats.segments_indexed = index.segments.len();
        (index, stats)
    }

    /// Build from plain line strings. Each consecutive vertex pair becomes a
    /// segment; lines with fewer than two vertices are ignored.
    pub fn from_lines(lines: Vec<LineString>, cell_size_deg: f64) -> Self {
        let cell_size_deg = if cell_size_deg > 0.0 && cell_size_deg.is_finite() {
            cell_size_deg
        } else {
            DEFAULT_CELL_SIZE_DEG
        };

        let network: MultiLineString = lines.into_iter().filter(|l| l.0.len() >= 2).collect();
        let bounds = network.bounding_rect();

        let segments: Vec<Segment> = network
            .iter()
            .enumerate()
            .flat_map(|(i, line)| line.lines().map(move |l| Segment::new(l, i as u32)))
            .collect();

        let grid = bounds.map(|bounds| {
            let mut grid = GridPartition::new(bounds, cell_size_deg);
            for (id, segment) in segments.iter().enumerate() {
                grid.insert(id as u32, segment.envelope());
            }
            grid
        });

        Self {
            segments,
            grid,
            bounds,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Bounding box of all segments, `None` for an empty network.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Whether `point` lies inside the network's bounding box, edges included.
    pub fn covers(&self, point: Point) -> bool {
        self.bounds.is_some_and(|b| point.intersects(&b))
    }

    fn line_count(&self) -> usize {
        self.segments
            .last()
            .map(|s| s.line_index as usize + 1)
            .unwrap_or(0)
    }

    /// Nearest segment to `point` within `max_search_km`.
    ///
    /// Returns [`RailError::NotFound`] when nothing lies inside the radius.
    pub fn query(&self, point: Point, max_search_km: f64) -> Result<SegmentMatch> {
        let not_found = || RailError::NotFound {
            lat: point.y(),
            lon: point.x(),
            radius_km: max_search_km,
        };

        let Some(grid) = &self.grid else {
            return Err(not_found());
        };
        if !(max_search_km >= 0.0) {
            return Err(not_found());
        }

        let center = grid.cell_of(point.0);
        let last_ring = grid.max_useful_ring(center);
        let mut best: Option<SegmentMatch> = None;

        for ring in 0..=last_ring {
            let floor_km = self.ring_floor_km(grid, point, ring);
            if floor_km > max_search_km {
                break;
            }
            if best.is_some_and(|b| floor_km > b.distance_km) {
                break;
            }

            for cell in grid.ring(center, ring) {
                self.scan_cell(grid, cell, point, &mut best);
            }
        }

        best.filter(|b| b.distance_km <= max_search_km)
            .ok_or_else(not_found)
    }

    fn scan_cell(
        &self,
        grid: &GridPartition,
        cell: CellCoord,
        point: Point,
        best: &mut Option<SegmentMatch>,
    ) {
        for &id in grid.members(cell) {
            let segment = self.segments[id as usize];
            let (projected, distance_km) = distance_to_segment_km(point, segment.line);
            if best.map_or(true, |b| distance_km < b.distance_km) {
                *best = Some(SegmentMatch {
                    segment,
                    projected,
                    distance_km,
                });
            }
        }
    }

    /// Lower bound on the distance from `point` to anything in `ring`.
    fn ring_floor_km(&self, grid: &GridPartition, point: Point, ring: i64) -> f64 {
        if ring <= 1 {
            return 0.0;
        }
        let cell = grid.cell_size_deg();
        // The point may sit anywhere in its own cell, so one ring of slack.
        let gap_deg = (ring - 1) as f64 * cell;
        let reach_lat = point.y().abs() + (ring + 1) as f64 * cell;
        // Great-circle arcs run slightly shorter than parallels; keep a 1% margin.
        0.99 * degrees_to_km_floor(gap_deg, reach_lat)
    }

    /// Exhaustive scan over every segment. Reference for the grid search.
    pub fn query_brute_force(&self, point: Point, max_search_km: f64) -> Option<SegmentMatch> {
        self.segments
            .iter()
            .map(|segment| {
                let (projected, distance_km) = distance_to_segment_km(point, segment.line);
                SegmentMatch {
                    segment: *segment,
                    projected,
                    distance_km,
                }
            })
            .filter(|m| m.distance_km <= max_search_km)
            .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
    }
}

/// Convert GeoJSON positions (`[lon, lat, ...]`) into a line string.
fn positions_to_linestring(positions: &[Vec<f64>]) -> Result<LineString> {
    let coords = positions
        .iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(Coord { x: *lon, y: *lat }),
            _ => Err(RailError::Format(format!("bad position {p:?}"))),
        })
        .collect::<Result<Vec<_>>>()?;

    if coords.len() < 2 {
        return Err(RailError::Format(format!(
            "line has {} position(s), need at least 2",
            coords.len()
        )));
    }
    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, JsonObject};
    use proptest::prelude::*;

    fn feature(value: Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: Some(JsonObject::new()),
            foreign_members: None,
        }
    }

    fn ls(coords: &[(f64, f64)]) -> LineString {
        LineString::from(coords.to_vec())
    }

    #[test]
    fn test_build_from_features_skips_other_geometry() {
        let features = vec![
            feature(Value::LineString(vec![
                vec![77.0, 28.0],
                vec![77.1, 28.1],
                vec![77.2, 28.1],
            ])),
            feature(Value::MultiLineString(vec![
                vec![vec![72.8, 19.0], vec![72.9, 19.1]],
                vec![vec![73.0, 19.0], vec![73.1, 19.0]],
            ])),
            feature(Value::Point(vec![77.0, 28.0])),
            feature(Value::LineString(vec![vec![77.0]])),
            Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: None,
                foreign_members: None,
            },
        ];

        let (index, stats) = RailNetworkIndex::from_features(&features, DEFAULT_CELL_SIZE_DEG);
        assert_eq!(stats.features_read, 5);
        assert_eq!(stats.features_skipped, 2);
        assert_eq!(stats.malformed_lines, 1);
        assert_eq!(stats.lines_indexed, 3);
        assert_eq!(stats.segments_indexed, 4);
        assert_eq!(index.segments().len(), 4);
        assert!(index.covers(Point::new(75.0, 25.0)));
        assert!(!index.covers(Point::new(80.0, 25.0)));
    }

    #[test]
    fn test_bounds_span_every_line() {
        let index = RailNetworkIndex::from_lines(
            vec![
                ls(&[(77.0, 28.0), (77.5, 28.4)]),
                ls(&[(72.8, 19.0), (73.1, 19.2)]),
                ls(&[(80.0, 13.0)]),
            ],
            DEFAULT_CELL_SIZE_DEG,
        );

        let bounds = index.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 72.8, y: 19.0 });
        assert_eq!(bounds.max(), Coord { x: 77.5, y: 28.4 });
        assert_eq!(index.segments().len(), 2);

        // Corners and edges count as inside.
        assert!(index.covers(Point::new(72.8, 19.0)));
        assert!(index.covers(Point::new(77.5, 24.0)));
        assert!(!index.covers(Point::new(77.51, 24.0)));
        assert!(!index.covers(Point::new(80.0, 13.0)));
    }

    #[test]
    fn test_empty_network_finds_nothing() {
        let index = RailNetworkIndex::from_lines(vec![], DEFAULT_CELL_SIZE_DEG);
        assert!(index.is_empty());
        assert!(index.bounds().is_none());
        assert!(matches!(
            index.query(Point::new(77.0, 28.0), 50.0),
            Err(RailError::NotFound { .. })
        ));
    }

    #[test]
    fn test_query_projects_onto_nearest_segment() {
        let index = RailNetworkIndex::from_lines(
            vec![
                ls(&[(77.0, 28.0), (77.5, 28.0)]),
                ls(&[(77.0, 28.2), (77.5, 28.2)]),
            ],
            DEFAULT_CELL_SIZE_DEG,
        );

        let m = index.query(Point::new(77.25, 28.03), 20.0).unwrap();
        assert_eq!(m.segment.line_index, 0);
        assert!((m.projected.x() - 77.25).abs() < 1e-9);
        assert!((m.projected.y() - 28.0).abs() < 1e-9);
        assert!((m.distance_km - 3.34).abs() < 0.05);
    }

    #[test]
    fn test_query_respects_radius() {
        let index = RailNetworkIndex::from_lines(
            vec![ls(&[(77.0, 28.0), (77.5, 28.0)])],
            DEFAULT_CELL_SIZE_DEG,
        );

        // ~11 km north of the track.
        let p = Point::new(77.2, 28.1);
        assert!(index.query(p, 5.0).is_err());
        assert!(index.query(p, 15.0).is_ok());
    }

    #[test]
    fn test_query_from_outside_the_grid() {
        let index = RailNetworkIndex::from_lines(
            vec![ls(&[(77.0, 28.0), (77.1, 28.0)])],
            DEFAULT_CELL_SIZE_DEG,
        );

        // West of the network's bounding box, ~9.8 km from the west end.
        let m = index.query(Point::new(76.9, 28.0), 20.0).unwrap();
        assert_eq!(m.projected, Point::new(77.0, 28.0));
    }

    #[test]
    fn test_far_segment_beats_near_cell_miss() {
        // A long diagonal registered in many cells, plus a short stub closer in
        // grid terms but farther in distance.
        let index = RailNetworkIndex::from_lines(
            vec![
                ls(&[(77.0, 28.0), (78.0, 29.0)]),
                ls(&[(77.62, 28.36), (77.63, 28.36)]),
            ],
            0.01,
        );

        let p = Point::new(77.51, 28.5);
        let grid = index.query(p, 30.0).unwrap();
        let brute = index.query_brute_force(p, 30.0).unwrap();
        assert!((grid.distance_km - brute.distance_km).abs() < 1e-9);
    }

    fn arb_network() -> impl Strategy<Value = Vec<LineString>> {
        let coord = (76.0f64..78.0, 27.0f64..29.0);
        let line = prop::collection::vec(coord, 2..6)
            .prop_map(|cs| LineString::from(cs));
        prop::collection::vec(line, 1..12)
    }

    proptest! {
        #[test]
        fn grid_query_matches_brute_force(
            lines in arb_network(),
            px in 75.5f64..78.5,
            py in 26.5f64..29.5,
            radius in 0.5f64..60.0,
            cell in prop::sample::select(vec![0.01, 0.05, 0.2]),
        ) {
            let index = RailNetworkIndex::from_lines(lines, cell);
            let p = Point::new(px, py);

            let grid = index.query(p, radius).ok();
            let brute = index.query_brute_force(p, radius);

            match (grid, brute) {
                (Some(g), Some(b)) => {
                    prop_assert!(g.distance_km <= b.distance_km + 1e-9);
                    prop_assert!(g.distance_km <= radius);
                }
                (None, None) => {}
                (g, b) => prop_assert!(false, "grid {:?} vs brute {:?}", g, b),
            }
        }
    }
}
