//! Distance and projection helpers.
//!
//! Projection onto a segment is planar in (lon, lat) degrees; the resulting
//! distance is measured with the Haversine formula. Over snapping radii of a
//! few tens of kilometres the planar projection lands within a few metres of
//! the geodesic foot point.

use geo::{Closest, ClosestPoint, HaversineDistance, Line, Point};

/// Length of one degree of arc on the sphere `geo`'s Haversine uses, in kilometres.
pub const KM_PER_DEGREE: f64 = 111.195;

/// Haversine distance between two points in kilometres.
pub fn haversine_km(p1: Point, p2: Point) -> f64 {
    p1.haversine_distance(&p2) / 1_000.0
}

/// Closest point on `segment` to `point` in the planar sense.
///
/// A zero-length segment projects everything onto its start.
pub fn project_onto_segment(point: Point, segment: Line) -> Point {
    match segment.closest_point(&point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => p,
        Closest::Indeterminate => segment.start.into(),
    }
}

/// Projected point and its Haversine distance (km) from `point`.
pub fn distance_to_segment_km(point: Point, segment: Line) -> (Point, f64) {
    let projected = project_onto_segment(point, segment);
    (projected, haversine_km(point, projected))
}

/// Convert kilometres to degrees of latitude.
pub fn km_to_degrees_approx(km: f64) -> f64 {
    km / KM_PER_DEGREE
}

/// Lower bound on the ground distance covered by `degrees` of lat or lon
/// anywhere at or below latitude `max_abs_lat`.
pub fn degrees_to_km_floor(degrees: f64, max_abs_lat: f64) -> f64 {
    let lat = max_abs_lat.abs().min(89.0).to_radians();
    degrees * KM_PER_DEGREE * lat.cos()
}
