//! Fill in sparse routes before snapping.

use std::f64::consts::PI;

use geo::Point;

/// Lateral bulge of synthesized points as a fraction of the chord length.
pub const DEFAULT_BULGE: f64 = 0.03;

/// Densify a route that has fewer than `min_points` points.
///
/// The result keeps the first and last point and places `min_points - 2`
/// points between them along the chord, pushed sideways by
/// `bulge * sin(pi * ratio)` so they form one smooth arc. Routes that are
/// already dense enough, or too short to define a chord, come back unchanged.
pub fn densify(route: &[Point], min_points: usize) -> Vec<Point> {
    densify_with_bulge(route, min_points, DEFAULT_BULGE)
}

pub fn densify_with_bulge(route: &[Point], min_points: usize, bulge: f64) -> Vec<Point> {
    let (Some(&first), Some(&last)) = (route.first(), route.last()) else {
        return route.to_vec();
    };
    if route.len() < 2 || route.len() >= min_points {
        return route.to_vec();
    }

    let synthesized = min_points - 2;
    let dx = last.x() - first.x();
    let dy = last.y() - first.y();

    let mut out = Vec::with_capacity(min_points);
    out.push(first);
    for i in 1..=synthesized {
        let ratio = i as f64 / (synthesized + 1) as f64;
        let offset = bulge * (PI * ratio).sin();
        // (-dy, dx) is the chord rotated a quarter turn, same length as the chord.
        out.push(Point::new(
            first.x() + ratio * dx - offset * dy,
            first.y() + ratio * dy + offset * dx,
        ));
    }
    out.push(last);
    out
}
