//! Geometric utility functions for distance calculations and spatial operations.

use geo::algorithm::Distance;
use geo::{Euclidean, Point};
use ndarray::Array1;

/// Builds a 2D position vector.
#[inline]
pub fn point(x: f32, y: f32) -> Array1<f32> {
    Array1::from_vec(vec![x, y])
}

/// Euclidean distance between two positions.
#[inline]
pub fn distance(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    Euclidean.distance(Point::new(a[0], a[1]), Point::new(b[0], b[1]))
}

/// Heading in radians from `from` toward `to`.
#[inline]
pub fn heading_towards(from: &Array1<f32>, to: &Array1<f32>) -> f32 {
    (to[1] - from[1]).atan2(to[0] - from[0])
}

/// Unit vector from `from` toward `to`, or zero when the points coincide.
pub fn unit_towards(from: &Array1<f32>, to: &Array1<f32>) -> [f32; 2] {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let len = dx.hypot(dy);
    if len <= f32::EPSILON {
        [0.0, 0.0]
    } else {
        [dx / len, dy / len]
    }
}

/// Clamps a position into the simulation box.
///
/// # Returns
///
/// `true` when the position had to be moved, i.e. the entity hit a wall.
pub fn clamp_to_bounds(v: &mut Array1<f32>, box_width: f32, box_height: f32) -> bool {
    let x = v[0].clamp(0.0, box_width);
    let y = v[1].clamp(0.0, box_height);
    let hit = (x - v[0]).abs() > 0.0 || (y - v[1]).abs() > 0.0;
    v[0] = x;
    v[1] = y;
    hit
}

/// Pushes a position out of a circle onto its rim.
///
/// # Returns
///
/// `true` when the position was inside the circle.
pub fn push_out_of_circle(v: &mut Array1<f32>, center: &Array1<f32>, radius: f32) -> bool {
    let d = distance(v, center);
    if d >= radius {
        return false;
    }
    let [ux, uy] = if d <= f32::EPSILON {
        [1.0, 0.0]
    } else {
        [(v[0] - center[0]) / d, (v[1] - center[1]) / d]
    };
    v[0] = center[0] + ux * radius;
    v[1] = center[1] + uy * radius;
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let d = distance(&point(0.0, 0.0), &point(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-5);
    }

    #[test]
    fn clamp_reports_wall_hits() {
        let mut p = point(-5.0, 10.0);
        assert!(clamp_to_bounds(&mut p, 100.0, 100.0));
        assert_eq!(p[0], 0.0);
        let mut inside = point(50.0, 50.0);
        assert!(!clamp_to_bounds(&mut inside, 100.0, 100.0));
    }

    #[test]
    fn push_out_lands_on_rim() {
        let center = point(10.0, 10.0);
        let mut p = point(12.0, 10.0);
        assert!(push_out_of_circle(&mut p, &center, 5.0));
        assert!((distance(&p, &center) - 5.0).abs() < 1e-4);
    }
}
