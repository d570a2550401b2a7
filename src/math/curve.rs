use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;
use itertools::Itertools;

/// A parametric curve in 2D space.
pub trait ParametricCurve2d {
    /// Samples the parametric curve.
    fn sample(&self, t: f64) -> Point2d;

    /// Returns the minimum and maximum t-values that define the bounds of the curve.
    fn bounds(&self) -> Interval<f64>;

    /// Samples the derivative of the parametric curve.
    ///
    /// The default implementation approximates the derivative by sampling
    /// two very nearby points along the curve.
    fn sample_dt(&self, t: f64) -> Vector2d {
        let delta = self.bounds().length() * 0.0001;
        let p1 = self.sample(t);
        let p2 = self.sample(t + delta);
        (p2 - p1) / delta
    }
}

impl<T: ParametricCurve2d + ?Sized> ParametricCurve2d for &T {
    fn sample(&self, t: f64) -> Point2d {
        (**self).sample(t)
    }

    fn bounds(&self) -> Interval<f64> {
        (**self).bounds()
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        (**self).sample_dt(t)
    }
}

/// Samples `count` points along the curve, evenly spaced in `t`,
/// including both end points. At least two points are always returned.
pub fn sample_points(curve: &impl ParametricCurve2d, count: usize) -> Vec<Point2d> {
    let bounds = curve.bounds();
    let count = usize::max(count, 2);
    let last = (count - 1) as f64;
    (0..count)
        .map(|i| bounds.lerp(i as f64 / last))
        .map(|t| curve.sample(t))
        .collect()
}

/// The total length of a polyline.
pub fn polyline_length(points: &[Point2d]) -> f64 {
    points
        .iter()
        .tuple_windows()
        .map(|(a, b)| a.distance(*b))
        .sum()
}

/// Walks `dist` along a polyline and returns the point reached and the
/// unit tangent of the segment it lies on.
///
/// Distances are clamped to the polyline. Returns `None` if the polyline
/// has no segment of positive length.
pub fn sample_polyline(points: &[Point2d], dist: f64) -> Option<(Point2d, Vector2d)> {
    let mut remaining = f64::max(dist, 0.0);
    let mut last = None;
    for (a, b) in points.iter().copied().tuple_windows() {
        let seg = b - a;
        let len = seg.magnitude();
        if len <= 0.0 {
            continue;
        }
        let dir = seg / len;
        if remaining <= len {
            return Some((a + dir * remaining, dir));
        }
        remaining -= len;
        last = Some((b, dir));
    }
    last
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{CircularArc2d, LineSegment2d};
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::PI;

    #[test]
    fn sample_points_includes_ends() {
        let line = LineSegment2d::from_ends(Point2d::new(0.0, 0.0), Point2d::new(10.0, 5.0));
        let points = sample_points(&line, 5);
        assert_eq!(points.len(), 5);
        assert_eq!(points[0], Point2d::new(0.0, 0.0));
        assert_eq!(points[4], Point2d::new(10.0, 5.0));
        assert_approx_eq!(points[2].x, 5.0);
    }

    #[test]
    fn sample_points_never_fewer_than_two() {
        let line = LineSegment2d::from_ends(Point2d::new(0.0, 0.0), Point2d::new(1.0, 0.0));
        assert_eq!(sample_points(&line, 0).len(), 2);
    }

    #[test]
    fn polyline_approximates_arc() {
        let arc = CircularArc2d::new(Point2d::new(0.0, 0.0), 40.0, 0.0, 0.5 * PI);
        let points = sample_points(&arc, 200);
        assert_approx_eq!(polyline_length(&points), arc.length(), 0.01);
    }

    #[test]
    fn sample_polyline_walks_segments() {
        let points = [
            Point2d::new(0.0, 0.0),
            Point2d::new(10.0, 0.0),
            Point2d::new(10.0, 10.0),
        ];
        let (p, dir) = sample_polyline(&points, 15.0).unwrap();
        assert_approx_eq!(p.x, 10.0);
        assert_approx_eq!(p.y, 5.0);
        assert_approx_eq!(dir.y, 1.0);

        let (end, _) = sample_polyline(&points, 100.0).unwrap();
        assert_eq!(end, Point2d::new(10.0, 10.0));

        assert!(sample_polyline(&points[..1], 0.0).is_none());
    }
}
