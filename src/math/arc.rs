use super::curve::ParametricCurve2d;
use super::{Point2d, Vector2d};
use crate::util::Interval;
use cgmath::prelude::*;

/// A circular arc.
///
/// The curve parameter runs from 0 to 1, sweeping from `start_angle` to `end_angle`.
/// A decreasing angle sweeps clockwise.
#[derive(Copy, Clone, Debug)]
pub struct CircularArc2d {
    centre: Point2d,
    radius: f64,
    angles: Interval<f64>,
}

impl CircularArc2d {
    /// Creates a new arc. Angles are in radians.
    pub const fn new(centre: Point2d, radius: f64, start_angle: f64, end_angle: f64) -> Self {
        Self {
            centre,
            radius,
            angles: Interval::new(start_angle, end_angle),
        }
    }

    /// The arc length.
    pub fn length(&self) -> f64 {
        self.radius * self.angles.length().abs()
    }
}

impl ParametricCurve2d for CircularArc2d {
    fn sample(&self, t: f64) -> Point2d {
        let angle = self.angles.lerp(t);
        self.centre + self.radius * Vector2d::new(angle.cos(), angle.sin())
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, 1.0)
    }

    fn sample_dt(&self, t: f64) -> Vector2d {
        let angle = self.angles.lerp(t);
        let sweep = self.angles.length();
        self.radius * sweep * Vector2d::new(-angle.sin(), angle.cos())
    }
}

/// A straight line segment.
#[derive(Copy, Clone, Debug)]
pub struct LineSegment2d {
    ends: [Point2d; 2],
}

impl LineSegment2d {
    pub const fn from_ends(start: Point2d, end: Point2d) -> Self {
        Self { ends: [start, end] }
    }

    pub fn length(&self) -> f64 {
        self.ends[0].distance(self.ends[1])
    }
}

impl ParametricCurve2d for LineSegment2d {
    fn sample(&self, t: f64) -> Point2d {
        self.ends[0] + (self.ends[1] - self.ends[0]) * t
    }

    fn bounds(&self) -> Interval<f64> {
        Interval::new(0.0, 1.0)
    }

    fn sample_dt(&self, _t: f64) -> Vector2d {
        self.ends[1] - self.ends[0]
    }
}
