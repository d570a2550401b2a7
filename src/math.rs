//! Mathematical structs and functions.

use cgmath::{Point2, Vector2};
pub use arc::{CircularArc2d, LineSegment2d};
pub use curve::{polyline_length, sample_points, sample_polyline, ParametricCurve2d};

mod arc;
mod curve;

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;
