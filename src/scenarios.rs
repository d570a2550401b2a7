//! Ready-made networks with typed, validated parameters.

pub use figure_eight::{FigureEight, FigureEightParams};
pub use merge::{Merge, MergeParams, INFLOW_EDGE_LEN};
pub use ring::{Ring, RingParams};
use crate::ConfigurationError;

mod figure_eight;
mod merge;
mod ring;

/// The default number of points sampled along each curved edge.
pub const DEFAULT_RESOLUTION: usize = 40;

fn default_resolution() -> usize {
    DEFAULT_RESOLUTION
}

/// Checks that a parameter is finite and greater than zero.
fn positive(key: &'static str, value: f64) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(key, format!("must be positive, got {}", value)))
    }
}

fn lane_count(key: &'static str, lanes: u32) -> Result<(), ConfigurationError> {
    if lanes == 0 {
        return Err(ConfigurationError::invalid(key, "must be at least 1"));
    }
    Ok(())
}

fn resolution(value: usize) -> Result<(), ConfigurationError> {
    if value < 2 {
        return Err(ConfigurationError::invalid("resolution", "must be at least 2"));
    }
    Ok(())
}
