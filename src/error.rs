//! Error types.

use std::fmt;
use thiserror::Error;

/// Any error produced while setting up a scenario.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Shorthand result type for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A scenario parameter is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("malformed parameters: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("parameter `{key}` is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigurationError {
    pub(crate) fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// A single violated network invariant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("network has no edges")]
    EmptyNetwork,

    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),

    #[error("duplicate edge id `{0}`")]
    DuplicateEdge(String),

    #[error("duplicate edge type `{0}`")]
    DuplicateType(String),

    #[error("edge `{edge}` references unknown node `{node}`")]
    UnknownNode { edge: String, node: String },

    #[error("edge `{edge}` references unknown type `{edge_type}`")]
    UnknownType { edge: String, edge_type: String },

    #[error("edge `{edge}` has no {attribute} and no type to inherit it from")]
    MissingAttribute {
        edge: String,
        attribute: &'static str,
    },

    #[error("`{id}` has non-positive {attribute} ({value})")]
    NonPositive {
        id: String,
        attribute: &'static str,
        value: f64,
    },

    #[error("edge `{edge}` has a shape with fewer than two points")]
    DegenerateShape { edge: String },

    #[error("shape of edge `{edge}` misses node `{node}` by {distance:.3}")]
    ShapeMismatch {
        edge: String,
        node: String,
        distance: f64,
    },

    #[error("route `{route}` is empty")]
    EmptyRoute { route: String },

    #[error("route `{route}` is declared more than once")]
    DuplicateRoute { route: String },

    #[error("route `{route}` starts with `{first}` instead of its own edge")]
    RouteStart { route: String, first: String },

    #[error("route `{route}` references unknown edge `{edge}`")]
    UnknownRouteEdge { route: String, edge: String },

    #[error("route `{route}` jumps from `{from}` to `{to}`, which do not meet")]
    DisconnectedRoute {
        route: String,
        from: String,
        to: String,
    },

    #[error("route `{route}` never returns to its start edge")]
    OpenRoute { route: String },

    #[error("edge `{0}` is covered by no route")]
    UncoveredEdge(String),

    #[error("connection from `{from}` to `{to}` is invalid: {reason}")]
    InvalidConnection {
        from: String,
        to: String,
        reason: String,
    },

    #[error("edge `{0}` has no start offset")]
    MissingOffset(String),

    #[error("start offset of `{0}` is declared more than once")]
    DuplicateOffset(String),

    #[error("start offset given for unknown edge `{0}`")]
    UnknownOffsetEdge(String),

    #[error("`{id}` has invalid start offset {offset}")]
    InvalidOffset { id: String, offset: f64 },

    #[error("link `{id}` has invalid length {length}")]
    InvalidLinkLength { id: String, length: f64 },

    #[error("edge `{edge}` starts at {actual:.3}, expected {expected:.3} after `{previous}`")]
    InconsistentOffset {
        edge: String,
        previous: String,
        expected: f64,
        actual: f64,
    },

    #[error("`{a}` and `{b}` overlap in the global coordinate")]
    OverlappingOffsets { a: String, b: String },

    /// Links of closed networks may not run past the end of the coordinate,
    /// so the origin must sit at the start of a link.
    #[error("`{id}` at {offset:.3} runs past the end of the closed coordinate ({total:.3})")]
    WrappingSpan { id: String, offset: f64, total: f64 },
}

/// Every invariant violation found while compiling a network or
/// building a position resolver.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Iterates over the individual violations.
    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    /// The number of violations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if the given violation was reported.
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    pub(crate) fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Returns `value` if no violations were recorded.
    pub(crate) fn into_result<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, error) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// A position query could not be answered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("unknown edge `{0}`")]
    UnknownEdge(String),

    #[error("route ends after edge `{0}`")]
    EndOfRoute(String),

    #[error("position {0} lies outside the network")]
    OutOfRange(f64),
}
