//! Resolution between positions on individual links and a single global coordinate.
//!
//! Every edge (and optionally every internal or intersection link) is assigned a
//! start offset in a one-dimensional coordinate. A position on a link is then
//! `offset + local distance`, and a global position maps back to the link whose
//! half-open interval `[offset, offset + length)` contains it. In closed networks
//! the coordinate wraps around at the total length.

pub use initial::{InitialConfig, Spacing, StartPosition};
use crate::network::Network;
use crate::util::Interval;
use crate::{QueryError, ValidationError, ValidationErrors};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

mod initial;

/// The relative tolerance used when checking offsets for consistency.
const OFFSET_TOLERANCE: f64 = 1e-6;

/// The namespace a link in the global coordinate belongs to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LinkKind {
    /// A road edge of the network.
    Edge,
    /// A connector between two road sections.
    Internal,
    /// The entry into a junction.
    Intersection,
}

/// The start of an internal or intersection link in the global coordinate.
#[derive(Clone, Debug, PartialEq)]
pub struct LinkStart {
    pub id: String,
    pub offset: f64,
    /// The length of the link in m; usually zero.
    pub length: f64,
}

impl LinkStart {
    /// Creates a zero-length link.
    pub fn new(id: impl Into<String>, offset: f64) -> Self {
        Self {
            id: id.into(),
            offset,
            length: 0.0,
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = length;
        self
    }
}

/// Produces the start offsets of a network's links.
pub trait EdgeStarts {
    /// The start offset of each edge.
    fn edge_starts(&self, network: &Network) -> Vec<(String, f64)>;

    /// The start offsets of connectors between road sections.
    fn internal_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        Vec::new()
    }

    /// The start offsets of junction entries.
    fn intersection_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        Vec::new()
    }
}

/// Lays edges end to end, following the canonical route first and then
/// the remaining edges in declaration order.
#[derive(Copy, Clone, Debug, Default)]
pub struct SequentialStarts;

impl EdgeStarts for SequentialStarts {
    fn edge_starts(&self, network: &Network) -> Vec<(String, f64)> {
        sequential_starts(network)
    }
}

/// Offsets for laying edges end to end. See [SequentialStarts].
pub fn sequential_starts(network: &Network) -> Vec<(String, f64)> {
    let canonical = network.routes().canonical().iter().map(String::as_str);
    let rest = network.iter_edges().map(|edge| edge.id());
    let mut offset = 0.0;
    canonical
        .chain(rest)
        .unique()
        .filter_map(|id| network.edge(id))
        .map(|edge| {
            let start = offset;
            offset += edge.length();
            (edge.id().to_owned(), start)
        })
        .collect()
}

/// A link's extent in the global coordinate.
#[derive(Clone, Debug)]
struct Span {
    id: String,
    kind: LinkKind,
    interval: Interval<f64>,
    /// The number of lanes; connectors have one.
    lanes: u32,
}

impl Span {
    fn location(&self, pos: f64) -> Location<'_> {
        Location {
            id: &self.id,
            kind: self.kind,
            pos,
        }
    }
}

/// A position on a particular link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location<'a> {
    /// The link ID.
    pub id: &'a str,
    /// The namespace of the link.
    pub kind: LinkKind,
    /// The distance along the link in m.
    pub pos: f64,
}

/// Converts between positions on links and the global coordinate.
#[derive(Clone, Debug)]
pub struct PositionResolver {
    /// Whether the coordinate wraps around.
    closed: bool,
    /// The length of the coordinate in m.
    total_length: f64,
    /// The links, sorted by start offset.
    spans: Vec<Span>,
    /// Indices into `spans` by link ID.
    index: HashMap<String, usize>,
}

impl PositionResolver {
    /// Builds a resolver from the start offsets produced by `starts`.
    pub fn new(
        network: &Network,
        starts: &(impl EdgeStarts + ?Sized),
    ) -> Result<Self, ValidationErrors> {
        Self::from_starts(
            network,
            starts.edge_starts(network),
            starts.internal_edge_starts(network),
            starts.intersection_edge_starts(network),
        )
    }

    /// Builds a resolver from explicit start offsets.
    pub fn from_starts(
        network: &Network,
        edge_starts: Vec<(String, f64)>,
        internal_starts: Vec<LinkStart>,
        intersection_starts: Vec<LinkStart>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let mut spans = vec![];
        let mut seen = HashSet::new();

        log::debug!(
            "resolving {} edge, {} internal and {} intersection starts",
            edge_starts.len(),
            internal_starts.len(),
            intersection_starts.len()
        );

        for (id, offset) in edge_starts {
            let Some(edge) = network.edge(&id) else {
                errors.push(ValidationError::UnknownOffsetEdge(id));
                continue;
            };
            let span = Span {
                interval: Interval::from_start(offset, edge.length()),
                lanes: edge.lanes(),
                kind: LinkKind::Edge,
                id,
            };
            Self::push_span(&mut spans, &mut seen, &mut errors, span);
        }
        let connectors = internal_starts
            .into_iter()
            .map(|start| (start, LinkKind::Internal))
            .chain(intersection_starts.into_iter().map(|start| (start, LinkKind::Intersection)));
        let mut connector_length = 0.0;
        for (start, kind) in connectors {
            if !(start.length.is_finite() && start.length >= 0.0) {
                errors.push(ValidationError::InvalidLinkLength {
                    id: start.id,
                    length: start.length,
                });
                continue;
            }
            connector_length += start.length;
            let span = Span {
                interval: Interval::from_start(start.offset, start.length),
                lanes: 1,
                kind,
                id: start.id,
            };
            Self::push_span(&mut spans, &mut seen, &mut errors, span);
        }

        // Every routed edge needs an offset
        for id in network.routes().iter().flat_map(|(_, edges)| edges).unique() {
            if !seen.contains(id.as_str()) {
                errors.push(ValidationError::MissingOffset(id.clone()));
            }
        }

        let closed = network.is_closed();
        let total_length = if closed {
            network.total_length() + connector_length
        } else {
            spans.iter().map(|s| s.interval.max).fold(0.0, f64::max)
        };
        let tolerance = OFFSET_TOLERANCE * f64::max(total_length, 1.0);

        spans.sort_by(|a, b| a.interval.min.total_cmp(&b.interval.min));
        let resolver = Self {
            closed,
            total_length,
            index: spans
                .iter()
                .enumerate()
                .map(|(idx, span)| (span.id.clone(), idx))
                .collect(),
            spans,
        };

        if closed {
            resolver.check_bounds(tolerance, &mut errors);
        }
        resolver.check_overlaps(tolerance, &mut errors);
        resolver.check_continuity(network, tolerance, &mut errors);

        if !errors.is_empty() {
            log::warn!("edge starts failed validation with {} violation(s)", errors.len());
        } else {
            log::info!(
                "resolved {} links over {:.2} m ({})",
                resolver.spans.len(),
                resolver.total_length,
                if closed { "closed" } else { "open" }
            );
        }
        errors.into_result(resolver)
    }

    /// Records a link's span, checking its offset.
    fn push_span(
        spans: &mut Vec<Span>,
        seen: &mut HashSet<String>,
        errors: &mut ValidationErrors,
        span: Span,
    ) {
        if !seen.insert(span.id.clone()) {
            errors.push(ValidationError::DuplicateOffset(span.id));
            return;
        }
        let offset = span.interval.min;
        if !(offset.is_finite() && offset >= 0.0) {
            errors.push(ValidationError::InvalidOffset {
                id: span.id,
                offset,
            });
            return;
        }
        spans.push(span);
    }

    /// Checks that every link of a closed network lies within one cycle.
    fn check_bounds(&self, tolerance: f64, errors: &mut ValidationErrors) {
        let end = self.total_length + tolerance;
        for span in &self.spans {
            let starts_inside = span.interval.min < self.total_length
                || (span.interval.length() == 0.0 && span.interval.min <= end);
            if !starts_inside {
                errors.push(ValidationError::InvalidOffset {
                    id: span.id.clone(),
                    offset: span.interval.min,
                });
            } else if span.interval.max > end {
                errors.push(ValidationError::WrappingSpan {
                    id: span.id.clone(),
                    offset: span.interval.min,
                    total: self.total_length,
                });
            }
        }
    }

    /// Checks that no two links of positive length overlap.
    fn check_overlaps(&self, tolerance: f64, errors: &mut ValidationErrors) {
        let solid = self.spans.iter().filter(|s| s.interval.length() > 0.0);
        for (a, b) in solid.tuple_windows() {
            if a.interval.max > b.interval.min + tolerance {
                errors.push(ValidationError::OverlappingOffsets {
                    a: a.id.clone(),
                    b: b.id.clone(),
                });
            }
        }
    }

    /// Checks that every edge continues on from at least one of its
    /// predecessors, after any connectors in between.
    fn check_continuity(&self, network: &Network, tolerance: f64, errors: &mut ValidationErrors) {
        let predecessors = network.routes().predecessors();
        for edge in network.iter_edges() {
            let Some(actual) = self.start_of(edge.id()) else {
                continue;
            };
            let Some(preds) = predecessors.get(edge.id()) else {
                continue;
            };
            let expected = preds
                .iter()
                .filter_map(|pred| {
                    let span = &self.spans[*self.index.get(*pred)?];
                    let end = span.interval.max;
                    Some((*pred, end + self.bridged_length(end, tolerance)))
                })
                .collect::<Vec<_>>();
            let consistent = expected.is_empty()
                || expected
                    .iter()
                    .any(|(_, expected)| self.separation(*expected, actual) <= tolerance);
            if !consistent {
                let (previous, expected) = expected[0];
                errors.push(ValidationError::InconsistentOffset {
                    edge: edge.id().to_owned(),
                    previous: previous.to_owned(),
                    expected: self.wrap(expected),
                    actual,
                });
            }
        }
    }

    /// The total length of positive-length connectors chained from `pos`.
    fn bridged_length(&self, pos: f64, tolerance: f64) -> f64 {
        let mut pos = pos;
        let mut bridged = 0.0;
        for _ in 0..self.spans.len() {
            let next = self.spans.iter().find(|s| {
                s.kind != LinkKind::Edge
                    && s.interval.length() > 0.0
                    && self.separation(s.interval.min, pos) <= tolerance
            });
            match next {
                Some(span) => {
                    bridged += span.interval.length();
                    pos = span.interval.max;
                }
                None => break,
            }
        }
        bridged
    }

    /// The absolute difference between two positions,
    /// accounting for wraparound in closed networks.
    fn separation(&self, a: f64, b: f64) -> f64 {
        if self.closed && self.total_length > 0.0 {
            let diff = (a - b).rem_euclid(self.total_length);
            f64::min(diff, self.total_length - diff)
        } else {
            (a - b).abs()
        }
    }

    /// Wraps a position into `[0, total_length)` in closed networks.
    fn wrap(&self, pos: f64) -> f64 {
        if !self.closed || self.total_length <= 0.0 {
            return pos;
        }
        let pos = pos.rem_euclid(self.total_length);
        // rem_euclid can round up to the modulus for tiny negative inputs
        if pos >= self.total_length {
            0.0
        } else {
            pos
        }
    }

    fn start_of(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|idx| self.spans[*idx].interval.min)
    }

    /// The length of the global coordinate in m.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    /// Whether the global coordinate wraps around.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The start offset of a link.
    pub fn edge_start(&self, id: &str) -> Option<f64> {
        self.start_of(id)
    }

    /// Converts a position on a link into a global position.
    ///
    /// In closed networks the result always lies in `[0, total_length)`.
    pub fn global_position(&self, id: &str, pos: f64) -> Result<f64, QueryError> {
        let offset = self
            .start_of(id)
            .ok_or_else(|| QueryError::UnknownEdge(id.to_owned()))?;
        Ok(self.wrap(offset + pos))
    }

    /// Finds the link containing a global position.
    ///
    /// Links own the half-open interval `[offset, offset + length)`, so a
    /// position exactly at a link's offset belongs to that link. Zero-length
    /// links never contain a position. Positions outside an open network,
    /// including one exactly at its total length, are [QueryError::OutOfRange].
    ///
    /// Closed networks always resolve: a position in a gap left by offset
    /// tolerance is placed at the end of the link before it.
    pub fn locate(&self, pos: f64) -> Result<Location<'_>, QueryError> {
        let pos = if self.closed {
            self.wrap(pos)
        } else if (0.0..self.total_length).contains(&pos) {
            pos
        } else {
            return Err(QueryError::OutOfRange(pos));
        };

        // The nearest link of positive length starting at or before `pos`
        // is the only one that can contain it.
        let idx = self.spans.partition_point(|s| s.interval.min <= pos);
        let solid = |s: &&Span| s.interval.length() > 0.0;
        let preceding = match self.spans[..idx].iter().rev().find(solid) {
            Some(span) => Some(span),
            None if self.closed => self.spans.iter().rev().find(solid),
            None => None,
        };
        match preceding {
            Some(span) if span.interval.contains_half_open(pos) => {
                Ok(span.location(pos - span.interval.min))
            }
            Some(span) if self.closed => {
                let local = self.wrap(pos - span.interval.min);
                Ok(span.location(local.min(span.interval.length())))
            }
            _ => Err(QueryError::OutOfRange(pos)),
        }
    }

    /// The distance travelled forwards from global position `from` to reach `to`.
    ///
    /// In closed networks this is always in `[0, total_length)`;
    /// in open networks it is negative if `to` lies behind `from`.
    pub fn forward_distance(&self, from: f64, to: f64) -> f64 {
        if self.closed {
            self.wrap(to - from)
        } else {
            to - from
        }
    }

    /// Returns an iterator over the links of the given kind, as (ID, offset) pairs,
    /// in order of offset.
    pub fn links(&self, kind: LinkKind) -> impl Iterator<Item = (&str, f64)> {
        self.spans
            .iter()
            .filter(move |s| s.kind == kind)
            .map(|s| (s.id.as_str(), s.interval.min))
    }
}
