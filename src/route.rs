//! The routes vehicles follow through a network.

use crate::geometry::{EdgeSpec, RouteSpec, Topology};
use crate::{EdgeKey, EdgeSet, QueryError, ValidationError, ValidationErrors};
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// The compiled routes of a network.
///
/// Every edge is associated with exactly one route: the route starting at that
/// edge if there is one, otherwise the first declared route containing it.
#[derive(Clone, Debug, Default)]
pub struct RouteTable {
    /// The routes in declaration order.
    routes: Vec<Route>,
    /// Route indices by start edge.
    by_start: HashMap<String, usize>,
    /// The associated route of each edge, and the edge's index within it.
    membership: HashMap<String, (usize, usize)>,
    /// Whether routes wrap around at their end.
    closed: bool,
}

#[derive(Clone, Debug)]
struct Route {
    start: String,
    edges: Vec<String>,
}

impl RouteTable {
    /// Validates and compiles the routes.
    ///
    /// Routes may only mention declared edges. Edges which were declared but
    /// failed validation are skipped by the connectivity checks, as their
    /// violations have already been recorded.
    pub(crate) fn compile(
        specs: &[RouteSpec],
        topology: Topology,
        declared: &[EdgeSpec],
        edges: &EdgeSet,
        edge_ids: &HashMap<String, EdgeKey>,
        errors: &mut ValidationErrors,
    ) -> Self {
        let declared_ids = declared.iter().map(|e| e.id.as_str()).collect::<HashSet<_>>();
        let mut table = RouteTable {
            closed: topology == Topology::Closed,
            ..Default::default()
        };

        for spec in specs {
            if table.by_start.contains_key(&spec.start) {
                errors.push(ValidationError::DuplicateRoute {
                    route: spec.start.clone(),
                });
                continue;
            }
            let Some(first) = spec.edges.first() else {
                errors.push(ValidationError::EmptyRoute {
                    route: spec.start.clone(),
                });
                continue;
            };
            if *first != spec.start {
                errors.push(ValidationError::RouteStart {
                    route: spec.start.clone(),
                    first: first.clone(),
                });
            }
            for edge in &spec.edges {
                if !declared_ids.contains(edge.as_str()) {
                    errors.push(ValidationError::UnknownRouteEdge {
                        route: spec.start.clone(),
                        edge: edge.clone(),
                    });
                }
            }

            // Consecutive edges must share a node
            let key = |id: &String| edge_ids.get(id.as_str()).map(|key| &edges[*key]);
            for (a, b) in spec.edges.iter().tuple_windows() {
                if let (Some(from), Some(to)) = (key(a), key(b)) {
                    if from.to() != to.from() {
                        errors.push(ValidationError::DisconnectedRoute {
                            route: spec.start.clone(),
                            from: a.clone(),
                            to: b.clone(),
                        });
                    }
                }
            }

            // In closed networks the last edge must lead back to the first
            if table.closed {
                let last = spec.edges.last().and_then(key);
                if let (Some(first), Some(last)) = (key(first), last) {
                    if last.to() != first.from() {
                        errors.push(ValidationError::OpenRoute {
                            route: spec.start.clone(),
                        });
                    }
                }
            }

            table.by_start.insert(spec.start.clone(), table.routes.len());
            table.routes.push(Route {
                start: spec.start.clone(),
                edges: spec.edges.clone(),
            });
        }

        // Associate each edge with a route, preferring the route it starts
        for (idx, route) in table.routes.iter().enumerate() {
            if route.edges.first() == Some(&route.start) {
                table.membership.insert(route.start.clone(), (idx, 0));
            }
        }
        for (idx, route) in table.routes.iter().enumerate() {
            for (pos, edge) in route.edges.iter().enumerate() {
                table.membership.entry(edge.clone()).or_insert((idx, pos));
            }
        }

        for edge in declared {
            if !table.membership.contains_key(&edge.id) {
                errors.push(ValidationError::UncoveredEdge(edge.id.clone()));
            }
        }

        table
    }

    /// Returns the edge following `edge_id` on its route.
    ///
    /// At the end of a route, closed networks wrap around to the route's first
    /// edge while open networks report [QueryError::EndOfRoute].
    pub fn next_edge(&self, edge_id: &str) -> Result<&str, QueryError> {
        let &(route, pos) = self
            .membership
            .get(edge_id)
            .ok_or_else(|| QueryError::UnknownEdge(edge_id.to_owned()))?;
        let edges = &self.routes[route].edges;
        match edges.get(pos + 1) {
            Some(next) => Ok(next),
            None if self.closed => Ok(&edges[0]),
            None => Err(QueryError::EndOfRoute(edge_id.to_owned())),
        }
    }

    /// Gets the route starting at the given edge.
    pub fn route(&self, start: &str) -> Option<&[String]> {
        self.by_start
            .get(start)
            .map(|idx| self.routes[*idx].edges.as_slice())
    }

    /// The first declared route, which defines the length of a closed network.
    pub fn canonical(&self) -> &[String] {
        self.routes
            .first()
            .map(|route| route.edges.as_slice())
            .unwrap_or_default()
    }

    /// Returns an iterator over the routes, as (start edge, edges) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.routes
            .iter()
            .map(|route| (route.start.as_str(), route.edges.as_slice()))
    }

    /// The edges which directly precede each edge on some route.
    /// In closed networks this includes the wrap from a route's last edge to its first.
    pub fn predecessors(&self) -> HashMap<&str, Vec<&str>> {
        let mut preds: HashMap<&str, Vec<&str>> = HashMap::new();
        for route in &self.routes {
            let pairs = route.edges.iter().tuple_windows::<(_, _)>();
            let wrap = match (self.closed, route.edges.first(), route.edges.last()) {
                (true, Some(first), Some(last)) => Some((last, first)),
                _ => None,
            };
            for (a, b) in pairs.chain(wrap) {
                let entry = preds.entry(b.as_str()).or_default();
                if !entry.contains(&a.as_str()) {
                    entry.push(a.as_str());
                }
            }
        }
        preds
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Whether routes wrap around at their end.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
