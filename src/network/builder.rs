use super::{Edge, Network, Node};
use crate::geometry::{EdgeSpec, EdgeType, Geometry, GeometrySpec, Topology};
use crate::math::{polyline_length, Point2d};
use crate::route::RouteTable;
use crate::{EdgeKey, EdgeSet, NodeKey, NodeSet, ValidationError, ValidationErrors};
use cgmath::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;

/// The maximum distance, in m, between the ends of an edge's shape and its nodes.
pub const SHAPE_ENDPOINT_TOLERANCE: f64 = 1e-2;

/// Validates network geometry and compiles it into a [Network].
#[derive(Clone, Debug)]
pub struct TopologyBuilder {
    /// The maximum distance between the ends of a shape and its nodes.
    shape_tolerance: f64,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self {
            shape_tolerance: SHAPE_ENDPOINT_TOLERANCE,
        }
    }
}

/// The validated attributes of an edge, prior to insertion.
struct EdgeParts {
    from: NodeKey,
    to: NodeKey,
    length: f64,
    lanes: u32,
    speed_limit: f64,
    shape: Vec<Point2d>,
}

impl TopologyBuilder {
    /// Creates a new builder with the default shape tolerance.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the maximum distance, in m, between the ends of a shape and its nodes.
    pub fn with_shape_tolerance(mut self, tolerance: f64) -> Self {
        self.shape_tolerance = tolerance;
        self
    }

    /// Validates the geometry and compiles it into a network.
    ///
    /// Every violation is collected before returning, so a failed compilation
    /// reports all offending nodes, edges and routes at once.
    pub fn compile(
        &self,
        geometry: &(impl Geometry + ?Sized),
    ) -> Result<Network, ValidationErrors> {
        let spec = GeometrySpec::from_geometry(geometry);
        let mut errors = ValidationErrors::default();

        log::debug!(
            "compiling {:?} network: {} nodes, {} edges, {} routes",
            spec.topology,
            spec.nodes.len(),
            spec.edges.len(),
            spec.routes.len()
        );

        let (mut nodes, node_ids, node_order) = Self::compile_nodes(&spec, &mut errors);
        let types = Self::compile_types(&spec.types, &mut errors);

        // Edges
        let mut edges = EdgeSet::with_key();
        let mut edge_ids = HashMap::new();
        let mut edge_order = vec![];
        for edge_spec in &spec.edges {
            if edge_ids.contains_key(&edge_spec.id) {
                errors.push(ValidationError::DuplicateEdge(edge_spec.id.clone()));
                continue;
            }
            let Some(parts) = self.compile_edge(edge_spec, &nodes, &node_ids, &types, &mut errors)
            else {
                continue;
            };
            let key = edges.insert_with_key(|key| Edge {
                key,
                id: edge_spec.id.clone(),
                from: parts.from,
                to: parts.to,
                length: parts.length,
                lanes: parts.lanes,
                speed_limit: parts.speed_limit,
                edge_type: edge_spec.edge_type.clone(),
                shape: parts.shape,
            });
            nodes[parts.from].edges_out.push(key);
            nodes[parts.to].edges_in.push(key);
            edge_ids.insert(edge_spec.id.clone(), key);
            edge_order.push(key);
        }
        if spec.edges.is_empty() {
            errors.push(ValidationError::EmptyNetwork);
        }

        let routes = RouteTable::compile(
            &spec.routes,
            spec.topology,
            &spec.edges,
            &edges,
            &edge_ids,
            &mut errors,
        );

        if let Some(connections) = &spec.connections {
            for connection in connections {
                if let Err(reason) = Self::check_connection(connection, &edges, &edge_ids) {
                    errors.push(ValidationError::InvalidConnection {
                        from: connection.from.clone(),
                        to: connection.to.clone(),
                        reason,
                    });
                }
            }
        }

        let total_length = match spec.topology {
            Topology::Closed => routes
                .canonical()
                .iter()
                .filter_map(|id| edge_ids.get(id.as_str()))
                .map(|key| edges[*key].length)
                .sum(),
            Topology::Open => edges.values().map(|edge| edge.length).sum(),
        };

        if !errors.is_empty() {
            log::warn!("network failed validation with {} violation(s)", errors.len());
            return Err(errors);
        }

        log::info!(
            "compiled network: {} nodes, {} edges, total length {:.2} m",
            nodes.len(),
            edges.len(),
            total_length
        );

        Ok(Network {
            topology: spec.topology,
            nodes,
            edges,
            node_ids,
            edge_ids,
            node_order,
            edge_order,
            routes,
            types: spec.types,
            connections: spec.connections,
            total_length,
        })
    }

    /// Inserts the nodes, skipping duplicates.
    fn compile_nodes(
        spec: &GeometrySpec,
        errors: &mut ValidationErrors,
    ) -> (NodeSet, HashMap<String, NodeKey>, Vec<NodeKey>) {
        let mut nodes = NodeSet::with_key();
        let mut node_ids = HashMap::new();
        let mut node_order = vec![];
        for node in &spec.nodes {
            if node_ids.contains_key(&node.id) {
                errors.push(ValidationError::DuplicateNode(node.id.clone()));
                continue;
            }
            let key = nodes.insert(Node {
                id: node.id.clone(),
                pos: Point2d::new(node.x, node.y),
                edges_out: SmallVec::new(),
                edges_in: SmallVec::new(),
            });
            node_ids.insert(node.id.clone(), key);
            node_order.push(key);
        }
        (nodes, node_ids, node_order)
    }

    /// Indexes the edge types by ID.
    fn compile_types<'a>(
        types: &'a [EdgeType],
        errors: &mut ValidationErrors,
    ) -> HashMap<&'a str, &'a EdgeType> {
        let mut index = HashMap::new();
        for edge_type in types {
            if index.contains_key(edge_type.id.as_str()) {
                errors.push(ValidationError::DuplicateType(edge_type.id.clone()));
                continue;
            }
            if edge_type.lanes == 0 {
                errors.push(ValidationError::NonPositive {
                    id: edge_type.id.clone(),
                    attribute: "lane count",
                    value: 0.0,
                });
            }
            if !is_positive(edge_type.speed_limit) {
                errors.push(ValidationError::NonPositive {
                    id: edge_type.id.clone(),
                    attribute: "speed limit",
                    value: edge_type.speed_limit,
                });
            }
            index.insert(edge_type.id.as_str(), edge_type);
        }
        index
    }

    /// Validates a single edge. Returns `None` if any violation was recorded.
    fn compile_edge(
        &self,
        spec: &EdgeSpec,
        nodes: &NodeSet,
        node_ids: &HashMap<String, NodeKey>,
        types: &HashMap<&str, &EdgeType>,
        errors: &mut ValidationErrors,
    ) -> Option<EdgeParts> {
        let before = errors.len();

        let mut lookup = |node: &str| {
            let key = node_ids.get(node).copied();
            if key.is_none() {
                errors.push(ValidationError::UnknownNode {
                    edge: spec.id.clone(),
                    node: node.to_owned(),
                });
            }
            key
        };
        let from = lookup(&spec.from);
        let to = lookup(&spec.to);

        // Inherit attributes from the edge type
        let edge_type = spec.edge_type.as_deref().and_then(|id| {
            let edge_type = types.get(id).copied();
            if edge_type.is_none() {
                errors.push(ValidationError::UnknownType {
                    edge: spec.id.clone(),
                    edge_type: id.to_owned(),
                });
            }
            edge_type
        });
        let lanes = spec.lanes.or(edge_type.map(|t| t.lanes));
        let speed_limit = spec.speed_limit.or(edge_type.map(|t| t.speed_limit));

        match lanes {
            None => errors.push(ValidationError::MissingAttribute {
                edge: spec.id.clone(),
                attribute: "lane count",
            }),
            Some(0) => errors.push(ValidationError::NonPositive {
                id: spec.id.clone(),
                attribute: "lane count",
                value: 0.0,
            }),
            Some(_) => {}
        }
        match speed_limit {
            None => errors.push(ValidationError::MissingAttribute {
                edge: spec.id.clone(),
                attribute: "speed limit",
            }),
            Some(speed) if !is_positive(speed) => errors.push(ValidationError::NonPositive {
                id: spec.id.clone(),
                attribute: "speed limit",
                value: speed,
            }),
            Some(_) => {}
        }

        let (from, to) = (from?, to?);
        let ends = [nodes[from].pos, nodes[to].pos];
        let shape = match &spec.shape {
            Some(shape) => self.check_shape(spec, shape, ends, [&spec.from, &spec.to], errors),
            None => Some(ends.to_vec()),
        };

        let length = spec
            .length
            .or_else(|| shape.as_deref().map(polyline_length));
        if let Some(length) = length {
            if !is_positive(length) {
                errors.push(ValidationError::NonPositive {
                    id: spec.id.clone(),
                    attribute: "length",
                    value: length,
                });
            }
        }

        if errors.len() > before {
            return None;
        }
        Some(EdgeParts {
            from,
            to,
            length: length?,
            lanes: lanes?,
            speed_limit: speed_limit?,
            shape: shape?,
        })
    }

    /// Checks that a shape starts and ends at the edge's nodes.
    fn check_shape(
        &self,
        spec: &EdgeSpec,
        shape: &[Point2d],
        ends: [Point2d; 2],
        node_ids: [&String; 2],
        errors: &mut ValidationErrors,
    ) -> Option<Vec<Point2d>> {
        if shape.len() < 2 {
            errors.push(ValidationError::DegenerateShape {
                edge: spec.id.clone(),
            });
            return None;
        }

        let mut valid = true;
        let shape_ends = [shape[0], shape[shape.len() - 1]];
        for ((point, end), node) in shape_ends.into_iter().zip(ends).zip(node_ids) {
            let distance = point.distance(end);
            if !(distance <= self.shape_tolerance) {
                errors.push(ValidationError::ShapeMismatch {
                    edge: spec.id.clone(),
                    node: node.clone(),
                    distance,
                });
                valid = false;
            }
        }
        valid.then(|| shape.to_vec())
    }

    /// Checks that a connection joins two meeting edges with valid lanes.
    fn check_connection(
        connection: &crate::geometry::Connection,
        edges: &EdgeSet,
        edge_ids: &HashMap<String, EdgeKey>,
    ) -> Result<(), String> {
        let lookup = |id: &str| {
            edge_ids
                .get(id)
                .map(|key| &edges[*key])
                .ok_or_else(|| format!("unknown edge `{}`", id))
        };
        let from = lookup(&connection.from)?;
        let to = lookup(&connection.to)?;
        if from.to != to.from {
            return Err("the edges do not meet".into());
        }
        if connection.from_lane >= from.lanes {
            return Err(format!("`{}` has no lane {}", from.id, connection.from_lane));
        }
        if connection.to_lane >= to.lanes {
            return Err(format!("`{}` has no lane {}", to.id, connection.to_lane));
        }
        Ok(())
    }
}

/// Returns true if the value is finite and greater than zero.
fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
