//! Declarative descriptions of road network geometry.
//!
//! A [Geometry] produces the nodes, edges and routes of a network from its own
//! typed parameters. The optional capabilities (edge types and connections)
//! have default implementations which produce nothing.

use crate::math::Point2d;

/// Whether the routes of a network are expected to close into loops.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Topology {
    /// Routes may end; vehicles leave the network.
    #[default]
    Open,
    /// Every route cycles back to its start edge.
    Closed,
}

/// A named point in 2D space.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeSpec {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl NodeSpec {
    pub fn new(id: impl Into<String>, x: f64, y: f64) -> Self {
        Self { id: id.into(), x, y }
    }
}

/// A directed road segment between two nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EdgeSpec {
    pub id: String,
    /// The ID of the node the edge starts at.
    pub from: String,
    /// The ID of the node the edge ends at.
    pub to: String,
    /// The length in m. Derived from the shape when absent.
    pub length: Option<f64>,
    /// The number of lanes. Inherited from the edge type when absent.
    pub lanes: Option<u32>,
    /// The speed limit in m/s. Inherited from the edge type when absent.
    pub speed_limit: Option<f64>,
    /// The ID of an [EdgeType] to inherit attributes from.
    pub edge_type: Option<String>,
    /// Control points of the centre line. A straight line between the
    /// end nodes is used when absent.
    pub shape: Option<Vec<Point2d>>,
}

impl EdgeSpec {
    pub fn new(id: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            ..Default::default()
        }
    }

    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_lanes(mut self, lanes: u32) -> Self {
        self.lanes = Some(lanes);
        self
    }

    pub fn with_speed_limit(mut self, speed_limit: f64) -> Self {
        self.speed_limit = Some(speed_limit);
        self
    }

    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = Some(edge_type.into());
        self
    }

    pub fn with_shape(mut self, shape: impl IntoIterator<Item = Point2d>) -> Self {
        self.shape = Some(shape.into_iter().collect());
        self
    }
}

/// The edges a vehicle entering the network on `start` will traverse.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteSpec {
    pub start: String,
    /// The edge sequence, beginning with `start`.
    pub edges: Vec<String>,
}

impl RouteSpec {
    pub fn new(
        start: impl Into<String>,
        edges: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            start: start.into(),
            edges: edges.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates one route per edge of a cycle, each starting at that edge
    /// and following the cycle round.
    pub fn rotations(cycle: &[&str]) -> Vec<Self> {
        (0..cycle.len())
            .map(|start| {
                let edges = cycle[start..].iter().chain(&cycle[..start]).copied();
                Self::new(cycle[start], edges)
            })
            .collect()
    }
}

/// Attributes shared by a family of edges.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeType {
    pub id: String,
    pub lanes: u32,
    /// The speed limit in m/s.
    pub speed_limit: f64,
}

impl EdgeType {
    pub fn new(id: impl Into<String>, lanes: u32, speed_limit: f64) -> Self {
        Self {
            id: id.into(),
            lanes,
            speed_limit,
        }
    }
}

/// A lane-level connection from the end of one edge to the start of another.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
    pub from: String,
    pub to: String,
    pub from_lane: u32,
    pub to_lane: u32,
}

impl Connection {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        from_lane: u32,
        to_lane: u32,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            from_lane,
            to_lane,
        }
    }
}

/// Produces the geometry of a road network.
pub trait Geometry {
    /// Whether the network's routes are closed loops.
    fn topology(&self) -> Topology;

    /// The nodes of the network.
    fn nodes(&self) -> Vec<NodeSpec>;

    /// The edges of the network.
    fn edges(&self) -> Vec<EdgeSpec>;

    /// The route followed from each starting edge.
    fn routes(&self) -> Vec<RouteSpec>;

    /// Edge types which edges may inherit lane counts and speed limits from.
    fn types(&self) -> Vec<EdgeType> {
        Vec::new()
    }

    /// Explicit lane connections.
    /// `None` leaves the simulator to infer default connections.
    fn connections(&self) -> Option<Vec<Connection>> {
        None
    }
}

/// The collected output of a [Geometry].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeometrySpec {
    pub topology: Topology,
    pub nodes: Vec<NodeSpec>,
    pub edges: Vec<EdgeSpec>,
    pub routes: Vec<RouteSpec>,
    pub types: Vec<EdgeType>,
    pub connections: Option<Vec<Connection>>,
}

impl GeometrySpec {
    /// Invokes each capability of the geometry once.
    pub fn from_geometry(geometry: &(impl Geometry + ?Sized)) -> Self {
        Self {
            topology: geometry.topology(),
            nodes: geometry.nodes(),
            edges: geometry.edges(),
            routes: geometry.routes(),
            types: geometry.types(),
            connections: geometry.connections(),
        }
    }
}

impl Geometry for GeometrySpec {
    fn topology(&self) -> Topology {
        self.topology
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        self.nodes.clone()
    }

    fn edges(&self) -> Vec<EdgeSpec> {
        self.edges.clone()
    }

    fn routes(&self) -> Vec<RouteSpec> {
        self.routes.clone()
    }

    fn types(&self) -> Vec<EdgeType> {
        self.types.clone()
    }

    fn connections(&self) -> Option<Vec<Connection>> {
        self.connections.clone()
    }
}
