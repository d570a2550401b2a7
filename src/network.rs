pub use builder::{TopologyBuilder, SHAPE_ENDPOINT_TOLERANCE};
pub use descriptor::{
    format_shape, parse_shape, ConnectionDescriptor, EdgeDescriptor, NetworkDescriptors,
    NodeDescriptor, RouteDescriptor, TypeDescriptor, SHAPE_PRECISION,
};
use crate::geometry::{Connection, EdgeType, Topology};
use crate::math::{polyline_length, sample_polyline, Point2d, Vector2d};
use crate::route::RouteTable;
use crate::{EdgeKey, EdgeSet, NodeKey, NodeSet, QueryError};
use smallvec::SmallVec;
use std::collections::HashMap;

mod builder;
mod descriptor;

/// A compiled node.
#[derive(Clone, Debug)]
pub struct Node {
    /// The node ID.
    id: String,
    /// The position of the node.
    pos: Point2d,
    /// The edges leaving this node.
    edges_out: SmallVec<[EdgeKey; 4]>,
    /// The edges arriving at this node.
    edges_in: SmallVec<[EdgeKey; 4]>,
}

/// A compiled edge, representing a directed road segment.
#[derive(Clone, Debug)]
pub struct Edge {
    /// The edge key.
    key: EdgeKey,
    /// The edge ID.
    id: String,
    /// The node the edge starts at.
    from: NodeKey,
    /// The node the edge ends at.
    to: NodeKey,
    /// The length in m.
    length: f64,
    /// The number of lanes.
    lanes: u32,
    /// The speed limit in m/s.
    speed_limit: f64,
    /// The edge type the attributes were inherited from, if any.
    edge_type: Option<String>,
    /// The centre line, from the start node to the end node.
    shape: Vec<Point2d>,
}

/// A validated, immutable road network.
///
/// Networks are created by a [TopologyBuilder] and never modified afterwards.
#[derive(Clone, Debug)]
pub struct Network {
    /// Whether the routes are closed loops.
    topology: Topology,
    /// The nodes, keyed for adjacency lookups.
    nodes: NodeSet,
    /// The edges.
    edges: EdgeSet,
    /// Node keys by ID.
    node_ids: HashMap<String, NodeKey>,
    /// Edge keys by ID.
    edge_ids: HashMap<String, EdgeKey>,
    /// Node keys in declaration order.
    node_order: Vec<NodeKey>,
    /// Edge keys in declaration order.
    edge_order: Vec<EdgeKey>,
    /// The routes.
    routes: RouteTable,
    /// The edge types.
    types: Vec<EdgeType>,
    /// Explicit lane connections, if any were given.
    connections: Option<Vec<Connection>>,
    /// The total length of the network in m.
    total_length: f64,
}

impl Node {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pos(&self) -> Point2d {
        self.pos
    }

    /// The keys of the edges leaving this node.
    pub fn edges_out(&self) -> &[EdgeKey] {
        &self.edges_out
    }

    /// The keys of the edges arriving at this node.
    pub fn edges_in(&self) -> &[EdgeKey] {
        &self.edges_in
    }
}

impl Edge {
    pub fn key(&self) -> EdgeKey {
        self.key
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The key of the node the edge starts at.
    pub fn from(&self) -> NodeKey {
        self.from
    }

    /// The key of the node the edge ends at.
    pub fn to(&self) -> NodeKey {
        self.to
    }

    /// Gets the length of the edge in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    /// Gets the speed limit in m/s.
    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    pub fn edge_type(&self) -> Option<&str> {
        self.edge_type.as_deref()
    }

    /// The control points of the edge's centre line.
    pub fn shape(&self) -> &[Point2d] {
        &self.shape
    }

    /// Samples the centre line at a distance along the edge.
    ///
    /// The declared length of an edge need not match the length of its shape
    /// polyline (a sampled arc is slightly shorter than the arc itself), so
    /// `pos` is scaled onto the polyline. Returns the point and the unit tangent.
    pub fn sample(&self, pos: f64) -> Option<(Point2d, Vector2d)> {
        let scale = polyline_length(&self.shape) / self.length;
        sample_polyline(&self.shape, pos.clamp(0.0, self.length) * scale)
    }
}

impl Network {
    /// Whether the network's routes are open or closed.
    pub fn topology(&self) -> Topology {
        self.topology
    }

    pub fn is_closed(&self) -> bool {
        self.topology == Topology::Closed
    }

    /// The total length of the network in m.
    ///
    /// For closed networks this is the length of one cycle of the canonical
    /// (first declared) route; for open networks it is the sum of all edge lengths.
    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Gets the node with the given ID.
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_ids.get(id).map(|key| &self.nodes[*key])
    }

    /// Gets the edge with the given ID.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_ids.get(id).map(|key| &self.edges[*key])
    }

    /// Gets the node with the given key.
    pub fn get_node(&self, key: NodeKey) -> Option<&Node> {
        self.nodes.get(key)
    }

    /// Gets the edge with the given key.
    pub fn get_edge(&self, key: EdgeKey) -> Option<&Edge> {
        self.edges.get(key)
    }

    /// Returns an iterator over the nodes in declaration order.
    pub fn iter_nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().map(|key| &self.nodes[*key])
    }

    /// Returns an iterator over the edges in declaration order.
    pub fn iter_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().map(|key| &self.edges[*key])
    }

    /// The edges leaving the given node.
    pub fn edges_out(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.node(node_id)
            .into_iter()
            .flat_map(|node| node.edges_out.iter())
            .map(|key| &self.edges[*key])
    }

    /// The edges arriving at the given node.
    pub fn edges_in(&self, node_id: &str) -> impl Iterator<Item = &Edge> {
        self.node(node_id)
            .into_iter()
            .flat_map(|node| node.edges_in.iter())
            .map(|key| &self.edges[*key])
    }

    /// The node an edge starts at.
    pub fn edge_start_node(&self, edge: &Edge) -> &Node {
        &self.nodes[edge.from]
    }

    /// The node an edge ends at.
    pub fn edge_end_node(&self, edge: &Edge) -> &Node {
        &self.nodes[edge.to]
    }

    /// Gets the route table.
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// The edge following `edge_id` on its route.
    pub fn next_edge(&self, edge_id: &str) -> Result<&str, QueryError> {
        self.routes.next_edge(edge_id)
    }

    pub fn types(&self) -> &[EdgeType] {
        &self.types
    }

    /// Explicit lane connections, or `None` if the simulator should infer them.
    pub fn connections(&self) -> Option<&[Connection]> {
        self.connections.as_deref()
    }

    /// Finds the shortest sequence of edges leading from the start of `from`
    /// to the end of `to`, along with its length in m.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<(Vec<&str>, f64)> {
        let src = *self.edge_ids.get(from)?;
        let dst = *self.edge_ids.get(to)?;
        let (path, _) = pathfinding::directed::dijkstra::dijkstra(
            &src,
            |key| self.successors(*key),
            |key| *key == dst,
        )?;
        let length = path.iter().map(|key| self.edges[*key].length).sum();
        let ids = path.iter().map(|key| self.edges[*key].id.as_str()).collect();
        Some((ids, length))
    }

    /// The edges which can be entered from the end of an edge,
    /// costed by the length of that edge in cm.
    fn successors(&self, key: EdgeKey) -> impl Iterator<Item = (EdgeKey, u64)> + '_ {
        let edge = &self.edges[key];
        let cost = (100.0 * edge.length).round() as u64;
        self.nodes[edge.to]
            .edges_out
            .iter()
            .map(move |next| (*next, cost))
    }
}
