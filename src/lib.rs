//! Compiles declarative road network geometry into validated networks, and
//! resolves positions on those networks into a single global coordinate.
//!
//! A [Geometry] describes nodes, edges and routes. The [TopologyBuilder] checks
//! them and produces an immutable [Network]. A [PositionResolver], built from
//! the start offsets an [EdgeStarts] implementation assigns to each link,
//! converts between `(link, distance)` pairs and global positions.

pub use cgmath;
pub use error::{
    ConfigurationError, Error, QueryError, Result, ValidationError, ValidationErrors,
};
pub use geometry::{
    Connection, EdgeSpec, EdgeType, Geometry, GeometrySpec, NodeSpec, RouteSpec, Topology,
};
pub use network::{
    format_shape, parse_shape, ConnectionDescriptor, Edge, EdgeDescriptor, Network,
    NetworkDescriptors, Node, NodeDescriptor, RouteDescriptor, TopologyBuilder, TypeDescriptor,
    SHAPE_ENDPOINT_TOLERANCE, SHAPE_PRECISION,
};
pub use position::{
    sequential_starts, EdgeStarts, InitialConfig, LinkKind, LinkStart, Location, PositionResolver,
    SequentialStarts, Spacing, StartPosition,
};
pub use route::RouteTable;
pub use scenario::Scenario;
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use util::Interval;

mod error;
mod geometry;
pub mod math;
mod network;
mod position;
mod route;
mod scenario;
pub mod scenarios;
mod util;

new_key_type! {
    /// Unique ID of a [Node].
    pub struct NodeKey;
    /// Unique ID of an [Edge].
    pub struct EdgeKey;
}

type NodeSet = SlotMap<NodeKey, Node>;
type EdgeSet = SlotMap<EdgeKey, Edge>;
