//! Flat descriptions of a compiled network, as consumed by a traffic simulator.

use super::Network;
use crate::math::Point2d;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// The number of decimal places written for shape coordinates.
pub const SHAPE_PRECISION: usize = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDescriptor {
    pub id: String,
    pub from: String,
    pub to: String,
    pub length: f64,
    pub num_lanes: u32,
    /// The speed limit in m/s.
    pub speed: f64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none", default)]
    pub edge_type: Option<String>,
    /// See [format_shape].
    pub shape: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDescriptor {
    pub id: String,
    pub num_lanes: u32,
    pub speed: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDescriptor {
    pub from: String,
    pub to: String,
    pub from_lane: u32,
    pub to_lane: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// The starting edge.
    pub id: String,
    pub edges: Vec<String>,
}

/// Every descriptor of a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescriptors {
    pub nodes: Vec<NodeDescriptor>,
    pub edges: Vec<EdgeDescriptor>,
    pub types: Vec<TypeDescriptor>,
    /// `None` when the simulator should infer connections itself.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub connections: Option<Vec<ConnectionDescriptor>>,
    pub routes: Vec<RouteDescriptor>,
}

impl NetworkDescriptors {
    pub fn to_json(&self) -> serde_json::Value {
        // Descriptors contain no maps with non-string keys, so this cannot fail
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// Formats a shape as space-separated `x,y` pairs with [SHAPE_PRECISION] decimals.
pub fn format_shape(points: &[Point2d]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", format_coord(p.x), format_coord(p.y)))
        .join(" ")
}

fn format_coord(value: f64) -> String {
    let scale = 10f64.powi(SHAPE_PRECISION as i32);
    let rounded = (value * scale).round() / scale;
    // Avoid writing "-0.00"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", SHAPE_PRECISION, rounded)
}

/// Parses a shape written by [format_shape].
pub fn parse_shape(shape: &str) -> Option<Vec<Point2d>> {
    shape
        .split_whitespace()
        .map(|pair| {
            let (x, y) = pair.split_once(',')?;
            Some(Point2d::new(x.parse().ok()?, y.parse().ok()?))
        })
        .collect()
}

impl Network {
    /// Describes the network for a simulator.
    pub fn descriptors(&self) -> NetworkDescriptors {
        let nodes = self
            .iter_nodes()
            .map(|node| NodeDescriptor {
                id: node.id().to_owned(),
                x: node.pos().x,
                y: node.pos().y,
            })
            .collect();

        let edges = self
            .iter_edges()
            .map(|edge| EdgeDescriptor {
                id: edge.id().to_owned(),
                from: self.edge_start_node(edge).id().to_owned(),
                to: self.edge_end_node(edge).id().to_owned(),
                length: edge.length(),
                num_lanes: edge.lanes(),
                speed: edge.speed_limit(),
                edge_type: edge.edge_type().map(str::to_owned),
                shape: format_shape(edge.shape()),
            })
            .collect();

        let types = self
            .types()
            .iter()
            .map(|ty| TypeDescriptor {
                id: ty.id.clone(),
                num_lanes: ty.lanes,
                speed: ty.speed_limit,
            })
            .collect();

        let connections = self.connections().map(|connections| {
            connections
                .iter()
                .map(|c| ConnectionDescriptor {
                    from: c.from.clone(),
                    to: c.to.clone(),
                    from_lane: c.from_lane,
                    to_lane: c.to_lane,
                })
                .collect()
        });

        let routes = self
            .routes()
            .iter()
            .map(|(start, edges)| RouteDescriptor {
                id: start.to_owned(),
                edges: edges.to_vec(),
            })
            .collect();

        NetworkDescriptors {
            nodes,
            edges,
            types,
            connections,
            routes,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::geometry::{Connection, EdgeSpec, EdgeType, GeometrySpec, NodeSpec, RouteSpec};
    use crate::TopologyBuilder;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn shapes_use_two_decimals() {
        let shape = [
            Point2d::new(0.0, -40.0),
            Point2d::new(1.005_1, 2.0 / 3.0),
            Point2d::new(-0.001, -1e-12),
        ];
        assert_eq!(format_shape(&shape), "0.00,-40.00 1.01,0.67 0.00,0.00");
        assert_eq!(format_shape(&[]), "");
    }

    #[test]
    fn shapes_parse_back() {
        let points = parse_shape("0.00,-40.00  1.50,2.25").unwrap();
        assert_eq!(points.len(), 2);
        assert_approx_eq!(points[1].x, 1.5);
        assert_approx_eq!(points[1].y, 2.25);

        assert!(parse_shape("1.0").is_none());
        assert!(parse_shape("a,b").is_none());
        assert_eq!(parse_shape("").unwrap(), vec![]);
    }

    #[test]
    fn describes_compiled_network() {
        let spec = GeometrySpec {
            nodes: vec![
                NodeSpec::new("a", 0.0, 0.0),
                NodeSpec::new("b", 30.0, 40.0),
                NodeSpec::new("c", 60.0, 80.0),
            ],
            edges: vec![
                EdgeSpec::new("ab", "a", "b").with_type("road"),
                EdgeSpec::new("bc", "b", "c").with_type("road").with_lanes(1),
            ],
            routes: vec![RouteSpec::new("ab", ["ab", "bc"]), RouteSpec::new("bc", ["bc"])],
            types: vec![EdgeType::new("road", 2, 15.0)],
            connections: Some(vec![Connection::new("ab", "bc", 1, 0)]),
            ..Default::default()
        };
        let network = TopologyBuilder::new().compile(&spec).unwrap();
        let descriptors = network.descriptors();

        assert_eq!(descriptors.nodes.len(), 3);
        let edge = &descriptors.edges[0];
        assert_eq!(edge.from, "a");
        assert_eq!(edge.to, "b");
        assert_approx_eq!(edge.length, 50.0);
        assert_eq!(edge.num_lanes, 2);
        assert_eq!(edge.edge_type.as_deref(), Some("road"));
        assert_eq!(edge.shape, "0.00,0.00 30.00,40.00");
        assert_eq!(descriptors.edges[1].num_lanes, 1);
        assert_eq!(descriptors.routes[0].edges, ["ab", "bc"]);

        let json = descriptors.to_json();
        assert_eq!(json["edges"][0]["numLanes"], 2);
        assert_eq!(json["edges"][0]["type"], "road");
        assert_eq!(json["types"][0]["speed"], 15.0);
        assert_eq!(json["connections"][0]["fromLane"], 1);
        assert_eq!(json["connections"][0]["toLane"], 0);
        assert_eq!(json["routes"][0]["id"], "ab");
    }

    #[test]
    fn untyped_edges_omit_type() {
        let spec = GeometrySpec {
            nodes: vec![NodeSpec::new("a", 0.0, 0.0), NodeSpec::new("b", 10.0, 0.0)],
            edges: vec![EdgeSpec::new("ab", "a", "b").with_lanes(1).with_speed_limit(5.0)],
            routes: vec![RouteSpec::new("ab", ["ab"])],
            ..Default::default()
        };
        let json = TopologyBuilder::new().compile(&spec).unwrap().descriptors().to_json();
        assert!(json["edges"][0].get("type").is_none());
        assert!(json.get("connections").is_none());
    }
}
