use crate::geometry::{EdgeSpec, Geometry, NodeSpec, RouteSpec, Topology};
use crate::math::{sample_points, CircularArc2d, Point2d};
use crate::network::Network;
use crate::position::{sequential_starts, EdgeStarts, LinkStart};
use crate::ConfigurationError;
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};

/// The edges of the ring, anticlockwise from the bottom, with their end nodes.
const EDGES: [(&str, &str, &str); 4] = [
    ("bottom", "bottom", "right"),
    ("right", "right", "top"),
    ("top", "top", "left"),
    ("left", "left", "bottom"),
];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RingParams {
    /// The radius of the ring in m.
    pub radius: f64,
    pub lanes: u32,
    /// The speed limit in m/s.
    pub speed_limit: f64,
    /// The number of points sampled along each quarter.
    #[serde(default = "super::default_resolution")]
    pub resolution: usize,
}

impl RingParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        super::positive("radius", self.radius)?;
        super::lane_count("lanes", self.lanes)?;
        super::positive("speed_limit", self.speed_limit)?;
        super::resolution(self.resolution)
    }
}

/// A single closed ring road, made of four quarter-circle edges.
#[derive(Clone, Debug)]
pub struct Ring {
    params: RingParams,
}

impl Ring {
    pub fn new(params: RingParams) -> Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parses and validates the parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn params(&self) -> &RingParams {
        &self.params
    }

    /// The length of each quarter of the ring.
    pub fn edge_length(&self) -> f64 {
        self.params.radius * FRAC_PI_2
    }
}

impl Geometry for Ring {
    fn topology(&self) -> Topology {
        Topology::Closed
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        let r = self.params.radius;
        vec![
            NodeSpec::new("bottom", 0.0, -r),
            NodeSpec::new("right", r, 0.0),
            NodeSpec::new("top", 0.0, r),
            NodeSpec::new("left", -r, 0.0),
        ]
    }

    fn edges(&self) -> Vec<EdgeSpec> {
        let centre = Point2d::new(0.0, 0.0);
        EDGES
            .iter()
            .enumerate()
            .map(|(i, (id, from, to))| {
                let start = -FRAC_PI_2 + i as f64 * FRAC_PI_2;
                let arc = CircularArc2d::new(centre, self.params.radius, start, start + FRAC_PI_2);
                EdgeSpec::new(*id, *from, *to)
                    .with_length(self.edge_length())
                    .with_lanes(self.params.lanes)
                    .with_speed_limit(self.params.speed_limit)
                    .with_shape(sample_points(&arc, self.params.resolution))
            })
            .collect()
    }

    fn routes(&self) -> Vec<RouteSpec> {
        RouteSpec::rotations(&EDGES.map(|(id, _, _)| id))
    }
}

impl EdgeStarts for Ring {
    fn edge_starts(&self, network: &Network) -> Vec<(String, f64)> {
        sequential_starts(network)
    }

    /// The junctions at each node, where the previous quarter ends.
    fn internal_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        let length = self.edge_length();
        EDGES
            .iter()
            .enumerate()
            .map(|(i, (id, _, _))| LinkStart::new(format!(":{}_0", id), i as f64 * length))
            .collect()
    }
}
