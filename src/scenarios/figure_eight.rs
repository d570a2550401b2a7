use crate::geometry::{EdgeSpec, Geometry, NodeSpec, RouteSpec, Topology};
use crate::math::{sample_points, CircularArc2d, Point2d};
use crate::network::Network;
use crate::position::{EdgeStarts, LinkStart};
use crate::ConfigurationError;
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};

/// The edges in driving order, from the bottom of the crossing.
const CYCLE: [&str; 6] = ["bottom", "top", "upper_ring", "right", "left", "lower_ring"];

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FigureEightParams {
    /// The radius of each loop in m.
    pub radius: f64,
    pub lanes: u32,
    /// The speed limit in m/s.
    pub speed_limit: f64,
    /// The number of points sampled along each loop.
    #[serde(default = "super::default_resolution")]
    pub resolution: usize,
}

impl FigureEightParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        super::positive("radius", self.radius)?;
        super::lane_count("lanes", self.lanes)?;
        super::positive("speed_limit", self.speed_limit)?;
        super::resolution(self.resolution)
    }
}

/// Two three-quarter loops joined by straight roads which cross at the centre.
///
/// Vehicles drive up through the centre, clockwise round the upper loop, left
/// through the centre and anticlockwise round the lower loop.
#[derive(Clone, Debug)]
pub struct FigureEight {
    params: FigureEightParams,
}

impl FigureEight {
    pub fn new(params: FigureEightParams) -> Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parses and validates the parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn params(&self) -> &FigureEightParams {
        &self.params
    }

    /// The length of one loop.
    pub fn ring_length(&self) -> f64 {
        1.5 * PI * self.params.radius
    }

    fn edge_length(&self, id: &str) -> f64 {
        match id {
            "upper_ring" | "lower_ring" => self.ring_length(),
            _ => self.params.radius,
        }
    }

    /// The start offset of each edge along the cycle.
    fn offsets(&self) -> Vec<(&'static str, f64)> {
        let mut offset = 0.0;
        CYCLE
            .iter()
            .map(|id| {
                let start = offset;
                offset += self.edge_length(id);
                (*id, start)
            })
            .collect()
    }

    fn offset(&self, id: &str) -> f64 {
        self.offsets()
            .into_iter()
            .find(|(edge, _)| *edge == id)
            .map_or(0.0, |(_, offset)| offset)
    }
}

impl Geometry for FigureEight {
    fn topology(&self) -> Topology {
        Topology::Closed
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        let r = self.params.radius;
        vec![
            NodeSpec::new("center", 0.0, 0.0),
            NodeSpec::new("bottom", 0.0, -r),
            NodeSpec::new("top", 0.0, r),
            NodeSpec::new("left", -r, 0.0),
            NodeSpec::new("right", r, 0.0),
        ]
    }

    fn edges(&self) -> Vec<EdgeSpec> {
        let (r, resolution) = (self.params.radius, self.params.resolution);
        let upper = CircularArc2d::new(Point2d::new(r, r), r, PI, -FRAC_PI_2);
        let lower = CircularArc2d::new(Point2d::new(-r, -r), r, FRAC_PI_2, 2.0 * PI);
        let edge = |id: &str, from: &str, to: &str| {
            EdgeSpec::new(id, from, to)
                .with_length(self.edge_length(id))
                .with_lanes(self.params.lanes)
                .with_speed_limit(self.params.speed_limit)
        };
        vec![
            edge("bottom", "bottom", "center"),
            edge("top", "center", "top"),
            edge("upper_ring", "top", "right").with_shape(sample_points(&upper, resolution)),
            edge("right", "right", "center"),
            edge("left", "center", "left"),
            edge("lower_ring", "left", "bottom").with_shape(sample_points(&lower, resolution)),
        ]
    }

    fn routes(&self) -> Vec<RouteSpec> {
        RouteSpec::rotations(&CYCLE)
    }
}

impl EdgeStarts for FigureEight {
    fn edge_starts(&self, _network: &Network) -> Vec<(String, f64)> {
        self.offsets()
            .into_iter()
            .map(|(id, offset)| (id.to_owned(), offset))
            .collect()
    }

    /// The junctions where each loop meets a straight road.
    fn internal_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        [
            (":bottom_0", "bottom"),
            (":top_0", "upper_ring"),
            (":right_0", "right"),
            (":left_0", "lower_ring"),
        ]
        .into_iter()
        .map(|(id, edge)| LinkStart::new(id, self.offset(edge)))
        .collect()
    }

    /// The two entries into the central crossing.
    fn intersection_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        vec![
            LinkStart::new(":center_0", self.offset("top")),
            LinkStart::new(":center_1", self.offset("left")),
        ]
    }
}
