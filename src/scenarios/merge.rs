use crate::geometry::{EdgeSpec, EdgeType, Geometry, NodeSpec, RouteSpec, Topology};
use crate::network::Network;
use crate::position::{EdgeStarts, LinkStart};
use crate::ConfigurationError;
use serde::Deserialize;
use std::f64::consts::FRAC_PI_4;

/// The length of the edges vehicles enter the network on, in m.
pub const INFLOW_EDGE_LEN: f64 = 100.0;

/// The angle at which the on-ramp meets the highway.
const MERGE_ANGLE: f64 = FRAC_PI_4;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeParams {
    /// The length of highway before the on-ramp joins, in m.
    pub pre_merge_length: f64,
    /// The length of highway after the on-ramp joins, in m.
    pub post_merge_length: f64,
    /// The length of the on-ramp, in m.
    pub merge_length: f64,
    pub highway_lanes: u32,
    pub merge_lanes: u32,
    /// The speed limit in m/s.
    pub speed_limit: f64,
}

impl MergeParams {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        super::positive("pre_merge_length", self.pre_merge_length)?;
        super::positive("post_merge_length", self.post_merge_length)?;
        super::positive("merge_length", self.merge_length)?;
        super::lane_count("highway_lanes", self.highway_lanes)?;
        super::lane_count("merge_lanes", self.merge_lanes)?;
        super::positive("speed_limit", self.speed_limit)
    }
}

/// A straight highway joined by a single on-ramp.
///
/// ```text
///  inflow_highway    left       center
/// ---------------> -------> * -------->
///                         /
///              bottom   /
///                     /
///     inflow_merge  /
/// ```
#[derive(Clone, Debug)]
pub struct Merge {
    params: MergeParams,
}

impl Merge {
    pub fn new(params: MergeParams) -> Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Parses and validates the parameters from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        Self::new(serde_json::from_str(json)?)
    }

    pub fn params(&self) -> &MergeParams {
        &self.params
    }

    /// The global position at which the on-ramp joins the highway.
    pub fn merge_point(&self) -> f64 {
        INFLOW_EDGE_LEN + self.params.pre_merge_length
    }

    /// The global position of the start of the on-ramp section.
    fn ramp_start(&self) -> f64 {
        self.merge_point() + self.params.post_merge_length + INFLOW_EDGE_LEN
    }
}

impl Geometry for Merge {
    fn topology(&self) -> Topology {
        Topology::Open
    }

    fn nodes(&self) -> Vec<NodeSpec> {
        let p = &self.params;
        let (sin, cos) = MERGE_ANGLE.sin_cos();
        let ramp = p.merge_length + INFLOW_EDGE_LEN;
        vec![
            NodeSpec::new("inflow_highway", -INFLOW_EDGE_LEN, 0.0),
            NodeSpec::new("left", 0.0, 0.0),
            NodeSpec::new("center", p.pre_merge_length, 0.0),
            NodeSpec::new("right", p.pre_merge_length + p.post_merge_length, 0.0),
            NodeSpec::new("inflow_merge", p.pre_merge_length - ramp * cos, -ramp * sin),
            NodeSpec::new(
                "bottom",
                p.pre_merge_length - p.merge_length * cos,
                -p.merge_length * sin,
            ),
        ]
    }

    /// Edges are straight, so their lengths follow from the node positions.
    fn edges(&self) -> Vec<EdgeSpec> {
        vec![
            EdgeSpec::new("inflow_highway", "inflow_highway", "left").with_type("highway"),
            EdgeSpec::new("left", "left", "center").with_type("highway"),
            EdgeSpec::new("center", "center", "right").with_type("highway"),
            EdgeSpec::new("inflow_merge", "inflow_merge", "bottom").with_type("merge"),
            EdgeSpec::new("bottom", "bottom", "center").with_type("merge"),
        ]
    }

    fn routes(&self) -> Vec<RouteSpec> {
        vec![
            RouteSpec::new("inflow_highway", ["inflow_highway", "left", "center"]),
            RouteSpec::new("left", ["left", "center"]),
            RouteSpec::new("center", ["center"]),
            RouteSpec::new("inflow_merge", ["inflow_merge", "bottom", "center"]),
            RouteSpec::new("bottom", ["bottom", "center"]),
        ]
    }

    fn types(&self) -> Vec<EdgeType> {
        vec![
            EdgeType::new("highway", self.params.highway_lanes, self.params.speed_limit),
            EdgeType::new("merge", self.params.merge_lanes, self.params.speed_limit),
        ]
    }
}

impl EdgeStarts for Merge {
    /// The highway is laid out first, followed by the on-ramp.
    fn edge_starts(&self, _network: &Network) -> Vec<(String, f64)> {
        let p = &self.params;
        vec![
            ("inflow_highway".into(), 0.0),
            ("left".into(), INFLOW_EDGE_LEN),
            ("center".into(), self.merge_point()),
            ("inflow_merge".into(), self.merge_point() + p.post_merge_length),
            ("bottom".into(), self.ramp_start()),
        ]
    }

    fn internal_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        vec![
            LinkStart::new(":left_0", INFLOW_EDGE_LEN),
            LinkStart::new(":bottom_0", self.ramp_start()),
        ]
    }

    fn intersection_edge_starts(&self, _network: &Network) -> Vec<LinkStart> {
        vec![LinkStart::new(":center_0", self.merge_point())]
    }
}
