//! Tests on the figure eight, a closed network with a crossing.

use assert_approx_eq::assert_approx_eq;
use std::f64::consts::PI;
use traffic_topology::{
    scenarios::{FigureEight, FigureEightParams},
    LinkKind, Scenario,
};

fn scenario() -> Scenario {
    let eight = FigureEight::new(FigureEightParams {
        radius: 30.0,
        lanes: 2,
        speed_limit: 30.0,
        resolution: 40,
    })
    .unwrap();
    Scenario::build("figure_eight", &eight).unwrap()
}

#[test]
fn total_length_is_both_loops_and_crossings() {
    let scenario = scenario();
    assert_approx_eq!(scenario.total_length(), 4.0 * 30.0 + 3.0 * PI * 30.0, 1e-9);
    assert_approx_eq!(scenario.network().total_length(), scenario.total_length(), 1e-9);
}

/// Test that the crossing links sit where each straight road enters the centre.
#[test]
fn intersection_links_mark_the_crossing() {
    let scenario = scenario();
    let resolver = scenario.resolver();
    let crossings = resolver.links(LinkKind::Intersection).collect::<Vec<_>>();
    assert_eq!(crossings.len(), 2);
    assert_eq!(crossings[0].0, ":center_0");
    assert_approx_eq!(crossings[0].1, resolver.edge_start("top").unwrap());
    assert_eq!(crossings[1].0, ":center_1");
    assert_approx_eq!(crossings[1].1, resolver.edge_start("left").unwrap());

    // The crossing itself is never returned by a lookup
    let location = scenario.locate(crossings[0].1).unwrap();
    assert_eq!(location.id, "top");
    assert_eq!(location.kind, LinkKind::Edge);
    assert_eq!(resolver.links(LinkKind::Internal).count(), 4);
}

#[test]
fn routes_cross_the_centre_twice() {
    let scenario = scenario();
    let mut edge = "bottom";
    let mut visited = vec![];
    loop {
        visited.push(edge);
        edge = scenario.next_edge(edge).unwrap();
        if edge == "bottom" {
            break;
        }
    }
    assert_eq!(visited, ["bottom", "top", "upper_ring", "right", "left", "lower_ring"]);

    let network = scenario.network();
    for id in ["bottom", "right"] {
        let edge = network.edge(id).unwrap();
        assert_eq!(network.edge_end_node(edge).id(), "center");
    }
}

#[test]
fn positions_round_trip_on_loops() {
    let scenario = scenario();
    for id in ["upper_ring", "lower_ring"] {
        for pos in [0.0, 50.0, 141.0] {
            let location = scenario.locate(scenario.global_position(id, pos).unwrap()).unwrap();
            assert_eq!(location.id, id);
            assert_approx_eq!(location.pos, pos, 1e-9);
        }
    }
}

#[test]
fn loop_shapes_sample_on_the_circle() {
    let scenario = scenario();
    let edge = scenario.network().edge("upper_ring").unwrap();
    let (point, tangent) = edge.sample(0.5 * edge.length()).unwrap();
    // Halfway round the upper loop is its top right corner
    let r = 30.0;
    let expected = (r + r * (PI / 4.0).cos(), r + r * (PI / 4.0).sin());
    assert_approx_eq!(point.x, expected.0, 0.1);
    assert_approx_eq!(point.y, expected.1, 0.1);
    assert_approx_eq!((tangent.x.powi(2) + tangent.y.powi(2)).sqrt(), 1.0, 1e-9);
}
