//! Tests on the closed ring road.

use assert_approx_eq::assert_approx_eq;
use std::f64::consts::PI;
use traffic_topology::{
    math::Point2d,
    scenarios::{Ring, RingParams},
    EdgeSpec, Error, GeometrySpec, LinkKind, QueryError, Scenario, TopologyBuilder, ValidationError,
};

fn ring(radius: f64) -> Ring {
    Ring::new(RingParams {
        radius,
        lanes: 1,
        speed_limit: 30.0,
        resolution: 40,
    })
    .unwrap()
}

fn scenario(radius: f64) -> Scenario {
    Scenario::build("ring", &ring(radius)).unwrap()
}

/// Test that the ring is one full circumference long, split into quarters.
#[test]
fn lengths_match_circumference() {
    for radius in [1.0, 40.0, 230.0] {
        let scenario = scenario(radius);
        assert_approx_eq!(scenario.total_length(), 2.0 * PI * radius, 1e-9);
        for edge in scenario.network().iter_edges() {
            assert_approx_eq!(edge.length(), radius * PI / 2.0, 1e-9);
        }
    }
}

/// Test the offsets of each quarter for a 40m ring.
#[test]
fn offsets_are_spaced_by_edge_length() {
    let scenario = scenario(40.0);
    let resolver = scenario.resolver();
    let expected = [("bottom", 0.0), ("right", 62.83), ("top", 125.66), ("left", 188.50)];
    for (id, offset) in expected {
        assert_approx_eq!(resolver.edge_start(id).unwrap(), offset, 1e-2);
    }
    assert_approx_eq!(scenario.total_length(), 251.33, 1e-2);
}

/// Test that converting to and from the global coordinate is lossless.
#[test]
fn positions_round_trip() {
    let scenario = scenario(40.0);
    let quarter = 20.0 * PI;
    for id in ["bottom", "right", "top", "left"] {
        for pos in [0.0, 0.5, 10.0, quarter - 0.01] {
            let global = scenario.global_position(id, pos).unwrap();
            let location = scenario.locate(global).unwrap();
            assert_eq!(location.id, id);
            assert_eq!(location.kind, LinkKind::Edge);
            assert_approx_eq!(location.pos, pos, 1e-9);
        }
    }
}

/// Test that positions beyond either end of the ring wrap around.
#[test]
fn positions_wrap_around() {
    let scenario = scenario(40.0);
    let total = scenario.total_length();

    let global = scenario.global_position("left", 70.0).unwrap();
    assert!((0.0..total).contains(&global));
    assert_approx_eq!(global, 3.0 * 20.0 * PI + 70.0 - total, 1e-9);

    for pos in [total, total + 5.0, 3.0 * total + 5.0, -total + 5.0] {
        let expected = pos.rem_euclid(total);
        let location = scenario.locate(pos).unwrap();
        let global = scenario.global_position(location.id, location.pos).unwrap();
        assert_approx_eq!(global, expected, 1e-9);
    }

    let location = scenario.locate(total).unwrap();
    assert_eq!(location.id, "bottom");
    assert_approx_eq!(location.pos, 0.0, 1e-9);

    let location = scenario.locate(-1.0).unwrap();
    assert_eq!(location.id, "left");
}

/// Test that following the routes visits every quarter and returns to the start.
#[test]
fn next_edge_cycles() {
    let scenario = scenario(40.0);
    let mut edge = "bottom";
    let mut visited = vec![];
    for _ in 0..4 {
        visited.push(edge);
        edge = scenario.next_edge(edge).unwrap();
    }
    assert_eq!(visited, ["bottom", "right", "top", "left"]);
    assert_eq!(edge, "bottom");
    assert_eq!(
        scenario.next_edge("middle"),
        Err(QueryError::UnknownEdge("middle".into()))
    );
}

/// Test that an edge referring to a missing node fails compilation.
#[test]
fn unknown_nodes_are_rejected() {
    let mut spec = GeometrySpec::from_geometry(&ring(40.0));
    spec.edges.push(EdgeSpec::new("spur", "top", "nowhere").with_lanes(1).with_speed_limit(10.0));
    let errors = TopologyBuilder::new().compile(&spec).unwrap_err();
    assert!(errors.contains(&ValidationError::UnknownNode {
        edge: "spur".into(),
        node: "nowhere".into(),
    }));
    // The spur is also covered by no route
    assert!(errors.contains(&ValidationError::UncoveredEdge("spur".into())));
    assert!(errors.to_string().contains("nowhere"));

    let scenario = Scenario::from_parts("broken", &spec, &ring(40.0));
    assert!(matches!(scenario, Err(Error::Validation(_))));
}

/// Test that every shape starts and ends at its nodes.
#[test]
fn shapes_meet_nodes() {
    let scenario = scenario(40.0);
    let network = scenario.network();
    for edge in network.iter_edges() {
        let shape = edge.shape();
        let from = network.edge_start_node(edge).pos();
        let to = network.edge_end_node(edge).pos();
        assert!(distance(shape[0], from) <= 1e-2);
        assert!(distance(shape[shape.len() - 1], to) <= 1e-2);
    }
}

/// Test that the descriptors carry shapes with exactly two decimals.
#[test]
fn descriptors_use_fixed_precision() {
    let descriptors = scenario(40.0).descriptors();
    assert_eq!(descriptors.nodes.len(), 4);
    assert_eq!(descriptors.routes.len(), 4);
    let bottom = &descriptors.edges[0];
    assert_eq!(bottom.id, "bottom");
    assert!(bottom.shape.starts_with("0.00,-40.00 "));
    assert!(bottom.shape.ends_with(" 40.00,0.00"));
    for pair in bottom.shape.split(' ') {
        for coord in pair.split(',') {
            let decimals = coord.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 2, "{}", coord);
        }
    }
}

/// Test that a scenario can be queried from many threads at once.
#[test]
fn concurrent_queries() {
    let scenario = scenario(40.0);
    let total = scenario.total_length();
    std::thread::scope(|s| {
        for i in 0..4 {
            let scenario = &scenario;
            s.spawn(move || {
                for j in 0..1000 {
                    let pos = (i * 1000 + j) as f64 * 0.37;
                    let location = scenario.locate(pos).unwrap();
                    let global = scenario.global_position(location.id, location.pos).unwrap();
                    let diff = (global - pos.rem_euclid(total)).abs();
                    assert!(diff < 1e-6 || total - diff < 1e-6, "{} resolved to {}", pos, global);
                }
            });
        }
    });
}

fn distance(a: Point2d, b: Point2d) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
