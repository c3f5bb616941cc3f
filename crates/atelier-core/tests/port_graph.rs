//! Integration tests: node layouts → port graph → topology.
//!
//! Builds ports the way the canvas does (from each node's layout
//! strategy), then wires and unwires links through `PortGraph`.

use atelier_core::geometry::Geometry;
use atelier_core::graph::{ConnectError, LinkSide, PortGraph};
use atelier_core::id::ObjectId;
use atelier_core::model::{InPortType, NodeShape, OutPortType};
use atelier_core::port::{
    BROADCAST_FROM_PORT, DEFAULT_FROM_PORT, DEFAULT_IN_PORT, NodePortLayout, Port, PortId,
    layout_for,
};
use kurbo::Point;
use pretty_assertions::assert_eq;

// ─── Helpers ─────────────────────────────────────────────────────────────

fn add_node(graph: &mut PortGraph, name: &str, left: f64, top: f64, shape: NodeShape) -> ObjectId {
    let _ = env_logger::builder().is_test(true).try_init();
    let id = ObjectId::intern(name);
    let geometry = Geometry::new(left, top, 200.0, 40.0);
    let layout = layout_for(&shape);
    let ports = layout
        .in_port(&shape)
        .into_iter()
        .chain(layout.from_ports(&shape, &geometry))
        .map(|spec| Port::new(PortId::new(id, &spec.name), spec.kind, spec.offset))
        .collect();
    graph.insert_ports(id, ports, &geometry);
    id
}

fn out(kind: OutPortType) -> NodeShape {
    NodeShape {
        out_port_type: kind,
        ..Default::default()
    }
}

fn link(name: &str) -> ObjectId {
    ObjectId::intern(name)
}

// ─── Layouts ─────────────────────────────────────────────────────────────

#[test]
fn switch_ports_split_the_bottom_edge() {
    let mut g = PortGraph::new();
    let shape = NodeShape {
        out_port_type: OutPortType::Static,
        out_ports: vec!["yes".into(), "no".into(), "maybe".into()],
        ..Default::default()
    };
    let sw = add_node(&mut g, "pg_switch", 0.0, 0.0, shape);

    let x = |name: &str| g.port(PortId::new(sw, name)).unwrap().position.x;
    assert!((x("yes") - 200.0 / 6.0).abs() < 1e-9);
    assert!((x("no") - 100.0).abs() < 1e-9);
    assert!((x("maybe") - 500.0 / 3.0).abs() < 1e-9);
    assert_eq!(g.ports_of(sw).len(), 4);
}

#[test]
fn trigger_and_sink_nodes_drop_a_side() {
    let mut g = PortGraph::new();
    let trigger = NodeShape {
        in_port_type: InPortType::None,
        ..Default::default()
    };
    let t = add_node(&mut g, "pg_trigger", 0.0, 0.0, trigger);
    let s = add_node(&mut g, "pg_sink", 0.0, 200.0, out(OutPortType::None));

    assert!(g.port(PortId::new(t, DEFAULT_IN_PORT)).is_none());
    assert!(g.port(PortId::new(t, DEFAULT_FROM_PORT)).is_some());
    assert!(g.port(PortId::new(s, DEFAULT_IN_PORT)).is_some());
    assert_eq!(g.node_ports(s).unwrap().from.len(), 0);
}

// ─── Connecting ──────────────────────────────────────────────────────────

#[test]
fn connect_errors_come_in_a_fixed_order() {
    let mut g = PortGraph::new();
    let a = add_node(&mut g, "pg_err_a", 0.0, 0.0, out(OutPortType::Single));
    let b = add_node(&mut g, "pg_err_b", 0.0, 200.0, out(OutPortType::Single));
    let a_out = PortId::new(a, DEFAULT_FROM_PORT);
    let a_in = PortId::new(a, DEFAULT_IN_PORT);
    let b_in = PortId::new(b, DEFAULT_IN_PORT);
    let b_out = PortId::new(b, DEFAULT_FROM_PORT);

    assert_eq!(
        g.can_connect(PortId::new(a, "nope"), b_in),
        Err(ConnectError::UnknownPort)
    );
    assert_eq!(g.can_connect(a_in, b_in), Err(ConnectError::NotAnOutput));
    assert_eq!(g.can_connect(a_out, b_out), Err(ConnectError::NotAnInput));
    assert_eq!(g.can_connect(a_out, a_in), Err(ConnectError::SelfLink));

    assert_eq!(g.connect(link("pg_err_l"), a_out, b_in), Ok(None));
    assert_eq!(g.can_connect(a_out, b_in), Err(ConnectError::Duplicate));
}

#[test]
fn endpoints_follow_node_moves() {
    let mut g = PortGraph::new();
    let a = add_node(&mut g, "pg_mv_a", 0.0, 0.0, out(OutPortType::Single));
    let b = add_node(&mut g, "pg_mv_b", 0.0, 200.0, out(OutPortType::Single));
    let l = link("pg_mv_l");
    g.connect(l, PortId::new(a, DEFAULT_FROM_PORT), PortId::new(b, DEFAULT_IN_PORT))
        .unwrap();
    assert_eq!(
        g.endpoints(l),
        Some((Point::new(100.0, 40.0), Point::new(100.0, 200.0)))
    );

    let touched = g.update_positions(b, &Geometry::new(300.0, 300.0, 200.0, 40.0));
    assert_eq!(touched, vec![l]);
    assert_eq!(
        g.endpoints(l),
        Some((Point::new(100.0, 40.0), Point::new(400.0, 300.0)))
    );
}

// ─── Removal ─────────────────────────────────────────────────────────────

#[test]
fn removing_a_node_side_by_side() {
    let mut g = PortGraph::new();
    let hub = add_node(&mut g, "pg_hub", 0.0, 0.0, out(OutPortType::Broadcast));
    let x = add_node(&mut g, "pg_x", 0.0, 200.0, out(OutPortType::Single));
    let y = add_node(&mut g, "pg_y", 300.0, 200.0, out(OutPortType::Single));
    let from = PortId::new(hub, BROADCAST_FROM_PORT);
    let (lx, ly) = (link("pg_lx"), link("pg_ly"));
    assert_eq!(g.connect(lx, from, PortId::new(x, DEFAULT_IN_PORT)), Ok(Some(0)));
    assert_eq!(g.connect(ly, from, PortId::new(y, DEFAULT_IN_PORT)), Ok(Some(1)));

    // x goes away: detach only the hub side of its incoming link.
    for l in g.incoming(x) {
        let detached = g.remove_link(l, Some(LinkSide::From)).unwrap();
        assert_eq!(detached.reindexed, vec![(ly, 0)]);
        assert_eq!(detached.broadcast_count, Some(1));
    }
    g.remove_node(x);

    assert_eq!(g.link_count(), 1);
    assert_eq!(g.link(ly).unwrap().from_port_index, Some(0));
    assert!(!g.is_linked(hub, x));
    assert!(g.is_linked(hub, y));
}

// ─── Topology ────────────────────────────────────────────────────────────

#[test]
fn topological_order_puts_sources_first() {
    let mut g = PortGraph::new();
    let c = add_node(&mut g, "pg_topo_c", 0.0, 400.0, out(OutPortType::None));
    let b = add_node(&mut g, "pg_topo_b", 0.0, 200.0, out(OutPortType::Single));
    let a = add_node(&mut g, "pg_topo_a", 0.0, 0.0, out(OutPortType::Single));
    g.connect(link("pg_topo_ab"), PortId::new(a, DEFAULT_FROM_PORT), PortId::new(b, DEFAULT_IN_PORT))
        .unwrap();
    g.connect(link("pg_topo_bc"), PortId::new(b, DEFAULT_FROM_PORT), PortId::new(c, DEFAULT_IN_PORT))
        .unwrap();

    assert_eq!(g.topological_order(&[c, b, a]), vec![a, b, c]);
}
