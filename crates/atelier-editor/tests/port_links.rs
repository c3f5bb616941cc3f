//! Integration tests: ports, links and workflows (atelier-editor).
//!
//! Nodes carry ports rebuilt from their layout; links hang between an
//! output and an input port and follow both nodes around. These tests
//! drive the graph through the canvas the way the UI does.

use atelier_core::config::EditorConfig;
use atelier_core::id::ObjectId;
use atelier_core::port::{BROADCAST_FROM_PORT, DEFAULT_FROM_PORT, DEFAULT_IN_PORT, PortId};
use atelier_editor::{Canvas, EditorEvent, InputEvent, InteractionMode};
use kurbo::Point;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};

fn canvas() -> Canvas {
    let _ = env_logger::builder().is_test(true).try_init();
    Canvas::headless(EditorConfig::default(), 1000.0, 800.0)
}

fn node(canvas: &mut Canvas, id: &str, left: f64, top: f64) -> ObjectId {
    canvas
        .add(json!({ "type": "node", "id": id, "left": left, "top": top }), false)
        .expect("node added")
}

fn link(canvas: &mut Canvas, id: &str, from: (&str, &str), to: &str) -> Option<ObjectId> {
    canvas.add(
        json!({
            "type": "link",
            "id": id,
            "fromNode": from.0,
            "fromPort": from.1,
            "toNode": to,
            "toPort": DEFAULT_IN_PORT,
        }),
        false,
    )
}

fn endpoints(canvas: &Canvas, id: ObjectId) -> (f64, f64, f64, f64) {
    let shape = canvas.get(id).and_then(|o| o.as_link()).expect("link exists");
    (shape.x1, shape.y1, shape.x2, shape.y2)
}

fn port_position(canvas: &Canvas, node: ObjectId, name: &str) -> Point {
    canvas
        .port_graph()
        .port(PortId::new(node, name))
        .expect("port exists")
        .position
}

// ─── Ports ──────────────────────────────────────────────────────────────

#[test]
fn nodes_get_top_and_bottom_ports() {
    let mut c = canvas();
    let a = node(&mut c, "pl_ports", 0.0, 0.0);
    assert_eq!(port_position(&c, a, DEFAULT_IN_PORT), Point::new(100.0, 0.0));
    assert_eq!(port_position(&c, a, DEFAULT_FROM_PORT), Point::new(100.0, 40.0));
}

// ─── Linking ────────────────────────────────────────────────────────────

#[test]
fn link_sits_above_the_workarea_and_snaps_to_ports() {
    let mut c = canvas();
    let a = node(&mut c, "pl_a", 0.0, 0.0);
    node(&mut c, "pl_b", 0.0, 200.0);
    let l = link(&mut c, "pl_ab", ("pl_a", DEFAULT_FROM_PORT), "pl_b").unwrap();

    assert_eq!(c.objects()[1].id, l);
    assert_eq!(endpoints(&c, l), (100.0, 40.0, 100.0, 200.0));
    assert!(c.port_graph().is_linked(a, ObjectId::intern("pl_b")));
    assert!(!c.port_graph().port(PortId::new(a, DEFAULT_FROM_PORT)).unwrap().enabled);
}

#[test]
fn moving_a_node_drags_its_links() {
    let mut c = canvas();
    let a = node(&mut c, "pl_mv_a", 0.0, 0.0);
    let b = node(&mut c, "pl_mv_b", 0.0, 200.0);
    let l = link(&mut c, "pl_mv_ab", ("pl_mv_a", DEFAULT_FROM_PORT), "pl_mv_b").unwrap();

    assert!(c.set_by_id("pl_mv_a", "left", json!(100)));
    assert_eq!(port_position(&c, a, DEFAULT_FROM_PORT), Point::new(200.0, 40.0));
    assert_eq!(port_position(&c, b, DEFAULT_IN_PORT), Point::new(100.0, 200.0));
    assert_eq!(endpoints(&c, l), (200.0, 40.0, 100.0, 200.0));
}

#[test]
fn duplicate_and_self_links_are_refused() {
    let mut c = canvas();
    node(&mut c, "pl_r_a", 0.0, 0.0);
    node(&mut c, "pl_r_b", 0.0, 200.0);
    assert!(link(&mut c, "pl_r_1", ("pl_r_a", DEFAULT_FROM_PORT), "pl_r_b").is_some());
    assert!(link(&mut c, "pl_r_2", ("pl_r_a", DEFAULT_FROM_PORT), "pl_r_b").is_none());
    assert!(link(&mut c, "pl_r_3", ("pl_r_b", DEFAULT_FROM_PORT), "pl_r_b").is_none());
    assert_eq!(c.port_graph().link_count(), 1);
}

#[test]
fn link_endpoints_cannot_be_patched() {
    let mut c = canvas();
    node(&mut c, "pl_p_a", 0.0, 0.0);
    node(&mut c, "pl_p_b", 0.0, 200.0);
    node(&mut c, "pl_p_c", 300.0, 200.0);
    link(&mut c, "pl_p_ab", ("pl_p_a", DEFAULT_FROM_PORT), "pl_p_b").unwrap();

    assert!(!c.set_by_id("pl_p_ab", "toNode", json!("pl_p_c")));
    let shape = c.find_by_id("pl_p_ab").and_then(|o| o.as_link()).unwrap();
    assert_eq!(shape.to_node.as_str(), "pl_p_b");
}

// ─── Removal ────────────────────────────────────────────────────────────

#[test]
fn removing_a_node_takes_its_links() {
    let mut c = canvas();
    let a = node(&mut c, "pl_rm_a", 0.0, 0.0);
    node(&mut c, "pl_rm_b", 0.0, 200.0);
    let l = link(&mut c, "pl_rm_ab", ("pl_rm_a", DEFAULT_FROM_PORT), "pl_rm_b").unwrap();
    c.drain_events();

    assert!(c.remove_by_id("pl_rm_b"));
    assert!(c.get(l).is_none());
    assert_eq!(c.port_graph().link_count(), 0);
    assert!(c.port_graph().port(PortId::new(a, DEFAULT_FROM_PORT)).unwrap().enabled);
    let events = c.drain_events();
    assert!(events.contains(&EditorEvent::Removed { id: l }));
    assert!(events.contains(&EditorEvent::Removed { id: ObjectId::intern("pl_rm_b") }));
}

#[test]
fn broadcast_links_reindex_after_a_removal() {
    let mut c = canvas();
    let hub = c
        .add(
            json!({ "type": "node", "id": "pl_hub", "outPortType": "broadcast" }),
            false,
        )
        .unwrap();
    node(&mut c, "pl_t1", 0.0, 200.0);
    node(&mut c, "pl_t2", 300.0, 200.0);
    let l1 = link(&mut c, "pl_bc_1", ("pl_hub", BROADCAST_FROM_PORT), "pl_t1").unwrap();
    let l2 = link(&mut c, "pl_bc_2", ("pl_hub", BROADCAST_FROM_PORT), "pl_t2").unwrap();

    let index = |c: &Canvas, id| c.get(id).and_then(|o| o.as_link()).unwrap().from_port_index;
    let count = |c: &Canvas| c.get(hub).and_then(|o| o.as_node()).unwrap().broadcast_count;
    assert_eq!((index(&c, l1), index(&c, l2)), (Some(0), Some(1)));
    assert_eq!(count(&c), 2);

    assert!(c.remove_by_id("pl_bc_1"));
    assert_eq!(index(&c, l2), Some(0));
    assert_eq!(count(&c), 1);
}

// ─── Dynamic ports ──────────────────────────────────────────────────────

#[test]
fn changing_out_ports_keeps_surviving_links() {
    let mut c = canvas();
    c.add(
        json!({
            "type": "node",
            "id": "pl_sw",
            "outPortType": "dynamic",
            "outPorts": ["a", "b"],
        }),
        false,
    )
    .unwrap();
    node(&mut c, "pl_sw_t", 0.0, 200.0);
    let l = link(&mut c, "pl_sw_l", ("pl_sw", "b"), "pl_sw_t").unwrap();
    assert_eq!(endpoints(&c, l).0, 150.0);

    // "b" moves to the first slot.
    assert!(c.set_by_id("pl_sw", "outPorts", json!(["b", "c"])));
    assert_eq!(endpoints(&c, l).0, 50.0);

    // "b" is gone, so is its link.
    assert!(c.set_by_id("pl_sw", "outPorts", json!(["c"])));
    assert!(c.get(l).is_none());
    assert_eq!(c.port_graph().link_count(), 0);
}

// ─── Pointer-driven linking ─────────────────────────────────────────────

#[test]
fn dragging_from_an_output_port_draws_a_link() {
    let mut c = canvas();
    let a = node(&mut c, "pl_drag_a", 0.0, 0.0);
    let b = node(&mut c, "pl_drag_b", 0.0, 200.0);

    assert!(c.handle_event(&InputEvent::pointer_down(100.0, 40.0)));
    assert_eq!(c.interaction_mode(), InteractionMode::Link);
    assert!(c.overlay().provisional_link.is_some());

    c.handle_event(&InputEvent::pointer_move(100.0, 150.0));
    assert_eq!(c.overlay().provisional_link, Some([100.0, 40.0, 100.0, 150.0]));

    c.handle_event(&InputEvent::pointer_up(100.0, 200.0));
    assert_eq!(c.interaction_mode(), InteractionMode::Selection);
    assert!(c.overlay().provisional_link.is_none());
    assert!(c.port_graph().is_linked(a, b));
}

#[test]
fn releasing_away_from_a_port_keeps_drawing() {
    let mut c = canvas();
    node(&mut c, "pl_miss_a", 0.0, 0.0);
    c.handle_event(&InputEvent::pointer_down(100.0, 40.0));
    c.handle_event(&InputEvent::pointer_up(500.0, 500.0));
    assert_eq!(c.interaction_mode(), InteractionMode::Link);

    // A click on empty canvas ends it without a link.
    c.handle_event(&InputEvent::pointer_down(500.0, 500.0));
    assert_eq!(c.interaction_mode(), InteractionMode::Selection);
    assert_eq!(c.port_graph().link_count(), 0);
}

// ─── Workflows ──────────────────────────────────────────────────────────

#[test]
fn workflow_export_orders_nodes_by_dependency() {
    let mut c = canvas();
    node(&mut c, "pl_wf_b", 0.0, 200.0);
    node(&mut c, "pl_wf_a", 0.0, 0.0);
    link(&mut c, "pl_wf_ab", ("pl_wf_a", DEFAULT_FROM_PORT), "pl_wf_b").unwrap();

    let exported: Value = serde_json::from_str(&c.export_workflow().unwrap()).unwrap();
    let ids: Vec<&str> = exported["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|n| n["id"].as_str())
        .collect();
    assert_eq!(ids, vec!["pl_wf_a", "pl_wf_b"]);
    assert_eq!(exported["links"][0]["fromNode"], "pl_wf_a");
}

#[test]
fn workflow_export_stops_on_a_flagged_node() {
    let mut c = canvas();
    node(&mut c, "pl_wf_bad", 0.0, 0.0);
    assert!(c.set_by_id("pl_wf_bad", "error", json!(true)));
    assert!(c.export_workflow().is_err());
}

#[test]
fn workflow_import_rebuilds_the_graph() {
    let mut c = canvas();
    let doc = json!({
        "nodes": [
            { "id": "pl_in_a", "nodeClazz": "Source", "properties": { "left": 0, "top": 0 } },
            { "id": "pl_in_b", "nodeClazz": "Sink", "properties": { "left": 0, "top": 200 } },
        ],
        "links": [
            { "fromNode": "pl_in_a", "fromPort": DEFAULT_FROM_PORT, "toNode": "pl_in_b",
              "toPort": DEFAULT_IN_PORT, "properties": { "left": 0, "top": 0 } },
        ],
        "viewportTransform": [1.5, 0, 0, 1.5, 20, 10],
    });

    let count = c.import_workflow(&doc.to_string(), |_| None).unwrap();
    assert_eq!(count, 3);
    assert_eq!(c.zoom(), 1.5);
    assert_eq!(c.viewport_transform(), [1.5, 0.0, 0.0, 1.5, 20.0, 10.0]);
    assert!(
        c.port_graph()
            .is_linked(ObjectId::intern("pl_in_a"), ObjectId::intern("pl_in_b"))
    );
    assert!(c.drain_events().contains(&EditorEvent::Imported { count: 3 }));
}
