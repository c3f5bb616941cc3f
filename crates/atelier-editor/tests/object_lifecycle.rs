//! Integration tests: object lifecycle on the canvas (atelier-editor).
//!
//! Add, remove, duplicate, clipboard, property patches, grouping and
//! image loading, driven through the public `Canvas` API.

use atelier_core::config::EditorConfig;
use atelier_core::id::ObjectId;
use atelier_editor::surface::SurfaceCall;
use atelier_editor::{Alignment, Canvas, EditorEvent, RecordingSurface, TransactionKind};
use kurbo::Size;
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn canvas() -> Canvas {
    init_logs();
    Canvas::headless(EditorConfig::default(), 1000.0, 800.0)
}

fn shape(canvas: &mut Canvas, id: &str, left: f64, top: f64) -> ObjectId {
    canvas
        .add(
            json!({ "type": "shape", "id": id, "left": left, "top": top, "width": 100, "height": 50 }),
            false,
        )
        .expect("shape added")
}

fn position(canvas: &Canvas, id: &str) -> (f64, f64) {
    let g = &canvas.find_by_id(id).expect("object exists").geometry;
    (g.left, g.top)
}

// ─── Adding ─────────────────────────────────────────────────────────────

#[test]
fn add_emits_added_and_one_history_step() {
    let mut c = canvas();
    let id = shape(&mut c, "lc_add", 10.0, 20.0);

    assert_eq!(c.get_objects().len(), 1);
    assert!(c.can_undo());
    assert_eq!(c.drain_events(), vec![
        EditorEvent::Added { id },
        EditorEvent::Transaction {
            kind: TransactionKind::Record,
            description: "add".into(),
        },
    ]);
}

#[test]
fn centered_add_lands_in_the_middle_of_the_view() {
    let mut c = canvas();
    let id = c
        .add(json!({ "type": "shape", "id": "lc_center", "width": 100, "height": 50 }), true)
        .unwrap();
    let g = &c.get(id).unwrap().geometry;
    assert_eq!((g.left, g.top), (450.0, 375.0));
}

#[test]
fn duplicate_ids_and_bad_descriptors_are_refused() {
    let mut c = canvas();
    shape(&mut c, "lc_dup_id", 0.0, 0.0);
    assert!(c.add(json!({ "type": "shape", "id": "lc_dup_id" }), false).is_none());
    assert!(c.add(json!({ "type": "spaceship" }), false).is_none());
    assert!(c.add(json!({ "type": "workarea" }), false).is_none());
    assert_eq!(c.get_objects().len(), 1);
}

// ─── Removing ───────────────────────────────────────────────────────────

#[test]
fn remove_drops_the_selection() {
    let mut c = canvas();
    let id = shape(&mut c, "lc_remove", 0.0, 0.0);
    assert!(c.select("lc_remove"));
    c.drain_events();

    assert!(c.remove());
    assert!(c.get(id).is_none());
    assert!(c.selection().is_empty());
    let events = c.drain_events();
    assert!(events.contains(&EditorEvent::Removed { id }));
    assert!(events.contains(&EditorEvent::Selected { ids: vec![] }));
}

#[test]
fn workarea_cannot_be_removed() {
    let mut c = canvas();
    assert!(!c.remove_by_id("workarea"));
    assert!(c.workarea().is_some());
}

// ─── Duplicate / clipboard ──────────────────────────────────────────────

#[test]
fn duplicate_offsets_the_clone_and_selects_it() {
    let mut c = canvas();
    shape(&mut c, "lc_orig", 10.0, 20.0);
    c.select("lc_orig");

    let clones = c.duplicate();
    assert_eq!(clones.len(), 1);
    let clone = c.get(clones[0]).unwrap();
    assert_eq!((clone.geometry.left, clone.geometry.top), (20.0, 30.0));
    assert_eq!(clone.name.as_deref(), Some("lc_orig_clone"));
    assert_eq!(c.selection().ids(), clones.as_slice());
    assert_eq!(position(&c, "lc_orig"), (10.0, 20.0));
}

#[test]
fn repeated_paste_cascades() {
    let mut c = canvas();
    shape(&mut c, "lc_copy", 10.0, 20.0);
    c.select("lc_copy");
    assert!(c.copy());

    let first = c.paste();
    let second = c.paste();
    let at = |id: ObjectId| {
        let g = &c.get(id).unwrap().geometry;
        (g.left, g.top)
    };
    assert_eq!(at(first[0]), (20.0, 30.0));
    assert_eq!(at(second[0]), (30.0, 40.0));
    assert_ne!(first[0], second[0]);
    assert_eq!(c.selection().ids(), second.as_slice());
}

#[test]
fn cut_removes_and_paste_restores() {
    let mut c = canvas();
    shape(&mut c, "lc_cut", 10.0, 20.0);
    c.select("lc_cut");
    assert!(c.cut());
    assert!(c.get_objects().is_empty());

    let pasted = c.paste();
    assert_eq!(pasted.len(), 1);
    assert_eq!(c.get_objects().len(), 1);
}

#[test]
fn paste_without_copy_is_a_no_op() {
    let mut c = canvas();
    assert!(c.paste().is_empty());
}

// ─── Property patches ───────────────────────────────────────────────────

#[test]
fn set_writes_only_changed_keys() {
    let mut c = canvas();
    let id = shape(&mut c, "lc_set", 0.0, 0.0);
    c.drain_events();

    assert!(c.set_by_id("lc_set", "fill", json!("#ff0000")));
    assert_eq!(c.get(id).unwrap().appearance.fill.as_deref(), Some("#ff0000"));
    assert!(c.drain_events().contains(&EditorEvent::Modified { id }));

    assert!(!c.set_by_id("lc_set", "fill", json!("#ff0000")));
    assert!(c.drain_events().is_empty());
}

#[test]
fn identity_keys_cannot_be_patched() {
    let mut c = canvas();
    shape(&mut c, "lc_ident", 0.0, 0.0);
    assert!(!c.set_by_id("lc_ident", "id", json!("other")));
    assert!(!c.set_by_id("lc_ident", "type", json!("text")));
    assert!(c.find_by_id("lc_ident").is_some());
}

#[test]
fn unsafe_trigger_scripts_are_rejected() {
    let mut c = canvas();
    let id = shape(&mut c, "lc_script", 0.0, 0.0);
    c.select("lc_script");

    let unsafe_trigger = json!({ "enabled": true, "type": "script", "code": "eval('1')" });
    assert!(!c.set("trigger", unsafe_trigger));
    assert!(!c.get(id).unwrap().metadata.trigger.enabled);

    let safe_trigger = json!({ "enabled": true, "type": "script", "code": "console.log(1)" });
    assert!(c.set("trigger", safe_trigger));
    assert!(c.get(id).unwrap().metadata.trigger.enabled);
}

#[test]
fn locking_recomputes_interactivity() {
    let mut c = canvas();
    let id = shape(&mut c, "lc_lock", 0.0, 0.0);
    assert!(c.set_by_id("lc_lock", "locked", json!(true)));
    let flags = c.get(id).unwrap().flags;
    assert!(flags.lock_movement_x && flags.lock_movement_y);
    assert!(!flags.has_controls);
}

// ─── Selection / arrangement ────────────────────────────────────────────

#[test]
fn all_select_skips_locked_objects() {
    let mut c = canvas();
    let free = shape(&mut c, "lc_free", 0.0, 0.0);
    c.add(json!({ "type": "shape", "id": "lc_locked", "locked": true }), false)
        .unwrap();

    assert!(c.all_select());
    assert_eq!(c.selection().ids(), &[free]);
}

#[test]
fn bring_to_front_reorders_paint() {
    let mut c = canvas();
    let a = shape(&mut c, "lc_z_a", 0.0, 0.0);
    let b = shape(&mut c, "lc_z_b", 0.0, 0.0);
    c.select("lc_z_a");

    assert!(c.bring_to_front());
    let order: Vec<ObjectId> = c.objects().iter().map(|o| o.id).collect();
    assert_eq!(order, vec![ObjectId::workarea(), b, a]);
    assert!(!c.bring_to_front());
}

#[test]
fn align_left_moves_to_the_selection_edge() {
    let mut c = canvas();
    shape(&mut c, "lc_al_a", 10.0, 20.0);
    shape(&mut c, "lc_al_b", 200.0, 100.0);
    assert!(c.all_select());

    assert!(c.align(Alignment::Left));
    assert_eq!(position(&c, "lc_al_b"), (10.0, 100.0));
    assert!(!c.align(Alignment::Left));
}

#[test]
fn group_and_ungroup_keep_positions() {
    let mut c = canvas();
    shape(&mut c, "lc_g_a", 10.0, 20.0);
    shape(&mut c, "lc_g_b", 200.0, 100.0);
    assert!(c.all_select());

    let group = c.to_group().expect("grouped");
    assert_eq!(c.get_objects().len(), 1);
    let g = &c.get(group).unwrap().geometry;
    assert_eq!((g.left, g.top, g.width, g.height), (10.0, 20.0, 290.0, 130.0));

    let members = c.to_active_selection();
    assert_eq!(members.len(), 2);
    assert!(c.get(group).is_none());
    assert_eq!(position(&c, "lc_g_a"), (10.0, 20.0));
    assert_eq!(position(&c, "lc_g_b"), (200.0, 100.0));
    assert_eq!(c.selection().ids().len(), 2);
}

#[test]
fn nodes_cannot_be_grouped() {
    let mut c = canvas();
    shape(&mut c, "lc_ng_a", 0.0, 0.0);
    c.add(json!({ "type": "node", "id": "lc_ng_node", "left": 300 }), false)
        .unwrap();
    assert!(c.all_select());
    assert!(c.to_group().is_none());
    assert_eq!(c.get_objects().len(), 2);
}

// ─── Image loading ──────────────────────────────────────────────────────

#[test]
fn images_wait_for_their_decode() {
    init_logs();
    let surface = RecordingSurface::new(1000.0, 800.0);
    let mut c = Canvas::new(EditorConfig::default(), Box::new(surface.clone()));

    let id = c
        .add(json!({ "type": "image", "id": "lc_img", "src": "a.png" }), false)
        .unwrap();
    assert!(c.get(id).is_none());
    let requests = surface.decode_requests();
    assert_eq!(requests.len(), 1);
    let (ticket, src) = requests[0].clone();
    assert_eq!(src, "a.png");

    assert!(c.complete_image_load(ticket, Ok(Size::new(64.0, 32.0))));
    let g = &c.get(id).unwrap().geometry;
    assert_eq!((g.width, g.height), (64.0, 32.0));

    // A ticket answers once.
    assert!(!c.complete_image_load(ticket, Ok(Size::new(1.0, 1.0))));
}

#[test]
fn removing_a_pending_image_cancels_its_ticket() {
    init_logs();
    let surface = RecordingSurface::new(1000.0, 800.0);
    let mut c = Canvas::new(EditorConfig::default(), Box::new(surface.clone()));
    c.add(json!({ "type": "image", "id": "lc_img_gone", "src": "b.png" }), false)
        .unwrap();
    let (ticket, _) = surface.decode_requests()[0].clone();

    assert!(c.remove_by_id("lc_img_gone"));
    assert!(!c.complete_image_load(ticket, Ok(Size::new(10.0, 10.0))));
    assert!(c.get_objects().is_empty());
}

#[test]
fn failed_decode_drops_the_image() {
    init_logs();
    let surface = RecordingSurface::new(1000.0, 800.0);
    let mut c = Canvas::new(EditorConfig::default(), Box::new(surface.clone()));
    c.add(json!({ "type": "image", "id": "lc_img_bad", "src": "c.png" }), false)
        .unwrap();
    let (ticket, _) = surface.decode_requests()[0].clone();

    assert!(!c.complete_image_load(ticket, Err("404".into())));
    assert!(c.get_objects().is_empty());
}

#[test]
fn element_objects_are_mirrored_and_unmirrored() {
    init_logs();
    let surface = RecordingSurface::new(1000.0, 800.0);
    let mut c = Canvas::new(EditorConfig::default(), Box::new(surface.clone()));
    let id = c
        .add(json!({ "type": "iframe", "id": "lc_frame", "left": 10, "top": 10 }), false)
        .unwrap();
    assert!(
        surface
            .calls()
            .iter()
            .any(|call| matches!(call, SurfaceCall::Mirror(mirrored, _) if *mirrored == id))
    );

    assert!(c.remove_by_id("lc_frame"));
    assert!(surface.calls().contains(&SurfaceCall::RemoveElement(id)));
}
