//! Integration tests: parse → export → re-parse round-trip.
//!
//! Verifies that no document data is lost when converting JSON →
//! SceneObjects → JSON, for every object kind the fixture carries.

use atelier_core::id::ObjectId;
use atelier_core::model::*;
use atelier_core::serialize::{export_objects, parse_document};
use atelier_core::workflow::WorkflowDocument;
use pretty_assertions::assert_eq;

const PIPELINE: &str = include_str!("fixtures/pipeline.json");

// ─── Helpers ─────────────────────────────────────────────────────────────

fn reparse(objects: &[SceneObject]) -> Vec<SceneObject> {
    let exported = export_objects(objects, &[]).expect("export failed");
    parse_document(&exported.to_string()).expect("re-parse failed")
}

fn find<'a>(objects: &'a [SceneObject], id: &str) -> &'a SceneObject {
    let id = ObjectId::intern(id);
    objects
        .iter()
        .find(|o| o.id == id)
        .unwrap_or_else(|| panic!("@{id} missing"))
}

// ─── Fixture round-trip ──────────────────────────────────────────────────

#[test]
fn fixture_parses_with_workarea_first() {
    let objects = parse_document(PIPELINE).unwrap();
    assert_eq!(objects.len(), 9);
    assert!(objects[0].is_workarea());
    assert_eq!(objects[1].id.as_str(), "banner");
}

#[test]
fn roundtrip_preserves_ids_and_kinds() {
    let first = parse_document(PIPELINE).unwrap();
    let second = reparse(&first);

    let ids = |objs: &[SceneObject]| objs.iter().map(|o| o.id).collect::<Vec<_>>();
    assert_eq!(ids(&first), ids(&second));
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.tag(), b.tag(), "kind changed for @{}", a.id);
        assert_eq!(a.geometry, b.geometry, "geometry changed for @{}", a.id);
    }
}

#[test]
fn roundtrip_preserves_payloads() {
    let objects = reparse(&parse_document(PIPELINE).unwrap());

    let banner = find(&objects, "banner");
    assert_eq!(banner.name.as_deref(), Some("Banner"));
    assert_eq!(banner.appearance.fill.as_deref(), Some("#1e88e5"));
    assert!(banner.metadata.tooltip.enabled);

    let ObjectKind::Group(logo) = &find(&objects, "logo").kind else {
        panic!("@logo is not a group");
    };
    let children: Vec<&str> = logo.objects.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(children, vec!["logo_mark", "logo_word"]);

    let photo = find(&objects, "photo").as_image().unwrap();
    assert_eq!(photo.crop, Some(CropRegion {
        x: 10.0,
        y: 5.0,
        width: 160.0,
        height: 90.0,
    }));

    let route = find(&objects, "route").as_node().unwrap();
    assert_eq!(route.out_port_type, OutPortType::Static);
    assert_eq!(route.out_ports, vec!["ok".to_string(), "retry".to_string()]);

    let link = find(&objects, "l_ingest_archive").as_link().unwrap();
    assert_eq!(link.from_node.as_str(), "ingest");
    assert_eq!(link.from_port_index, Some(1));
    assert_eq!(link.line_style, LineStyle::Straight);
}

#[test]
fn export_keeps_mode_flags_out_of_documents() {
    let mut objects = parse_document(PIPELINE).unwrap();
    for obj in &mut objects {
        obj.flags.selectable = false;
        obj.flags.evented = false;
    }
    let exported = export_objects(&objects, &[]).unwrap();
    let banner = &exported[1];
    assert!(banner.get("selectable").is_none());
    assert!(banner.get("evented").is_none());
    assert_eq!(banner["locked"], false);
}

// ─── Workflow documents ──────────────────────────────────────────────────

#[test]
fn workflow_view_of_the_fixture() {
    let objects = parse_document(PIPELINE).unwrap();
    let order = [
        ObjectId::intern("ingest"),
        ObjectId::intern("route"),
        ObjectId::intern("archive"),
    ];
    let doc = WorkflowDocument::from_objects(&objects, &order, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
        .unwrap();
    let nodes: Vec<&str> = doc.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(nodes, vec!["ingest", "route", "archive"]);
    assert_eq!(doc.links.len(), 2);

    let reloaded = WorkflowDocument::from_json(&doc.to_json().unwrap()).unwrap();
    assert_eq!(reloaded, doc);

    let (nodes, links) = reloaded.into_objects(|clazz| {
        (clazz == "Switch").then(|| NodeShape {
            out_port_type: OutPortType::Static,
            out_ports: vec!["ok".into(), "retry".into()],
            ..Default::default()
        })
    });
    assert_eq!(nodes.len(), 3);
    assert_eq!(links.len(), 2);
    let route = nodes.iter().find(|n| n.id.as_str() == "route").unwrap();
    assert_eq!(route.as_node().unwrap().out_ports.len(), 2);
    assert_eq!(route.as_node().unwrap().node_clazz, "Switch");
}
