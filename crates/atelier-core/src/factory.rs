//! Kind-keyed object construction.
//!
//! Descriptors arrive from the UI or from an imported document as JSON
//! property bags. `construct` reads the `type` tag, runs that kind's
//! constructor to fill in kind-specific defaults, then deserializes the
//! bag into a `SceneObject`. New kinds extend `KindTag` and `CONSTRUCTORS`.

use crate::error::{EditorError, EditorResult};
use crate::id::ObjectId;
use crate::model::{KindTag, SceneObject};
use serde_json::{Map, Value, json};

type Constructor = fn(&mut Map<String, Value>) -> EditorResult<()>;

const CONSTRUCTORS: &[(KindTag, Constructor)] = &[
    (KindTag::Workarea, workarea_defaults),
    (KindTag::Shape, shape_defaults),
    (KindTag::Group, group_defaults),
    (KindTag::Image, image_defaults),
    (KindTag::Text, text_defaults),
    (KindTag::Polygon, polygon_defaults),
    (KindTag::Node, node_defaults),
    (KindTag::Link, link_defaults),
    (KindTag::Element, embed_defaults),
    (KindTag::Video, embed_defaults),
    (KindTag::Iframe, embed_defaults),
];

impl KindTag {
    pub fn parse(s: &str) -> Option<KindTag> {
        CONSTRUCTORS
            .iter()
            .map(|(tag, _)| *tag)
            .find(|tag| tag.as_str() == s)
    }
}

/// Build a scene object from a JSON descriptor.
pub fn construct(descriptor: Value) -> EditorResult<SceneObject> {
    let Value::Object(mut bag) = descriptor else {
        return Err(EditorError::InvalidOperation(
            "object descriptor must be a JSON object".into(),
        ));
    };
    let tag = bag
        .get("type")
        .and_then(Value::as_str)
        .and_then(KindTag::parse)
        .ok_or_else(|| {
            EditorError::InvalidOperation(format!("unknown object type {:?}", bag.get("type")))
        })?;
    let (_, constructor) = CONSTRUCTORS
        .iter()
        .find(|(t, _)| *t == tag)
        .ok_or_else(|| EditorError::InvalidOperation(format!("no constructor for {tag:?}")))?;
    constructor(&mut bag)?;
    if !bag.get("id").is_some_and(Value::is_string) {
        bag.insert("id".into(), json!(ObjectId::fresh(tag.as_str()).as_str()));
    }
    let obj: SceneObject = serde_json::from_value(Value::Object(bag))?;
    Ok(obj)
}

fn default_size(bag: &mut Map<String, Value>, width: f64, height: f64) {
    bag.entry("width").or_insert(json!(width));
    bag.entry("height").or_insert(json!(height));
}

fn workarea_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    bag.insert("id".into(), json!(crate::id::WORKAREA_ID));
    default_size(bag, 600.0, 400.0);
    Ok(())
}

fn shape_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    default_size(bag, 100.0, 100.0);
    Ok(())
}

/// Children go through the table too, so they get their own defaults/ids.
fn group_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    let children = match bag.remove("objects") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(EditorError::InvalidOperation(
                "group `objects` must be an array".into(),
            ));
        }
        None => Vec::new(),
    };
    let mut built = Vec::with_capacity(children.len());
    for child in children {
        let obj = construct(child)?;
        built.push(serde_json::to_value(&obj)?);
    }
    bag.insert("objects".into(), Value::Array(built));
    Ok(())
}

fn image_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    // Real size arrives with the decode.
    default_size(bag, 0.0, 0.0);
    Ok(())
}

fn text_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    default_size(bag, 200.0, 40.0);
    Ok(())
}

/// Size comes from the vertex bounds.
fn polygon_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    let points = bag.get("points").and_then(Value::as_array);
    let (mut max_x, mut max_y) = (0.0_f64, 0.0_f64);
    for p in points.into_iter().flatten() {
        max_x = max_x.max(p.get("x").and_then(Value::as_f64).unwrap_or(0.0));
        max_y = max_y.max(p.get("y").and_then(Value::as_f64).unwrap_or(0.0));
    }
    default_size(bag, max_x, max_y);
    Ok(())
}

fn node_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    default_size(bag, 200.0, 40.0);
    bag.entry("fill").or_insert(json!("rgba(41, 41, 41, 0.8)"));
    bag.entry("hasControls").or_insert(json!(false));
    Ok(())
}

fn link_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    for key in ["fromNode", "fromPort", "toNode", "toPort"] {
        if !bag.get(key).is_some_and(Value::is_string) {
            return Err(EditorError::InvalidOperation(format!("link is missing `{key}`")));
        }
    }
    bag.entry("fill").or_insert(Value::Null);
    bag.entry("stroke").or_insert(json!("#442d2d"));
    bag.entry("strokeWidth").or_insert(json!(2.0));
    bag.entry("hasControls").or_insert(json!(false));
    bag.entry("hasBorders").or_insert(json!(false));
    Ok(())
}

fn embed_defaults(bag: &mut Map<String, Value>) -> EditorResult<()> {
    default_size(bag, 480.0, 270.0);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ObjectKind, ShapeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn shape_gets_defaults_and_fresh_id() {
        let obj = construct(json!({ "type": "shape", "shape": "circle" })).unwrap();
        assert!(obj.id.as_str().starts_with("shape_"));
        assert_eq!(obj.geometry.width, 100.0);
        match obj.kind {
            ObjectKind::Shape(props) => assert_eq!(props.shape, ShapeKind::Circle),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn group_children_are_constructed() {
        let obj = construct(json!({
            "type": "group",
            "objects": [{ "type": "text", "text": "hi" }, { "type": "shape", "id": "r1" }]
        }))
        .unwrap();
        let ObjectKind::Group(group) = obj.kind else {
            panic!("not a group");
        };
        assert_eq!(group.objects.len(), 2);
        assert_eq!(group.objects[1].id.as_str(), "r1");
        assert_eq!(group.objects[0].geometry.width, 200.0);
    }

    #[test]
    fn workarea_id_is_forced() {
        let obj = construct(json!({ "type": "workarea", "id": "bg" })).unwrap();
        assert!(obj.is_workarea());
    }

    #[test]
    fn polygon_size_from_points() {
        let obj = construct(json!({
            "type": "polygon",
            "points": [{ "x": 0, "y": 0 }, { "x": 40, "y": 10 }, { "x": 20, "y": 30 }]
        }))
        .unwrap();
        assert_eq!((obj.geometry.width, obj.geometry.height), (40.0, 30.0));
    }

    #[test]
    fn unknown_type_and_incomplete_link_are_rejected() {
        assert!(construct(json!({ "type": "spaceship" })).is_err());
        assert!(construct(json!({ "type": "link", "fromNode": "a" })).is_err());
        assert!(construct(json!([1, 2])).is_err());
    }
}
