//! JSON interchange for scene documents.
//!
//! Export is dataless: each object is serialized to its property bag and
//! then filtered down to an allow-list, so render-time state (interactivity
//! flags that depend on the current mode) never leaks into documents.
//! Group children are filtered the same way.

use crate::error::{EditorError, EditorResult};
use crate::factory::construct;
use crate::model::SceneObject;
use serde_json::{Map, Value};

/// Keys every exported object keeps.
pub const EXPORT_ALLOW_LIST: &[&str] = &[
    // identity
    "id",
    "name",
    "type",
    // geometry
    "left",
    "top",
    "width",
    "height",
    "scaleX",
    "scaleY",
    "angle",
    "originX",
    "originY",
    // appearance
    "fill",
    "stroke",
    "strokeWidth",
    "opacity",
    "shadow",
    "visible",
    "locked",
    // metadata
    "animation",
    "tooltip",
    "trigger",
    "userProperty",
    "link",
    // kind payloads
    "layout",
    "src",
    "shape",
    "rx",
    "ry",
    "objects",
    "crop",
    "text",
    "fontSize",
    "fontFamily",
    "fontWeight",
    "textAlign",
    "points",
    "html",
    "css",
    "js",
    "autoplay",
    "muted",
    "loop",
    "nodeClazz",
    "description",
    "configuration",
    "icon",
    "inPortType",
    "outPortType",
    "outPorts",
    "broadcastCount",
    "error",
    "errorMessage",
    "fromNode",
    "fromPort",
    "toNode",
    "toPort",
    "fromPortIndex",
    "lineStyle",
    "x1",
    "y1",
    "x2",
    "y2",
];

/// Serialize one object to its filtered property bag.
pub fn export_object(obj: &SceneObject, extra: &[String]) -> EditorResult<Value> {
    let value = serde_json::to_value(obj)?;
    Ok(filter_bag(value, extra))
}

fn filter_bag(value: Value, extra: &[String]) -> Value {
    let Value::Object(bag) = value else {
        return value;
    };
    let mut out = Map::new();
    for (key, value) in bag {
        let keep = EXPORT_ALLOW_LIST.contains(&key.as_str()) || extra.iter().any(|e| *e == key);
        if !keep {
            continue;
        }
        let value = if key == "objects" {
            match value {
                Value::Array(children) => Value::Array(
                    children.into_iter().map(|c| filter_bag(c, extra)).collect(),
                ),
                other => other,
            }
        } else {
            value
        };
        out.insert(key, value);
    }
    Value::Object(out)
}

/// Serialize objects, in order, to a JSON array.
pub fn export_objects<'a>(
    objects: impl IntoIterator<Item = &'a SceneObject>,
    extra: &[String],
) -> EditorResult<Value> {
    let bags = objects
        .into_iter()
        .map(|obj| export_object(obj, extra))
        .collect::<EditorResult<Vec<_>>>()?;
    Ok(Value::Array(bags))
}

/// Parse a document: either a bare array of property bags or an object
/// with an `objects` array. The workarea, if present, comes back first.
pub fn parse_document(json: &str) -> EditorResult<Vec<SceneObject>> {
    let value: Value = serde_json::from_str(json)?;
    parse_document_value(value)
}

pub fn parse_document_value(value: Value) -> EditorResult<Vec<SceneObject>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("objects") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(EditorError::InvalidOperation(
                    "document has no `objects` array".into(),
                ));
            }
        },
        _ => {
            return Err(EditorError::InvalidOperation(
                "document must be an array or an object".into(),
            ));
        }
    };
    let mut objects = items
        .into_iter()
        .map(construct)
        .collect::<EditorResult<Vec<_>>>()?;
    if let Some(pos) = objects.iter().position(SceneObject::is_workarea) {
        let workarea = objects.remove(pos);
        objects.insert(0, workarea);
    }
    Ok(objects)
}
