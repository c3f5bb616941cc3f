//! Single-slot clipboard payload.
//!
//! The copied selection is stored as MessagePack bytes, so later edits to
//! the source objects never reach what was copied. Pasting decodes a fresh
//! deep copy every time.

use crate::error::{EditorError, EditorResult};
use crate::model::SceneObject;
use kurbo::Point;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Payload {
    objects: Vec<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct Clipboard {
    bytes: Vec<u8>,
    /// Left/top of the selection when it was copied.
    origin: Point,
    /// Left/top of the most recent paste (starts at `origin`).
    anchor: Point,
    count: usize,
}

impl Clipboard {
    /// Snapshot `objects`. `anchor` is the selection's left/top.
    pub fn capture(objects: &[SceneObject], anchor: Point) -> EditorResult<Self> {
        if objects.is_empty() {
            return Err(EditorError::Clipboard("nothing to copy".into()));
        }
        // Property bags rather than typed structs: flattened serde
        // structs need a self-describing map encoding.
        let bags = objects
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let payload = Payload { objects: bags };
        let bytes = rmp_serde::to_vec_named(&payload)
            .map_err(|e| EditorError::Clipboard(e.to_string()))?;
        Ok(Self {
            bytes,
            origin: anchor,
            anchor,
            count: objects.len(),
        })
    }

    /// Decode a fresh deep copy of the stored objects.
    pub fn restore(&self) -> EditorResult<Vec<SceneObject>> {
        let payload: Payload = rmp_serde::from_slice(&self.bytes)
            .map_err(|e| EditorError::Clipboard(e.to_string()))?;
        payload
            .objects
            .into_iter()
            .map(|bag| serde_json::from_value(bag).map_err(EditorError::from))
            .collect()
    }

    pub fn anchor(&self) -> Point {
        self.anchor
    }

    /// Displacement for the next paste: the last paste position plus
    /// `offset`, relative to where the objects were copied. Advances the
    /// anchor so repeated pastes cascade.
    pub fn next_paste_shift(&mut self, offset: kurbo::Vec2) -> kurbo::Vec2 {
        self.anchor += offset;
        self.anchor - self.origin
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry;
    use crate::id::ObjectId;
    use crate::model::{ObjectKind, TextProps};

    #[test]
    fn restore_is_independent_of_source() {
        let mut obj = SceneObject::new(
            ObjectId::intern("clip_text"),
            ObjectKind::Text(TextProps::default()),
            Geometry::new(5.0, 5.0, 100.0, 20.0),
        );
        let clip = Clipboard::capture(std::slice::from_ref(&obj), Point::new(5.0, 5.0)).unwrap();
        obj.geometry.left = 999.0;

        let restored = clip.restore().unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored[0].geometry.left, 5.0);
        assert_eq!(restored[0].id, obj.id);
    }

    #[test]
    fn pastes_cascade_from_the_last_paste() {
        let obj = SceneObject::new(
            ObjectId::intern("clip_cascade"),
            ObjectKind::Text(TextProps::default()),
            Geometry::new(40.0, 40.0, 100.0, 20.0),
        );
        let mut clip = Clipboard::capture(&[obj], Point::new(40.0, 40.0)).unwrap();
        let offset = kurbo::Vec2::new(10.0, 10.0);
        assert_eq!(clip.next_paste_shift(offset), kurbo::Vec2::new(10.0, 10.0));
        assert_eq!(clip.next_paste_shift(offset), kurbo::Vec2::new(20.0, 20.0));
        assert_eq!(clip.anchor(), Point::new(60.0, 60.0));
    }

    #[test]
    fn empty_selection_is_rejected() {
        assert!(Clipboard::capture(&[], Point::ZERO).is_err());
    }
}
