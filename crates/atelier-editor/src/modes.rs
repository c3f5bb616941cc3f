//! Interaction modes.
//!
//! Exactly one mode is active. Each variant carries only the transient data
//! that mode needs, so a polygon draft cannot leak into link drawing and a
//! crop session cannot outlive crop mode.

use crate::crop::CropSession;
use crate::surface::Cursor;
use atelier_core::geometry::Geometry;
use atelier_core::id::ObjectId;
use atelier_core::model::{ObjectKind, PolyPoint, PolygonProps, SceneObject};
use atelier_core::port::PortId;
use kurbo::{Point, Rect};
use serde::Serialize;

/// Per-object override used when a mode reconfigures interactivity.
pub type ObjectPredicate = dyn Fn(&SceneObject) -> bool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionMode {
    Selection,
    Grab,
    Polygon,
    Link,
    Crop,
}

impl InteractionMode {
    pub fn cursor(self) -> Cursor {
        match self {
            InteractionMode::Selection => Cursor::Default,
            InteractionMode::Grab => Cursor::Grab,
            InteractionMode::Polygon | InteractionMode::Link => Cursor::Pointer,
            InteractionMode::Crop => Cursor::Crosshair,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonDraft {
    /// Canvas-space vertices in click order.
    pub vertices: Vec<Point>,
    /// Current pointer, for the rubber-band edge.
    pub pointer: Option<Point>,
}

impl PolygonDraft {
    /// Clicking back on the first vertex closes the shape.
    pub fn closes_at(&self, point: Point, tolerance: f64) -> bool {
        self.vertices.len() >= 3
            && self
                .vertices
                .first()
                .is_some_and(|first| first.distance(point) <= tolerance)
    }

    /// Build the polygon: left/top at the vertex bounds, points relative.
    pub fn to_object(&self) -> Option<SceneObject> {
        if self.vertices.len() < 3 {
            return None;
        }
        let bounds = self
            .vertices
            .iter()
            .fold(Rect::from_points(self.vertices[0], self.vertices[0]), |r, p| {
                r.union_pt(*p)
            });
        let points = self
            .vertices
            .iter()
            .map(|p| PolyPoint {
                x: p.x - bounds.x0,
                y: p.y - bounds.y0,
            })
            .collect();
        let mut obj = SceneObject::new(
            ObjectId::fresh("polygon"),
            ObjectKind::Polygon(PolygonProps { points }),
            Geometry::new(bounds.x0, bounds.y0, bounds.width(), bounds.height()),
        );
        obj.appearance.fill = Some("rgba(0, 0, 0, 0.25)".into());
        obj.appearance.stroke = Some("rgba(0, 0, 0, 1)".into());
        Some(obj)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkDraft {
    pub from: PortId,
    pub start: Point,
    pub pointer: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Selection,
    /// `last` is the screen point of the previous drag sample.
    Grab { last: Option<Point> },
    Polygon(PolygonDraft),
    Link(LinkDraft),
    Crop(CropSession),
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Selection
    }
}

impl Mode {
    pub fn kind(&self) -> InteractionMode {
        match self {
            Mode::Selection => InteractionMode::Selection,
            Mode::Grab { .. } => InteractionMode::Grab,
            Mode::Polygon(_) => InteractionMode::Polygon,
            Mode::Link(_) => InteractionMode::Link,
            Mode::Crop(_) => InteractionMode::Crop,
        }
    }
}

/// Reconfigure one object's `selectable`/`evented` for `mode`.
///
/// The workarea is never interactive. A predicate, when given, decides
/// both flags for every other object.
pub fn configure_object(
    obj: &mut SceneObject,
    mode: InteractionMode,
    editable: bool,
    predicate: Option<&ObjectPredicate>,
) {
    if obj.is_workarea() {
        obj.flags.selectable = false;
        obj.flags.evented = false;
        return;
    }
    if let Some(predicate) = predicate {
        let on = predicate(obj);
        obj.flags.selectable = on;
        obj.flags.evented = on;
        return;
    }
    match mode {
        InteractionMode::Selection => {
            obj.flags.selectable = editable;
            obj.flags.evented = true;
        }
        InteractionMode::Grab
        | InteractionMode::Polygon
        | InteractionMode::Link
        | InteractionMode::Crop => {
            obj.flags.selectable = false;
            obj.flags.evented = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::model::ShapeProps;

    #[test]
    fn polygon_closes_on_first_vertex_only_after_three() {
        let mut draft = PolygonDraft::default();
        draft.vertices.push(Point::new(0.0, 0.0));
        draft.vertices.push(Point::new(50.0, 0.0));
        assert!(!draft.closes_at(Point::new(1.0, 1.0), 5.0));
        draft.vertices.push(Point::new(0.0, 50.0));
        assert!(draft.closes_at(Point::new(1.0, 1.0), 5.0));
        assert!(!draft.closes_at(Point::new(20.0, 20.0), 5.0));
    }

    #[test]
    fn polygon_points_are_relative_to_bounds() {
        let draft = PolygonDraft {
            vertices: vec![Point::new(10.0, 20.0), Point::new(60.0, 20.0), Point::new(10.0, 80.0)],
            pointer: None,
        };
        let obj = draft.to_object().unwrap();
        assert_eq!((obj.geometry.left, obj.geometry.top), (10.0, 20.0));
        assert_eq!((obj.geometry.width, obj.geometry.height), (50.0, 60.0));
        let ObjectKind::Polygon(props) = &obj.kind else {
            panic!("not a polygon");
        };
        assert_eq!(props.points[2], PolyPoint { x: 0.0, y: 60.0 });
    }

    #[test]
    fn modes_reconfigure_flags() {
        let mut obj = SceneObject::new(
            ObjectId::intern("mode_obj"),
            ObjectKind::Shape(ShapeProps::default()),
            Geometry::default(),
        );
        configure_object(&mut obj, InteractionMode::Grab, true, None);
        assert!(!obj.flags.selectable && !obj.flags.evented);
        configure_object(&mut obj, InteractionMode::Selection, true, None);
        assert!(obj.flags.selectable && obj.flags.evented);
        let only_nodes = |o: &SceneObject| o.as_node().is_some();
        configure_object(&mut obj, InteractionMode::Selection, true, Some(&only_nodes));
        assert!(!obj.flags.selectable);
    }
}
