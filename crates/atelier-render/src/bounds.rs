//! Bounding rect queries.

use crate::path::{bounds as path_bounds, link_path};
use atelier_core::model::{ObjectKind, SceneObject};
use kurbo::{Point, Rect};

/// Axis-aligned canvas-space bounds of an object.
///
/// Links are measured along their path rather than their stored box.
pub fn object_bounds(obj: &SceneObject) -> Rect {
    match &obj.kind {
        ObjectKind::Link(link) => path_bounds(&link_path(
            Point::new(link.x1, link.y1),
            Point::new(link.x2, link.y2),
            link.line_style,
        )),
        _ => obj.geometry.bounding_rect(),
    }
}

/// Union of the bounds of every object, or `None` for an empty set.
pub fn union_bounds<'a>(objects: impl IntoIterator<Item = &'a SceneObject>) -> Option<Rect> {
    objects
        .into_iter()
        .map(object_bounds)
        .reduce(|acc, r| acc.union(r))
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::geometry::Geometry;
    use atelier_core::id::ObjectId;
    use atelier_core::model::ShapeProps;

    #[test]
    fn union_of_two_boxes() {
        let a = SceneObject::new(
            ObjectId::intern("ub_a"),
            ObjectKind::Shape(ShapeProps::default()),
            Geometry::new(0.0, 0.0, 10.0, 10.0),
        );
        let b = SceneObject::new(
            ObjectId::intern("ub_b"),
            ObjectKind::Shape(ShapeProps::default()),
            Geometry::new(20.0, 30.0, 10.0, 10.0),
        );
        assert_eq!(union_bounds([&a, &b]), Some(Rect::new(0.0, 0.0, 30.0, 40.0)));
        assert_eq!(union_bounds(std::iter::empty()), None);
    }
}
