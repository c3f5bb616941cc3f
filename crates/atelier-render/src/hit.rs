//! Hit testing: point → object / port lookup.
//!
//! Walks the render list back to front (last painted = topmost) and tests
//! each object against its real outline: rotated boxes, ellipses, polygon
//! vertices and link paths.

use crate::bounds::object_bounds;
use crate::path::{distance_to, link_path};
use atelier_core::graph::PortGraph;
use atelier_core::id::ObjectId;
use atelier_core::model::{ObjectKind, SceneObject, ShapeKind};
use atelier_core::port::{PORT_RADIUS, PortId};
use kurbo::{BezPath, Ellipse, Point, Rect, Shape};

/// Extra slack around a link's stroke.
const LINK_TOLERANCE: f64 = 4.0;

/// Find the topmost evented object at `point` (canvas space).
/// Returns `None` when nothing but the background is hit.
pub fn hit_test(objects: &[SceneObject], point: Point) -> Option<ObjectId> {
    hit_test_filtered(objects, point, |_| true)
}

/// Like `hit_test`, skipping objects `accept` rejects.
pub fn hit_test_filtered(
    objects: &[SceneObject],
    point: Point,
    accept: impl Fn(&SceneObject) -> bool,
) -> Option<ObjectId> {
    objects
        .iter()
        .rev()
        .filter(|obj| obj.flags.evented && obj.appearance.visible && !obj.is_workarea())
        .filter(|obj| accept(obj))
        .find(|obj| contains(obj, point))
        .map(|obj| obj.id)
}

/// Does the object's outline contain `point`?
pub fn contains(obj: &SceneObject, point: Point) -> bool {
    let g = &obj.geometry;
    match &obj.kind {
        ObjectKind::Link(link) => {
            let path = link_path(
                Point::new(link.x1, link.y1),
                Point::new(link.x2, link.y2),
                link.line_style,
            );
            distance_to(&path, point) <= obj.appearance.stroke_width / 2.0 + LINK_TOLERANCE
        }
        ObjectKind::Shape(shape) if matches!(shape.shape, ShapeKind::Circle | ShapeKind::Ellipse) => {
            let size = g.scaled_size();
            let local = g.transform().inverse() * point;
            let ellipse = Ellipse::new(
                Point::new(size.width / 2.0, size.height / 2.0),
                (size.width / 2.0, size.height / 2.0),
                0.0,
            );
            ellipse.contains(local)
        }
        ObjectKind::Polygon(poly) if poly.points.len() >= 3 => {
            let local = g.transform().inverse() * point;
            let mut path = BezPath::new();
            for (i, p) in poly.points.iter().enumerate() {
                let p = Point::new(p.x * g.scale_x, p.y * g.scale_y);
                if i == 0 {
                    path.move_to(p);
                } else {
                    path.line_to(p);
                }
            }
            path.close_path();
            path.contains(local)
        }
        _ => g.contains(point),
    }
}

/// Find all evented objects whose bounds intersect `rect`.
/// Used for marquee (box) selection.
pub fn hit_test_rect(objects: &[SceneObject], rect: Rect) -> Vec<ObjectId> {
    objects
        .iter()
        .filter(|obj| obj.flags.evented && obj.flags.selectable && !obj.is_workarea())
        .filter(|obj| {
            let b = object_bounds(obj);
            !b.intersect(rect).is_zero_area() || rect.contains(b.origin())
        })
        .map(|obj| obj.id)
        .collect()
}

/// The port nearest to `point` within the hit radius, if any.
pub fn hit_port(graph: &PortGraph, point: Point) -> Option<PortId> {
    graph
        .ports()
        .map(|port| (port.id, port.position.distance(point)))
        .filter(|(_, d)| *d <= PORT_RADIUS)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::geometry::Geometry;
    use atelier_core::model::{PolyPoint, PolygonProps, ShapeProps};

    fn rect(id: &str, left: f64, top: f64, w: f64, h: f64) -> SceneObject {
        SceneObject::new(
            ObjectId::intern(id),
            ObjectKind::Shape(ShapeProps::default()),
            Geometry::new(left, top, w, h),
        )
    }

    #[test]
    fn hit_test_basic() {
        let objects = vec![rect("h_a", 10.0, 10.0, 100.0, 100.0), rect("h_b", 200.0, 200.0, 50.0, 50.0)];
        assert_eq!(hit_test(&objects, Point::new(50.0, 50.0)), Some(ObjectId::intern("h_a")));
        assert_eq!(hit_test(&objects, Point::new(220.0, 220.0)), Some(ObjectId::intern("h_b")));
        assert_eq!(hit_test(&objects, Point::new(150.0, 150.0)), None);
    }

    #[test]
    fn topmost_wins_and_non_evented_is_skipped() {
        let mut objects = vec![rect("t_under", 0.0, 0.0, 100.0, 100.0), rect("t_over", 0.0, 0.0, 100.0, 100.0)];
        assert_eq!(hit_test(&objects, Point::new(5.0, 5.0)), Some(ObjectId::intern("t_over")));
        objects[1].flags.evented = false;
        assert_eq!(hit_test(&objects, Point::new(5.0, 5.0)), Some(ObjectId::intern("t_under")));
    }

    #[test]
    fn circle_corners_miss() {
        let mut circle = rect("h_circle", 0.0, 0.0, 100.0, 100.0);
        circle.kind = ObjectKind::Shape(ShapeProps {
            shape: ShapeKind::Circle,
            ..Default::default()
        });
        assert!(contains(&circle, Point::new(50.0, 50.0)));
        assert!(!contains(&circle, Point::new(3.0, 3.0)));
    }

    #[test]
    fn polygon_uses_vertices() {
        let mut tri = rect("h_tri", 0.0, 0.0, 100.0, 100.0);
        tri.kind = ObjectKind::Polygon(PolygonProps {
            points: vec![
                PolyPoint { x: 0.0, y: 0.0 },
                PolyPoint { x: 100.0, y: 0.0 },
                PolyPoint { x: 0.0, y: 100.0 },
            ],
        });
        assert!(contains(&tri, Point::new(10.0, 10.0)));
        assert!(!contains(&tri, Point::new(90.0, 90.0)));
    }

    #[test]
    fn marquee_collects_intersecting() {
        let objects = vec![rect("m_a", 0.0, 0.0, 10.0, 10.0), rect("m_b", 100.0, 100.0, 10.0, 10.0)];
        let hits = hit_test_rect(&objects, Rect::new(5.0, 5.0, 50.0, 50.0));
        assert_eq!(hits, vec![ObjectId::intern("m_a")]);
    }
}
