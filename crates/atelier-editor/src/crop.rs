//! Image cropping session.
//!
//! A session owns the crop rectangle while crop mode is active. The
//! rectangle starts at the image's bounds and can only shrink or move
//! inside them. Each of the eight handles pins the opposite side.

use atelier_core::id::ObjectId;
use atelier_core::model::{CropRegion, Flags, SceneObject};
use kurbo::{Point, Rect, Vec2};

/// Smallest crop edge in canvas units.
pub const MIN_CROP: f64 = 10.0;

/// Handle hit tolerance in canvas units.
pub const HANDLE_TOLERANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    /// Drag inside the rectangle.
    Move,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CropSession {
    pub target: ObjectId,
    /// Image bounds when the session started.
    pub bounds: Rect,
    pub rect: Rect,
    /// Interactivity of the image before cropping, restored on exit.
    pub saved_flags: Flags,
    drag: Option<(CropHandle, Point)>,
}

impl CropSession {
    /// Start on an image. Anything else is refused.
    pub fn start(image: &mut SceneObject) -> Option<Self> {
        image.as_image()?;
        let bounds = image.geometry.bounding_rect();
        let saved_flags = image.flags;
        image.flags.selectable = false;
        image.flags.evented = false;
        Some(Self {
            target: image.id,
            bounds,
            rect: bounds,
            saved_flags,
            drag: None,
        })
    }

    pub fn handle_at(&self, point: Point) -> Option<CropHandle> {
        let r = self.rect;
        let near = |a: f64, b: f64| (a - b).abs() <= HANDLE_TOLERANCE;
        let (cx, cy) = (r.center().x, r.center().y);
        let candidates = [
            (CropHandle::TopLeft, Point::new(r.x0, r.y0)),
            (CropHandle::Top, Point::new(cx, r.y0)),
            (CropHandle::TopRight, Point::new(r.x1, r.y0)),
            (CropHandle::Right, Point::new(r.x1, cy)),
            (CropHandle::BottomRight, Point::new(r.x1, r.y1)),
            (CropHandle::Bottom, Point::new(cx, r.y1)),
            (CropHandle::BottomLeft, Point::new(r.x0, r.y1)),
            (CropHandle::Left, Point::new(r.x0, cy)),
        ];
        candidates
            .into_iter()
            .find(|(_, p)| near(p.x, point.x) && near(p.y, point.y))
            .map(|(h, _)| h)
            .or_else(|| r.contains(point).then_some(CropHandle::Move))
    }

    /// Pointer down. Returns whether a handle (or the body) was grabbed.
    pub fn begin_drag(&mut self, point: Point) -> bool {
        self.drag = self.handle_at(point).map(|h| (h, point));
        self.drag.is_some()
    }

    /// Pointer move while dragging.
    pub fn drag_to(&mut self, point: Point) -> bool {
        let Some((handle, last)) = self.drag else {
            return false;
        };
        match handle {
            CropHandle::Move => self.moving(point - last),
            _ => self.resize(handle, point),
        }
        self.drag = Some((handle, point));
        true
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Move an edge (or corner) of the rectangle to `point`, keeping the
    /// opposite side pinned and the rectangle inside the image.
    pub fn resize(&mut self, handle: CropHandle, point: Point) {
        let b = self.bounds;
        let mut r = self.rect;
        let moves_left = matches!(
            handle,
            CropHandle::TopLeft | CropHandle::Left | CropHandle::BottomLeft
        );
        let moves_right = matches!(
            handle,
            CropHandle::TopRight | CropHandle::Right | CropHandle::BottomRight
        );
        let moves_top = matches!(
            handle,
            CropHandle::TopLeft | CropHandle::Top | CropHandle::TopRight
        );
        let moves_bottom = matches!(
            handle,
            CropHandle::BottomLeft | CropHandle::Bottom | CropHandle::BottomRight
        );
        if moves_left {
            r.x0 = point.x.min(r.x1 - MIN_CROP).max(b.x0);
        }
        if moves_right {
            r.x1 = point.x.max(r.x0 + MIN_CROP).min(b.x1);
        }
        if moves_top {
            r.y0 = point.y.min(r.y1 - MIN_CROP).max(b.y0);
        }
        if moves_bottom {
            r.y1 = point.y.max(r.y0 + MIN_CROP).min(b.y1);
        }
        self.rect = r;
    }

    /// Translate the rectangle, clamped so it stays inside the image.
    pub fn moving(&mut self, delta: Vec2) {
        let b = self.bounds;
        let r = self.rect;
        let dx = delta.x.max(b.x0 - r.x0).min(b.x1 - r.x1);
        let dy = delta.y.max(b.y0 - r.y0).min(b.y1 - r.y1);
        self.rect = r + Vec2::new(dx, dy);
    }

    /// Source-pixel region of the current rectangle. `existing` is the
    /// crop already applied to the image, if any.
    pub fn region(&self, scale: Vec2, existing: Option<CropRegion>) -> CropRegion {
        let base = existing.unwrap_or_default();
        let sx = if scale.x > 0.0 { scale.x } else { 1.0 };
        let sy = if scale.y > 0.0 { scale.y } else { 1.0 };
        CropRegion {
            x: base.x + (self.rect.x0 - self.bounds.x0) / sx,
            y: base.y + (self.rect.y0 - self.bounds.y0) / sy,
            width: self.rect.width() / sx,
            height: self.rect.height() / sy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::geometry::Geometry;
    use atelier_core::model::{ImageProps, ObjectKind, ShapeProps};
    use pretty_assertions::assert_eq;

    fn image() -> SceneObject {
        SceneObject::new(
            ObjectId::intern("crop_img"),
            ObjectKind::Image(ImageProps::default()),
            Geometry::new(100.0, 100.0, 200.0, 100.0),
        )
    }

    #[test]
    fn only_images_can_be_cropped() {
        let mut shape = SceneObject::new(
            ObjectId::intern("crop_shape"),
            ObjectKind::Shape(ShapeProps::default()),
            Geometry::default(),
        );
        assert!(CropSession::start(&mut shape).is_none());
        let mut img = image();
        let session = CropSession::start(&mut img).unwrap();
        assert!(!img.flags.evented);
        assert!(session.saved_flags.evented);
    }

    #[test]
    fn corner_handle_pins_opposite_corner() {
        let mut img = image();
        let mut s = CropSession::start(&mut img).unwrap();
        s.resize(CropHandle::TopLeft, Point::new(150.0, 50.0));
        assert_eq!(s.rect, Rect::new(150.0, 100.0, 300.0, 200.0));
        s.resize(CropHandle::BottomRight, Point::new(155.0, 400.0));
        assert_eq!(s.rect, Rect::new(150.0, 100.0, 160.0, 200.0));
    }

    #[test]
    fn moving_stays_inside_the_image() {
        let mut img = image();
        let mut s = CropSession::start(&mut img).unwrap();
        s.resize(CropHandle::Right, Point::new(200.0, 0.0));
        s.moving(Vec2::new(500.0, -30.0));
        assert_eq!(s.rect, Rect::new(200.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn drag_picks_handles_then_body() {
        let mut img = image();
        let mut s = CropSession::start(&mut img).unwrap();
        assert_eq!(s.handle_at(Point::new(102.0, 149.0)), Some(CropHandle::Left));
        assert_eq!(s.handle_at(Point::new(200.0, 150.0)), Some(CropHandle::Move));
        assert!(s.begin_drag(Point::new(300.0, 200.0)));
        assert!(s.drag_to(Point::new(250.0, 180.0)));
        s.end_drag();
        assert_eq!(s.rect, Rect::new(100.0, 100.0, 250.0, 180.0));
        assert!(!s.drag_to(Point::new(0.0, 0.0)));
    }

    #[test]
    fn region_is_in_source_pixels() {
        let mut img = image();
        img.geometry.scale_x = 2.0;
        img.geometry.scale_y = 2.0;
        let mut s = CropSession::start(&mut img).unwrap();
        s.resize(CropHandle::TopLeft, Point::new(140.0, 120.0));
        let region = s.region(Vec2::new(2.0, 2.0), Some(CropRegion {
            x: 5.0,
            y: 5.0,
            width: 0.0,
            height: 0.0,
        }));
        assert_eq!(region, CropRegion {
            x: 25.0,
            y: 15.0,
            width: 180.0,
            height: 90.0,
        });
    }
}
