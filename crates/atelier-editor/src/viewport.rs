//! Viewport transform: zoom and pan.
//!
//! The transform maps canvas space to screen space. Only uniform zoom is
//! supported, so the zoom ratio is the `a` coefficient of the affine.

use atelier_core::geometry::Geometry;
use kurbo::{Affine, Point, Size, Vec2};

/// Zoom step for zoom in / zoom out.
pub const ZOOM_STEP: f64 = 0.05;

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    transform: Affine,
    min_zoom: f64,
    max_zoom: f64,
}

impl Viewport {
    /// `bounds` is `(min, max)` as ratios (1.0 = 100%).
    pub fn new(bounds: (f64, f64)) -> Self {
        Self {
            transform: Affine::IDENTITY,
            min_zoom: bounds.0,
            max_zoom: bounds.1,
        }
    }

    pub fn transform(&self) -> Affine {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    /// `[a, b, c, d, e, f]`, the layout hosts exchange.
    pub fn coeffs(&self) -> [f64; 6] {
        self.transform.as_coeffs()
    }

    pub fn zoom(&self) -> f64 {
        self.transform.as_coeffs()[0]
    }

    pub fn clamp(&self, ratio: f64) -> f64 {
        ratio.clamp(self.min_zoom, self.max_zoom)
    }

    pub fn reset(&mut self) {
        self.transform = Affine::IDENTITY;
    }

    pub fn to_canvas(&self, screen: Point) -> Point {
        self.transform.inverse() * screen
    }

    pub fn to_screen(&self, canvas: Point) -> Point {
        self.transform * canvas
    }

    /// Zoom to `ratio` (clamped) keeping the canvas point under `screen`
    /// fixed. Returns the applied ratio.
    pub fn zoom_to_point(&mut self, screen: Point, ratio: f64) -> f64 {
        let ratio = self.clamp(ratio);
        let before = self.to_canvas(screen);
        let [_, b, c, _, e, f] = self.transform.as_coeffs();
        let scaled = Affine::new([ratio, b, c, ratio, e, f]);
        let after = scaled * before;
        let fix = screen - after;
        self.transform = Affine::new([ratio, b, c, ratio, e + fix.x, f + fix.y]);
        ratio
    }

    /// Pan by a screen-space delta.
    pub fn relative_pan(&mut self, delta: Vec2) {
        self.transform = Affine::translate(delta) * self.transform;
    }

    /// Screen point at the middle of a viewport of `size`.
    pub fn visual_center(size: Size) -> Point {
        Point::new(size.width / 2.0, size.height / 2.0)
    }

    /// Screen-space bounds of an object, used to place DOM mirrors.
    pub fn screen_frame(&self, geometry: &Geometry) -> (Point, Size) {
        let zoom = self.zoom();
        let top_left = self.to_screen(geometry.top_left());
        let size = geometry.scaled_size();
        (top_left, Size::new(size.width * zoom, size.height * zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn zoom_keeps_the_anchor_fixed() {
        let mut vp = Viewport::new((0.3, 3.0));
        let anchor = Point::new(200.0, 100.0);
        let under = vp.to_canvas(anchor);
        assert_eq!(vp.zoom_to_point(anchor, 2.0), 2.0);
        let back = vp.to_screen(under);
        assert!((back - anchor).hypot() < 1e-9);
    }

    #[test]
    fn zoom_is_clamped_to_bounds() {
        let mut vp = Viewport::new((0.3, 3.0));
        assert_eq!(vp.zoom_to_point(Point::ZERO, 10.0), 3.0);
        assert_eq!(vp.zoom_to_point(Point::ZERO, 0.01), 0.3);
        assert_eq!(vp.zoom(), 0.3);
    }

    #[test]
    fn pan_moves_screen_not_canvas() {
        let mut vp = Viewport::new((0.3, 3.0));
        vp.zoom_to_point(Point::ZERO, 2.0);
        vp.relative_pan(Vec2::new(15.0, -5.0));
        assert_eq!(vp.zoom(), 2.0);
        assert_eq!(vp.to_screen(Point::new(10.0, 10.0)), Point::new(35.0, 15.0));
    }

    #[test]
    fn frames_scale_with_zoom() {
        let mut vp = Viewport::new((0.3, 3.0));
        vp.zoom_to_point(Point::ZERO, 2.0);
        let g = Geometry::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(
            vp.screen_frame(&g),
            (Point::new(20.0, 40.0), Size::new(200.0, 100.0))
        );
    }
}
