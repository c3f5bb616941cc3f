//! Object geometry: position, size, scale, rotation and origin.
//!
//! `left`/`top` locate the object's *origin point* (chosen by
//! `originX`/`originY`) in canvas space. Rotation happens around that point,
//! so every derived quantity goes through `transform()`.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginX {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OriginY {
    #[default]
    Top,
    Center,
    Bottom,
}

impl OriginX {
    fn factor(self) -> f64 {
        match self {
            OriginX::Left => 0.0,
            OriginX::Center => 0.5,
            OriginX::Right => 1.0,
        }
    }
}

impl OriginY {
    fn factor(self) -> f64 {
        match self {
            OriginY::Top => 0.0,
            OriginY::Center => 0.5,
            OriginY::Bottom => 1.0,
        }
    }
}

/// Geometric state shared by every scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Geometry {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Degrees, clockwise.
    pub angle: f64,
    pub origin_x: OriginX,
    pub origin_y: OriginY,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
            origin_x: OriginX::Left,
            origin_y: OriginY::Top,
        }
    }
}

impl Geometry {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
            ..Default::default()
        }
    }

    /// Width/height after scaling.
    pub fn scaled_size(&self) -> Size {
        Size::new(self.width * self.scale_x, self.height * self.scale_y)
    }

    /// Maps the scaled local box `(0, 0)..(sw, sh)` into canvas space.
    pub fn transform(&self) -> Affine {
        let size = self.scaled_size();
        let origin = Vec2::new(
            size.width * self.origin_x.factor(),
            size.height * self.origin_y.factor(),
        );
        Affine::translate(Vec2::new(self.left, self.top))
            * Affine::rotate(self.angle.to_radians())
            * Affine::translate(-origin)
    }

    /// Corners in canvas space: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let size = self.scaled_size();
        let t = self.transform();
        [
            t * Point::new(0.0, 0.0),
            t * Point::new(size.width, 0.0),
            t * Point::new(size.width, size.height),
            t * Point::new(0.0, size.height),
        ]
    }

    /// Axis-aligned bounding rect of the transformed box.
    pub fn bounding_rect(&self) -> Rect {
        let [a, b, c, d] = self.corners();
        Rect::from_points(a, b).union_pt(c).union_pt(d)
    }

    /// Center of the transformed box.
    pub fn center(&self) -> Point {
        let size = self.scaled_size();
        self.transform() * Point::new(size.width / 2.0, size.height / 2.0)
    }

    /// Move so the center lands on `center`, keeping size and rotation.
    pub fn set_center(&mut self, center: Point) {
        let delta = center - self.center();
        self.translate(delta);
    }

    /// Position of the top-left corner of the unrotated box.
    pub fn top_left(&self) -> Point {
        let c = self.center();
        let size = self.scaled_size();
        Point::new(c.x - size.width / 2.0, c.y - size.height / 2.0)
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.left += delta.x;
        self.top += delta.y;
    }

    pub fn position(&self) -> Point {
        Point::new(self.left, self.top)
    }

    pub fn contains(&self, point: Point) -> bool {
        let size = self.scaled_size();
        let local = self.transform().inverse() * point;
        local.x >= 0.0 && local.y >= 0.0 && local.x <= size.width && local.y <= size.height
    }
}
