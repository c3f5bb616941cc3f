//! The render surface seam.
//!
//! The canvas never paints. Everything it needs from the host (repaint
//! requests, cursors, image decoding, rasterizing crops, DOM mirrors for
//! embedded elements, transient overlays) goes through `RenderSurface`.

use atelier_core::id::ObjectId;
use atelier_core::model::{CropRegion, SceneObject};
use kurbo::{Point, Rect, Size};
use serde::Serialize;

/// Handle for an in-flight image decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LoadTicket(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cursor {
    Default,
    Pointer,
    Move,
    Grab,
    Grabbing,
    Crosshair,
}

impl Cursor {
    pub fn as_css(self) -> &'static str {
        match self {
            Cursor::Default => "default",
            Cursor::Pointer => "pointer",
            Cursor::Move => "move",
            Cursor::Grab => "grab",
            Cursor::Grabbing => "grabbing",
            Cursor::Crosshair => "crosshair",
        }
    }
}

/// A guide segment in canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuideLine {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl GuideLine {
    pub fn vertical(x: f64, y1: f64, y2: f64) -> Self {
        Self { x1: x, y1, x2: x, y2 }
    }

    pub fn horizontal(y: f64, x1: f64, x2: f64) -> Self {
        Self { x1, y1: y, x2, y2: y }
    }
}

/// Screen-space placement of a DOM-mirrored element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElementFrame {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    /// Degrees.
    pub angle: f64,
}

/// Transient drawing state that is not part of the document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub guides: Vec<GuideLine>,
    pub marquee: Option<[f64; 4]>,
    pub crop: Option<[f64; 4]>,
    /// Polygon vertices placed so far, plus the rubber-band end.
    pub polygon: Vec<[f64; 2]>,
    /// Provisional link: start and pointer.
    pub provisional_link: Option<[f64; 4]>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        *self == Overlay::default()
    }
}

pub(crate) fn rect_coords(rect: Rect) -> [f64; 4] {
    [rect.x0, rect.y0, rect.width(), rect.height()]
}

pub(crate) fn point_coords(p: Point) -> [f64; 2] {
    [p.x, p.y]
}

pub trait RenderSurface {
    /// Schedule a repaint. Cheap; may be called many times per frame.
    fn request_render(&mut self);

    fn set_cursor(&mut self, _cursor: Cursor) {}

    /// Canvas element size in screen pixels.
    fn viewport_size(&self) -> Size;

    /// Start decoding `src`. The host answers with
    /// `Canvas::complete_image_load(ticket, ..)`.
    fn decode_image(&mut self, _ticket: LoadTicket, _src: &str) {}

    /// Rasterize `region` (source pixels) of `image`, returning the new
    /// image source. `None` leaves the source as is.
    fn rasterize(&mut self, _image: &SceneObject, _region: CropRegion) -> Option<String> {
        None
    }

    /// Create or reposition the DOM node mirroring an element object.
    fn mirror_element(&mut self, _obj: &SceneObject, _frame: ElementFrame) {}

    fn remove_element(&mut self, _id: ObjectId) {}

    fn set_overlay(&mut self, _overlay: &Overlay) {}
}

/// Headless surface.
#[derive(Debug, Clone)]
pub struct NullSurface {
    size: Size,
}

impl NullSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
        }
    }
}

impl RenderSurface for NullSurface {
    fn request_render(&mut self) {}

    fn viewport_size(&self) -> Size {
        self.size
    }
}

/// Calls seen by a `RecordingSurface`.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Render,
    Cursor(Cursor),
    Decode(LoadTicket, String),
    Rasterize(ObjectId, CropRegion),
    Mirror(ObjectId, ElementFrame),
    RemoveElement(ObjectId),
    Overlay(Overlay),
}

/// Surface that records every call, shared through an `Rc` so a test can
/// keep a handle after moving the surface into the canvas.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    size: Size,
    calls: std::rc::Rc<std::cell::RefCell<Vec<SurfaceCall>>>,
    /// Source returned from `rasterize`.
    pub raster_src: Option<String>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: Size::new(width, height),
            calls: Default::default(),
            raster_src: Some("data:image/png;base64,cropped".into()),
        }
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Tickets requested so far, oldest first.
    pub fn decode_requests(&self) -> Vec<(LoadTicket, String)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                SurfaceCall::Decode(t, src) => Some((*t, src.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn last_overlay(&self) -> Option<Overlay> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            SurfaceCall::Overlay(o) => Some(o.clone()),
            _ => None,
        })
    }

    fn push(&self, call: SurfaceCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RenderSurface for RecordingSurface {
    fn request_render(&mut self) {
        self.push(SurfaceCall::Render);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.push(SurfaceCall::Cursor(cursor));
    }

    fn viewport_size(&self) -> Size {
        self.size
    }

    fn decode_image(&mut self, ticket: LoadTicket, src: &str) {
        self.push(SurfaceCall::Decode(ticket, src.to_string()));
    }

    fn rasterize(&mut self, image: &SceneObject, region: CropRegion) -> Option<String> {
        self.push(SurfaceCall::Rasterize(image.id, region));
        self.raster_src.clone()
    }

    fn mirror_element(&mut self, obj: &SceneObject, frame: ElementFrame) {
        self.push(SurfaceCall::Mirror(obj.id, frame));
    }

    fn remove_element(&mut self, id: ObjectId) {
        self.push(SurfaceCall::RemoveElement(id));
    }

    fn set_overlay(&mut self, overlay: &Overlay) {
        self.push(SurfaceCall::Overlay(overlay.clone()));
    }
}
