//! `RenderSurface` backed by JavaScript callbacks.
//!
//! The host registers functions by name (`requestRender`, `setCursor`,
//! `decodeImage`, `rasterize`, `mirrorElement`, `removeElement`,
//! `setOverlay`). Missing callbacks are skipped; a callback that throws is
//! logged and otherwise ignored.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use atelier_core::id::ObjectId;
use atelier_core::model::{CropRegion, SceneObject};
use atelier_editor::{Cursor, ElementFrame, LoadTicket, Overlay, RenderSurface};
use js_sys::Function;
use kurbo::Size;
use serde::Serialize;
use wasm_bindgen::JsValue;

pub const CALLBACK_NAMES: &[&str] = &[
    "requestRender",
    "setCursor",
    "decodeImage",
    "rasterize",
    "mirrorElement",
    "removeElement",
    "setOverlay",
];

/// Callback table shared between the bridge (which registers) and the
/// surface owned by the canvas (which calls).
#[derive(Default)]
pub struct Callbacks {
    table: HashMap<&'static str, Function>,
    size: Size,
}

impl Callbacks {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            table: HashMap::new(),
            size: Size::new(width, height),
        }
    }

    /// Returns `false` for names the surface never calls.
    pub fn register(&mut self, name: &str, callback: Function) -> bool {
        match CALLBACK_NAMES.iter().find(|n| **n == name) {
            Some(name) => {
                self.table.insert(name, callback);
                true
            }
            None => {
                log::warn!("unknown surface callback {name:?}");
                false
            }
        }
    }

    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = Size::new(width, height);
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        let callback = self.table.get(name)?;
        let result = match args {
            [] => callback.call0(&JsValue::NULL),
            [a] => callback.call1(&JsValue::NULL, a),
            [a, b] => callback.call2(&JsValue::NULL, a, b),
            [a, b, c, ..] => callback.call3(&JsValue::NULL, a, b, c),
        };
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("surface callback {name} threw: {e:?}");
                None
            }
        }
    }
}

pub struct JsSurface {
    callbacks: Rc<RefCell<Callbacks>>,
}

impl JsSurface {
    pub fn new(callbacks: Rc<RefCell<Callbacks>>) -> Self {
        Self { callbacks }
    }

    fn call(&self, name: &str, args: &[JsValue]) -> Option<JsValue> {
        self.callbacks.borrow().call(name, args)
    }
}

fn json_arg(value: &impl Serialize) -> JsValue {
    match serde_json::to_string(value) {
        Ok(json) => JsValue::from_str(&json),
        Err(e) => {
            log::error!("surface payload did not serialize: {e}");
            JsValue::NULL
        }
    }
}

impl RenderSurface for JsSurface {
    fn request_render(&mut self) {
        self.call("requestRender", &[]);
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.call("setCursor", &[JsValue::from_str(cursor.as_css())]);
    }

    fn viewport_size(&self) -> Size {
        self.callbacks.borrow().size
    }

    fn decode_image(&mut self, ticket: LoadTicket, src: &str) {
        // Tickets stay far below 2^53, so they round-trip through a JS number.
        let args = [JsValue::from_f64(ticket.0 as f64), JsValue::from_str(src)];
        if self.call("decodeImage", &args).is_none() {
            log::warn!("no decodeImage callback; image {src} stays pending");
        }
    }

    fn rasterize(&mut self, image: &SceneObject, region: CropRegion) -> Option<String> {
        self.call("rasterize", &[json_arg(image), json_arg(&region)])?
            .as_string()
    }

    fn mirror_element(&mut self, obj: &SceneObject, frame: ElementFrame) {
        self.call("mirrorElement", &[json_arg(obj), json_arg(&frame)]);
    }

    fn remove_element(&mut self, id: ObjectId) {
        self.call("removeElement", &[JsValue::from_str(id.as_str())]);
    }

    fn set_overlay(&mut self, overlay: &Overlay) {
        self.call("setOverlay", &[json_arg(overlay)]);
    }
}
