//! WASM bridge for atelier: exposes the canvas controller to JavaScript.
//!
//! Compiled via `wasm-pack build --target web` and driven by the React
//! editor shell. Structured values cross the boundary as JSON strings;
//! operations that can fail answer `{"ok":true,...}` or
//! `{"ok":false,"error":"..."}`.

mod surface;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use atelier_core::config::EditorConfig;
use atelier_core::id::ObjectId;
use atelier_core::model::{NodeShape, SceneObject};
use atelier_core::port::PortId;
use atelier_editor::animation::PlayState;
use atelier_editor::{
    Alignment, Canvas, InputEvent, InteractionMode, LoadTicket, Modifiers, PointerButton,
};
use kurbo::{Point, Size, Vec2};
use serde::Serialize;
use serde_json::{Value, json};
use surface::{Callbacks, JsSurface};
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
///
/// Owns the `Canvas` and the callback table its surface calls into. All
/// interaction from the JS shell goes through this struct.
#[wasm_bindgen]
pub struct AtelierCanvas {
    canvas: Canvas,
    callbacks: Rc<RefCell<Callbacks>>,
}

#[wasm_bindgen]
impl AtelierCanvas {
    /// Create a controller for a canvas element of the given size.
    /// `config` is the editor option bag as JSON (empty for defaults).
    #[wasm_bindgen(constructor)]
    pub fn new(config: &str, width: f64, height: f64) -> Result<AtelierCanvas, JsValue> {
        console_setup();

        let config = if config.trim().is_empty() {
            EditorConfig::default()
        } else {
            EditorConfig::from_json(config).map_err(|e| JsValue::from_str(&e.to_string()))?
        };
        let callbacks = Rc::new(RefCell::new(Callbacks::new(width, height)));
        let surface = JsSurface::new(Rc::clone(&callbacks));
        Ok(Self {
            canvas: Canvas::new(config, Box::new(surface)),
            callbacks,
        })
    }

    /// Register a surface callback by name (`requestRender`, `setCursor`,
    /// `decodeImage`, `rasterize`, `mirrorElement`, `removeElement`,
    /// `setOverlay`). Returns `false` for unknown names.
    pub fn on(&mut self, name: &str, callback: js_sys::Function) -> bool {
        self.callbacks.borrow_mut().register(name, callback)
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.callbacks.borrow_mut().set_size(width, height);
        self.canvas.resize(width, height);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// `button`: 0 primary, 1 middle, 2 secondary (DOM numbering).
    /// Returns true if the scene or view changed.
    #[allow(clippy::too_many_arguments)]
    pub fn pointer_down(
        &mut self,
        x: f64,
        y: f64,
        button: u8,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let button = match button {
            1 => PointerButton::Middle,
            2 => PointerButton::Secondary,
            _ => PointerButton::Primary,
        };
        self.canvas.handle_event(&InputEvent::PointerDown {
            x,
            y,
            button,
            modifiers: modifiers(shift, ctrl, alt, meta),
        })
    }

    pub fn pointer_move(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.canvas.handle_event(&InputEvent::PointerMove {
            x,
            y,
            modifiers: modifiers(shift, ctrl, alt, meta),
        })
    }

    pub fn pointer_up(&mut self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.canvas.handle_event(&InputEvent::PointerUp {
            x,
            y,
            modifiers: modifiers(shift, ctrl, alt, meta),
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn wheel(
        &mut self,
        x: f64,
        y: f64,
        dx: f64,
        dy: f64,
        shift: bool,
        ctrl: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        self.canvas.handle_event(&InputEvent::Wheel {
            x,
            y,
            dx,
            dy,
            modifiers: modifiers(shift, ctrl, alt, meta),
        })
    }

    /// `key` is the DOM `KeyboardEvent.key` value.
    pub fn key_down(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.canvas.handle_event(&InputEvent::KeyDown {
            key: key.to_string(),
            modifiers: modifiers(shift, ctrl, alt, meta),
        })
    }

    pub fn key_up(&mut self, key: &str, shift: bool, ctrl: bool, alt: bool, meta: bool) -> bool {
        self.canvas.handle_event(&InputEvent::KeyUp {
            key: key.to_string(),
            modifiers: modifiers(shift, ctrl, alt, meta),
        })
    }

    // ─── Images ──────────────────────────────────────────────────────────

    /// Answer a `decodeImage` callback with the decoded natural size.
    pub fn complete_image_load(&mut self, ticket: f64, width: f64, height: f64) -> bool {
        self.canvas
            .complete_image_load(ticket_of(ticket), Ok(Size::new(width, height)))
    }

    /// Answer a `decodeImage` callback with a failure.
    pub fn fail_image_load(&mut self, ticket: f64, message: &str) -> bool {
        self.canvas
            .complete_image_load(ticket_of(ticket), Err(message.to_string()))
    }

    // ─── Objects ─────────────────────────────────────────────────────────

    /// Add an object from its JSON descriptor. Answers `{"ok":true,"id":..}`.
    pub fn add(&mut self, descriptor: &str, centered: bool) -> String {
        let descriptor: Value = match serde_json::from_str(descriptor) {
            Ok(v) => v,
            Err(e) => return error(e),
        };
        match self.canvas.add(descriptor, centered) {
            Some(id) => ok(json!({ "id": id })),
            None => error("object was refused"),
        }
    }

    pub fn remove(&mut self) -> bool {
        self.canvas.remove()
    }

    pub fn remove_by_id(&mut self, id: &str) -> bool {
        self.canvas.remove_by_id(id)
    }

    /// Duplicate the selection. Returns the new ids as a JSON array.
    pub fn duplicate(&mut self) -> String {
        to_json(&self.canvas.duplicate())
    }

    pub fn copy(&mut self) -> bool {
        self.canvas.copy()
    }

    pub fn cut(&mut self) -> bool {
        self.canvas.cut()
    }

    /// Paste the clipboard. Returns the new ids as a JSON array.
    pub fn paste(&mut self) -> String {
        to_json(&self.canvas.paste())
    }

    /// Set one property on the active object. `value` is JSON.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        match serde_json::from_str(value) {
            Ok(value) => self.canvas.set(key, value),
            Err(e) => {
                log::warn!("set {key}: {e}");
                false
            }
        }
    }

    pub fn set_by_id(&mut self, id: &str, key: &str, value: &str) -> bool {
        match serde_json::from_str(value) {
            Ok(value) => self.canvas.set_by_id(id, key, value),
            Err(e) => {
                log::warn!("set {key} on {id}: {e}");
                false
            }
        }
    }

    /// Apply a JSON property patch to an object.
    pub fn set_object_by_id(&mut self, id: &str, patch: &str) -> bool {
        match serde_json::from_str(patch) {
            Ok(patch) => self.canvas.set_object_by_id(id, patch),
            Err(e) => {
                log::warn!("patch for {id}: {e}");
                false
            }
        }
    }

    /// Every object except the workarea, as JSON.
    pub fn get_objects(&self) -> String {
        to_json(&self.canvas.get_objects())
    }

    /// One object as JSON, or `null`.
    pub fn get_object(&self, id: &str) -> String {
        to_json(&self.canvas.find_by_id(id))
    }

    // ─── Selection and arrangement ───────────────────────────────────────

    pub fn select(&mut self, id: &str) -> bool {
        self.canvas.select(id)
    }

    pub fn deselect(&mut self) {
        self.canvas.deselect();
    }

    pub fn all_select(&mut self) -> bool {
        self.canvas.all_select()
    }

    pub fn get_selected_ids(&self) -> String {
        to_json(&self.canvas.selection().ids())
    }

    pub fn bring_forward(&mut self) -> bool {
        self.canvas.bring_forward()
    }

    pub fn send_backwards(&mut self) -> bool {
        self.canvas.send_backwards()
    }

    pub fn bring_to_front(&mut self) -> bool {
        self.canvas.bring_to_front()
    }

    pub fn send_to_back(&mut self) -> bool {
        self.canvas.send_to_back()
    }

    /// `alignment`: left, center, right, top, middle or bottom.
    pub fn align(&mut self, alignment: &str) -> bool {
        match parse_alignment(alignment) {
            Some(alignment) => self.canvas.align(alignment),
            None => {
                log::warn!("unknown alignment {alignment:?}");
                false
            }
        }
    }

    pub fn nudge(&mut self, dx: f64, dy: f64) -> bool {
        self.canvas.nudge(dx, dy)
    }

    /// Group the selection. Returns the group id, or an empty string.
    pub fn to_group(&mut self) -> String {
        self.canvas
            .to_group()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Ungroup the active group. Returns the member ids as JSON.
    pub fn to_active_selection(&mut self) -> String {
        to_json(&self.canvas.to_active_selection())
    }

    // ─── Modes ───────────────────────────────────────────────────────────

    /// `interactive`: optional JSON array of ids that stay interactive;
    /// everything else is frozen.
    pub fn selection_mode(&mut self, interactive: Option<String>) {
        let predicate = interactive.as_deref().and_then(id_predicate);
        self.canvas.selection_mode(predicate.as_deref());
    }

    pub fn grab_mode(&mut self, interactive: Option<String>) {
        let predicate = interactive.as_deref().and_then(id_predicate);
        self.canvas.grab_mode(predicate.as_deref());
    }

    pub fn drawing_mode(&mut self) -> bool {
        self.canvas.drawing_mode(None)
    }

    /// Start drawing a link from the named output port of `node`.
    pub fn start_link(&mut self, node: &str, port: &str) -> bool {
        self.canvas
            .start_link(PortId::new(ObjectId::intern(node), port))
    }

    pub fn escape(&mut self) {
        self.canvas.escape();
    }

    /// selection, grab, polygon, link or crop.
    pub fn interaction_mode(&self) -> String {
        match self.canvas.interaction_mode() {
            InteractionMode::Selection => "selection",
            InteractionMode::Grab => "grab",
            InteractionMode::Polygon => "polygon",
            InteractionMode::Link => "link",
            InteractionMode::Crop => "crop",
        }
        .to_string()
    }

    pub fn crop_start(&mut self) -> bool {
        self.canvas.crop_start()
    }

    pub fn crop_finish(&mut self) -> bool {
        self.canvas.crop_finish()
    }

    pub fn crop_cancel(&mut self) -> bool {
        self.canvas.crop_cancel()
    }

    /// Transient overlay (guides, marquee, crop box, drafts) as JSON.
    pub fn get_overlay(&self) -> String {
        to_json(self.canvas.overlay())
    }

    // ─── Viewport ────────────────────────────────────────────────────────

    pub fn zoom(&self) -> f64 {
        self.canvas.zoom()
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.canvas.zoom_in()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.canvas.zoom_out()
    }

    pub fn zoom_one_to_one(&mut self) {
        self.canvas.zoom_one_to_one();
    }

    pub fn zoom_to_fit(&mut self) -> f64 {
        self.canvas.zoom_to_fit()
    }

    pub fn zoom_to_point(&mut self, x: f64, y: f64, ratio: f64) -> f64 {
        self.canvas.zoom_to_point(Point::new(x, y), ratio)
    }

    pub fn relative_pan(&mut self, dx: f64, dy: f64) {
        self.canvas.relative_pan(Vec2::new(dx, dy));
    }

    /// The six affine coefficients `[a, b, c, d, e, f]` as JSON.
    pub fn viewport_transform(&self) -> String {
        to_json(&self.canvas.viewport_transform())
    }

    // ─── Animation ───────────────────────────────────────────────────────

    pub fn play_animation(&mut self, id: &str) -> bool {
        self.canvas.play_animation(ObjectId::intern(id))
    }

    pub fn pause_animation(&mut self, id: &str) -> bool {
        self.canvas.pause_animation(ObjectId::intern(id))
    }

    pub fn resume_animation(&mut self, id: &str) -> bool {
        self.canvas.resume_animation(ObjectId::intern(id))
    }

    pub fn stop_animation(&mut self, id: &str) -> bool {
        self.canvas.stop_animation(ObjectId::intern(id))
    }

    pub fn restart_animation(&mut self, id: &str) -> bool {
        self.canvas.restart_animation(ObjectId::intern(id))
    }

    /// playing, paused, or an empty string.
    pub fn animation_state(&self, id: &str) -> String {
        match self.canvas.animation_state(ObjectId::intern(id)) {
            Some(PlayState::Playing) => "playing".into(),
            Some(PlayState::Paused) => "paused".into(),
            None => String::new(),
        }
    }

    /// Call once per animation frame with the host clock (ms). Returns
    /// whether another frame is needed.
    pub fn tick_animations(&mut self, now: f64) -> bool {
        self.canvas.tick_animations(now)
    }

    // ─── Documents and history ───────────────────────────────────────────

    pub fn export_json(&self) -> String {
        match self.canvas.export_json() {
            Ok(document) => ok(json!({ "document": document })),
            Err(e) => error(e),
        }
    }

    pub fn import_json(&mut self, json: &str) -> String {
        match self.canvas.import_json(json) {
            Ok(()) => ok(json!({})),
            Err(e) => error(e),
        }
    }

    pub fn export_workflow(&self) -> String {
        match self.canvas.export_workflow() {
            Ok(document) => ok(json!({ "document": document })),
            Err(e) => error(e),
        }
    }

    /// `catalog` maps node classes to their port layout:
    /// `{"Switch": {"outPortType": "static", "outPorts": ["a", "b"]}}`.
    pub fn import_workflow(&mut self, json: &str, catalog: &str) -> String {
        let catalog: HashMap<String, NodeShape> = if catalog.trim().is_empty() {
            HashMap::new()
        } else {
            match serde_json::from_str(catalog) {
                Ok(c) => c,
                Err(e) => return error(e),
            }
        };
        match self
            .canvas
            .import_workflow(json, |clazz| catalog.get(clazz).cloned())
        {
            Ok(count) => ok(json!({ "count": count })),
            Err(e) => error(e),
        }
    }

    pub fn clear(&mut self) {
        self.canvas.clear();
    }

    pub fn undo(&mut self) -> bool {
        self.canvas.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.canvas.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.canvas.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.canvas.can_redo()
    }

    /// Pending editor events as a JSON array; the queue is emptied.
    pub fn drain_events(&mut self) -> String {
        to_json(&self.canvas.drain_events())
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

fn modifiers(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers {
        shift,
        ctrl,
        alt,
        meta,
    }
}

fn ticket_of(ticket: f64) -> LoadTicket {
    LoadTicket(ticket as u64)
}

fn parse_alignment(name: &str) -> Option<Alignment> {
    Some(match name {
        "left" => Alignment::Left,
        "center" => Alignment::Center,
        "right" => Alignment::Right,
        "top" => Alignment::Top,
        "middle" => Alignment::Middle,
        "bottom" => Alignment::Bottom,
        _ => return None,
    })
}

/// Predicate keeping only the listed ids interactive.
fn id_predicate(json: &str) -> Option<Box<dyn Fn(&SceneObject) -> bool>> {
    match serde_json::from_str::<Vec<String>>(json) {
        Ok(ids) => {
            let ids: Vec<ObjectId> = ids.iter().map(|s| ObjectId::intern(s)).collect();
            Some(Box::new(move |obj: &SceneObject| ids.contains(&obj.id)))
        }
        Err(e) => {
            log::warn!("interactive ids: {e}");
            None
        }
    }
}

fn to_json(value: &impl Serialize) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("bridge value did not serialize: {e}");
        "null".to_string()
    })
}

fn ok(payload: Value) -> String {
    let mut envelope = json!({ "ok": true });
    if let (Value::Object(out), Value::Object(fields)) = (&mut envelope, payload) {
        out.extend(fields);
    }
    envelope.to_string()
}

fn error(e: impl std::fmt::Display) -> String {
    json!({ "ok": false, "error": e.to_string() }).to_string()
}

// ─── Console logging and panic hook ──────────────────────────────────────

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let msg = format!("[{}] {}", record.target(), record.args());
        #[cfg(target_arch = "wasm32")]
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&msg.into()),
            log::Level::Warn => web_sys::console::warn_1(&msg.into()),
            _ => web_sys::console::log_1(&msg.into()),
        }
        #[cfg(not(target_arch = "wasm32"))]
        let _ = msg;
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn console_setup() {
    use std::sync::Once;
    static SETUP: Once = Once::new();
    SETUP.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(|info| {
            let msg = format!("atelier WASM panic: {info}");
            web_sys::console::error_1(&msg.into());
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn envelopes() {
        let v: Value = serde_json::from_str(&ok(json!({ "count": 3 }))).unwrap();
        assert_eq!(v, json!({ "ok": true, "count": 3 }));
        let v: Value = serde_json::from_str(&error("bad \"doc\"")).unwrap();
        assert_eq!(v, json!({ "ok": false, "error": "bad \"doc\"" }));
    }

    #[test]
    fn alignment_names() {
        assert_eq!(parse_alignment("middle"), Some(Alignment::Middle));
        assert_eq!(parse_alignment("diagonal"), None);
    }

    #[test]
    fn interactive_id_predicate() {
        let predicate = id_predicate(r#"["wb_keep"]"#).unwrap();
        let keep = atelier_core::factory::construct(json!({ "type": "shape", "id": "wb_keep" })).unwrap();
        let other = atelier_core::factory::construct(json!({ "type": "shape", "id": "wb_other" })).unwrap();
        assert!(predicate(&keep));
        assert!(!predicate(&other));
        assert!(id_predicate("not json").is_none());
    }
}
