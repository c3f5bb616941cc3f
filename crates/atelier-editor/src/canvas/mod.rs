//! The canvas controller.
//!
//! `Canvas` owns the scene (registry + port graph), the viewport, the
//! active interaction mode, selection, clipboard, history and animations.
//! Handler groups live in the sibling modules as further `impl Canvas`
//! blocks:
//!
//! | module        | handlers                                              |
//! |---------------|-------------------------------------------------------|
//! | `objects`     | add / remove / duplicate / clipboard / set / z-order  |
//! | `links`       | ports, link drawing, link removal                     |
//! | `interaction` | modes, crop, animation                                |
//! | `dispatch`    | pointer, wheel and keyboard routing                   |
//! | `io`          | import / export / workflow / undo / resize            |
//! | `view`        | zoom and pan                                          |

mod dispatch;
mod interaction;
mod io;
mod links;
mod objects;
mod view;

pub use objects::AddOptions;

use crate::animation::Animator;
use crate::events::{EditorEvent, EventQueue, TransactionKind};
use crate::history::History;
use crate::modes::{InteractionMode, Mode};
use crate::registry::Registry;
use crate::selection::Selection;
use crate::surface::{Cursor, ElementFrame, LoadTicket, NullSurface, Overlay, RenderSurface};
use crate::viewport::Viewport;
use atelier_core::clipboard::Clipboard;
use atelier_core::config::EditorConfig;
use atelier_core::geometry::Geometry;
use atelier_core::graph::PortGraph;
use atelier_core::id::ObjectId;
use atelier_core::model::SceneObject;
use atelier_core::serialize::export_objects;
use atelier_core::workarea::{place, workarea_object};
use kurbo::{Point, Size};
use std::collections::HashMap;

/// Undo depth.
const HISTORY_DEPTH: usize = 100;

/// An image decode the canvas is waiting on.
#[derive(Debug)]
pub(crate) enum PendingLoad {
    /// An image object, added once its natural size is known.
    Object {
        obj: Box<SceneObject>,
        options: AddOptions,
    },
    /// The workarea background for import generation `generation`.
    Workarea { generation: u64 },
}

/// Import waiting on the workarea background.
#[derive(Debug)]
pub(crate) struct PendingImport {
    generation: u64,
    objects: Vec<SceneObject>,
    /// Workarea geometry as stored in the document.
    stored: Geometry,
}

/// Pointer gesture in selection mode.
#[derive(Debug, Clone)]
pub(crate) enum Drag {
    Move {
        start: Point,
        origins: Vec<(ObjectId, Point)>,
        moved: bool,
    },
    Marquee {
        start: Point,
        current: Point,
    },
}

pub struct Canvas {
    pub(crate) config: EditorConfig,
    pub(crate) surface: Box<dyn RenderSurface>,
    pub(crate) registry: Registry,
    pub(crate) ports: PortGraph,
    pub(crate) viewport: Viewport,
    pub(crate) viewport_size: Size,
    pub(crate) mode: Mode,
    pub(crate) selection: Selection,
    pub(crate) clipboard: Option<Clipboard>,
    pub(crate) history: History,
    pub(crate) animator: Animator,
    pub(crate) events: EventQueue,
    pub(crate) overlay: Overlay,
    pub(crate) drag: Option<Drag>,
    pub(crate) hovered: Option<ObjectId>,
    pub(crate) hovered_port: Option<atelier_core::port::PortId>,
    /// Set while space is held for a temporary grab.
    pub(crate) space_grab: bool,
    /// Loading a document: no `Added` events, no history records.
    pub(crate) loading: bool,
    /// Unscaled workarea content size (background image or configured size).
    pub(crate) workarea_natural: Size,
    next_ticket: u64,
    pub(crate) loads: HashMap<LoadTicket, PendingLoad>,
    pub(crate) generation: u64,
    pub(crate) pending_import: Option<PendingImport>,
}

impl Canvas {
    pub fn new(config: EditorConfig, surface: Box<dyn RenderSurface>) -> Self {
        let config = config.normalized();
        let viewport_size = surface.viewport_size();
        let workarea_natural = Size::new(config.workarea.width, config.workarea.height);
        let mut canvas = Self {
            viewport: Viewport::new(config.zoom_bounds()),
            config,
            surface,
            registry: Registry::new(),
            ports: PortGraph::new(),
            viewport_size,
            mode: Mode::Selection,
            selection: Selection::default(),
            clipboard: None,
            history: History::new(HISTORY_DEPTH),
            animator: Animator::new(),
            events: EventQueue::default(),
            overlay: Overlay::default(),
            drag: None,
            hovered: None,
            hovered_port: None,
            space_grab: false,
            loading: false,
            workarea_natural,
            next_ticket: 1,
            loads: HashMap::new(),
            generation: 0,
            pending_import: None,
        };

        let mut workarea = workarea_object(&canvas.config.workarea);
        place(&mut workarea, workarea_natural, viewport_size);
        canvas.registry.insert(workarea, None);
        if let Some(src) = canvas.config.workarea.src.clone() {
            let ticket = canvas.issue_ticket(PendingLoad::Workarea { generation: 0 });
            canvas.surface.decode_image(ticket, &src);
        }
        canvas.surface.set_cursor(Cursor::Default);
        let snapshot = canvas.snapshot();
        canvas.history.reset(snapshot);
        canvas
    }

    /// A canvas with no host attached.
    pub fn headless(config: EditorConfig, width: f64, height: f64) -> Self {
        Self::new(config, Box::new(NullSurface::new(width, height)))
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Every object in paint order, workarea first.
    pub fn objects(&self) -> &[SceneObject] {
        self.registry.render_list()
    }

    /// User objects: everything but the workarea.
    pub fn get_objects(&self) -> Vec<&SceneObject> {
        self.registry
            .render_list()
            .iter()
            .filter(|o| !o.is_workarea())
            .collect()
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.registry.get(id)
    }

    /// Look an object up by id, logging a miss.
    pub fn find_by_id(&self, id: &str) -> Option<&SceneObject> {
        let found = self.registry.get(ObjectId::intern(id));
        if found.is_none() {
            log::warn!("object {id} not found");
        }
        found
    }

    pub fn workarea(&self) -> Option<&SceneObject> {
        self.registry.workarea()
    }

    pub fn port_graph(&self) -> &PortGraph {
        &self.ports
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// The single active object.
    pub fn active_object(&self) -> Option<&SceneObject> {
        self.selection.active().and_then(|id| self.registry.get(id))
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn interaction_mode(&self) -> InteractionMode {
        self.mode.kind()
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn zoom(&self) -> f64 {
        self.viewport.zoom()
    }

    pub fn viewport_transform(&self) -> [f64; 6] {
        self.viewport.coeffs()
    }

    pub fn viewport_size(&self) -> Size {
        self.viewport_size
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn drain_events(&mut self) -> Vec<EditorEvent> {
        self.events.drain()
    }

    // ─── Internal plumbing ───────────────────────────────────────────────

    pub(crate) fn render(&mut self) {
        self.surface.request_render();
    }

    pub(crate) fn push_overlay(&mut self) {
        self.surface.set_overlay(&self.overlay);
    }

    pub(crate) fn set_selection(&mut self, selection: Selection) {
        if selection == self.selection {
            return;
        }
        self.selection = selection;
        self.events.push(EditorEvent::Selected {
            ids: self.selection.ids().to_vec(),
        });
    }

    pub(crate) fn clear_selection(&mut self) {
        self.set_selection(Selection::default());
    }

    pub(crate) fn issue_ticket(&mut self, load: PendingLoad) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        self.loads.insert(ticket, load);
        ticket
    }

    /// Canvas-space point at the middle of the viewport.
    pub(crate) fn visual_center(&self) -> Point {
        self.viewport
            .to_canvas(Viewport::visual_center(self.viewport_size))
    }

    /// Reposition the DOM mirror of an element object.
    pub(crate) fn mirror(&mut self, id: ObjectId) {
        let Some(obj) = self.registry.get(id) else {
            return;
        };
        if !obj.is_dom_mirrored() {
            return;
        }
        let (top_left, size) = self.viewport.screen_frame(&obj.geometry);
        let frame = ElementFrame {
            left: top_left.x,
            top: top_left.y,
            width: size.width,
            height: size.height,
            angle: obj.geometry.angle,
        };
        self.surface.mirror_element(obj, frame);
    }

    pub(crate) fn mirror_all(&mut self) {
        let ids: Vec<ObjectId> = self
            .registry
            .render_list()
            .iter()
            .filter(|o| o.is_dom_mirrored())
            .map(|o| o.id)
            .collect();
        for id in ids {
            self.mirror(id);
        }
    }

    /// Exported document state, used as the history snapshot.
    pub(crate) fn snapshot(&self) -> String {
        match export_objects(
            self.registry.render_list(),
            &self.config.properties_to_include,
        ) {
            Ok(value) => value.to_string(),
            Err(e) => {
                log::error!("failed to snapshot document: {e}");
                String::new()
            }
        }
    }

    /// Record the current state as one undo step. Inside a batch this only
    /// marks the batch dirty.
    pub(crate) fn record(&mut self, description: &str) {
        if self.loading {
            return;
        }
        if self.history.is_batching() {
            self.history.record(String::new(), description);
            return;
        }
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return;
        }
        if self.history.record(snapshot, description) {
            self.events.push(EditorEvent::Transaction {
                kind: TransactionKind::Record,
                description: description.to_string(),
            });
        }
    }

    /// Run `f` as a single undo step.
    pub(crate) fn batch<R>(&mut self, description: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.history.begin_batch();
        let out = f(self);
        if self.history.end_batch() {
            self.record(description);
        }
        out
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("objects", &self.registry.len())
            .field("links", &self.ports.link_count())
            .field("mode", &self.mode.kind())
            .field("zoom", &self.viewport.zoom())
            .finish()
    }
}
