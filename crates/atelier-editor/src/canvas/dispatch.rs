//! Pointer, wheel and keyboard routing.
//!
//! Every event enters through `Canvas::handle_event` and is routed by the
//! interaction mode:
//!
//! | mode        | down                     | move                 | up                    |
//! |-------------|--------------------------|----------------------|-----------------------|
//! | `selection` | port / object / marquee  | drag, marquee, hover | commit drag / marquee |
//! | `grab`      | anchor the pan           | pan                  | release               |
//! | `polygon`   | add vertex or close      | rubber band          |                       |
//! | `link`      | finish on an input port  | provisional link     | finish on input port  |
//! | `crop`      | grab a handle            | resize / move        | release               |

use super::{Canvas, Drag};
use crate::events::{EditorEvent, ObjectAction};
use crate::grid;
use crate::guidelines::{self, Target};
use crate::input::{InputEvent, Modifiers, PointerButton};
use crate::modes::{InteractionMode, Mode};
use crate::selection::Selection;
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::surface::{Cursor, rect_coords};
use crate::viewport::ZOOM_STEP;
use atelier_core::id::ObjectId;
use atelier_core::model::TriggerKind;
use atelier_core::port::PortId;
use atelier_core::script::check_script;
use atelier_core::workarea::effective_bounds;
use atelier_render::{hit_port, hit_test, hit_test_rect, object_bounds};
use kurbo::{Point, Rect, Vec2};

impl Canvas {
    /// Route one input event. Returns whether the canvas consumed it.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown {
                x,
                y,
                button,
                modifiers,
            } => {
                if *button != PointerButton::Primary {
                    return false;
                }
                self.pointer_down(Point::new(*x, *y), *modifiers)
            }
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y)),
            InputEvent::PointerUp { x, y, modifiers } => {
                self.pointer_up(Point::new(*x, *y), *modifiers)
            }
            InputEvent::Wheel {
                x,
                y,
                dx,
                dy,
                modifiers,
            } => self.wheel(Point::new(*x, *y), Vec2::new(*dx, *dy), *modifiers),
            InputEvent::KeyDown { key, modifiers } => self.key_down(key, *modifiers),
            InputEvent::KeyUp { key, .. } => self.key_up(key),
        }
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    fn pointer_down(&mut self, screen: Point, modifiers: Modifiers) -> bool {
        let point = self.viewport.to_canvas(screen);
        match self.mode.kind() {
            InteractionMode::Selection => self.selection_down(point, modifiers),
            InteractionMode::Grab => {
                self.mode = Mode::Grab { last: Some(screen) };
                self.surface.set_cursor(Cursor::Grabbing);
                true
            }
            InteractionMode::Polygon => {
                self.polygon_click(point);
                true
            }
            InteractionMode::Link => {
                if let Some(port) = self.input_port_at(point) {
                    self.link_generate(port);
                }
                self.finish_link();
                true
            }
            InteractionMode::Crop => self.crop_pointer_down(point),
        }
    }

    fn pointer_move(&mut self, screen: Point) -> bool {
        let point = self.viewport.to_canvas(screen);
        match self.mode.kind() {
            InteractionMode::Selection => self.selection_move(point),
            InteractionMode::Grab => {
                let Mode::Grab { last: Some(last) } = self.mode else {
                    return false;
                };
                self.mode = Mode::Grab { last: Some(screen) };
                self.relative_pan(screen - last);
                true
            }
            InteractionMode::Polygon => {
                self.polygon_pointer(point);
                true
            }
            InteractionMode::Link => {
                if let Mode::Link(draft) = &mut self.mode {
                    draft.pointer = point;
                    let start = draft.start;
                    self.overlay.provisional_link = Some([start.x, start.y, point.x, point.y]);
                    self.push_overlay();
                }
                self.update_port_hover(point);
                self.render();
                true
            }
            InteractionMode::Crop => self.crop_pointer_move(point),
        }
    }

    fn pointer_up(&mut self, screen: Point, modifiers: Modifiers) -> bool {
        let point = self.viewport.to_canvas(screen);
        match self.mode.kind() {
            InteractionMode::Selection => self.selection_up(modifiers),
            InteractionMode::Grab => {
                self.mode = Mode::Grab { last: None };
                self.surface.set_cursor(Cursor::Grab);
                true
            }
            InteractionMode::Polygon => true,
            InteractionMode::Link => {
                if let Some(port) = self.input_port_at(point) {
                    self.link_generate(port);
                    self.finish_link();
                }
                true
            }
            InteractionMode::Crop => {
                self.crop_pointer_up();
                true
            }
        }
    }

    fn input_port_at(&self, point: Point) -> Option<PortId> {
        hit_port(&self.ports, point).filter(|id| self.ports.port(*id).is_some_and(|p| p.is_input()))
    }

    // ─── Selection mode ──────────────────────────────────────────────────

    fn selection_down(&mut self, point: Point, modifiers: Modifiers) -> bool {
        if self.config.editable {
            let output = hit_port(&self.ports, point)
                .filter(|id| self.ports.port(*id).is_some_and(|p| !p.is_input() && p.enabled));
            if let Some(port) = output {
                return self.start_link(port);
            }
        }

        let hit = hit_test(self.registry.render_list(), point);
        if !self.config.editable {
            if let Some(id) = hit {
                self.fire_action(id);
            }
            return hit.is_some();
        }

        let selectable = hit.filter(|id| self.registry.get(*id).is_some_and(|o| o.flags.selectable));
        match selectable {
            Some(id) => {
                if modifiers.shift {
                    let mut selection = self.selection.clone();
                    selection.toggle(id);
                    self.set_selection(selection);
                } else if !self.selection.contains(id) {
                    self.set_selection(Selection::single(id));
                }
                self.begin_move(point);
            }
            None => {
                if !modifiers.shift {
                    self.clear_selection();
                }
                self.drag = Some(Drag::Marquee {
                    start: point,
                    current: point,
                });
            }
        }
        true
    }

    fn begin_move(&mut self, point: Point) {
        let origins: Vec<(ObjectId, Point)> = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.registry.get(*id))
            .filter(|o| o.as_link().is_none() && !o.flags.locked)
            .map(|o| (o.id, o.geometry.position()))
            .collect();
        if origins.is_empty() {
            return;
        }
        self.history.begin_batch();
        self.drag = Some(Drag::Move {
            start: point,
            origins,
            moved: false,
        });
    }

    fn selection_move(&mut self, point: Point) -> bool {
        match self.drag.take() {
            Some(Drag::Move { start, origins, .. }) => {
                self.drag_objects(point - start, &origins);
                self.drag = Some(Drag::Move {
                    start,
                    origins,
                    moved: true,
                });
                self.record("move");
                true
            }
            Some(Drag::Marquee { start, .. }) => {
                self.drag = Some(Drag::Marquee {
                    start,
                    current: point,
                });
                self.overlay.marquee = Some(rect_coords(Rect::from_points(start, point)));
                self.push_overlay();
                self.render();
                true
            }
            None => {
                self.hover(point);
                false
            }
        }
    }

    /// Place each dragged object at its origin plus `total`, then snap.
    fn drag_objects(&mut self, total: Vec2, origins: &[(ObjectId, Point)]) {
        for (id, origin) in origins {
            let Some(obj) = self.registry.get_mut(*id) else {
                continue;
            };
            if !obj.flags.lock_movement_x {
                obj.geometry.left = origin.x + total.x;
            }
            if !obj.flags.lock_movement_y {
                obj.geometry.top = origin.y + total.y;
            }
            grid::snap_geometry(&mut obj.geometry, &self.config.grid);
        }
        if let [(id, _)] = origins {
            self.snap_to_guides(*id);
        }
        for (id, _) in origins {
            self.set_coords(*id);
        }
        self.render();
    }

    fn snap_to_guides(&mut self, id: ObjectId) {
        if !self.config.guideline.enabled {
            return;
        }
        let Some(obj) = self.registry.get(id) else {
            return;
        };
        let moving = object_bounds(obj);
        let mut targets: Vec<Target> = self
            .registry
            .render_list()
            .iter()
            .filter(|o| o.id != id && o.flags.evented && o.as_link().is_none() && !o.is_workarea())
            .map(|o| Target::Object(object_bounds(o)))
            .collect();
        if let Some(workarea) = self.registry.workarea() {
            targets.push(Target::Workarea(effective_bounds(workarea, self.viewport_size)));
        }
        let snap = guidelines::snap(moving, &targets, &self.config.guideline);
        if snap.delta != Vec2::ZERO {
            if let Some(obj) = self.registry.get_mut(id) {
                obj.geometry.translate(snap.delta);
            }
        }
        self.overlay.guides = snap.lines;
        self.push_overlay();
    }

    /// Close the move gesture: one history step, guides cleared.
    fn finish_move(&mut self, origins: &[(ObjectId, Point)], moved: bool) {
        if moved {
            for (id, _) in origins {
                self.events.push(EditorEvent::Modified { id: *id });
            }
        }
        if self.history.end_batch() {
            self.record("move");
        }
        if !self.overlay.guides.is_empty() {
            self.overlay.guides.clear();
            self.push_overlay();
        }
    }

    /// Drop any gesture in progress. A move keeps where the objects got to
    /// and still closes its history batch.
    pub(crate) fn cancel_drag(&mut self) {
        match self.drag.take() {
            Some(Drag::Move { origins, moved, .. }) => self.finish_move(&origins, moved),
            Some(Drag::Marquee { .. }) => {
                self.overlay.marquee = None;
                self.push_overlay();
            }
            None => {}
        }
    }

    fn selection_up(&mut self, modifiers: Modifiers) -> bool {
        match self.drag.take() {
            Some(Drag::Move { origins, moved, .. }) => {
                self.finish_move(&origins, moved);
                self.render();
                true
            }
            Some(Drag::Marquee { start, current }) => {
                self.overlay.marquee = None;
                self.push_overlay();
                let rect = Rect::from_points(start, current);
                if rect.area() > 0.0 {
                    let hits = hit_test_rect(self.registry.render_list(), rect);
                    let mut ids = if modifiers.shift {
                        self.selection.ids().to_vec()
                    } else {
                        Vec::new()
                    };
                    ids.extend(hits.into_iter().filter(|id| !self.selection.contains(*id)));
                    self.set_selection(Selection::many(ids));
                }
                self.render();
                true
            }
            None => false,
        }
    }

    /// Hover: tooltips, port feedback and the cursor.
    fn hover(&mut self, point: Point) {
        self.update_port_hover(point);
        let hit = hit_test(self.registry.render_list(), point);
        if hit == self.hovered {
            return;
        }
        for (id, visible) in [(self.hovered, false), (hit, true)] {
            let Some(id) = id else {
                continue;
            };
            if self
                .registry
                .get(id)
                .is_some_and(|o| o.metadata.tooltip.enabled)
            {
                self.events.push(EditorEvent::Tooltip { id, visible });
            }
        }
        self.hovered = hit;
        let cursor = match hit.and_then(|id| self.registry.get(id)) {
            Some(obj) if self.config.editable && obj.flags.selectable => Cursor::Move,
            Some(obj) if !self.config.editable && has_action(obj) => Cursor::Pointer,
            _ => Cursor::Default,
        };
        self.surface.set_cursor(cursor);
    }

    /// Fire an object's click action on a non-editable canvas.
    fn fire_action(&mut self, id: ObjectId) {
        let Some(obj) = self.registry.get(id) else {
            return;
        };
        let trigger = &obj.metadata.trigger;
        let link = &obj.metadata.link;
        let action = if trigger.enabled {
            match trigger.kind {
                TriggerKind::Url => trigger.url.clone().map(|url| ObjectAction::Link {
                    url,
                    target: None,
                }),
                TriggerKind::Script => match trigger.code.as_deref() {
                    Some(code) => match check_script(code) {
                        Ok(()) => Some(ObjectAction::Script {
                            code: code.to_string(),
                        }),
                        Err(e) => {
                            log::error!("trigger on {id} rejected: {e}");
                            None
                        }
                    },
                    None => None,
                },
            }
        } else if link.enabled {
            link.url.clone().map(|url| ObjectAction::Link {
                url,
                target: link.target.clone(),
            })
        } else {
            None
        };
        if let Some(action) = action {
            self.events.push(EditorEvent::Action { id, action });
        }
    }

    // ─── Wheel ───────────────────────────────────────────────────────────

    /// Vertical scroll zooms at the pointer. Shift, horizontal scroll or a
    /// canvas with zoom disabled pans instead.
    fn wheel(&mut self, screen: Point, delta: Vec2, modifiers: Modifiers) -> bool {
        if self.config.zoom_enabled && !modifiers.shift && delta.y != 0.0 {
            let step = if delta.y > 0.0 { -ZOOM_STEP } else { ZOOM_STEP };
            self.zoom_to_point(screen, self.zoom() + step);
            return true;
        }
        if delta == Vec2::ZERO {
            return false;
        }
        self.relative_pan(-delta);
        true
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    fn key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        let Some(action) = ShortcutMap::resolve(key, modifiers) else {
            return false;
        };
        if !ShortcutMap::enabled(action, &self.config.key_event) {
            return false;
        }
        self.run_shortcut(action)
    }

    fn key_up(&mut self, key: &str) -> bool {
        let Some(action) = ShortcutMap::resolve_release(key) else {
            return false;
        };
        ShortcutMap::enabled(action, &self.config.key_event) && self.run_shortcut(action)
    }

    /// Run a shortcut action. Editing actions need an editable canvas.
    pub fn run_shortcut(&mut self, action: ShortcutAction) -> bool {
        let editable = self.config.editable;
        match action {
            ShortcutAction::Nudge { dx, dy } => editable && self.nudge(dx, dy),
            ShortcutAction::Delete => editable && self.remove(),
            ShortcutAction::SelectAll => editable && self.all_select(),
            ShortcutAction::Copy => editable && self.copy(),
            ShortcutAction::Cut => editable && self.cut(),
            ShortcutAction::Paste => editable && !self.paste().is_empty(),
            ShortcutAction::Duplicate => editable && !self.duplicate().is_empty(),
            ShortcutAction::Undo => editable && self.undo(),
            ShortcutAction::Redo => editable && self.redo(),
            ShortcutAction::ZoomIn => {
                self.zoom_in();
                true
            }
            ShortcutAction::ZoomOut => {
                self.zoom_out();
                true
            }
            ShortcutAction::ZoomToFit => {
                self.zoom_to_fit();
                true
            }
            ShortcutAction::ZoomOneToOne => {
                self.zoom_one_to_one();
                true
            }
            ShortcutAction::GrabStart => {
                if matches!(self.mode, Mode::Selection) && !self.space_grab {
                    self.grab_mode(None);
                    self.space_grab = true;
                }
                true
            }
            ShortcutAction::GrabEnd => {
                if !self.space_grab {
                    return false;
                }
                self.selection_mode(None);
                true
            }
            ShortcutAction::Escape => {
                self.escape();
                true
            }
        }
    }
}

fn has_action(obj: &atelier_core::model::SceneObject) -> bool {
    obj.metadata.trigger.enabled || obj.metadata.link.enabled
}
