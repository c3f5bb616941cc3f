use super::{AddOptions, Canvas};
use crate::animation::PlayState;
use crate::crop::CropSession;
use crate::events::EditorEvent;
use crate::modes::{Mode, ObjectPredicate, PolygonDraft, configure_object};
use crate::selection::Selection;
use crate::surface::{Overlay, point_coords, rect_coords};
use atelier_core::id::ObjectId;
use kurbo::{Point, Vec2};

/// Screen distance within which a click closes a polygon.
const POLYGON_CLOSE_DISTANCE: f64 = 10.0;

impl Canvas {
    // ─── Modes ───────────────────────────────────────────────────────────

    /// Switch modes: reconfigure every object, reset transient state.
    pub(crate) fn enter_mode(&mut self, mode: Mode, predicate: Option<&ObjectPredicate>) {
        self.cancel_drag();
        let previous = std::mem::replace(&mut self.mode, mode);
        if let Mode::Crop(session) = &previous {
            if let Some(obj) = self.registry.get_mut(session.target) {
                obj.flags = session.saved_flags;
            }
        }
        let kind = self.mode.kind();
        let editable = self.config.editable;
        for obj in self.registry.iter_mut() {
            configure_object(obj, kind, editable, predicate);
        }
        self.ports.clear_feedback();
        self.hovered_port = None;
        self.overlay = Overlay::default();
        self.push_overlay();
        self.surface.set_cursor(kind.cursor());
        log::debug!("mode {:?} -> {kind:?}", previous.kind());
        self.render();
    }

    /// Back to selection. `predicate` decides per object whether it stays
    /// interactive.
    pub fn selection_mode(&mut self, predicate: Option<&ObjectPredicate>) {
        self.space_grab = false;
        if matches!(self.mode, Mode::Selection) && predicate.is_none() {
            return;
        }
        self.enter_mode(Mode::Selection, predicate);
    }

    /// Drag to pan.
    pub fn grab_mode(&mut self, predicate: Option<&ObjectPredicate>) {
        if matches!(self.mode, Mode::Grab { .. }) {
            return;
        }
        self.enter_mode(Mode::Grab { last: None }, predicate);
    }

    /// Click out a polygon.
    pub fn drawing_mode(&mut self, predicate: Option<&ObjectPredicate>) -> bool {
        if !self.config.editable {
            log::warn!("drawing needs an editable canvas");
            return false;
        }
        self.clear_selection();
        self.enter_mode(Mode::Polygon(PolygonDraft::default()), predicate);
        true
    }

    /// Cancel whatever is in progress.
    pub fn escape(&mut self) {
        match self.mode {
            Mode::Selection => {
                self.cancel_drag();
                self.clear_selection();
            }
            Mode::Crop(_) => {
                self.crop_cancel();
            }
            Mode::Link(_) => {
                self.finish_link();
            }
            Mode::Polygon(_) | Mode::Grab { .. } => self.selection_mode(None),
        }
        self.render();
    }

    /// Leave a mode that is working on `id` (before `id` is removed).
    pub(crate) fn release_mode_target(&mut self, id: ObjectId) {
        let involved = match &self.mode {
            Mode::Crop(session) => session.target == id,
            Mode::Link(draft) => draft.from.node == id,
            _ => false,
        };
        if involved {
            self.enter_mode(Mode::Selection, None);
        }
    }

    // ─── Polygon drawing ─────────────────────────────────────────────────

    pub(crate) fn polygon_click(&mut self, point: Point) {
        let tolerance = POLYGON_CLOSE_DISTANCE / self.viewport.zoom();
        let Mode::Polygon(draft) = &mut self.mode else {
            return;
        };
        if draft.closes_at(point, tolerance) {
            let polygon = draft.to_object();
            self.enter_mode(Mode::Selection, None);
            if let Some(id) = polygon.and_then(|obj| self.add_object(obj, AddOptions::default())) {
                self.set_selection(Selection::single(id));
            }
            return;
        }
        draft.vertices.push(point);
        self.push_polygon_overlay();
    }

    pub(crate) fn polygon_pointer(&mut self, point: Point) {
        if let Mode::Polygon(draft) = &mut self.mode {
            draft.pointer = Some(point);
        }
        self.push_polygon_overlay();
    }

    fn push_polygon_overlay(&mut self) {
        let Mode::Polygon(draft) = &self.mode else {
            return;
        };
        let mut points: Vec<[f64; 2]> = draft.vertices.iter().copied().map(point_coords).collect();
        if let (Some(pointer), false) = (draft.pointer, draft.vertices.is_empty()) {
            points.push(point_coords(pointer));
        }
        self.overlay.polygon = points;
        self.push_overlay();
        self.render();
    }

    // ─── Crop ────────────────────────────────────────────────────────────

    /// Start cropping the active image.
    pub fn crop_start(&mut self) -> bool {
        let Some(id) = self.selection.active() else {
            log::warn!("select an image to crop");
            return false;
        };
        if self.registry.get(id).and_then(|o| o.as_image()).is_none() {
            log::warn!("{id} is not an image");
            return false;
        }
        if !matches!(self.mode, Mode::Selection) {
            self.enter_mode(Mode::Selection, None);
        }
        let Some(session) = self.registry.get_mut(id).and_then(CropSession::start) else {
            return false;
        };
        let rect = session.rect;
        self.enter_mode(Mode::Crop(session), None);
        self.overlay.crop = Some(rect_coords(rect));
        self.push_overlay();
        self.render();
        true
    }

    /// Apply the crop rectangle. The host rasterizes the region when it
    /// can; otherwise the region is kept on the image.
    pub fn crop_finish(&mut self) -> bool {
        let Mode::Crop(session) = &self.mode else {
            log::warn!("not cropping");
            return false;
        };
        let session = session.clone();
        let id = session.target;
        let Some(obj) = self.registry.get(id) else {
            self.enter_mode(Mode::Selection, None);
            return false;
        };
        let scale = Vec2::new(obj.geometry.scale_x, obj.geometry.scale_y);
        let existing = obj.as_image().and_then(|image| image.crop);
        let region = session.region(scale, existing);
        let rasterized = self.surface.rasterize(obj, region);
        self.enter_mode(Mode::Selection, None);

        let Some(obj) = self.registry.get_mut(id) else {
            return false;
        };
        if let Some(image) = obj.as_image_mut() {
            match rasterized {
                Some(src) => {
                    image.src = Some(src);
                    image.crop = None;
                }
                None => image.crop = Some(region),
            }
        }
        let g = &mut obj.geometry;
        g.width = region.width;
        g.height = region.height;
        let delta = session.rect.origin() - g.top_left();
        g.translate(delta);

        self.events.push(EditorEvent::Modified { id });
        self.record("crop");
        self.render();
        true
    }

    /// Leave crop mode without touching the image.
    pub fn crop_cancel(&mut self) -> bool {
        if !matches!(self.mode, Mode::Crop(_)) {
            return false;
        }
        self.enter_mode(Mode::Selection, None);
        true
    }

    pub(crate) fn crop_pointer_down(&mut self, point: Point) -> bool {
        match &mut self.mode {
            Mode::Crop(session) => session.begin_drag(point),
            _ => false,
        }
    }

    pub(crate) fn crop_pointer_move(&mut self, point: Point) -> bool {
        let Mode::Crop(session) = &mut self.mode else {
            return false;
        };
        if !session.drag_to(point) {
            return false;
        }
        let rect = session.rect;
        self.overlay.crop = Some(rect_coords(rect));
        self.push_overlay();
        self.render();
        true
    }

    pub(crate) fn crop_pointer_up(&mut self) {
        if let Mode::Crop(session) = &mut self.mode {
            session.end_drag();
        }
    }

    // ─── Animation ───────────────────────────────────────────────────────

    pub fn play_animation(&mut self, id: ObjectId) -> bool {
        let Some(obj) = self.registry.get_mut(id) else {
            log::warn!("object {id} not found");
            return false;
        };
        let playing = self.animator.play(obj);
        if playing {
            self.render();
        }
        playing
    }

    pub fn pause_animation(&mut self, id: ObjectId) -> bool {
        self.animator.pause(id)
    }

    pub fn resume_animation(&mut self, id: ObjectId) -> bool {
        let resumed = self.animator.resume(id);
        if resumed {
            self.render();
        }
        resumed
    }

    /// Stop and restore the object to its pre-animation state.
    pub fn stop_animation(&mut self, id: ObjectId) -> bool {
        let Some(obj) = self.registry.get_mut(id) else {
            return false;
        };
        let stopped = self.animator.stop(obj);
        if stopped {
            self.set_coords(id);
            self.render();
        }
        stopped
    }

    pub fn restart_animation(&mut self, id: ObjectId) -> bool {
        let Some(obj) = self.registry.get_mut(id) else {
            return false;
        };
        let restarted = self.animator.restart(obj);
        self.set_coords(id);
        self.render();
        restarted
    }

    pub fn animation_state(&self, id: ObjectId) -> Option<PlayState> {
        self.animator.state(id)
    }

    /// Advance animations to `now` (milliseconds, host clock). Returns
    /// whether anything is still running.
    pub fn tick_animations(&mut self, now: f64) -> bool {
        let outcome = self.animator.tick(now, &mut self.registry);
        for id in &outcome.updated {
            self.set_coords(*id);
        }
        for id in outcome.finished {
            log::debug!("animation on {id} finished");
        }
        if !outcome.updated.is_empty() {
            self.render();
        }
        self.animator.has_running()
    }
}
