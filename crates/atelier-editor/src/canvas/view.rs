use super::Canvas;
use crate::events::EditorEvent;
use crate::viewport::{Viewport, ZOOM_STEP};
use atelier_core::workarea::fit_scale;
use kurbo::{Point, Vec2};

impl Canvas {
    /// Zoom to `ratio` keeping the canvas point under `screen` fixed.
    /// Returns the ratio after clamping to the configured bounds.
    pub fn zoom_to_point(&mut self, screen: Point, ratio: f64) -> f64 {
        let applied = self.viewport.zoom_to_point(screen, ratio);
        self.after_zoom();
        applied
    }

    pub fn zoom_in(&mut self) -> f64 {
        let center = Viewport::visual_center(self.viewport_size);
        self.zoom_to_point(center, self.zoom() + ZOOM_STEP)
    }

    pub fn zoom_out(&mut self) -> f64 {
        let center = Viewport::visual_center(self.viewport_size);
        self.zoom_to_point(center, self.zoom() - ZOOM_STEP)
    }

    /// Back to 100% with no pan.
    pub fn zoom_one_to_one(&mut self) {
        self.viewport.reset();
        self.after_zoom();
    }

    /// Fit the workarea in the viewport and center it.
    pub fn zoom_to_fit(&mut self) -> f64 {
        let Some(workarea) = self.registry.workarea() else {
            return self.zoom();
        };
        let content = workarea.geometry.scaled_size();
        let target = workarea.geometry.center();
        let screen_center = Viewport::visual_center(self.viewport_size);

        self.viewport.reset();
        let applied = self
            .viewport
            .zoom_to_point(screen_center, fit_scale(content, self.viewport_size));
        let landed = self.viewport.to_screen(target);
        self.viewport.relative_pan(screen_center - landed);
        self.after_zoom();
        applied
    }

    /// Pan by a screen-space delta.
    pub fn relative_pan(&mut self, delta: Vec2) {
        self.viewport.relative_pan(delta);
        self.mirror_all();
        self.render();
    }

    fn after_zoom(&mut self) {
        self.mirror_all();
        let ratio = self.zoom();
        self.events.push(EditorEvent::Zoomed { ratio });
        self.render();
    }
}
