//! Workarea placement.
//!
//! The workarea is the design surface: a singleton background object with
//! id `"workarea"`. Its layout decides where it sits in the viewport and how
//! every other object follows it when the viewport or the workarea changes.

use crate::config::WorkareaConfig;
use crate::geometry::Geometry;
use crate::id::ObjectId;
use crate::model::{ObjectKind, SceneObject, WorkareaLayout, WorkareaProps};
use kurbo::{Rect, Size, Vec2};

/// Build the workarea object from config, unplaced.
pub fn workarea_object(config: &WorkareaConfig) -> SceneObject {
    let mut obj = SceneObject::new(
        ObjectId::workarea(),
        ObjectKind::Workarea(WorkareaProps {
            layout: config.layout,
            src: config.src.clone(),
        }),
        Geometry::new(0.0, 0.0, config.width, config.height),
    );
    obj.name = Some(String::new());
    obj.appearance.fill = Some(config.background_color.clone());
    obj.appearance.stroke = None;
    obj.flags.selectable = false;
    obj.flags.evented = false;
    obj.flags.has_controls = false;
    obj.flags.has_borders = false;
    obj.flags.lock_movement_x = true;
    obj.flags.lock_movement_y = true;
    obj
}

pub fn layout_of(obj: &SceneObject) -> WorkareaLayout {
    match &obj.kind {
        ObjectKind::Workarea(props) => props.layout,
        _ => WorkareaLayout::Fixed,
    }
}

/// Uniform scale that fits `content` inside `viewport`.
///
/// Starts from the axis the content is longest on, then corrects when the
/// other axis still overflows.
pub fn fit_scale(content: Size, viewport: Size) -> f64 {
    if content.width <= 0.0 || content.height <= 0.0 {
        return 1.0;
    }
    let mut scale;
    if content.height >= content.width {
        scale = viewport.height / content.height;
        if viewport.width < content.width * scale {
            scale *= viewport.width / (content.width * scale);
        }
    } else {
        scale = viewport.width / content.width;
        if viewport.height < content.height * scale {
            scale *= viewport.height / (content.height * scale);
        }
    }
    scale
}

/// Place the workarea in a viewport of `viewport` size according to its
/// layout. `natural` is the unscaled content size (image size when the
/// workarea has a background, otherwise its configured size).
pub fn place(workarea: &mut SceneObject, natural: Size, viewport: Size) {
    let layout = layout_of(workarea);
    let g = &mut workarea.geometry;
    g.angle = 0.0;
    match layout {
        WorkareaLayout::Fixed => {
            g.width = natural.width;
            g.height = natural.height;
            g.scale_x = 1.0;
            g.scale_y = 1.0;
        }
        WorkareaLayout::Responsive => {
            let scale = fit_scale(natural, viewport);
            g.width = natural.width;
            g.height = natural.height;
            g.scale_x = scale;
            g.scale_y = scale;
        }
        WorkareaLayout::Fullscreen => {
            g.width = viewport.width;
            g.height = viewport.height;
            g.scale_x = 1.0;
            g.scale_y = 1.0;
        }
    }
    let size = g.scaled_size();
    let center = kurbo::Point::new(viewport.width / 2.0, viewport.height / 2.0);
    g.set_center(center);
    if layout == WorkareaLayout::Fullscreen {
        g.left = 0.0;
        g.top = 0.0;
    }
    log::debug!(
        "workarea placed {:?} at ({}, {}) size {}x{}",
        layout,
        g.left,
        g.top,
        size.width,
        size.height
    );
}

/// Effective edges used by guidelines. A fullscreen workarea spans the
/// whole viewport regardless of its stored geometry.
pub fn effective_bounds(workarea: &SceneObject, viewport: Size) -> Rect {
    match layout_of(workarea) {
        WorkareaLayout::Fullscreen => Rect::from_origin_size((0.0, 0.0), viewport),
        _ => workarea.geometry.bounding_rect(),
    }
}

/// How sibling objects follow a workarea change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reflow {
    Offset(Vec2),
    Scale(Vec2),
}

impl Reflow {
    /// Between two placements of the workarea: a scale ratio for
    /// fullscreen, otherwise the displacement of its left/top.
    pub fn between(layout: WorkareaLayout, before: &Geometry, after: &Geometry) -> Self {
        if layout == WorkareaLayout::Fullscreen {
            let before_size = before.scaled_size();
            let after_size = after.scaled_size();
            let ratio = |a: f64, b: f64| if b > 0.0 { a / b } else { 1.0 };
            return Reflow::Scale(Vec2::new(
                ratio(after_size.width, before_size.width),
                ratio(after_size.height, before_size.height),
            ));
        }
        Reflow::Offset(Vec2::new(after.left - before.left, after.top - before.top))
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Reflow::Offset(d) => d.x == 0.0 && d.y == 0.0,
            Reflow::Scale(s) => s.x == 1.0 && s.y == 1.0,
        }
    }

    pub fn apply(&self, geometry: &mut Geometry) {
        match *self {
            Reflow::Offset(delta) => geometry.translate(delta),
            Reflow::Scale(ratio) => {
                geometry.left *= ratio.x;
                geometry.top *= ratio.y;
                geometry.scale_x *= ratio.x;
                geometry.scale_y *= ratio.y;
            }
        }
    }
}
