//! Declarative per-object animations.
//!
//! `play` captures the properties the animation perturbs and disables the
//! object's controls. The host drives frames through `tick(now_ms)`; the
//! first tick after `play` fixes the start time. A non-looping animation
//! that completes is stopped, which restores the captured state. Looping
//! animations run back and forth.

use crate::registry::Registry;
use atelier_core::color::Color;
use atelier_core::id::ObjectId;
use atelier_core::model::{AnimationDescriptor, AnimationKind, Axis, Easing, Flags, SceneObject};
use kurbo::{CubicBez, ParamCurve, Point, Vec2};
use std::collections::HashMap;

const DEFAULT_BOUNCE: f64 = 20.0;
const DEFAULT_SHAKE: f64 = 10.0;
const DEFAULT_SCALE: f64 = 2.0;
const DEFAULT_ROTATION: f64 = 360.0;
/// Full oscillations per shake pass.
const SHAKE_CYCLES: f64 = 4.0;

// ─── Easing ──────────────────────────────────────────────────────────────

pub fn ease(easing: Easing, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    match easing {
        Easing::Linear => t,
        Easing::EaseIn => t * t,
        Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
        Easing::EaseInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
            }
        }
        Easing::CubicBezier(x1, y1, x2, y2) => {
            let curve = CubicBez::new((0.0, 0.0), (x1, y1), (x2, y2), (1.0, 1.0));
            // x(s) is monotonic for x1, x2 in [0, 1]: bisect for x(s) = t.
            let (mut lo, mut hi) = (0.0, 1.0);
            for _ in 0..32 {
                let mid = (lo + hi) / 2.0;
                if curve.eval(mid).x < t {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            curve.eval((lo + hi) / 2.0).y
        }
    }
}

// ─── Instances ───────────────────────────────────────────────────────────

/// Properties captured before the animation perturbs them.
#[derive(Debug, Clone, PartialEq)]
struct Origin {
    opacity: f64,
    position: Point,
    center: Point,
    scale: Vec2,
    angle: f64,
    fill: Option<String>,
    stroke: Option<String>,
    flags: Flags,
}

impl Origin {
    fn capture(obj: &SceneObject) -> Self {
        Self {
            opacity: obj.appearance.opacity,
            position: obj.geometry.position(),
            center: obj.geometry.center(),
            scale: Vec2::new(obj.geometry.scale_x, obj.geometry.scale_y),
            angle: obj.geometry.angle,
            fill: obj.appearance.fill.clone(),
            stroke: obj.appearance.stroke.clone(),
            flags: obj.flags,
        }
    }

    fn restore(&self, obj: &mut SceneObject) {
        obj.appearance.opacity = self.opacity;
        obj.geometry.left = self.position.x;
        obj.geometry.top = self.position.y;
        obj.geometry.scale_x = self.scale.x;
        obj.geometry.scale_y = self.scale.y;
        obj.geometry.angle = self.angle;
        obj.appearance.fill = self.fill.clone();
        obj.appearance.stroke = self.stroke.clone();
        obj.flags = self.flags;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Playing,
    Paused,
}

#[derive(Debug, Clone)]
struct Instance {
    descriptor: AnimationDescriptor,
    origin: Origin,
    /// Timestamp of frame zero (after the delay). Set on the first tick.
    start: Option<f64>,
    /// Elapsed time when paused.
    elapsed: f64,
    state: PlayState,
}

/// What a tick changed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TickOutcome {
    pub updated: Vec<ObjectId>,
    /// Non-looping animations that completed and were stopped.
    pub finished: Vec<ObjectId>,
}

#[derive(Debug, Default)]
pub struct Animator {
    instances: HashMap<ObjectId, Instance>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self, id: ObjectId) -> bool {
        self.instances
            .get(&id)
            .is_some_and(|i| i.state == PlayState::Playing)
    }

    pub fn state(&self, id: ObjectId) -> Option<PlayState> {
        self.instances.get(&id).map(|i| i.state)
    }

    pub fn has_running(&self) -> bool {
        self.instances.values().any(|i| i.state == PlayState::Playing)
    }

    /// Start (or restart) the object's animation. Returns `false` when the
    /// object carries no animation.
    pub fn play(&mut self, obj: &mut SceneObject) -> bool {
        if self.instances.contains_key(&obj.id) {
            self.stop(obj);
        }
        let Some(descriptor) = obj.metadata.animation.clone() else {
            log::warn!("object {} has no animation", obj.id);
            return false;
        };
        if descriptor.kind == AnimationKind::None {
            return false;
        }
        let origin = Origin::capture(obj);
        obj.flags.has_controls = false;
        obj.flags.lock_movement_x = true;
        obj.flags.lock_movement_y = true;
        log::debug!("play {:?} on {}", descriptor.kind, obj.id);
        self.instances.insert(
            obj.id,
            Instance {
                descriptor,
                origin,
                start: None,
                elapsed: 0.0,
                state: PlayState::Playing,
            },
        );
        true
    }

    pub fn pause(&mut self, id: ObjectId) -> bool {
        match self.instances.get_mut(&id) {
            Some(instance) if instance.state == PlayState::Playing => {
                instance.state = PlayState::Paused;
                true
            }
            _ => false,
        }
    }

    /// Resume a paused animation from where it stopped.
    pub fn resume(&mut self, id: ObjectId) -> bool {
        match self.instances.get_mut(&id) {
            Some(instance) if instance.state == PlayState::Paused => {
                instance.state = PlayState::Playing;
                instance.start = None;
                true
            }
            _ => false,
        }
    }

    /// Stop and restore the captured state.
    pub fn stop(&mut self, obj: &mut SceneObject) -> bool {
        let Some(instance) = self.instances.remove(&obj.id) else {
            return false;
        };
        instance.origin.restore(obj);
        true
    }

    pub fn restart(&mut self, obj: &mut SceneObject) -> bool {
        self.stop(obj);
        self.play(obj)
    }

    /// Drop an instance without restoring (the object is gone).
    pub fn forget(&mut self, id: ObjectId) {
        self.instances.remove(&id);
    }

    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Advance every playing animation to `now` (milliseconds).
    pub fn tick(&mut self, now: f64, objects: &mut Registry) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        let mut stale = Vec::new();
        for (id, instance) in self.instances.iter_mut() {
            if instance.state != PlayState::Playing {
                continue;
            }
            let Some(obj) = objects.get_mut(*id) else {
                stale.push(*id);
                continue;
            };
            let resume_from = instance.elapsed;
            let delay = instance.descriptor.delay;
            let start = *instance.start.get_or_insert(if resume_from > 0.0 {
                now - resume_from
            } else {
                now + delay
            });
            if now < start {
                continue;
            }
            let elapsed = now - start;
            instance.elapsed = elapsed;
            let d = &instance.descriptor;
            let duration = d.duration.max(1.0);
            let pass = (elapsed / duration).floor();
            let done = !d.looping && elapsed >= duration;
            let mut t = if done { 1.0 } else { (elapsed % duration) / duration };
            if d.looping && pass as u64 % 2 == 1 {
                t = 1.0 - t;
            }
            apply(d, &instance.origin, obj, ease(d.easing, t));
            outcome.updated.push(*id);
            if done {
                outcome.finished.push(*id);
            }
        }
        for id in stale {
            self.instances.remove(&id);
        }
        for id in &outcome.finished {
            if let Some(obj) = objects.get_mut(*id) {
                self.stop(obj);
            }
        }
        outcome
    }
}

/// Write the animated properties for eased progress `p`.
fn apply(d: &AnimationDescriptor, origin: &Origin, obj: &mut SceneObject, p: f64) {
    let along = |distance: f64| match d.axis {
        Axis::Horizontal => Vec2::new(distance, 0.0),
        Axis::Vertical => Vec2::new(0.0, distance),
    };
    match d.kind {
        AnimationKind::None => {}
        AnimationKind::Fade => {
            let target = d.opacity.unwrap_or(0.0);
            obj.appearance.opacity = origin.opacity + (target - origin.opacity) * p;
        }
        AnimationKind::Bounce => {
            let pos = origin.position + along(d.offset.unwrap_or(DEFAULT_BOUNCE) * p);
            obj.geometry.left = pos.x;
            obj.geometry.top = pos.y;
        }
        AnimationKind::Shake => {
            let wave = (p * SHAKE_CYCLES * std::f64::consts::TAU).sin();
            let pos = origin.position + along(d.offset.unwrap_or(DEFAULT_SHAKE) * wave);
            obj.geometry.left = pos.x;
            obj.geometry.top = pos.y;
        }
        AnimationKind::Scaling => {
            let factor = 1.0 + (d.scale.unwrap_or(DEFAULT_SCALE) - 1.0) * p;
            obj.geometry.scale_x = origin.scale.x * factor;
            obj.geometry.scale_y = origin.scale.y * factor;
            obj.geometry.set_center(origin.center);
        }
        AnimationKind::Rotation => {
            obj.geometry.angle = origin.angle + d.angle.unwrap_or(DEFAULT_ROTATION) * p;
            obj.geometry.set_center(origin.center);
        }
        AnimationKind::Flash => {
            let tween = |from: &Option<String>, to: &Option<String>| {
                let from = from.as_deref().and_then(Color::parse)?;
                let to = to.as_deref().and_then(Color::parse)?;
                Some(from.lerp(&to, p).to_css())
            };
            // Colors that do not parse are left as they are.
            if let Some(fill) = tween(&origin.fill, &d.fill) {
                obj.appearance.fill = Some(fill);
            }
            if let Some(stroke) = tween(&origin.stroke, &d.stroke) {
                obj.appearance.stroke = Some(stroke);
            }
        }
    }
}
