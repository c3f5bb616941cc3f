//! Alignment guidelines for dragged objects.
//!
//! While a single object is moved, its bounds are compared against every
//! other evented, non-link sibling and against the workarea. Six
//! alignments are checked: center, left and right edges (vertical guides)
//! plus center, top and bottom (horizontal guides). The closest hit per
//! axis snaps the object; a guide segment is drawn for every alignment
//! that holds after the snap.

use crate::surface::GuideLine;
use atelier_core::config::GuidelineConfig;
use kurbo::{Rect, Vec2};

/// Something the moving object can align against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    Object(Rect),
    /// The workarea: guides run across the whole span instead of only
    /// between the two objects.
    Workarea(Rect),
}

impl Target {
    fn rect(&self) -> Rect {
        match self {
            Target::Object(r) | Target::Workarea(r) => *r,
        }
    }
}

/// Snap delta to apply plus the guides to draw this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snap {
    pub delta: Vec2,
    pub lines: Vec<GuideLine>,
}

const ALIGNED: f64 = 1e-6;

fn in_range(a: f64, b: f64, margin: f64) -> bool {
    (a.round() - b.round()).abs() <= margin
}

#[derive(Clone, Copy)]
enum Edge {
    Start,
    Center,
    End,
}

const EDGES: [Edge; 3] = [Edge::Center, Edge::Start, Edge::End];

fn x_of(r: Rect, edge: Edge) -> f64 {
    match edge {
        Edge::Start => r.x0,
        Edge::Center => r.center().x,
        Edge::End => r.x1,
    }
}

fn y_of(r: Rect, edge: Edge) -> f64 {
    match edge {
        Edge::Start => r.y0,
        Edge::Center => r.center().y,
        Edge::End => r.y1,
    }
}

/// Smallest in-range correction along one axis.
fn closest(
    moving: Rect,
    targets: &[Target],
    margin: f64,
    coord: fn(Rect, Edge) -> f64,
) -> Option<f64> {
    let mut best: Option<f64> = None;
    for target in targets {
        for edge in EDGES {
            let (m, o) = (coord(moving, edge), coord(target.rect(), edge));
            if in_range(m, o, margin) {
                let d = o - m;
                if best.is_none_or(|b| d.abs() < b.abs()) {
                    best = Some(d);
                }
            }
        }
    }
    best
}

/// Compute guides for `moving` (its bounds after the raw drag delta).
pub fn snap(moving: Rect, targets: &[Target], config: &GuidelineConfig) -> Snap {
    if !config.enabled {
        return Snap::default();
    }
    let margin = config.margin;
    let span = config.span;
    let delta = Vec2::new(
        closest(moving, targets, margin, x_of).unwrap_or(0.0),
        closest(moving, targets, margin, y_of).unwrap_or(0.0),
    );

    // Only alignments that hold once the object sits at its snapped place.
    let snapped = moving + delta;
    let mut lines = Vec::new();
    for target in targets {
        let other = target.rect();
        for edge in EDGES {
            let ox = x_of(other, edge);
            if (x_of(snapped, edge) - ox).abs() < ALIGNED {
                lines.push(match target {
                    Target::Workarea(_) => GuideLine::vertical(ox, -span, span),
                    Target::Object(_) => GuideLine::vertical(
                        ox,
                        snapped.y0.min(other.y0),
                        snapped.y1.max(other.y1),
                    ),
                });
            }

            let oy = y_of(other, edge);
            if (y_of(snapped, edge) - oy).abs() < ALIGNED {
                lines.push(match target {
                    Target::Workarea(_) => GuideLine::horizontal(oy, -span, span),
                    Target::Object(_) => GuideLine::horizontal(
                        oy,
                        snapped.x0.min(other.x0),
                        snapped.x1.max(other.x1),
                    ),
                });
            }
        }
    }

    Snap { delta, lines }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> GuidelineConfig {
        GuidelineConfig::default()
    }

    #[test]
    fn left_edges_snap_within_margin() {
        let moving = Rect::new(103.0, 300.0, 153.0, 350.0);
        let other = Rect::new(100.0, 0.0, 200.0, 100.0);
        let snap = snap(moving, &[Target::Object(other)], &config());
        assert_eq!(snap.delta, Vec2::new(-3.0, 0.0));
        assert_eq!(snap.lines, vec![GuideLine::vertical(100.0, 0.0, 350.0)]);
    }

    #[test]
    fn out_of_range_produces_nothing() {
        let moving = Rect::new(110.0, 300.0, 170.0, 350.0);
        let other = Rect::new(100.0, 0.0, 200.0, 100.0);
        let snap = snap(moving, &[Target::Object(other)], &config());
        assert_eq!(snap, Snap::default());
    }

    #[test]
    fn workarea_center_guides_cross_the_span() {
        let workarea = Rect::new(0.0, 0.0, 600.0, 400.0);
        let moving = Rect::new(252.0, 10.0, 352.0, 60.0);
        let snap = snap(moving, &[Target::Workarea(workarea)], &config());
        assert_eq!(snap.delta.x, -2.0);
        assert!(snap.lines.contains(&GuideLine::vertical(300.0, -5000.0, 5000.0)));
    }

    #[test]
    fn closest_hit_wins_per_axis() {
        let moving = Rect::new(0.0, 103.0, 50.0, 153.0);
        let near = Rect::new(300.0, 101.0, 400.0, 200.0);
        let far = Rect::new(500.0, 99.0, 600.0, 140.0);
        let snap = snap(moving, &[Target::Object(far), Target::Object(near)], &config());
        assert_eq!(snap.delta.y, -2.0);
        assert_eq!(snap.lines, vec![GuideLine::horizontal(101.0, 0.0, 400.0)]);
    }

    #[test]
    fn every_alignment_at_the_snapped_place_gets_a_guide() {
        let moving = Rect::new(102.0, 300.0, 202.0, 350.0);
        let same_width = Rect::new(100.0, 0.0, 200.0, 100.0);
        let snap = snap(moving, &[Target::Object(same_width)], &config());
        assert_eq!(snap.delta, Vec2::new(-2.0, 0.0));
        assert_eq!(
            snap.lines,
            vec![
                GuideLine::vertical(150.0, 0.0, 350.0),
                GuideLine::vertical(100.0, 0.0, 350.0),
                GuideLine::vertical(200.0, 0.0, 350.0),
            ]
        );
    }

    #[test]
    fn disabled_config_never_snaps() {
        let cfg = GuidelineConfig {
            enabled: false,
            ..config()
        };
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(snap(r, &[Target::Object(r)], &cfg), Snap::default());
    }
}
