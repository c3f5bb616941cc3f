//! Link path geometry.
//!
//! Links leave the bottom of the source node and enter the top of the
//! target node, so every style starts and ends moving vertically.

use atelier_core::model::LineStyle;
use kurbo::{BezPath, ParamCurve, ParamCurveDeriv, ParamCurveNearest, PathSeg, Point, Rect, Shape};

/// Minimum vertical reach of the curved style's control points.
const CURVE_MIN_REACH: f64 = 40.0;
/// Clearance the orthogonal style keeps below/above the ports.
const ORTHO_GAP: f64 = 20.0;
/// Tolerance used when flattening for nearest-point queries.
const ACCURACY: f64 = 0.1;

pub fn link_path(start: Point, end: Point, style: LineStyle) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(start);
    match style {
        LineStyle::Straight => path.line_to(end),
        LineStyle::Curved => {
            let reach = ((end.y - start.y).abs() / 2.0).max(CURVE_MIN_REACH);
            path.curve_to(
                Point::new(start.x, start.y + reach),
                Point::new(end.x, end.y - reach),
                end,
            );
        }
        LineStyle::Orthogonal => {
            for p in orthogonal_route(start, end) {
                path.line_to(p);
            }
        }
    }
    path
}

/// Corner points after `start`, ending at `end`.
fn orthogonal_route(start: Point, end: Point) -> Vec<Point> {
    if end.y - start.y >= ORTHO_GAP * 2.0 {
        let mid_y = (start.y + end.y) / 2.0;
        return vec![
            Point::new(start.x, mid_y),
            Point::new(end.x, mid_y),
            end,
        ];
    }
    // Target sits above (or level with) the source: go down, across,
    // up past the target, across, then down into it.
    let below = start.y + ORTHO_GAP;
    let above = end.y - ORTHO_GAP;
    let mid_x = (start.x + end.x) / 2.0;
    vec![
        Point::new(start.x, below),
        Point::new(mid_x, below),
        Point::new(mid_x, above),
        Point::new(end.x, above),
        end,
    ]
}

/// Distance from `point` to the nearest point on `path`.
pub fn distance_to(path: &BezPath, point: Point) -> f64 {
    path.segments()
        .map(|seg| seg.nearest(point, ACCURACY).distance_sq)
        .fold(f64::INFINITY, f64::min)
        .sqrt()
}

/// Tip and direction (radians) of the arrow head at the path's end.
pub fn arrow_head(path: &BezPath) -> Option<(Point, f64)> {
    let last: PathSeg = path.segments().last()?;
    let tip = last.eval(1.0);
    let tangent = match last {
        PathSeg::Line(line) => line.p1 - line.p0,
        PathSeg::Quad(quad) => quad.deriv().eval(1.0).to_vec2(),
        PathSeg::Cubic(cubic) => cubic.deriv().eval(1.0).to_vec2(),
    };
    Some((tip, tangent.atan2()))
}

pub fn bounds(path: &BezPath) -> Rect {
    path.bounding_box()
}
