use atelier_core::config::GridConfig;
use atelier_core::geometry::Geometry;

/// Round `value` to the nearest multiple of `size`.
pub fn snap_value(value: f64, size: f64) -> f64 {
    if size <= 0.0 {
        return value;
    }
    (value / size).round() * size
}

/// Snap a moving object's left/top onto the grid when snapping is on.
/// Returns whether anything changed.
pub fn snap_geometry(geometry: &mut Geometry, grid: &GridConfig) -> bool {
    if !(grid.enabled && grid.snap_to_grid) {
        return false;
    }
    let left = snap_value(geometry.left, grid.size);
    let top = snap_value(geometry.top, grid.size);
    let changed = left != geometry.left || top != geometry.top;
    geometry.left = left;
    geometry.top = top;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_round_to_nearest_cell() {
        assert_eq!(snap_value(14.9, 10.0), 10.0);
        assert_eq!(snap_value(15.0, 10.0), 20.0);
        assert_eq!(snap_value(-4.0, 10.0), -0.0);
        assert_eq!(snap_value(7.0, 0.0), 7.0);
    }

    #[test]
    fn snapping_requires_both_toggles() {
        let mut g = Geometry::new(13.0, 27.0, 10.0, 10.0);
        let mut grid = GridConfig {
            enabled: true,
            snap_to_grid: false,
            size: 10.0,
        };
        assert!(!snap_geometry(&mut g, &grid));
        grid.snap_to_grid = true;
        assert!(snap_geometry(&mut g, &grid));
        assert_eq!((g.left, g.top), (10.0, 30.0));
    }
}
