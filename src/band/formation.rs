//! Placement geometry for the formation helpers.
//!
//! These are pure functions: slot `i` of `count` maps to a point. The
//! Command Surface places members with them and the curriculum builds target
//! formations with them, so both always agree.

// Slot indices are small; float conversion is exact in practice.
#![allow(clippy::cast_precision_loss)]

use std::f64::consts::TAU;

use crate::band::field::Position;

/// Default spacing between block cells, in yards.
pub const DEFAULT_BLOCK_SPACING: f64 = 5.0;

/// Evenly spaced points on the segment `start..=end`.
///
/// Two or more slots include both endpoints; a single slot sits at the
/// midpoint.
#[must_use]
pub fn line_points(count: usize, start: Position, end: Position) -> Vec<Position> {
    match count {
        0 => Vec::new(),
        1 => vec![Position::new(
            (start.x + end.x) / 2.0,
            (start.y + end.y) / 2.0,
        )],
        _ => {
            let last = (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let t = i as f64 / last;
                    Position::new(
                        start.x + (end.x - start.x) * t,
                        start.y + (end.y - start.y) * t,
                    )
                })
                .collect()
        }
    }
}

/// Points at equal angular increments around a circle.
///
/// Slot 0 sits at angle 0 (along +x from the center); angles grow
/// counter-clockwise in field coordinates.
#[must_use]
pub fn circle_points(count: usize, center: Position, radius: f64) -> Vec<Position> {
    if count == 0 {
        return Vec::new();
    }
    let step = TAU / count as f64;
    (0..count)
        .map(|i| {
            let angle = step * i as f64;
            Position::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            )
        })
        .collect()
}

/// Grid points filled row-major from `origin`.
///
/// The column count is `ceil(count / rows)`. Returns an empty list when
/// `rows` is zero.
#[must_use]
pub fn block_points(count: usize, origin: Position, rows: usize, spacing: f64) -> Vec<Position> {
    if count == 0 || rows == 0 {
        return Vec::new();
    }
    let cols = count.div_ceil(rows);
    (0..count)
        .map(|i| {
            let row = i / cols;
            let col = i % cols;
            Position::new(
                origin.x + col as f64 * spacing,
                origin.y + row as f64 * spacing,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_line_four() {
        let pts = line_points(4, Position::new(20.0, 26.0), Position::new(80.0, 26.0));
        let xs: Vec<f64> = pts.iter().map(|p| p.x).collect();
        assert!(close(xs[0], 20.0) && close(xs[1], 40.0) && close(xs[2], 60.0) && close(xs[3], 80.0));
        assert!(pts.iter().all(|p| close(p.y, 26.0)));
    }

    #[test]
    fn test_line_single_midpoint() {
        let pts = line_points(1, Position::new(10.0, 10.0), Position::new(30.0, 20.0));
        assert_eq!(pts.len(), 1);
        assert!(close(pts[0].x, 20.0) && close(pts[0].y, 15.0));
    }

    #[test]
    fn test_circle_starts_on_x_axis() {
        let pts = circle_points(4, Position::new(50.0, 26.0), 10.0);
        assert!(close(pts[0].x, 60.0) && close(pts[0].y, 26.0));
        assert!(close(pts[1].x, 50.0) && close(pts[1].y, 36.0));
    }

    #[test]
    fn test_block_row_major() {
        let pts = block_points(5, Position::new(10.0, 10.0), 2, 5.0);
        // 3 columns, second row holds two members
        assert!(close(pts[2].x, 20.0) && close(pts[2].y, 10.0));
        assert!(close(pts[3].x, 10.0) && close(pts[3].y, 15.0));
        assert!(close(pts[4].x, 15.0) && close(pts[4].y, 15.0));
    }

    #[test]
    fn test_block_zero_rows() {
        assert!(block_points(4, Position::new(0.0, 0.0), 0, 5.0).is_empty());
    }
}
