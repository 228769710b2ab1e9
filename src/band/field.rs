//! Field geometry: bounds, clamping and facing arithmetic.
//!
//! Coordinates are in yards. `x` runs along the length of the field from the
//! left end zone line, `y` runs across it from the back sideline.

use serde::{Deserialize, Serialize};

/// Length of the field in yards (goal line to goal line).
pub const FIELD_LENGTH: f64 = 100.0;

/// Width of the field in yards (sideline to sideline).
pub const FIELD_WIDTH: f64 = 53.33;

/// Distance covered by one marching step, in yards.
///
/// Used by `move_forward` and by anything that converts steps to distance.
pub const STEP_LENGTH_YARDS: f64 = 0.8;

/// Number of distinct facings (degrees in a full turn).
pub const FULL_TURN: i64 = 360;

/// A point on the field.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Yards from the left end of the field.
    pub x: f64,
    /// Yards from the back sideline.
    pub y: f64,
}

impl Position {
    /// Create a position without clamping.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Create a position clamped into the field bounds.
    ///
    /// NaN coordinates collapse to the lower bound so the result is always
    /// a valid field position.
    #[must_use]
    pub fn clamped(x: f64, y: f64) -> Self {
        Self {
            x: clamp_axis(x, FIELD_LENGTH),
            y: clamp_axis(y, FIELD_WIDTH),
        }
    }

    /// Euclidean distance to another position, in yards.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Whether this position lies inside the field bounds.
    #[must_use]
    pub fn is_on_field(self) -> bool {
        (0.0..=FIELD_LENGTH).contains(&self.x) && (0.0..=FIELD_WIDTH).contains(&self.y)
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// Normalize a facing in degrees into `[0, 360)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn normalize_facing(degrees: i64) -> u16 {
    degrees.rem_euclid(FULL_TURN) as u16
}

/// Smallest angle between two facings, in degrees (`0..=180`).
#[must_use]
pub fn facing_difference(a: i64, b: i64) -> u16 {
    let diff = normalize_facing(i64::from(normalize_facing(a)) - i64::from(normalize_facing(b)));
    diff.min(360 - diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_bounds() {
        let p = Position::clamped(-5.0, 80.0);
        assert!((p.x - 0.0).abs() < f64::EPSILON);
        assert!((p.y - FIELD_WIDTH).abs() < f64::EPSILON);

        let p = Position::clamped(f64::INFINITY, f64::NEG_INFINITY);
        assert!((p.x - FIELD_LENGTH).abs() < f64::EPSILON);
        assert!(p.y.abs() < f64::EPSILON);
    }

    #[test]
    fn test_clamped_nan() {
        let p = Position::clamped(f64::NAN, 10.0);
        assert!(p.is_on_field());
        assert!(p.x.abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_facing() {
        assert_eq!(normalize_facing(0), 0);
        assert_eq!(normalize_facing(360), 0);
        assert_eq!(normalize_facing(-90), 270);
        assert_eq!(normalize_facing(725), 5);
        assert_eq!(normalize_facing(i64::MIN), normalize_facing(i64::MIN % 360));
    }

    #[test]
    fn test_facing_difference() {
        assert_eq!(facing_difference(10, 350), 20);
        assert_eq!(facing_difference(90, 270), 180);
        assert_eq!(facing_difference(45, 45), 0);
    }

    #[test]
    fn test_distance() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < 1e-12);
    }
}
