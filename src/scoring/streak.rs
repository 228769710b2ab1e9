//! Session streak counter.

// Streak lengths are small; the float conversion is exact.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use serde::{Deserialize, Serialize};

/// Multiplier gained per consecutive fully correct run.
pub const STREAK_STEP: f64 = 0.05;

/// Largest bonus the streak can add on top of 1.0×.
pub const MAX_STREAK_BONUS: f64 = 0.5;

/// Consecutive fully correct runs.
///
/// Owned by the caller (the session) and passed to the scorer by reference.
/// The scorer reads the multiplier; only the caller records outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakCounter {
    current: u32,
    best: u32,
}

impl StreakCounter {
    /// A fresh counter at 1.0×.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: 0, best: 0 }
    }

    /// A counter that already has `streak` correct runs behind it.
    #[must_use]
    pub const fn from_streak(streak: u32) -> Self {
        Self {
            current: streak,
            best: streak,
        }
    }

    /// Rebuild a counter from a persisted multiplier.
    ///
    /// Values below 1.0 or non-finite values give a fresh counter.
    #[must_use]
    pub fn from_multiplier(multiplier: f64) -> Self {
        if !multiplier.is_finite() || multiplier <= 1.0 {
            return Self::new();
        }
        let bonus = (multiplier - 1.0).min(MAX_STREAK_BONUS);
        Self::from_streak((bonus / STREAK_STEP).round() as u32)
    }

    /// Current streak length.
    #[must_use]
    pub const fn streak(&self) -> u32 {
        self.current
    }

    /// Longest streak seen by this counter.
    #[must_use]
    pub const fn best(&self) -> u32 {
        self.best
    }

    /// Score multiplier for the next run: `1 + min(streak × 0.05, 0.5)`.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        1.0 + (f64::from(self.current) * STREAK_STEP).min(MAX_STREAK_BONUS)
    }

    /// Record a run outcome.
    pub fn record(&mut self, fully_correct: bool) {
        if fully_correct {
            self.current = self.current.saturating_add(1);
            self.best = self.best.max(self.current);
        } else {
            self.reset();
        }
    }

    /// Drop back to 1.0×.
    pub fn reset(&mut self) {
        self.current = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_multiplier() {
        assert!((StreakCounter::new().multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_streak_grows_and_caps() {
        let mut streak = StreakCounter::new();
        for _ in 0..3 {
            streak.record(true);
        }
        assert!((streak.multiplier() - 1.15).abs() < 1e-9);
        for _ in 0..20 {
            streak.record(true);
        }
        assert!((streak.multiplier() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_incorrect_run_resets_but_keeps_best() {
        let mut streak = StreakCounter::from_streak(4);
        streak.record(false);
        assert_eq!(streak.streak(), 0);
        assert_eq!(streak.best(), 4);
        assert!((streak.multiplier() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_multiplier() {
        assert_eq!(StreakCounter::from_multiplier(1.2).streak(), 4);
        assert_eq!(StreakCounter::from_multiplier(9.0).streak(), 10);
        assert_eq!(StreakCounter::from_multiplier(f64::NAN).streak(), 0);
        assert_eq!(StreakCounter::from_multiplier(0.5).streak(), 0);
    }
}
