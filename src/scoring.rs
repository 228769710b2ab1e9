//! Formation scoring: Pride Points.
//!
//! The scorer is a pure function of the final band, the target, the run
//! statistics and the current streak. It never records the outcome itself,
//! so scoring the same snapshot twice always yields the same report.
//!
//! ```text
//! base        = correct / expected × max_base
//! efficiency  = max_efficiency × (par − used) / par      (used < par)
//! creativity  = per_helper × helpers beyond the minimal set, capped
//! speed       = max_speed × (1 − elapsed / par_time)     (elapsed < par_time)
//! final       = round((base + efficiency + creativity + speed) × multiplier)
//! ```
//!
//! Bonuses are only awarded when every slot is correct.

// Slot and command counts are small; float conversion is exact. The final
// score is rounded from a bounded value.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

mod matcher;
mod streak;
mod target;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::band::BandMember;
use crate::sandbox::RunStats;

pub use matcher::{match_slots, SlotMatch};
pub use streak::{StreakCounter, MAX_STREAK_BONUS, STREAK_STEP};
pub use target::{
    FormationTarget, MemberSelector, TargetSlot, DEFAULT_FACING_TOLERANCE, DEFAULT_TOLERANCE,
};

/// Point values for each part of the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Base points for a fully correct formation.
    pub max_base: f64,
    /// Largest efficiency bonus.
    pub max_efficiency: f64,
    /// Creativity bonus per formation helper beyond the minimal set.
    pub creativity_per_helper: f64,
    /// Largest creativity bonus.
    pub max_creativity: f64,
    /// Largest speed bonus.
    pub max_speed: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            max_base: 100.0,
            max_efficiency: 20.0,
            creativity_per_helper: 5.0,
            max_creativity: 20.0,
            max_speed: 15.0,
        }
    }
}

/// Score breakdown for one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    /// Points for correctly placed members.
    pub base_points: f64,
    /// Bonus for using fewer band commands than par.
    pub efficiency_bonus: f64,
    /// Bonus for using formation helpers beyond the minimal set.
    pub creativity_bonus: f64,
    /// Bonus for finishing faster than par time.
    pub speed_bonus: f64,
    /// Streak multiplier in effect for this run.
    pub streak_multiplier: f64,
    /// Pride Points earned.
    pub final_score: i64,
    /// Slots filled within tolerance.
    pub correct: usize,
    /// Slots in the target.
    pub expected: usize,
    /// Human-readable notes, one per missed slot plus a summary.
    pub diagnostics: Vec<String>,
}

impl ScoreReport {
    /// Whether every slot was filled correctly.
    #[must_use]
    pub fn is_perfect(&self) -> bool {
        self.correct == self.expected
    }
}

/// Compares a band against a target formation.
#[derive(Debug, Clone, Default)]
pub struct FormationScorer {
    weights: ScoringWeights,
}

impl FormationScorer {
    /// Create a scorer with the given weights.
    #[must_use]
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// The weights in use.
    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score a final band state.
    #[must_use]
    pub fn score(
        &self,
        members: &[BandMember],
        target: &FormationTarget,
        stats: &RunStats,
        streak: &StreakCounter,
    ) -> ScoreReport {
        let matches = match_slots(members, target);
        let expected = matches.len();
        let correct = matches.iter().filter(|m| m.correct).count();
        let mut diagnostics = missed_slot_notes(&matches, target);

        let base_points = if expected == 0 {
            self.weights.max_base
        } else {
            correct as f64 / expected as f64 * self.weights.max_base
        };

        let perfect = correct == expected;
        let (efficiency_bonus, creativity_bonus, speed_bonus) = if perfect {
            (
                self.efficiency(stats, target),
                self.creativity(stats, target),
                self.speed(stats, target),
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        let streak_multiplier = streak.multiplier();
        let total = base_points + efficiency_bonus + creativity_bonus + speed_bonus;
        let final_score = (total * streak_multiplier).round() as i64;

        diagnostics.push(if perfect {
            format!("All {expected} positions correct in \"{}\".", target.name)
        } else {
            format!(
                "{correct} of {expected} positions correct in \"{}\".",
                target.name
            )
        });

        debug!(
            target = %target.name,
            correct,
            expected,
            final_score,
            "formation scored"
        );

        ScoreReport {
            base_points,
            efficiency_bonus,
            creativity_bonus,
            speed_bonus,
            streak_multiplier,
            final_score,
            correct,
            expected,
            diagnostics,
        }
    }

    fn efficiency(&self, stats: &RunStats, target: &FormationTarget) -> f64 {
        match target.par_operations {
            Some(par) if par > 0 && stats.command_count() < par => {
                let saved = (par - stats.command_count()) as f64;
                self.weights.max_efficiency * saved / par as f64
            }
            _ => 0.0,
        }
    }

    /// Best-effort: counts distinct formation helpers the minimal solution
    /// does not need.
    fn creativity(&self, stats: &RunStats, target: &FormationTarget) -> f64 {
        if target.minimal_commands.is_empty() {
            return 0.0;
        }
        let extra = stats
            .kinds_used()
            .into_iter()
            .filter(|kind| kind.is_formation() && !target.minimal_commands.contains(kind))
            .count();
        (extra as f64 * self.weights.creativity_per_helper).min(self.weights.max_creativity)
    }

    fn speed(&self, stats: &RunStats, target: &FormationTarget) -> f64 {
        match target.par_time_ms {
            Some(par) if par > 0 => {
                let ratio = stats.elapsed_ms() / par as f64;
                (self.weights.max_speed * (1.0 - ratio)).max(0.0)
            }
            _ => 0.0,
        }
    }
}

fn missed_slot_notes(matches: &[SlotMatch], target: &FormationTarget) -> Vec<String> {
    matches
        .iter()
        .filter(|m| !m.correct)
        .map(|m| {
            let slot = &target.slots[m.slot];
            match (m.member, m.distance) {
                (Some(id), Some(distance)) if distance > target.tolerance_for(slot) => format!(
                    "Member {id} is {distance:.1} yards from ({:.1}, {:.1}).",
                    slot.x, slot.y
                ),
                (Some(id), _) => format!(
                    "Member {id} is in place at ({:.1}, {:.1}) but facing the wrong way.",
                    slot.x, slot.y
                ),
                (None, _) => format!(
                    "Nobody is available for the spot at ({:.1}, {:.1}).",
                    slot.x, slot.y
                ),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::band::{CommandKind, CommandRecord, Position, Roster, Section};

    fn line_members() -> Vec<BandMember> {
        (0..4)
            .map(|i| {
                BandMember::new(
                    i,
                    Section::Brass,
                    "trumpet",
                    Position::new(20.0 + 20.0 * f64::from(i), 26.0),
                    0,
                )
            })
            .collect()
    }

    fn line_target() -> FormationTarget {
        FormationTarget::from_points(
            "line",
            (0..4).map(MemberSelector::Id),
            (0..4)
                .map(|i| Position::new(20.0 + 20.0 * f64::from(i), 26.0))
                .collect(),
        )
    }

    fn stats(kinds: &[CommandKind]) -> RunStats {
        RunStats {
            commands: kinds
                .iter()
                .map(|&kind| CommandRecord { kind, affected: 4 })
                .collect(),
            ..RunStats::default()
        }
    }

    #[test]
    fn test_perfect_without_pars() {
        let report = FormationScorer::default().score(
            &line_members(),
            &line_target(),
            &stats(&[CommandKind::FormLine]),
            &StreakCounter::new(),
        );
        assert!(report.is_perfect());
        assert!((report.base_points - 100.0).abs() < f64::EPSILON);
        assert_eq!(report.final_score, 100);
    }

    #[test]
    fn test_partial_gets_no_bonus() {
        let mut members = line_members();
        members[3] = BandMember::new(3, Section::Brass, "trumpet", Position::new(90.0, 26.0), 0);
        let target = line_target().with_par_operations(10);
        let report = FormationScorer::default().score(
            &members,
            &target,
            &stats(&[CommandKind::FormLine]),
            &StreakCounter::from_streak(2),
        );
        assert_eq!(report.correct, 3);
        assert!((report.base_points - 75.0).abs() < 1e-9);
        assert!(report.efficiency_bonus.abs() < f64::EPSILON);
        assert_eq!(report.final_score, 83); // 75 × 1.1 = 82.5
        assert!(report.diagnostics[0].contains("Member 3 is 10.0 yards"));
    }

    #[test]
    fn test_efficiency_bonus() {
        let target = line_target().with_par_operations(4);
        let report = FormationScorer::default().score(
            &line_members(),
            &target,
            &stats(&[CommandKind::FormLine]),
            &StreakCounter::new(),
        );
        assert!((report.efficiency_bonus - 15.0).abs() < 1e-9);
        assert_eq!(report.final_score, 115);
    }

    #[test]
    fn test_creativity_bonus() {
        let target = line_target().with_minimal_commands([CommandKind::MoveTo]);
        let report = FormationScorer::default().score(
            &line_members(),
            &target,
            &stats(&[CommandKind::FormLine, CommandKind::FormCircle, CommandKind::FormLine]),
            &StreakCounter::new(),
        );
        assert!((report.creativity_bonus - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_speed_bonus() {
        let target = line_target().with_par_time_ms(100);
        let mut run = stats(&[CommandKind::FormLine]);
        run.elapsed = Duration::from_millis(50);
        let report = FormationScorer::default().score(
            &line_members(),
            &target,
            &run,
            &StreakCounter::new(),
        );
        assert!((report.speed_bonus - 7.5).abs() < 1e-6);

        run.elapsed = Duration::from_millis(500);
        let slow = FormationScorer::default().score(
            &line_members(),
            &target,
            &run,
            &StreakCounter::new(),
        );
        assert!(slow.speed_bonus.abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_target_is_full_marks() {
        let report = FormationScorer::default().score(
            &line_members(),
            &FormationTarget::new("free"),
            &RunStats::default(),
            &StreakCounter::new(),
        );
        assert!(report.is_perfect());
        assert_eq!(report.final_score, 100);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let members = Roster::standard(8).to_store().unwrap();
        let target = line_target().with_par_operations(3);
        let scorer = FormationScorer::default();
        let run = stats(&[CommandKind::MoveTo]);
        let streak = StreakCounter::from_streak(5);
        let first = scorer.score(members.get_all_members(), &target, &run, &streak);
        let second = scorer.score(members.get_all_members(), &target, &run, &streak);
        assert_eq!(first, second);
    }
}
