//! Per-learner challenge progress and the local leaderboard.
//!
//! Progress is fed from scored runs: a perfect run marks its challenge as
//! completed, and every scored run can raise the best score kept for that
//! challenge. The whole record is plain JSON so a front end can keep it
//! between sessions.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LoadError;
use crate::session::RunOutcome;

use super::{catalog, rotation_day};

/// Leaderboard entries kept; lower scores fall off first.
pub const LEADERBOARD_CAPACITY: usize = 100;

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Player name.
    pub name: String,
    /// Challenge the score was earned on.
    pub challenge: u32,
    /// Final score.
    pub score: i64,
    /// Rotation day the score was recorded (day 0 is 2024-01-01).
    pub day: i64,
}

/// Completed challenges, best scores and the leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Progress {
    completed: BTreeSet<u32>,
    best_scores: BTreeMap<u32, i64>,
    leaderboard: Vec<LeaderboardEntry>,
}

impl Progress {
    /// Empty progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a run on `challenge`.
    ///
    /// Only scored runs count. Returns `true` if the run was perfect, which
    /// marks the challenge as completed.
    pub fn record(&mut self, challenge: u32, outcome: &RunOutcome) -> bool {
        let Some(report) = outcome.report() else {
            return false;
        };
        let best = self.best_scores.entry(challenge).or_insert(report.final_score);
        *best = (*best).max(report.final_score);

        let perfect = report.is_perfect();
        if perfect && self.completed.insert(challenge) {
            info!(challenge, completed = self.completed_count(), "challenge completed");
        }
        perfect
    }

    /// Whether `challenge` has been solved perfectly.
    #[must_use]
    pub fn is_completed(&self, challenge: u32) -> bool {
        self.completed.contains(&challenge)
    }

    /// Number of built-in challenges completed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        catalog()
            .iter()
            .filter(|c| self.completed.contains(&c.id))
            .count()
    }

    /// Share of the built-in catalog completed, from 0 to 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // Catalog sizes are tiny
    pub fn completion_percentage(&self) -> f64 {
        let total = catalog().len();
        if total == 0 {
            return 0.0;
        }
        self.completed_count() as f64 / total as f64 * 100.0
    }

    /// Best score seen on `challenge`, perfect or not.
    #[must_use]
    pub fn best_score(&self, challenge: u32) -> Option<i64> {
        self.best_scores.get(&challenge).copied()
    }

    /// Add a score to the leaderboard, dated today.
    pub fn add_to_leaderboard(&mut self, name: &str, challenge: u32, score: i64) {
        self.add_entry(LeaderboardEntry {
            name: name.to_string(),
            challenge,
            score,
            day: rotation_day(),
        });
    }

    /// Add a prepared entry, keeping at most [`LEADERBOARD_CAPACITY`].
    pub fn add_entry(&mut self, entry: LeaderboardEntry) {
        self.leaderboard.push(entry);
        if self.leaderboard.len() > LEADERBOARD_CAPACITY {
            self.sort_leaderboard();
            self.leaderboard.truncate(LEADERBOARD_CAPACITY);
        }
    }

    /// Top `limit` entries, highest score first. Ties keep insertion order.
    #[must_use]
    pub fn leaderboard(&self, limit: usize) -> Vec<&LeaderboardEntry> {
        let mut entries: Vec<&LeaderboardEntry> = self.leaderboard.iter().collect();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(limit);
        entries
    }

    /// Forget completions, best scores and the leaderboard.
    pub fn reset(&mut self) {
        self.completed.clear();
        self.best_scores.clear();
        self.leaderboard.clear();
    }

    /// Load progress from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Load progress, starting empty if the file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, LoadError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Save progress as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), LoadError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn sort_leaderboard(&mut self) {
        self.leaderboard.sort_by(|a, b| b.score.cmp(&a.score));
    }
}
