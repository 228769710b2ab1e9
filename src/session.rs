//! A play session: one band, one sandbox, one streak.
//!
//! The session owns the authoritative store. A run executes on a copy and
//! the result is committed only if the script completes, so a failed run
//! leaves the band exactly where the previous run left it. Sequential runs
//! build on each other until [`Session::reset`] puts the band back on its
//! roster spots.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::band::{assert_invariants, BandStore, Roster, DEFAULT_BAND_SIZE};
use crate::error::{Diagnostic, LoadError};
use crate::sandbox::{Execution, RunBudget, RunPhase, RunStats, Sandbox};
use crate::scoring::{FormationScorer, FormationTarget, ScoreReport, ScoringWeights, StreakCounter};
use crate::snapshot::Snapshot;

/// Session configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Per-run resource budget.
    pub budget: RunBudget,
    /// Score weights.
    pub weights: ScoringWeights,
    /// Band size for the standard roster.
    pub band_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            budget: RunBudget::default(),
            weights: ScoringWeights::default(),
            band_size: DEFAULT_BAND_SIZE,
        }
    }
}

impl SessionConfig {
    /// Load a configuration file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}

/// What happened to one run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// The script completed and was scored against a target.
    Scored {
        /// Score breakdown.
        report: ScoreReport,
        /// Run statistics.
        stats: RunStats,
    },
    /// The script completed with no target to score against.
    Completed {
        /// Run statistics.
        stats: RunStats,
    },
    /// The script failed or timed out; the band was not changed.
    Failed {
        /// [`RunPhase::Failed`] or [`RunPhase::TimedOut`].
        phase: RunPhase,
        /// Learner-facing description.
        diagnostic: Diagnostic,
        /// Statistics up to the failure.
        stats: RunStats,
    },
}

impl RunOutcome {
    /// Run statistics.
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        match self {
            Self::Scored { stats, .. } | Self::Completed { stats } | Self::Failed { stats, .. } => {
                stats
            }
        }
    }

    /// The score report, if the run was scored.
    #[must_use]
    pub fn report(&self) -> Option<&ScoreReport> {
        match self {
            Self::Scored { report, .. } => Some(report),
            _ => None,
        }
    }

    /// The failure diagnostic, if the run failed.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Failed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// Store, sandbox, scorer and streak for one learner.
#[derive(Debug, Clone)]
pub struct Session {
    roster: Roster,
    store: BandStore,
    sandbox: Sandbox,
    scorer: FormationScorer,
    streak: StreakCounter,
}

impl Session {
    /// Start a session with every member on its roster spot.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster has duplicate ids.
    pub fn new(config: &SessionConfig, roster: Roster) -> Result<Self, LoadError> {
        let store = roster.to_store()?;
        Ok(Self {
            roster,
            store,
            sandbox: Sandbox::new(config.budget),
            scorer: FormationScorer::new(config.weights),
            streak: StreakCounter::new(),
        })
    }

    /// Start a session on the standard roster of `config.band_size`.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster cannot be built.
    pub fn standard(config: &SessionConfig) -> Result<Self, LoadError> {
        Self::new(config, Roster::standard(config.band_size))
    }

    /// The current band.
    #[must_use]
    pub fn store(&self) -> &BandStore {
        &self.store
    }

    /// The roster the band resets to.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The streak counter.
    #[must_use]
    pub fn streak(&self) -> &StreakCounter {
        &self.streak
    }

    /// Replace the streak counter, for callers that persist it.
    pub fn set_streak(&mut self, streak: StreakCounter) {
        self.streak = streak;
    }

    /// The sandbox, for compile-only checks.
    #[must_use]
    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// Run a script and, if it completes, commit its result and score it.
    ///
    /// With a target, a complete run is scored with the current streak
    /// multiplier and then extends or resets the streak. A failed run resets
    /// the streak whether or not a target was given.
    pub fn run(&mut self, source: &str, target: Option<&FormationTarget>) -> RunOutcome {
        match self.sandbox.execute(source, &self.store) {
            Execution::Completed { store, stats } => {
                self.store = store;
                assert_invariants(&self.store);
                match target {
                    Some(target) => {
                        let report = self.scorer.score(
                            self.store.get_all_members(),
                            target,
                            &stats,
                            &self.streak,
                        );
                        self.streak.record(report.is_perfect());
                        info!(
                            score = report.final_score,
                            perfect = report.is_perfect(),
                            streak = self.streak.streak(),
                            "run scored"
                        );
                        RunOutcome::Scored { report, stats }
                    }
                    None => RunOutcome::Completed { stats },
                }
            }
            Execution::Failed {
                phase,
                diagnostic,
                stats,
            } => {
                self.streak.reset();
                warn!(%diagnostic, "run failed; band unchanged");
                RunOutcome::Failed {
                    phase,
                    diagnostic,
                    stats,
                }
            }
        }
    }

    /// Put every member back on its roster spot.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster cannot be rebuilt.
    pub fn reset(&mut self) -> Result<(), LoadError> {
        self.store = self.roster.to_store()?;
        Ok(())
    }

    /// Replace the band with a saved snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is invalid.
    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<(), LoadError> {
        self.store = snapshot.to_store()?;
        Ok(())
    }

    /// Capture the current band.
    #[must_use]
    pub fn snapshot(&self, name: Option<&str>) -> Snapshot {
        Snapshot::capture(&self.store, name)
    }
}
