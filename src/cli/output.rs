//! Output formatting utilities for CLI.

use bandcode::curriculum::{self, Challenge, LeaderboardEntry, Progress};
use bandcode::scoring::StreakCounter;
use bandcode::{BandMember, BandStore, Diagnostic, RunOutcome, ScoreReport};
use serde::Serialize;

/// JSON-serializable run result.
#[derive(Debug, Serialize)]
pub(super) struct JsonRunResult {
    /// "scored", "completed", "failed" or "timed out".
    pub(super) status: String,
    /// Score breakdown (null if not scored).
    pub(super) score: Option<ScoreReport>,
    /// Failure diagnostic (null if the script completed).
    pub(super) diagnostic: Option<Diagnostic>,
    /// Interpreter operations executed.
    pub(super) operations: u64,
    /// Band commands issued.
    pub(super) commands: usize,
    /// Execution time in milliseconds.
    pub(super) elapsed_ms: f64,
    /// Script output lines.
    pub(super) output: Vec<String>,
    /// Streak after this run.
    pub(super) streak: u32,
    /// Band after this run.
    pub(super) members: Vec<BandMember>,
}

impl JsonRunResult {
    /// Create from a run outcome.
    pub(super) fn new(outcome: &RunOutcome, store: &BandStore, streak: &StreakCounter) -> Self {
        let stats = outcome.stats();
        Self {
            status: status(outcome),
            score: outcome.report().cloned(),
            diagnostic: outcome.diagnostic().cloned(),
            operations: stats.operations,
            commands: stats.command_count(),
            elapsed_ms: stats.elapsed_ms(),
            output: stats.output.clone(),
            streak: streak.streak(),
            members: store.get_all_members().to_vec(),
        }
    }
}

fn status(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Scored { .. } => "scored".to_string(),
        RunOutcome::Completed { .. } => "completed".to_string(),
        RunOutcome::Failed { phase, .. } => phase.to_string(),
    }
}

/// Format a run outcome as human-readable text.
pub(super) fn format_run_text(
    outcome: &RunOutcome,
    store: &BandStore,
    streak: &StreakCounter,
) -> String {
    let mut output = String::new();
    let stats = outcome.stats();

    for line in &stats.output {
        output.push_str(&format!("> {line}\n"));
    }
    if !stats.output.is_empty() {
        output.push('\n');
    }

    output.push_str(&format!("Run: {}\n", status(outcome)));
    output.push_str(&format!(
        "  Operations: {}  Commands: {}  Time: {:.1}ms\n",
        stats.operations,
        stats.command_count(),
        stats.elapsed_ms()
    ));

    match outcome {
        RunOutcome::Failed { diagnostic, .. } => {
            output.push_str(&format!("\n{diagnostic}\n"));
        }
        RunOutcome::Scored { report, .. } => {
            output.push_str(&format_report_text(report));
            output.push_str(&format!(
                "  Streak: {} (best {})\n",
                streak.streak(),
                streak.best()
            ));
        }
        RunOutcome::Completed { .. } => {
            output.push_str("\nBand:\n");
            for m in store.get_all_members() {
                output.push_str(&format!(
                    "  Member {} ({} {}): x={:.1}, y={:.1}, facing={}\n",
                    m.id(),
                    m.section(),
                    m.instrument(),
                    m.x(),
                    m.y(),
                    m.facing()
                ));
            }
        }
    }

    output
}

fn format_report_text(report: &ScoreReport) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\nFormation: {}/{} slots correct\n",
        report.correct, report.expected
    ));
    output.push_str(&format!("  Base:       {:>6.1}\n", report.base_points));
    output.push_str(&format!("  Efficiency: {:>6.1}\n", report.efficiency_bonus));
    output.push_str(&format!("  Creativity: {:>6.1}\n", report.creativity_bonus));
    output.push_str(&format!("  Speed:      {:>6.1}\n", report.speed_bonus));
    output.push_str(&format!("  Multiplier: {:>6.2}x\n", report.streak_multiplier));
    output.push_str(&format!("  Pride Points: {}\n", report.final_score));
    for note in &report.diagnostics {
        output.push_str(&format!("  - {note}\n"));
    }
    output
}

/// JSON-serializable challenge summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonChallenge {
    pub(super) id: u32,
    pub(super) title: &'static str,
    pub(super) description: &'static str,
    pub(super) difficulty: String,
    pub(super) band_size: usize,
    pub(super) slots: usize,
    pub(super) hint: &'static str,
    pub(super) starter_code: &'static str,
    /// Whether this is today's challenge.
    pub(super) today: bool,
}

impl JsonChallenge {
    /// Create from a challenge.
    pub(super) fn from_challenge(challenge: &Challenge, today: bool) -> Self {
        Self {
            id: challenge.id,
            title: challenge.title,
            description: challenge.description,
            difficulty: challenge.difficulty.to_string(),
            band_size: challenge.band_size(),
            slots: challenge.target.slots.len(),
            hint: challenge.hint,
            starter_code: challenge.starter_code,
            today,
        }
    }
}

/// Format the challenge list as human-readable text.
pub(super) fn format_challenges_text(challenges: &[&Challenge], today: u32) -> String {
    let mut output = String::new();
    for c in challenges {
        let marker = if c.id == today { " (today)" } else { "" };
        output.push_str(&format!(
            "{:>2}. {} [{}, {} members]{marker}\n",
            c.id,
            c.title,
            c.difficulty,
            c.band_size()
        ));
        output.push_str(&format!("    {}\n", c.description));
    }
    output
}

/// JSON summary of a progress file.
#[derive(Debug, Serialize)]
pub(super) struct JsonProgress<'a> {
    /// Ids of completed built-in challenges.
    pub(super) completed: Vec<u32>,
    /// Built-in challenges in the catalog.
    pub(super) total: usize,
    /// Completed share, 0-100.
    pub(super) percentage: f64,
    /// Top leaderboard entries.
    pub(super) leaderboard: Vec<&'a LeaderboardEntry>,
}

impl<'a> JsonProgress<'a> {
    pub(super) fn new(progress: &'a Progress, top: usize) -> Self {
        Self {
            completed: completed_ids(progress),
            total: curriculum::catalog().len(),
            percentage: progress.completion_percentage(),
            leaderboard: progress.leaderboard(top),
        }
    }
}

fn completed_ids(progress: &Progress) -> Vec<u32> {
    curriculum::catalog()
        .iter()
        .map(|c| c.id)
        .filter(|&id| progress.is_completed(id))
        .collect()
}

/// Format progress as text.
pub(super) fn format_progress_text(progress: &Progress, top: usize) -> String {
    let mut output = format!(
        "Completed {} of {} challenges ({:.0}%)\n",
        progress.completed_count(),
        curriculum::catalog().len(),
        progress.completion_percentage()
    );
    for c in curriculum::catalog() {
        let mark = if progress.is_completed(c.id) { "x" } else { " " };
        let best = progress
            .best_score(c.id)
            .map_or_else(String::new, |s| format!(" (best {s})"));
        output.push_str(&format!("  [{mark}] {:>2}. {}{best}\n", c.id, c.title));
    }

    let leaders = progress.leaderboard(top);
    if !leaders.is_empty() {
        output.push_str("\nLeaderboard:\n");
        for (rank, entry) in leaders.iter().enumerate() {
            output.push_str(&format!(
                "  {:>3}. {:<16} {:>5}  (challenge {})\n",
                rank + 1,
                entry.name,
                entry.score,
                entry.challenge
            ));
        }
    }
    output
}

/// Result of grading one script.
#[derive(Debug, Clone, Serialize)]
pub(super) struct GradeResult {
    /// Script file name.
    pub(super) name: String,
    /// Pride Points (0 if the run failed).
    pub(super) score: i64,
    /// Slots filled correctly.
    pub(super) correct: usize,
    /// Slots in the target.
    pub(super) expected: usize,
    /// Interpreter operations executed.
    pub(super) operations: u64,
    /// Failure message (null if scored).
    pub(super) error: Option<String>,
}

impl GradeResult {
    /// Create from a run outcome.
    pub(super) fn from_outcome(name: String, outcome: &RunOutcome) -> Self {
        let operations = outcome.stats().operations;
        match outcome {
            RunOutcome::Scored { report, .. } => Self {
                name,
                score: report.final_score,
                correct: report.correct,
                expected: report.expected,
                operations,
                error: None,
            },
            RunOutcome::Failed { diagnostic, .. } => Self {
                name,
                score: 0,
                correct: 0,
                expected: 0,
                operations,
                error: Some(diagnostic.to_string()),
            },
            RunOutcome::Completed { .. } => Self {
                name,
                score: 0,
                correct: 0,
                expected: 0,
                operations,
                error: Some("no target to score against".to_string()),
            },
        }
    }

    /// A script that could not be loaded.
    pub(super) fn unreadable(name: String, error: String) -> Self {
        Self {
            name,
            score: 0,
            correct: 0,
            expected: 0,
            operations: 0,
            error: Some(error),
        }
    }

    fn is_perfect(&self) -> bool {
        self.error.is_none() && self.correct == self.expected
    }
}

/// JSON-serializable grading summary.
#[derive(Debug, Serialize)]
pub(super) struct JsonGradeSummary {
    /// Challenge id.
    pub(super) challenge: u32,
    /// Challenge title.
    pub(super) title: &'static str,
    /// Scripts that filled every slot.
    pub(super) perfect: usize,
    /// Scripts that failed to run.
    pub(super) failed: usize,
    /// Per-script results in input order.
    pub(super) results: Vec<GradeResult>,
}

impl JsonGradeSummary {
    /// Create from grading results.
    pub(super) fn new(challenge: &Challenge, results: &[GradeResult]) -> Self {
        Self {
            challenge: challenge.id,
            title: challenge.title,
            perfect: results.iter().filter(|r| r.is_perfect()).count(),
            failed: results.iter().filter(|r| r.error.is_some()).count(),
            results: results.to_vec(),
        }
    }
}

/// Format grading results as human-readable text, best score first.
pub(super) fn format_grade_text(challenge: &Challenge, results: &[GradeResult]) -> String {
    let mut output = String::new();
    let perfect = results.iter().filter(|r| r.is_perfect()).count();

    output.push_str(&format!(
        "Challenge {}: {} ({} scripts)\n",
        challenge.id,
        challenge.title,
        results.len()
    ));
    output.push_str(&format!("  Perfect: {perfect}/{}\n\n", results.len()));

    let mut sorted: Vec<&GradeResult> = results.iter().collect();
    sorted.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.name.cmp(&b.name)));

    for r in sorted {
        match &r.error {
            Some(error) => output.push_str(&format!("  {:<24} {error}\n", r.name)),
            None => output.push_str(&format!(
                "  {:<24} {:>5} pts  {}/{} slots  {} ops\n",
                r.name, r.score, r.correct, r.expected, r.operations
            )),
        }
    }

    output
}

/// Format grading results as CSV in input order.
pub(super) fn format_grade_csv(results: &[GradeResult]) -> String {
    let mut output = String::from("script,score,correct,expected,operations,error\n");
    for r in results {
        let error = r.error.as_deref().unwrap_or("").replace('"', "\"\"");
        output.push_str(&format!(
            "{},{},{},{},{},\"{error}\"\n",
            r.name, r.score, r.correct, r.expected, r.operations
        ));
    }
    output
}
