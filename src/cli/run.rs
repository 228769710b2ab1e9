//! Run command implementation.

use super::output::{format_run_text, JsonRunResult};
use super::{find_challenge, read_script, CliError, OutputFormat};
use bandcode::band::Roster;
use bandcode::curriculum::Progress;
use bandcode::scoring::StreakCounter;
use bandcode::{FormationTarget, RunOutcome, Session, SessionConfig, Snapshot};
use std::path::PathBuf;

/// Arguments for the run command.
#[derive(Debug)]
pub(crate) struct RunArgs {
    pub(crate) script: PathBuf,
    pub(crate) challenge: Option<u32>,
    pub(crate) target: Option<PathBuf>,
    pub(crate) size: Option<usize>,
    pub(crate) from: Option<PathBuf>,
    pub(crate) config: Option<PathBuf>,
    pub(crate) max_ops: Option<u64>,
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) streak: u32,
    pub(crate) save: Option<PathBuf>,
    pub(crate) progress: Option<PathBuf>,
    pub(crate) player: Option<String>,
    pub(crate) format: OutputFormat,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if an input file cannot be loaded or the script does
/// not complete.
pub(crate) fn execute(args: &RunArgs) -> Result<(), CliError> {
    let source = read_script(&args.script)?;

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    if let Some(ops) = args.max_ops {
        config.budget.max_operations = ops;
    }
    if let Some(ms) = args.timeout_ms {
        config.budget.max_duration_ms = ms;
    }

    let challenge = args.challenge.map(find_challenge).transpose()?;
    let target = match (&args.target, challenge) {
        (Some(path), _) => Some(FormationTarget::load(path)?),
        (None, Some(challenge)) => Some(challenge.target.clone()),
        (None, None) => None,
    };

    let band_size = args
        .size
        .or_else(|| challenge.map(|c| c.band_size()))
        .unwrap_or(config.band_size);
    let mut session = Session::new(&config, Roster::standard(band_size))?;

    if let Some(path) = &args.from {
        session.restore(&Snapshot::load(path)?)?;
    }
    session.set_streak(StreakCounter::from_streak(args.streak));

    let outcome = session.run(&source, target.as_ref());

    if let Some(path) = &args.save {
        let name = args.script.file_stem().map(|s| s.to_string_lossy().to_string());
        session.snapshot(name.as_deref()).save(path)?;
    }

    if let (Some(path), Some(challenge)) = (&args.progress, challenge) {
        let mut progress = Progress::load_or_default(path)?;
        let perfect = progress.record(challenge.id, &outcome);
        if let (true, Some(player), Some(report)) = (perfect, &args.player, outcome.report()) {
            progress.add_to_leaderboard(player, challenge.id, report.final_score);
        }
        progress.save(path)?;
    }

    match args.format {
        OutputFormat::Text => {
            print!("{}", format_run_text(&outcome, session.store(), session.streak()));
        }
        OutputFormat::Json => {
            let json_result = JsonRunResult::new(&outcome, session.store(), session.streak());
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    match outcome {
        RunOutcome::Failed { phase, .. } => Err(CliError::new(format!(
            "{} {phase}",
            args.script.display()
        ))),
        RunOutcome::Scored { .. } | RunOutcome::Completed { .. } => Ok(()),
    }
}
