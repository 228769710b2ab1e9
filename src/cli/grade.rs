//! Grade command implementation.

use super::output::{format_grade_csv, format_grade_text, GradeResult, JsonGradeSummary};
use super::{find_challenge, read_script, CliError, GradeFormat};
use bandcode::curriculum::Challenge;
use bandcode::{Session, SessionConfig};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Execute the grade command.
///
/// # Errors
///
/// Returns an error for an unknown challenge or if output fails.
pub(crate) fn execute(
    scripts: &[PathBuf],
    challenge: u32,
    threads: Option<usize>,
    format: GradeFormat,
    progress: bool,
) -> Result<(), CliError> {
    let challenge = find_challenge(challenge)?;

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = if progress {
        let pb = ProgressBar::new(scripts.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} scripts ({per_sec})")
                .expect("valid template")
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // One session per script; sessions share nothing
    let results: Vec<GradeResult> = scripts
        .par_iter()
        .map(|path| {
            let result = grade_one(path, challenge);
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            result
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();

    match format {
        GradeFormat::Text => {
            print!("{}", format_grade_text(challenge, &results));
            println!();
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        GradeFormat::Json => {
            let summary = JsonGradeSummary::new(challenge, &results);
            let json = serde_json::to_string_pretty(&summary)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        GradeFormat::Csv => print!("{}", format_grade_csv(&results)),
    }

    Ok(())
}

fn grade_one(path: &Path, challenge: &Challenge) -> GradeResult {
    let name = path
        .file_name()
        .map_or_else(|| "unknown".to_string(), |n| n.to_string_lossy().to_string());

    let outcome = read_script(path).and_then(|source| {
        let mut session = Session::new(&SessionConfig::default(), challenge.roster())?;
        Ok(session.run(&source, Some(&challenge.target)))
    });

    match outcome {
        Ok(outcome) => GradeResult::from_outcome(name, &outcome),
        Err(e) => GradeResult::unreadable(name, e.to_string()),
    }
}
