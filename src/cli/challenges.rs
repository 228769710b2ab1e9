//! Challenges command implementation.

use super::output::{format_challenges_text, JsonChallenge};
use super::{CliError, OutputFormat};
use bandcode::curriculum::{self, Challenge, Difficulty};

/// Execute the challenges command.
///
/// # Errors
///
/// Returns an error for an unknown difficulty or if JSON output fails.
pub(crate) fn execute(
    difficulty: Option<&str>,
    random: bool,
    format: OutputFormat,
) -> Result<(), CliError> {
    let difficulty = difficulty
        .map(|name| {
            Difficulty::parse(name).ok_or_else(|| {
                CliError::new(format!(
                    "Unknown difficulty '{name}' (beginner, intermediate, advanced)"
                ))
            })
        })
        .transpose()?;

    let challenges: Vec<&Challenge> = match (random, difficulty) {
        (true, _) => vec![curriculum::random_challenge(difficulty, &mut rand::thread_rng())],
        (false, Some(difficulty)) => curriculum::by_difficulty(difficulty).collect(),
        (false, None) => curriculum::catalog().iter().collect(),
    };
    let today = curriculum::today().id;

    match format {
        OutputFormat::Text => print!("{}", format_challenges_text(&challenges, today)),
        OutputFormat::Json => {
            let json: Vec<JsonChallenge> = challenges
                .iter()
                .map(|c| JsonChallenge::from_challenge(c, c.id == today))
                .collect();
            let json = serde_json::to_string_pretty(&json)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
