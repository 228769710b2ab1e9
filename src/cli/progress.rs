//! Progress command implementation.

use super::output::{format_progress_text, JsonProgress};
use super::{CliError, OutputFormat};
use bandcode::curriculum::Progress;
use std::path::Path;

/// Execute the progress command.
///
/// # Errors
///
/// Returns an error if the progress file cannot be read or written.
pub(crate) fn execute(
    path: &Path,
    reset: bool,
    top: usize,
    format: OutputFormat,
) -> Result<(), CliError> {
    let mut progress = Progress::load_or_default(path)?;
    if reset {
        progress.reset();
        progress.save(path)?;
    }

    match format {
        OutputFormat::Text => print!("{}", format_progress_text(&progress, top)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonProgress::new(&progress, top))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
