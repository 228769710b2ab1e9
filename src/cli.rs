//! CLI command implementations for Bandcode.

pub(crate) mod challenges;
pub(crate) mod check;
pub(crate) mod grade;
pub(crate) mod progress;
pub(crate) mod run;

mod output;

use bandcode::LoadError;
use clap::ValueEnum;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

/// Output format for the `run`, `challenges` and `progress` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `grade` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum GradeFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<LoadError> for CliError {
    fn from(e: LoadError) -> Self {
        Self::new(e.to_string())
    }
}

/// Read a script file, naming the file in the error.
pub(crate) fn read_script(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))
}

/// Look up a built-in challenge by id.
pub(crate) fn find_challenge(id: u32) -> Result<&'static bandcode::curriculum::Challenge, CliError> {
    bandcode::curriculum::find(id).ok_or_else(|| {
        let count = bandcode::curriculum::catalog().len();
        CliError::new(format!("Unknown challenge {id} (choose 1-{count})"))
    })
}
