//! Bandcode CLI - run, check and grade marching-band scripts.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Bandcode - sandboxed formation scripts for a marching band
#[derive(Parser, Debug)]
#[command(name = "bandcode")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a script against a band and score it
    Run {
        /// Script file (.rhai)
        #[arg(required = true)]
        script: PathBuf,

        /// Score against a built-in challenge
        #[arg(short, long, conflicts_with = "target")]
        challenge: Option<u32>,

        /// Score against a formation file (JSON)
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Band size for the standard roster (default: 16, or the challenge's)
        #[arg(long)]
        size: Option<usize>,

        /// Start from a saved snapshot instead of the roster
        #[arg(long)]
        from: Option<PathBuf>,

        /// Session configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Interpreter operation budget
        #[arg(long)]
        max_ops: Option<u64>,

        /// Wall-clock budget in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Current streak length (sets the multiplier)
        #[arg(long, default_value = "0")]
        streak: u32,

        /// Save the final band to a snapshot file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Record the result in a progress file (JSON, created if missing)
        #[arg(long, requires = "challenge")]
        progress: Option<PathBuf>,

        /// Add a perfect score to the progress leaderboard under this name
        #[arg(long, requires = "progress")]
        player: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check that a script compiles, without running it
    Check {
        /// Script file (.rhai)
        #[arg(required = true)]
        script: PathBuf,
    },

    /// List the built-in challenges
    Challenges {
        /// Only show one difficulty (beginner, intermediate, advanced)
        #[arg(short, long)]
        difficulty: Option<String>,

        /// Pick one challenge at random
        #[arg(short, long)]
        random: bool,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Show completed challenges and the leaderboard
    Progress {
        /// Progress file (JSON)
        #[arg(required = true)]
        file: PathBuf,

        /// Clear all progress first
        #[arg(long)]
        reset: bool,

        /// Leaderboard entries to show
        #[arg(long, default_value = "10")]
        top: usize,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Grade many scripts against a challenge in parallel
    Grade {
        /// Script files (.rhai)
        #[arg(required = true, num_args = 1..)]
        scripts: Vec<PathBuf>,

        /// Challenge id
        #[arg(short, long)]
        challenge: u32,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::GradeFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            script,
            challenge,
            target,
            size,
            from,
            config,
            max_ops,
            timeout_ms,
            streak,
            save,
            progress,
            player,
            format,
        } => cli::run::execute(&cli::run::RunArgs {
            script,
            challenge,
            target,
            size,
            from,
            config,
            max_ops,
            timeout_ms,
            streak,
            save,
            progress,
            player,
            format,
        }),

        Commands::Check { script } => cli::check::execute(&script),

        Commands::Challenges {
            difficulty,
            random,
            format,
        } => cli::challenges::execute(difficulty.as_deref(), random, format),

        Commands::Progress {
            file,
            reset,
            top,
            format,
        } => cli::progress::execute(&file, reset, top, format),

        Commands::Grade {
            scripts,
            challenge,
            threads,
            format,
            progress,
        } => cli::grade::execute(&scripts, challenge, threads, format, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
