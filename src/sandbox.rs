//! Execution sandbox for learner scripts.
//!
//! A run compiles the source, binds a locked-down namespace (the `band`
//! object, the pre-built member lists and Rhai's safe built-ins) and executes
//! it once against a working copy of the band. The copy is handed back only
//! when the script completes; any failure leaves the caller's store exactly as
//! it was.
//!
//! The budget is enforced two ways: an operation cap inside the interpreter
//! and a watchdog thread that trips an abort flag after the wall-clock limit.
//! Either one ends the run with a `TimeoutError`.

mod diagnose;
mod host;
mod watchdog;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::band::{BandStore, CommandKind, CommandRecord};
use crate::error::{Diagnostic, ErrorCategory};

pub use host::ExecutionContext;

use watchdog::Watchdog;

/// Default interpreter operation cap per run.
pub const DEFAULT_MAX_OPERATIONS: u64 = 100_000;

/// Default wall-clock limit per run, in milliseconds.
pub const DEFAULT_MAX_DURATION_MS: u64 = 2_000;

/// Resource budget for one run. Zero disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunBudget {
    /// Maximum interpreter operations.
    pub max_operations: u64,
    /// Maximum wall-clock time in milliseconds.
    pub max_duration_ms: u64,
}

impl Default for RunBudget {
    fn default() -> Self {
        Self {
            max_operations: DEFAULT_MAX_OPERATIONS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
        }
    }
}

impl RunBudget {
    /// Wall-clock limit, if any.
    #[must_use]
    pub fn max_duration(&self) -> Option<Duration> {
        (self.max_duration_ms > 0).then(|| Duration::from_millis(self.max_duration_ms))
    }
}

/// Where the sandbox is in its run cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    /// Waiting for a script.
    Idle,
    /// Parsing the source.
    Compiling,
    /// Executing the script.
    Running,
    /// The script finished normally.
    Completed,
    /// The script failed to compile or raised an error.
    Failed,
    /// The script ran out of operations or time.
    TimedOut,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Compiling => "compiling",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::TimedOut => "timed out",
        };
        f.write_str(name)
    }
}

/// What a run consumed and produced besides the band itself.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Interpreter operations executed.
    pub operations: u64,
    /// Band commands issued, in order.
    pub commands: Vec<CommandRecord>,
    /// Wall-clock execution time (excluding compilation).
    pub elapsed: Duration,
    /// Non-blank, non-comment source lines.
    pub lines_of_code: usize,
    /// Captured `print`/`debug` output.
    pub output: Vec<String>,
}

impl RunStats {
    /// Number of band commands issued.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Distinct command kinds used.
    #[must_use]
    pub fn kinds_used(&self) -> BTreeSet<CommandKind> {
        self.commands.iter().map(|c| c.kind).collect()
    }

    /// Elapsed time in fractional milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1_000.0
    }
}

/// Result of one run.
#[derive(Debug, Clone)]
pub enum Execution {
    /// The script finished; `store` is the band after the run.
    Completed {
        /// Final band state.
        store: BandStore,
        /// Run statistics.
        stats: RunStats,
    },
    /// The script did not finish. The caller's store is untouched.
    Failed {
        /// [`RunPhase::Failed`] or [`RunPhase::TimedOut`].
        phase: RunPhase,
        /// Learner-facing description of the failure.
        diagnostic: Diagnostic,
        /// Statistics up to the failure.
        stats: RunStats,
    },
}

impl Execution {
    /// Terminal phase of the run.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        match self {
            Self::Completed { .. } => RunPhase::Completed,
            Self::Failed { phase, .. } => *phase,
        }
    }

    /// Run statistics.
    #[must_use]
    pub fn stats(&self) -> &RunStats {
        match self {
            Self::Completed { stats, .. } | Self::Failed { stats, .. } => stats,
        }
    }

    /// The failure diagnostic, if the run failed.
    #[must_use]
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { diagnostic, .. } => Some(diagnostic),
        }
    }
}

/// Runs learner scripts one at a time.
#[derive(Debug, Clone)]
pub struct Sandbox {
    budget: RunBudget,
    phase: RunPhase,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new(RunBudget::default())
    }
}

impl Sandbox {
    /// Create a sandbox with the given budget.
    #[must_use]
    pub fn new(budget: RunBudget) -> Self {
        Self {
            budget,
            phase: RunPhase::Idle,
        }
    }

    /// The per-run budget.
    #[must_use]
    pub fn budget(&self) -> &RunBudget {
        &self.budget
    }

    /// Current phase. Always [`RunPhase::Idle`] between runs.
    #[must_use]
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Compile a script without running it.
    ///
    /// # Errors
    ///
    /// Returns a `SyntaxError` diagnostic if the script does not parse.
    pub fn check(&self, source: &str) -> Result<(), Diagnostic> {
        let ctx = Rc::new(RefCell::new(ExecutionContext::default()));
        let engine = host::build_engine(&ctx, &self.budget, Arc::new(AtomicBool::new(false)));
        engine
            .compile(source)
            .map(|_| ())
            .map_err(|err| diagnose::classify_parse(&err))
    }

    /// Run `source` once against a working copy of `store`.
    pub fn execute(&mut self, source: &str, store: &BandStore) -> Execution {
        let lines_of_code = count_lines(source);
        self.enter(RunPhase::Compiling);

        let ctx = Rc::new(RefCell::new(ExecutionContext::new(store.clone())));
        let abort = Arc::new(AtomicBool::new(false));
        let engine = host::build_engine(&ctx, &self.budget, Arc::clone(&abort));

        let ast = match engine.compile(source) {
            Ok(ast) => ast,
            Err(err) => {
                let stats = RunStats {
                    lines_of_code,
                    ..RunStats::default()
                };
                return self.fail(diagnose::classify_parse(&err), stats);
            }
        };

        self.enter(RunPhase::Running);
        let watchdog = match self.budget.max_duration() {
            Some(limit) => match Watchdog::arm(limit, abort) {
                Ok(dog) => Some(dog),
                Err(err) => {
                    let diagnostic = Diagnostic::new(
                        ErrorCategory::Internal,
                        None,
                        &format!("The sandbox could not start its timer ({err})."),
                    );
                    return self.fail(diagnostic, RunStats::default());
                }
            },
            None => None,
        };

        let mut scope = host::bind_scope(&ctx);
        let started = Instant::now();
        let result = engine.run_ast_with_scope(&mut scope, &ast);
        let elapsed = started.elapsed();
        drop(watchdog);
        drop(scope);

        let last_line = ctx.borrow().last_line();
        let (api, operations, output) = ctx.take().into_parts();
        let (store, commands) = api.into_parts();
        let stats = RunStats {
            operations,
            commands,
            elapsed,
            lines_of_code,
            output,
        };

        match result {
            Ok(()) => {
                self.enter(RunPhase::Completed);
                info!(
                    operations = stats.operations,
                    commands = stats.command_count(),
                    elapsed_ms = stats.elapsed_ms(),
                    "script completed"
                );
                self.enter(RunPhase::Idle);
                Execution::Completed { store, stats }
            }
            Err(err) => self.fail(diagnose::classify(&err, last_line), stats),
        }
    }

    fn fail(&mut self, diagnostic: Diagnostic, stats: RunStats) -> Execution {
        let phase = if diagnostic.category == ErrorCategory::Timeout {
            RunPhase::TimedOut
        } else {
            RunPhase::Failed
        };
        self.enter(phase);
        info!(category = %diagnostic.category, line = ?diagnostic.line, "script failed");
        self.enter(RunPhase::Idle);
        Execution::Failed {
            phase,
            diagnostic,
            stats,
        }
    }

    fn enter(&mut self, next: RunPhase) {
        debug!(from = %self.phase, to = %next, "sandbox phase");
        self.phase = next;
    }
}

/// Source lines that hold code.
fn count_lines(source: &str) -> usize {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .count()
}
