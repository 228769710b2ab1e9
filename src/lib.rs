// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Bandcode: sandboxed script execution and formation scoring for a
//! marching-band programming game.
//!
//! Learners write short Rhai scripts that drive band members around a
//! football field through a restricted Band API. This crate runs those
//! scripts safely and scores the result:
//! - Every Band API call clamps its inputs and never fails
//! - Scripts run under an operation cap and a wall-clock watchdog
//! - Failures become one-line, categorized, learner-facing diagnostics
//! - Final positions are scored in Pride Points with a streak multiplier
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Session (store, streak, reset)    │
//! ├──────────────────┬──────────────────┤
//! │ Execution Sandbox│ Formation Scorer │
//! │  (Rhai + budget) │  (Pride Points)  │
//! ├──────────────────┴──────────────────┤
//! │  Band API  →  Band State Store      │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use bandcode::{Session, SessionConfig};
//!
//! let config = SessionConfig { band_size: 4, ..SessionConfig::default() };
//! let mut session = Session::standard(&config).unwrap();
//! session.run("band.form_line(members, 20, 26, 80, 26);", None);
//! assert!(session.store().get_all_members().iter().all(|m| (m.y() - 26.0).abs() < 1e-9));
//! ```

pub mod band;
pub mod curriculum;
pub mod error;
pub mod sandbox;
pub mod scoring;
pub mod session;
pub mod snapshot;

pub use band::{BandApi, BandMember, BandStore, MemberId, Position, Roster, Section};
pub use error::{Diagnostic, ErrorCategory, LoadError};
pub use sandbox::{Execution, RunBudget, RunPhase, RunStats, Sandbox};
pub use scoring::{FormationScorer, FormationTarget, ScoreReport, StreakCounter};
pub use session::{RunOutcome, Session, SessionConfig};
pub use snapshot::{FormationLibrary, Snapshot};
