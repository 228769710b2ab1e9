//! Error types.
//!
//! Two families live here:
//! - [`Diagnostic`]: a learner-facing description of why a script failed.
//!   These are values, not Rust errors; a failed script is a normal outcome.
//! - [`LoadError`]: host-side failures while loading rosters, targets or
//!   snapshots.

use std::fmt;
use std::io;

use serde::Serialize;

use crate::band::MemberId;

/// Category a script failure is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCategory {
    /// The script could not be parsed.
    Syntax,
    /// A name (variable, command, property) does not exist.
    Name,
    /// A value of the wrong kind was used.
    Type,
    /// A value of the right kind but an impossible amount.
    Value,
    /// The run exceeded its operation or time budget.
    Timeout,
    /// The script tried something the sandbox does not allow.
    Unsupported,
    /// Any other error raised while the script ran.
    Runtime,
    /// A fault in the engine itself rather than the script.
    Internal,
}

impl ErrorCategory {
    /// Label shown to learners.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ErrorCategory::Syntax => "SyntaxError",
            ErrorCategory::Name => "NameError",
            ErrorCategory::Type => "TypeError",
            ErrorCategory::Value => "ValueError",
            ErrorCategory::Timeout => "TimeoutError",
            ErrorCategory::Unsupported => "UnsupportedOperation",
            ErrorCategory::Runtime => "RuntimeError",
            ErrorCategory::Internal => "InternalError",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A classified, learner-facing script failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Failure category.
    pub category: ErrorCategory,
    /// One sentence, already prefixed with the line number when known.
    pub message: String,
    /// 1-based source line the failure originated from.
    pub line: Option<usize>,
}

impl Diagnostic {
    /// Build a diagnostic, prefixing the message with its line number.
    #[must_use]
    pub fn new(category: ErrorCategory, line: Option<usize>, message: &str) -> Self {
        let message = match line {
            Some(line) => format!("Line {line}: {message}"),
            None => message.to_string(),
        };
        Self {
            category,
            message,
            line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.category, self.message)
    }
}

/// Error loading rosters, targets, snapshots or configuration.
#[derive(Debug)]
pub enum LoadError {
    /// Reading or writing a file failed.
    Io(io::Error),
    /// The JSON was malformed or did not match the expected shape.
    Json(serde_json::Error),
    /// Two members share an id.
    DuplicateMember(MemberId),
    /// The roster has more members than a field can hold.
    RosterTooLarge(usize),
    /// The snapshot was written by an unknown format version.
    UnsupportedVersion(u32),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "invalid JSON: {e}"),
            Self::DuplicateMember(id) => write!(f, "duplicate member id: {id}"),
            Self::RosterTooLarge(n) => write!(f, "roster too large: {n} members"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported snapshot version: {v}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LoadError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_line_prefix() {
        let d = Diagnostic::new(ErrorCategory::Name, Some(3), "`foo` is not defined.");
        assert_eq!(d.message, "Line 3: `foo` is not defined.");
        assert_eq!(d.to_string(), "NameError: Line 3: `foo` is not defined.");
    }

    #[test]
    fn test_diagnostic_without_line() {
        let d = Diagnostic::new(ErrorCategory::Timeout, None, "The script ran too long.");
        assert_eq!(d.message, "The script ran too long.");
    }

    #[test]
    fn test_load_error_display() {
        assert_eq!(
            LoadError::DuplicateMember(4).to_string(),
            "duplicate member id: 4"
        );
        assert_eq!(
            LoadError::UnsupportedVersion(9).to_string(),
            "unsupported snapshot version: 9"
        );
    }
}
