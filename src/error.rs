//! Structured error handling and exit codes.

use serde::Serialize;

use crate::fields::ResolveError;
use crate::source::SourceError;

/// Exit codes for the rowdupe application.
///
/// - 0: Success (check completed, duplicates found)
/// - 1: General error (unreadable input, no valid key fields, bad config)
/// - 2: No duplicates found
/// - 3: Partial success (duplicates found, but some inputs were unreadable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Check completed and duplicates were found.
    Success = 0,
    /// General error: The run was aborted.
    GeneralError = 1,
    /// No duplicates: Check completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Duplicates were found in the readable inputs only.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RW000",
            Self::GeneralError => "RW001",
            Self::NoDuplicates => "RW002",
            Self::PartialSuccess => "RW003",
        }
    }

    /// Exit code for a completed check.
    #[must_use]
    pub fn for_check(found_duplicates: bool, partial_input: bool) -> Self {
        match (found_duplicates, partial_input) {
            (false, _) => Self::NoDuplicates,
            (true, true) => Self::PartialSuccess,
            (true, false) => Self::Success,
        }
    }
}

/// Broad category of a fatal error, for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No input could be read, or the input type is unsupported
    Input,
    /// Inputs disagree on their schema
    SchemaMismatch,
    /// Key field resolution produced nothing usable
    NoValidFields,
    Config,
    Other,
}

impl ErrorKind {
    /// Classify an application error by its innermost known cause.
    #[must_use]
    pub fn of(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if let Some(e) = cause.downcast_ref::<SourceError>() {
                return match e {
                    SourceError::SchemaMismatch { .. } => Self::SchemaMismatch,
                    _ => Self::Input,
                };
            }
            if cause.downcast_ref::<ResolveError>().is_some() {
                return Self::NoValidFields;
            }
            if cause.downcast_ref::<crate::config::ConfigError>().is_some() {
                return Self::Config;
            }
        }
        Self::Other
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RW001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    pub kind: ErrorKind,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            kind: ErrorKind::of(err),
            message: format!("{err:#}"),
        }
    }
}
