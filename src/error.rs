//! Structured error handling and exit codes.

use serde::Serialize;

use crate::dedup::{DedupSummary, RunState};

/// Exit codes for mirrorclean.
///
/// - 0: Success (at least one duplicate relocated, nothing skipped)
/// - 1: General error (precondition failure, bad configuration)
/// - 2: No duplicates found
/// - 3: Partial success (some files were skipped)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: duplicates were relocated.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: the run completed without finding any.
    NoDuplicates = 2,
    /// Partial success: some files were skipped.
    PartialSuccess = 3,
    /// Interrupted: the run was cancelled by the user (Ctrl+C).
    Interrupted = 130,
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
            Self::Success => "MC000",
            Self::GeneralError => "MC001",
            Self::NoDuplicates => "MC002",
            Self::PartialSuccess => "MC003",
            Self::Interrupted => "MC130",
        }
    }

    /// Exit code describing a finished run.
    ///
    /// Cancellation wins over skipped files, which win over an empty result.
    #[must_use]
    pub fn from_summary(summary: &DedupSummary) -> Self {
        let (removed, skipped) = summary.result();
        if summary.state == RunState::Cancelled {
            Self::Interrupted
        } else if skipped > 0 {
            Self::PartialSuccess
        } else if removed == 0 {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "MC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
