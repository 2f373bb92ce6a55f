//! Output formatters for run summaries.
//!
//! - [`text`]: colored, human-readable summary
//! - [`json`]: machine-readable summary for scripting
//!
//! Both render a [`RunReport`], which bundles the engine's summary with the
//! details only the binary knows (source path, log file, duration).

pub mod json;
pub mod text;

use std::path::PathBuf;
use std::time::Duration;

use crate::dedup::DedupSummary;
use crate::error::ExitCode;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

/// Everything the summary formatters need about a finished run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Engine summary.
    pub summary: DedupSummary,
    /// Source directory that was cleaned.
    pub source_dir: PathBuf,
    /// Run log file, if one was written.
    pub log_file: Option<PathBuf>,
    /// Wall-clock duration of the run.
    pub duration: Duration,
    /// Exit code the process will return.
    pub exit_code: ExitCode,
}

impl RunReport {
    /// Build a report, deriving the exit code from the summary.
    #[must_use]
    pub fn new(
        summary: DedupSummary,
        source_dir: PathBuf,
        log_file: Option<PathBuf>,
        duration: Duration,
    ) -> Self {
        let exit_code = ExitCode::from_summary(&summary);
        Self {
            summary,
            source_dir,
            log_file,
            duration,
            exit_code,
        }
    }
}
