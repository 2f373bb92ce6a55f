//! JSON output formatter for run summaries.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "source_dir": "/data/photos",
//!   "backup_dir": "/data/photos/backup_duplicates",
//!   "log_file": "/data/photos/logs/duplicate_deletion_20240309_140507.log",
//!   "algorithm": "sha256",
//!   "state": "completed",
//!   "duplicates_removed": 3,
//!   "skipped": 0,
//!   "processed": 10,
//!   "total": 10,
//!   "bytes_relocated": 52340,
//!   "duration_ms": 812,
//!   "exit_code": 0,
//!   "exit_code_name": "MC000"
//! }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::RunReport;
use crate::dedup::RunState;
use crate::scanner::HashAlgorithm;

/// Flat JSON view of a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Cleaned directory
    pub source_dir: String,
    /// Directory that received duplicates
    pub backup_dir: String,
    /// Run log file, if written
    pub log_file: Option<String>,
    /// Digest algorithm
    pub algorithm: HashAlgorithm,
    /// Terminal state of the run
    pub state: RunState,
    /// Duplicates moved to the backup directory
    pub duplicates_removed: u64,
    /// Files left in place after a failure
    pub skipped: u64,
    /// Files handled
    pub processed: u64,
    /// Files found
    pub total: u64,
    /// Bytes moved to the backup directory
    pub bytes_relocated: u64,
    /// Run duration in milliseconds
    pub duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "MC000")
    pub exit_code_name: String,
}

impl JsonOutput {
    /// Create the JSON view of a report.
    #[must_use]
    pub fn new(report: &RunReport) -> Self {
        let counters = &report.summary.counters;
        Self {
            source_dir: path_string(&report.source_dir),
            backup_dir: path_string(&report.summary.backup_dir),
            log_file: report.log_file.as_deref().map(path_string),
            algorithm: report.summary.algorithm,
            state: report.summary.state,
            duplicates_removed: counters.duplicates_removed,
            skipped: counters.skipped,
            processed: counters.processed,
            total: counters.total,
            bytes_relocated: counters.bytes_relocated,
            duration_ms: u64::try_from(report.duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: report.exit_code.as_i32(),
            exit_code_name: report.exit_code.code_prefix().to_string(),
        }
    }

    /// Serialize to a compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to a pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the JSON output followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
