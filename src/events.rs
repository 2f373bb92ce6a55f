//! Outbound events from the deduplication engine.
//!
//! The engine reports everything it does through a single stream of
//! [`DedupEvent`] values delivered to an [`EventSink`]. The binary hands the
//! engine a [`crossbeam_channel::Sender`] and consumes the stream on another
//! thread, so presentation work never blocks the walk.
//!
//! Delivery is best effort: `emit` has no error path, and a sink whose
//! receiver went away simply drops events.

use std::fmt;

use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use log::Level;
use serde::Serialize;

/// Severity of a user-facing log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordLevel {
    /// Successful relocations and the final summary.
    Info,
    /// Unreadable or locked files, cancellation, empty source directory.
    Warning,
    /// Unexpected per-file failures.
    Error,
}

impl RecordLevel {
    /// Upper-case label used in the run log file.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }

    /// Matching level of the `log` facade.
    #[must_use]
    pub fn as_log_level(self) -> Level {
        match self {
            Self::Info => Level::Info,
            Self::Warning => Level::Warn,
            Self::Error => Level::Error,
        }
    }
}

impl fmt::Display for RecordLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A timestamped, user-facing log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    /// Severity.
    pub level: RecordLevel,
    /// Local time the record was produced.
    pub timestamp: DateTime<Local>,
    /// Human-readable message.
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current local time.
    #[must_use]
    pub fn now(level: RecordLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Render as a run-log line: `YYYY-MM-DD HH:MM:SS,mmm [LEVEL]: message`.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} [{}]: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f"),
            self.level.label(),
            self.message
        )
    }
}

/// Everything the engine reports while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupEvent {
    /// Sent after every file, including skipped ones.
    Progress {
        /// Files handled so far.
        processed: u64,
        /// Files found by the walk.
        total: u64,
    },
    /// Name of the file just handled.
    Status {
        /// Final path component of the file.
        file_name: String,
    },
    /// A user-facing log record.
    Log(LogRecord),
}

/// Receiver of engine events.
///
/// Implementations must be cheap: `emit` is called on the engine thread
/// between files.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: DedupEvent);
}

impl EventSink for Sender<DedupEvent> {
    fn emit(&self, event: DedupEvent) {
        // A closed channel means nobody is listening any more.
        let _ = self.send(event);
    }
}
