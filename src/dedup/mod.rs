//! Duplicate detection and removal.
//!
//! - [`index`]: first-seen path per digest for the current run
//! - [`engine`]: the sequential walk/digest/relocate loop
//!
//! A file is a duplicate when its digest equals the digest of a file seen
//! earlier in walk order. The earlier file always stays in place.

pub mod engine;
pub mod index;

use std::path::PathBuf;

pub use engine::{
    run_dedup, DedupConfig, DedupSummary, Deduplicator, RunCounters, RunState,
};
pub use index::DigestIndex;

/// Errors that end a run before or at its start.
///
/// Failures on individual files are never reported here; they are counted
/// as skipped instead.
#[derive(thiserror::Error, Debug)]
pub enum DedupError {
    /// Source directory does not exist.
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),

    /// Source path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Backup directory is the source directory itself.
    #[error("Backup directory must differ from the source directory: {0}")]
    BackupIsSource(PathBuf),

    /// Backup directory could not be created.
    #[error("Cannot create backup directory {path}: {source}")]
    BackupDir {
        /// Backup directory path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
