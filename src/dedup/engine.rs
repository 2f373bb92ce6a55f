//! Sequential duplicate removal.
//!
//! # Overview
//!
//! [`Deduplicator`] walks a source tree, digests every regular file in walk
//! order and keeps the first file seen for each digest. Every later file
//! with a known digest is relocated into the backup directory.
//!
//! The walk is strictly sequential: a file's classification and any copy or
//! removal finish before the next file is opened, so the [`DigestIndex`] is
//! always consistent when it is consulted.
//!
//! Per-file failures never end a run. They are logged and counted in
//! [`RunCounters::skipped`]; the affected file stays where it was.
//!
//! # Example
//!
//! ```no_run
//! use mirrorclean::dedup::{DedupConfig, Deduplicator};
//! use mirrorclean::scanner::HashAlgorithm;
//! use std::path::Path;
//!
//! let config = DedupConfig::new("/photos/backup_duplicates")
//!     .with_algorithm(HashAlgorithm::Sha256)
//!     .with_preserve_structure(true);
//! let summary = Deduplicator::new(config).run(Path::new("/photos")).unwrap();
//!
//! let (removed, skipped) = summary.result();
//! println!("{removed} duplicates removed, {skipped} skipped");
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::{DedupError, DigestIndex};
use crate::actions::{plan_relocation, relocate, RelocateError, Relocated};
use crate::events::{DedupEvent, EventSink, LogRecord, RecordLevel};
use crate::scanner::{HashAlgorithm, Hasher, Walker, WalkerConfig, DEFAULT_CHUNK_SIZE};
use crate::signal::CancelToken;

/// Configuration for a deduplication run.
#[derive(Clone)]
pub struct DedupConfig {
    /// Directory that receives relocated duplicates (created if missing).
    pub backup_dir: PathBuf,
    /// Digest algorithm for the whole run.
    pub algorithm: HashAlgorithm,
    /// Read chunk size for digests.
    pub chunk_size: usize,
    /// Mirror the source directory layout inside the backup directory.
    pub preserve_structure: bool,
    /// Walker configuration for file discovery.
    pub walker_config: WalkerConfig,
    /// Optional token for cooperative cancellation.
    pub cancel: Option<CancelToken>,
    /// Optional receiver of progress, status and log events.
    pub events: Option<Arc<dyn EventSink>>,
}

impl std::fmt::Debug for DedupConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DedupConfig")
            .field("backup_dir", &self.backup_dir)
            .field("algorithm", &self.algorithm)
            .field("chunk_size", &self.chunk_size)
            .field("preserve_structure", &self.preserve_structure)
            .field("walker_config", &self.walker_config)
            .field("cancel", &self.cancel)
            .field("events", &self.events.as_ref().map(|_| "<sink>"))
            .finish()
    }
}

impl DedupConfig {
    /// Create a configuration with default settings for `backup_dir`.
    #[must_use]
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            algorithm: HashAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            preserve_structure: false,
            walker_config: WalkerConfig::default(),
            cancel: None,
            events: None,
        }
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the read chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Mirror source directories inside the backup directory.
    #[must_use]
    pub fn with_preserve_structure(mut self, preserve: bool) -> Self {
        self.preserve_structure = preserve;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set the event sink.
    #[must_use]
    pub fn with_events(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }
}

/// Counters accumulated during a run. All of them only ever grow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounters {
    /// Duplicates copied to the backup tree and removed from the source.
    pub duplicates_removed: u64,
    /// Files left in place because they could not be read or relocated.
    pub skipped: u64,
    /// Files handled so far.
    pub processed: u64,
    /// Files found by the walk.
    pub total: u64,
    /// Bytes moved into the backup tree.
    pub bytes_relocated: u64,
}

/// How a run ended. Both states carry valid counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// Every file was handled.
    Completed,
    /// Stopped early at the user's request.
    Cancelled,
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DedupSummary {
    /// Final counters.
    pub counters: RunCounters,
    /// Terminal state.
    pub state: RunState,
    /// Algorithm used for the run.
    pub algorithm: HashAlgorithm,
    /// Backup directory (may not exist if nothing was found to scan).
    pub backup_dir: PathBuf,
}

impl DedupSummary {
    /// `(duplicates_removed, skipped)`.
    #[must_use]
    pub fn result(&self) -> (u64, u64) {
        (self.counters.duplicates_removed, self.counters.skipped)
    }

    /// Whether the run was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state == RunState::Cancelled
    }
}

/// Walks a source tree and relocates duplicate content.
#[derive(Debug)]
pub struct Deduplicator {
    config: DedupConfig,
    hasher: Hasher,
}

impl Deduplicator {
    /// Create a deduplicator with the given configuration.
    #[must_use]
    pub fn new(config: DedupConfig) -> Self {
        let hasher = Hasher::new(config.algorithm).with_chunk_size(config.chunk_size);
        Self { config, hasher }
    }

    fn is_cancelled(&self) -> bool {
        self.config
            .cancel
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }

    fn emit(&self, event: DedupEvent) {
        if let Some(sink) = &self.config.events {
            sink.emit(event);
        }
    }

    /// Log through the `log` facade and forward the record to the sink.
    fn record(&self, level: RecordLevel, message: String) {
        log::log!(level.as_log_level(), "{}", message);
        self.emit(DedupEvent::Log(LogRecord::now(level, message)));
    }

    /// Enumerate `source` and remove its duplicates.
    ///
    /// The backup directory is left out of the walk when it lies inside
    /// `source`, as are any directories in the walker's exclude list.
    ///
    /// # Errors
    ///
    /// - `SourceNotFound` / `NotADirectory` if `source` is unusable
    /// - `BackupIsSource` if the backup directory is `source` itself
    /// - `BackupDir` if the backup directory cannot be created
    ///
    /// Nothing else is fatal.
    pub fn run(&self, source: &Path) -> Result<DedupSummary, DedupError> {
        validate_source(source)?;
        if same_dir(source, &self.config.backup_dir) {
            return Err(DedupError::BackupIsSource(self.config.backup_dir.clone()));
        }

        let walker_config = self
            .config
            .walker_config
            .clone()
            .with_excluded_dir(&self.config.backup_dir);
        let mut walker = Walker::new(source, walker_config);
        if let Some(token) = &self.config.cancel {
            walker = walker.with_cancel_token(token.clone());
        }

        log::debug!("Enumerating files under {}", source.display());
        let (files, errors) = walker.collect_files();
        for error in errors {
            self.record(RecordLevel::Warning, format!("Cannot scan: {error}"));
        }

        // The walk stops early on cancellation, so its file list is partial.
        if self.is_cancelled() {
            self.record(RecordLevel::Warning, "Process cancelled by user.".to_string());
            let counters = RunCounters {
                total: files.len() as u64,
                ..RunCounters::default()
            };
            self.record_totals(&counters);
            return Ok(self.summary(counters, RunState::Cancelled));
        }

        let paths = files.into_iter().map(|f| f.path).collect();
        self.run_files(source, paths)
    }

    /// Remove duplicates among an explicit, ordered list of files.
    ///
    /// `source_root` anchors relative paths when the directory structure is
    /// preserved. The first file in `files` with a given digest is kept.
    ///
    /// # Errors
    ///
    /// `BackupDir` if the backup directory cannot be created. An empty list
    /// returns immediately without creating anything.
    pub fn run_files(
        &self,
        source_root: &Path,
        files: Vec<PathBuf>,
    ) -> Result<DedupSummary, DedupError> {
        let mut counters = RunCounters {
            total: files.len() as u64,
            ..RunCounters::default()
        };

        if files.is_empty() {
            self.record(
                RecordLevel::Warning,
                "No files found in the selected directory.".to_string(),
            );
            return Ok(self.summary(counters, RunState::Completed));
        }

        let backup_dir = &self.config.backup_dir;
        fs::create_dir_all(backup_dir).map_err(|source| DedupError::BackupDir {
            path: backup_dir.clone(),
            source,
        })?;

        log::info!(
            "Scanning {} files with {} (preserve structure: {})",
            counters.total,
            self.config.algorithm,
            self.config.preserve_structure
        );

        let mut index = DigestIndex::new();
        let mut state = RunState::Completed;

        for path in files {
            if self.is_cancelled() {
                self.record(RecordLevel::Warning, "Process cancelled by user.".to_string());
                state = RunState::Cancelled;
                break;
            }

            match self.hasher.digest_file(&path) {
                Err(e) => {
                    counters.skipped += 1;
                    self.record(
                        RecordLevel::Warning,
                        format!("Cannot read file {}: {}", path.display(), e),
                    );
                }
                Ok(digest) => {
                    if let Some(original) = index.observe(digest, &path) {
                        log::debug!(
                            "{} duplicates {}",
                            path.display(),
                            original.display()
                        );
                        self.handle_duplicate(source_root, &path, &mut counters);
                    }
                }
            }

            counters.processed += 1;
            self.emit(DedupEvent::Progress {
                processed: counters.processed,
                total: counters.total,
            });
            self.emit(DedupEvent::Status {
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            });
        }

        log::debug!("{} distinct contents kept", index.len());
        self.record_totals(&counters);

        Ok(self.summary(counters, state))
    }

    /// Closing summary record of a run that got past validation.
    fn record_totals(&self, counters: &RunCounters) {
        self.record(
            RecordLevel::Info,
            format!(
                "Total {} duplicates deleted, {} skipped.",
                counters.duplicates_removed, counters.skipped
            ),
        );
    }

    /// Relocate one duplicate and account for the outcome.
    fn handle_duplicate(&self, source_root: &Path, path: &Path, counters: &mut RunCounters) {
        match self.relocate_duplicate(source_root, path) {
            Ok(moved) => {
                counters.duplicates_removed += 1;
                counters.bytes_relocated += moved.size;
                self.record(
                    RecordLevel::Info,
                    format!(
                        "Duplicate removed: {} → Backup: {}",
                        moved.source.display(),
                        moved.destination.display()
                    ),
                );
            }
            Err(e) if e.is_permission_denied() => {
                counters.skipped += 1;
                self.record(
                    RecordLevel::Warning,
                    format!("File locked: {}. Skipped.", path.display()),
                );
            }
            Err(e) => {
                counters.skipped += 1;
                self.record(
                    RecordLevel::Error,
                    format!("Error processing {}: {}", path.display(), e),
                );
            }
        }
    }

    fn relocate_duplicate(
        &self,
        source_root: &Path,
        path: &Path,
    ) -> Result<Relocated, RelocateError> {
        let plan = plan_relocation(
            source_root,
            &self.config.backup_dir,
            path,
            self.config.preserve_structure,
        )?;
        relocate(&plan)
    }

    fn summary(&self, counters: RunCounters, state: RunState) -> DedupSummary {
        DedupSummary {
            counters,
            state,
            algorithm: self.config.algorithm,
            backup_dir: self.config.backup_dir.clone(),
        }
    }
}

fn validate_source(source: &Path) -> Result<(), DedupError> {
    if !source.exists() {
        return Err(DedupError::SourceNotFound(source.to_path_buf()));
    }
    if !source.is_dir() {
        return Err(DedupError::NotADirectory(source.to_path_buf()));
    }
    Ok(())
}

/// Whether two paths name the same directory, resolving links when both exist.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Run a complete deduplication with explicit arguments.
///
/// Returns `(duplicates_removed, skipped)`.
///
/// # Errors
///
/// See [`Deduplicator::run`].
pub fn run_dedup(
    source_dir: &Path,
    backup_dir: &Path,
    algorithm: HashAlgorithm,
    preserve_structure: bool,
    events: Option<Arc<dyn EventSink>>,
    cancel: Option<CancelToken>,
) -> Result<(u64, u64), DedupError> {
    let mut config = DedupConfig::new(backup_dir)
        .with_algorithm(algorithm)
        .with_preserve_structure(preserve_structure);
    config.events = events;
    config.cancel = cancel;

    Deduplicator::new(config).run(source_dir).map(|s| s.result())
}
