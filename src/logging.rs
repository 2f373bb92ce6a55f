//! Logging infrastructure for mirrorclean.
//!
//! Console logging goes through the `log` facade and the `env_logger`
//! backend. Log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (errors), `--brief` (warnings), `--verbose`
//!    (debug/trace)
//! 3. Default: info level
//!
//! Independently of the console level, every user-facing record of a run is
//! persisted to a [`RunLog`] file.
//!
//! # Build-specific Formatting
//!
//! - **Debug builds**: Include timestamp, level, and module path
//! - **Release builds**: Compact format with level and message only
//!
//! # Example
//!
//! ```rust,no_run
//! use mirrorclean::logging::init_logging;
//!
//! // Default (info) level
//! init_logging(0, false, false);
//!
//! // Warnings and errors only
//! init_logging(0, false, true);
//! ```

use std::env;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use env_logger::Builder;
use log::LevelFilter;

use crate::events::LogRecord;

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Call once at startup, before any logging calls are made.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - Only show errors
/// * `brief` - Hide per-file info messages
///
/// # Panics
///
/// Panics if called more than once, as `env_logger` can only be
/// initialized once per process.
pub fn init_logging(verbose: u8, quiet: bool, brief: bool) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet, brief));
    }

    configure_format(&mut builder, verbose);
    builder.init();

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet, brief)
        );
    }
}

/// Determine the log level from CLI flags.
fn determine_level(verbose: u8, quiet: bool, brief: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else if brief {
        LevelFilter::Warn
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Console level while a progress bar is drawn on stderr.
///
/// At the default level every relocated file logs an info line, which would
/// tear the bar, so the console falls back to `--brief`. Levels chosen with
/// `-v`, `--brief` or `-q` are kept. The run log still receives every record.
#[must_use]
pub fn level_while_drawing(bar_drawn: bool, level: LevelFilter) -> LevelFilter {
    if bar_drawn && level == LevelFilter::Info {
        LevelFilter::Warn
    } else {
        level
    }
}

/// Configure the log format based on build type and verbosity.
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}

/// File name of the run log for a run started at `started`.
///
/// ```
/// use chrono::{Local, TimeZone};
/// use mirrorclean::logging::log_file_name;
///
/// let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
/// assert_eq!(log_file_name(&started), "duplicate_deletion_20240309_140507.log");
/// ```
#[must_use]
pub fn log_file_name(started: &DateTime<Local>) -> String {
    format!("duplicate_deletion_{}.log", started.format("%Y%m%d_%H%M%S"))
}

/// Per-run log file holding every user-facing record of one run.
///
/// Records are written at all levels regardless of console verbosity. Runs
/// started within the same second share a file and append to it.
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RunLog {
    /// Create the log directory if needed and open the run's log file.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created.
    pub fn create(log_dir: &Path, started: &DateTime<Local>) -> io::Result<Self> {
        fs::create_dir_all(log_dir)?;
        let path = log_dir.join(log_file_name(started));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        log::debug!("Writing run log to {}", path.display());
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn write_record(&mut self, record: &LogRecord) -> io::Result<()> {
        writeln!(self.writer, "{}", record.to_line())
    }

    /// Flush and close the file, returning its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails.
    pub fn finish(mut self) -> io::Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}
