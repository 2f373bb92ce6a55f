//! mirrorclean - duplicate file remover with a backup tree
//!
//! Walks a directory, digests every file, keeps the first file seen for each
//! content and moves every later copy into a backup directory, optionally
//! mirroring the original layout.

pub mod actions;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod error;
pub mod events;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use chrono::Local;

use crate::cli::{CleanArgs, Cli, Commands, HashArgs, OutputFormat};
use crate::config::Config;
use crate::dedup::{DedupConfig, DedupError, Deduplicator};
use crate::error::ExitCode;
use crate::events::DedupEvent;
use crate::logging::RunLog;
use crate::output::{JsonOutput, RunReport, TextOutput};
use crate::progress::Progress;
use crate::scanner::{Hasher, WalkerConfig};

/// Run the command described by `cli` and return the process exit code.
///
/// Logging must already be initialized; see [`logging::init_logging`].
///
/// # Errors
///
/// Returns an error for fatal conditions: bad configuration, an unusable
/// source directory, or a backup or log directory that cannot be created.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    let colored = !cli.no_color && io::stdout().is_terminal();
    match cli.command {
        Commands::Clean(args) => run_clean(args, cli.quiet, colored),
        Commands::Hash(args) => run_hash(&args),
    }
}

fn run_clean(args: CleanArgs, quiet: bool, colored: bool) -> Result<ExitCode> {
    let mut config =
        Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid configuration")?;

    if !args.path.exists() {
        return Err(DedupError::SourceNotFound(args.path).into());
    }
    let source = args
        .path
        .canonicalize()
        .with_context(|| format!("Cannot access {}", args.path.display()))?;
    if !source.is_dir() {
        return Err(DedupError::NotADirectory(source).into());
    }

    let backup_dir = resolve_dir(&source, args.backup_dir.as_deref(), &config.backup_dir_name)?;
    if backup_dir == source {
        return Err(DedupError::BackupIsSource(backup_dir).into());
    }
    let log_dir = resolve_dir(&source, args.log_dir.as_deref(), &config.log_dir_name)?;
    log::debug!(
        "Source: {}, backup: {}, logs: {}",
        source.display(),
        backup_dir.display(),
        log_dir.display()
    );

    let cancel = signal::install_handler().context("Failed to install Ctrl+C handler")?;

    let walker_config = WalkerConfig {
        follow_symlinks: config.follow_symlinks,
        skip_hidden: config.skip_hidden,
        ignore_patterns: config.ignore_patterns.clone(),
        exclude_dirs: Vec::new(),
    }
    .with_excluded_dir(&log_dir);

    let started = Local::now();
    let timer = Instant::now();
    let mut run_log = if config.write_log_file {
        Some(
            RunLog::create(&log_dir, &started)
                .with_context(|| format!("Cannot create run log in {}", log_dir.display()))?,
        )
    } else {
        None
    };

    let (tx, rx) = crossbeam_channel::unbounded();
    let dedup_config = DedupConfig::new(&backup_dir)
        .with_algorithm(config.algorithm)
        .with_chunk_size(config.chunk_size)
        .with_preserve_structure(config.preserve_structure)
        .with_walker_config(walker_config)
        .with_cancel_token(cancel)
        .with_events(Arc::new(tx));

    let mut progress = Progress::new(quiet || args.no_progress, !colored);
    let console_level = log::max_level();
    let bar_drawn = progress.is_visible() && io::stderr().is_terminal();
    log::set_max_level(logging::level_while_drawing(bar_drawn, console_level));

    let engine_source = source.clone();
    let engine = thread::Builder::new()
        .name("mirrorclean-engine".to_string())
        .spawn(move || Deduplicator::new(dedup_config).run(&engine_source));
    let engine = match engine {
        Ok(handle) => handle,
        Err(e) => {
            log::set_max_level(console_level);
            return Err(e).context("Failed to start the deduplication thread");
        }
    };

    // Drains until the engine drops its sender.
    let mut log_failed = false;
    for event in rx.iter() {
        progress.handle(&event);
        if let (DedupEvent::Log(record), Some(file)) = (&event, run_log.as_mut()) {
            if let Err(e) = file.write_record(record) {
                if !log_failed {
                    log::warn!("Cannot write run log {}: {}", file.path().display(), e);
                    log_failed = true;
                }
            }
        }
    }
    log::set_max_level(console_level);

    let summary = engine
        .join()
        .map_err(|_| anyhow!("Deduplication thread panicked"))?
        .with_context(|| format!("Cannot clean {}", source.display()))?;
    progress.finish(summary.is_cancelled());

    let log_file = run_log
        .map(RunLog::finish)
        .transpose()
        .context("Failed to flush run log")?;

    let report = RunReport::new(summary, source, log_file, timer.elapsed());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => JsonOutput::new(&report).write_to(&mut out, true)?,
        OutputFormat::Text if !quiet => TextOutput::new(&report, colored).write_to(&mut out)?,
        OutputFormat::Text => {}
    }

    Ok(report.exit_code)
}

/// Fold command-line flags over the loaded configuration.
fn apply_overrides(config: &mut Config, args: &CleanArgs) {
    if let Some(algorithm) = args.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }
    config.preserve_structure |= args.preserve_structure;
    config.skip_hidden |= args.skip_hidden;
    config.follow_symlinks |= args.follow_symlinks;
    config
        .ignore_patterns
        .extend(args.ignore_patterns.iter().cloned());
    if args.no_log_file {
        config.write_log_file = false;
    }
}

/// Absolute form of an explicit directory, or `source/<default_name>`.
fn resolve_dir(source: &Path, explicit: Option<&Path>, default_name: &str) -> Result<PathBuf> {
    match explicit {
        None => Ok(source.join(default_name)),
        Some(dir) if dir.exists() => dir
            .canonicalize()
            .with_context(|| format!("Cannot access {}", dir.display())),
        Some(dir) => std::path::absolute(dir)
            .with_context(|| format!("Cannot resolve {}", dir.display())),
    }
}

fn run_hash(args: &HashArgs) -> Result<ExitCode> {
    let hasher = Hasher::new(args.algorithm);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;

    for file in &args.files {
        match hasher.digest_file(file) {
            Ok(digest) => writeln!(out, "{}  {}", digest, file.display())?,
            Err(e) => {
                failures += 1;
                log::warn!("Cannot read file {}: {}", file.display(), e);
            }
        }
    }

    if failures > 0 {
        Ok(ExitCode::PartialSuccess)
    } else {
        Ok(ExitCode::Success)
    }
}
