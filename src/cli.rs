//! Command-line interface definitions for mirrorclean.
//!
//! Global options (verbosity, color, error format) apply to every
//! subcommand.
//!
//! # Example
//!
//! ```bash
//! # Move duplicates under ~/Photos into ~/Photos/backup_duplicates
//! mirrorclean clean ~/Photos
//!
//! # Fast digests, mirrored layout, custom backup location
//! mirrorclean clean ~/Photos -a fast --preserve-structure --backup-dir /mnt/dups
//!
//! # Print digests without touching anything
//! mirrorclean hash a.jpg b.jpg -a blake3
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use bytesize::ByteSize;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::scanner::HashAlgorithm;

/// Remove duplicate files by moving them into a backup tree.
///
/// mirrorclean digests every file under a directory, keeps the first file
/// seen with each content, and moves every later copy into a backup
/// directory. Nothing is deleted outright.
#[derive(Debug, Parser)]
#[command(name = "mirrorclean")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Hide per-file messages; show warnings, errors and the summary
    #[arg(long, global = true, conflicts_with_all = ["verbose", "quiet"])]
    pub brief: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Move duplicate files out of a directory tree
    Clean(CleanArgs),
    /// Print content digests of files
    Hash(HashArgs),
}

/// Arguments for the clean subcommand.
#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Directory to clean
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Where duplicates are moved (default: PATH/backup_duplicates)
    #[arg(long, value_name = "DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Where the run log is written (default: PATH/logs)
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Digest algorithm (fast = md5, secure = sha256)
    #[arg(short, long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Mirror the source directory layout inside the backup directory
    #[arg(long)]
    pub preserve_structure: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Follow symbolic links during the walk
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Read chunk size for digests (e.g. 8KiB, 1MiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_chunk_size)]
    pub chunk_size: Option<usize>,

    /// Do not write a run log file
    #[arg(long)]
    pub no_log_file: bool,

    /// Do not show a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Summary format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Configuration file (default: platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Arguments for the hash subcommand.
#[derive(Debug, Args)]
pub struct HashArgs {
    /// Files to digest
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Digest algorithm (fast = md5, secure = sha256)
    #[arg(short, long, value_enum, default_value = "sha256")]
    pub algorithm: HashAlgorithm,
}

/// Summary format for the clean subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON summary for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable chunk size such as `8KiB` or `4096`.
///
/// # Errors
///
/// Returns an error for unparsable input, zero, or sizes that do not fit in
/// memory addressing.
pub fn parse_chunk_size(s: &str) -> Result<usize, String> {
    let size = ByteSize::from_str(s.trim()).map_err(|e| format!("Invalid size '{s}': {e}"))?;
    if size.as_u64() == 0 {
        return Err("Chunk size must be at least 1 byte".to_string());
    }
    usize::try_from(size.as_u64()).map_err(|_| format!("Chunk size too large: {s}"))
}
