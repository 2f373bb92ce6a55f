//! Safe relocation of duplicates into the backup tree.
//!
//! # Overview
//!
//! A duplicate is moved by copying it (content, permissions and timestamps)
//! to a destination that does not exist yet, verifying the copy, and only
//! then removing the source. A failure at any step leaves the source in
//! place.
//!
//! Destinations never overwrite: [`plan_relocation`] picks `name.ext`,
//! then `name_1.ext`, `name_2.ext`, … until it finds a free path.
//!
//! # Example
//!
//! ```no_run
//! use mirrorclean::actions::relocate::{plan_relocation, relocate};
//! use std::path::Path;
//!
//! let plan = plan_relocation(
//!     Path::new("/photos"),
//!     Path::new("/photos/backup_duplicates"),
//!     Path::new("/photos/2023/img_001.jpg"),
//!     true,
//! )?;
//! let moved = relocate(&plan)?;
//! println!("{} -> {}", moved.source.display(), moved.destination.display());
//! # Ok::<(), mirrorclean::actions::relocate::RelocateError>(())
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use thiserror::Error;

/// Error type for relocation operations.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// Source file was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied while copying or removing.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The source has no final path component to name the copy after.
    #[error("path has no file name: {0}")]
    NoFileName(PathBuf),

    /// The copy does not match the source length.
    #[error("incomplete copy of {path}: expected {expected} bytes, wrote {actual}")]
    IncompleteCopy {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RelocateError {
    /// Classify an I/O error raised while touching `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Whether the failure was an access denial (locked or protected file).
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }
}

/// Where a duplicate will be moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationPlan {
    /// Current location inside the source tree.
    pub source: PathBuf,
    /// Free path inside the backup tree.
    pub destination: PathBuf,
}

/// Result of a completed relocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocated {
    /// Former location (no longer exists).
    pub source: PathBuf,
    /// Backup copy.
    pub destination: PathBuf,
    /// Bytes copied.
    pub size: u64,
}

/// Return `dir/file_name`, or the first `dir/<stem>_<n><ext>` that is free.
///
/// The suffix goes before the last extension (`report.tar.gz` becomes
/// `report.tar_1.gz`). Existence is re-checked after every increment.
#[must_use]
pub fn unique_destination(dir: &Path, file_name: &std::ffi::OsStr) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let name = Path::new(file_name);
    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Compute a non-overwriting destination for `path`.
///
/// With `preserve_structure`, the copy goes under `backup_root` at the same
/// relative directory it had under `source_root`, and that directory is
/// created. Otherwise all copies land flat in `backup_root`. Either way a
/// taken name gets a numeric suffix.
///
/// # Errors
///
/// - `NoFileName` if `path` ends in `..` or is a root
/// - `PermissionDenied`/`Io` if the mirrored directory cannot be created
pub fn plan_relocation(
    source_root: &Path,
    backup_root: &Path,
    path: &Path,
    preserve_structure: bool,
) -> Result<RelocationPlan, RelocateError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| RelocateError::NoFileName(path.to_path_buf()))?;

    let dest_dir = if preserve_structure {
        let relative = path
            .parent()
            .and_then(|parent| parent.strip_prefix(source_root).ok())
            .unwrap_or_else(|| Path::new(""));
        let dir = backup_root.join(relative);
        fs::create_dir_all(&dir).map_err(|e| RelocateError::from_io(&dir, e))?;
        dir
    } else {
        backup_root.to_path_buf()
    };

    Ok(RelocationPlan {
        source: path.to_path_buf(),
        destination: unique_destination(&dest_dir, file_name),
    })
}

/// Copy the source's access and modification times onto `dest`.
fn copy_times(source_meta: &fs::Metadata, dest: &Path) -> io::Result<()> {
    let atime = FileTime::from_last_access_time(source_meta);
    let mtime = FileTime::from_last_modification_time(source_meta);
    filetime::set_file_times(dest, atime, mtime)
}

/// Execute a plan: copy with metadata, verify, then remove the source.
///
/// If the copy fails or is incomplete, any partial destination file is
/// removed and the source is untouched. If removing the source fails, the
/// backup copy is removed again so the file exists exactly once.
///
/// # Errors
///
/// - `NotFound` if the source vanished
/// - `PermissionDenied` if copying or removing was denied
/// - `IncompleteCopy` if the destination length differs from the source
/// - `Io` for any other failure
pub fn relocate(plan: &RelocationPlan) -> Result<Relocated, RelocateError> {
    let source = &plan.source;
    let dest = &plan.destination;

    let source_meta = fs::metadata(source).map_err(|e| RelocateError::from_io(source, e))?;
    let expected = source_meta.len();

    let copied = match fs::copy(source, dest) {
        Ok(n) => n,
        Err(e) => {
            discard_partial(dest);
            return Err(RelocateError::from_io(dest, e));
        }
    };

    if copied != expected {
        discard_partial(dest);
        return Err(RelocateError::IncompleteCopy {
            path: source.clone(),
            expected,
            actual: copied,
        });
    }

    if let Err(e) = copy_times(&source_meta, dest) {
        // Content is intact; timestamps are best effort.
        log::debug!("Could not preserve timestamps on {}: {}", dest.display(), e);
    }

    if let Err(e) = fs::remove_file(source) {
        discard_partial(dest);
        return Err(RelocateError::from_io(source, e));
    }

    log::debug!(
        "Relocated {} -> {} ({} bytes)",
        source.display(),
        dest.display(),
        expected
    );

    Ok(Relocated {
        source: source.clone(),
        destination: dest.clone(),
        size: expected,
    })
}

/// Remove a destination file left by a failed relocation.
fn discard_partial(dest: &Path) {
    match fs::remove_file(dest) {
        Ok(()) => log::debug!("Removed partial copy {}", dest.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove partial copy {}: {}", dest.display(), e),
    }
}
