//! In-memory digest index for a single run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::Digest;

/// Maps each digest to the first path observed with it.
///
/// The index is owned by one run and dropped with it.
#[derive(Debug, Default)]
pub struct DigestIndex {
    originals: HashMap<Digest, PathBuf>,
}

impl DigestIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `path` under `digest` unless the digest is already known.
    ///
    /// Returns the retained first-seen path when `path` is a duplicate, or
    /// `None` when `path` became the first-seen file for its digest.
    pub fn observe(&mut self, digest: Digest, path: &Path) -> Option<&Path> {
        match self.originals.entry(digest) {
            Entry::Occupied(slot) => {
                let original: &Path = slot.into_mut();
                Some(original)
            }
            Entry::Vacant(slot) => {
                slot.insert(path.to_path_buf());
                None
            }
        }
    }

    /// Number of distinct digests.
    #[must_use]
    pub fn len(&self) -> usize {
        self.originals.len()
    }

    /// Whether no digest has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.originals.is_empty()
    }
}
