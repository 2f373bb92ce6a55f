//! Streaming file digests.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size chunks and produces a [`Digest`]
//! with the run-wide [`HashAlgorithm`]. Memory use is bounded by the chunk
//! size regardless of file size.
//!
//! Read failures are returned as a [`HashError`] naming the path; whether
//! that skips the file or aborts is the caller's decision.
//!
//! # Example
//!
//! ```no_run
//! use mirrorclean::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new(HashAlgorithm::Sha256);
//! match hasher.digest_file(Path::new("photo.jpg")) {
//!     Ok(digest) => println!("{}", digest.to_hex()),
//!     Err(e) => eprintln!("skipped: {e}"),
//! }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use clap::ValueEnum;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::HashError;

/// Default read chunk size in bytes (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Digest algorithm used for a whole run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// MD5, 128-bit. Fast, not collision resistant.
    #[value(alias = "fast")]
    #[serde(alias = "fast")]
    Md5,
    /// SHA-256, 256-bit. Collision resistant.
    #[default]
    #[value(alias = "secure")]
    #[serde(alias = "secure")]
    Sha256,
    /// BLAKE3, 256-bit. Fast and collision resistant.
    Blake3,
}

impl HashAlgorithm {
    /// Length of the digest in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha256 | Self::Blake3 => 32,
        }
    }

    /// Short lowercase name, as accepted on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Finalized content digest.
///
/// Digests produced by different algorithms never compare equal, even if
/// their bytes happened to match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Box<[u8]>,
}

impl Digest {
    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex rendering.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hash_to_hex(&self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Render bytes as lowercase hex.
#[must_use]
pub fn hash_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{b:02x}");
        s
    })
}

/// Incremental state for one of the supported algorithms.
enum State {
    Md5(Md5),
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl State {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => Self::Md5(Md5::new()),
            HashAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Sha256(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Box<[u8]> {
        match self {
            Self::Md5(h) => h.finalize().to_vec().into_boxed_slice(),
            Self::Sha256(h) => h.finalize().to_vec().into_boxed_slice(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec().into_boxed_slice(),
        }
    }
}

/// Chunked file hasher for a single algorithm.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
}

impl Hasher {
    /// Create a hasher with the default 8 KiB chunk size.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Override the read chunk size. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Digest an in-memory buffer.
    #[must_use]
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        let mut state = State::new(self.algorithm);
        state.update(data);
        Digest {
            algorithm: self.algorithm,
            bytes: state.finalize(),
        }
    }

    /// Digest everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Returns the first I/O error other than `Interrupted`.
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<Digest> {
        let mut state = State::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => state.update(&buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(Digest {
            algorithm: self.algorithm,
            bytes: state.finalize(),
        })
    }

    /// Digest the full contents of a file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file vanished
    /// - `PermissionDenied` if it cannot be opened or read
    /// - `Io` for any other read failure (including directories and locked files)
    pub fn digest_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.digest_reader(file)
            .map_err(|e| HashError::from_io(path, e))
    }
}
