//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (`--config FILE`, else `config.toml` in the platform
//!    config directory)
//! 3. `MIRRORCLEAN_*` environment variables
//!
//! Command-line flags are applied on top by the binary.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::scanner::{HashAlgorithm, DEFAULT_CHUNK_SIZE};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MIRRORCLEAN_";

/// Default name of the backup directory created inside the source.
pub const DEFAULT_BACKUP_DIR_NAME: &str = "backup_duplicates";

/// Default name of the run log directory created inside the source.
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";

/// Errors from loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A layer could not be parsed or extracted.
    #[error("Invalid configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    /// A value failed validation.
    #[error("Invalid value for '{key}': {reason}")]
    Invalid {
        /// Offending key.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The platform config directory is unknown.
    #[error("Failed to determine project directories")]
    NoProjectDirs,

    /// Writing the config file failed.
    #[error("Cannot write config file {path}: {source}")]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Serializing the config failed.
    #[error("Cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest algorithm for every run.
    pub algorithm: HashAlgorithm,
    /// Mirror the source directory layout inside the backup directory.
    pub preserve_structure: bool,
    /// Backup directory name used when `--backup-dir` is not given.
    pub backup_dir_name: String,
    /// Log directory name used when `--log-dir` is not given.
    pub log_dir_name: String,
    /// Read chunk size for digests, in bytes.
    pub chunk_size: usize,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Follow symbolic links while walking.
    pub follow_symlinks: bool,
    /// Gitignore-style patterns to leave out of the walk.
    pub ignore_patterns: Vec<String>,
    /// Write a per-run log file.
    pub write_log_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            preserve_structure: false,
            backup_dir_name: DEFAULT_BACKUP_DIR_NAME.to_string(),
            log_dir_name: DEFAULT_LOG_DIR_NAME.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            skip_hidden: false,
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
            write_log_file: true,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// With `path` set, that file must exist. Without it, the platform
    /// config file is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing (explicit path only), cannot
    /// be parsed, or yields an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
        }

        let file = path.map(Path::to_path_buf).or_else(Self::default_path);
        let config: Self = Self::figment(file.as_deref())
            .extract()
            .map_err(Box::new)?;
        config.validate()?;

        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Build the provider stack without extracting it.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Check values that serde alone cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_dir_name("backup_dir_name", &self.backup_dir_name)?;
        validate_dir_name("log_dir_name", &self.log_dir_name)?;
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                key: "chunk_size",
                reason: "must be at least 1 byte".to_string(),
            });
        }
        Ok(())
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Platform config file path, if the platform has one.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().ok().map(|dir| dir.join("config.toml"))
    }

    fn config_dir() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("com", "mirrorclean", "mirrorclean")
            .ok_or(ConfigError::NoProjectDirs)?;
        Ok(dirs.config_dir().to_path_buf())
    }
}

fn validate_dir_name(key: &'static str, name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must not be empty".to_string(),
        });
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(ConfigError::Invalid {
            key,
            reason: format!("'{name}' must be a single directory name"),
        });
    }
    Ok(())
}
