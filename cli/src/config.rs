//! Demo application configuration.
//!
//! Loaded from a YAML file whose path comes from the `-c/--config` global
//! flag, else the `APP_CONFIG` environment variable. Missing keys take their
//! defaults.
//!
//! # Example YAML
//!
//! ```yaml
//! name: inventory
//! database_url: sqlite:///tmp/inventory.db
//! debug: true
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable consulted when no `--config` flag is given.
pub const CONFIG_ENV: &str = "APP_CONFIG";

/// Errors raised while reading or writing the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parsing or serialization failure.
    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings the demo application is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name printed by `dumpconfig`.
    pub name: String,
    /// Database the `db` commands operate on.
    pub database_url: String,
    /// Verbose command output.
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "manage".to_string(),
            database_url: "sqlite:///tmp/manage.db".to_string(),
            debug: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = std::fs::File::create(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Picks the config file from the flag value, then `APP_CONFIG`, and
    /// loads it. Without either, returns the defaults.
    pub fn resolve(flag: Option<&str>) -> Result<(Self, Option<PathBuf>)> {
        let from_env = std::env::var(CONFIG_ENV).ok().filter(|v| !v.is_empty());
        let Some(path) = flag.map(str::to_string).or(from_env).map(PathBuf::from) else {
            debug!("no config file given, using defaults");
            return Ok((Self::default(), None));
        };
        debug!(path = %path.display(), "loading config");
        let config = Self::load(&path)?;
        Ok((config, Some(path)))
    }
}
