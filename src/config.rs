//! Runtime configuration.
//!
//! Loaded from an optional TOML file, then overridden by `HAARINDEX_*`
//! environment variables (a `.env` file is honored).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{HaarIndexError, Result};
use crate::index::records::DEFAULT_RECORD_CHUNK;

const ENV_PREFIX: &str = "HAARINDEX_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub index: IndexConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Object store URL, e.g. `memory:///`, `file:///var/lib/haarindex`, `s3://bucket`.
    pub url: String,
    /// Key prefix nested below the URL path.
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: "memory:///".to_string(),
            prefix: "haarindex".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Label distinguishing this index's metrics from other indexes in the
    /// same process.
    pub name: String,
    /// Slots added to the record store past the id that overflowed it.
    pub record_chunk: usize,
    /// Log a progress line every this many internal ids while rebuilding.
    pub load_progress_interval: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            record_chunk: DEFAULT_RECORD_CHUNK,
            load_progress_interval: 250_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
    /// `text` or `json`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or `$HAARINDEX_CONFIG` when `path` is
    /// None, falling back to defaults when neither is set.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let env_path = std::env::var(format!("{ENV_PREFIX}CONFIG")).ok();
        let path = path.map(Path::to_path_buf).or(env_path.map(Into::into));

        let mut config = match path {
            Some(p) => {
                let raw = std::fs::read_to_string(&p)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| HaarIndexError::Config(e.to_string()))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(v) = env_var("STORAGE_URL") {
            self.storage.url = v;
        }
        if let Some(v) = env_var("STORAGE_PREFIX") {
            self.storage.prefix = v;
        }
        if let Some(v) = env_var("INDEX_NAME") {
            self.index.name = v;
        }
        if let Some(v) = env_var("RECORD_CHUNK") {
            self.index.record_chunk = parse_env("RECORD_CHUNK", &v)?;
        }
        if let Some(v) = env_var("LOAD_PROGRESS_INTERVAL") {
            self.index.load_progress_interval = parse_env("LOAD_PROGRESS_INTERVAL", &v)?;
        }
        if let Some(v) = env_var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = env_var("LOG_FORMAT") {
            self.logging.format = v;
        }
        Ok(())
    }

    /// Reject values the index cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.index.name.is_empty() {
            return Err(HaarIndexError::Config(
                "index.name must not be empty".to_string(),
            ));
        }
        if self.index.record_chunk == 0 {
            return Err(HaarIndexError::Config(
                "index.record_chunk must be greater than 0".to_string(),
            ));
        }
        if self.index.load_progress_interval == 0 {
            return Err(HaarIndexError::Config(
                "index.load_progress_interval must be greater than 0".to_string(),
            ));
        }
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(HaarIndexError::Config(format!(
                "logging.format must be 'text' or 'json', got '{}'",
                self.logging.format
            )));
        }
        url::Url::parse(&self.storage.url)?;
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}")).ok()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| HaarIndexError::Config(format!("invalid {ENV_PREFIX}{name}: '{value}'")))
}
