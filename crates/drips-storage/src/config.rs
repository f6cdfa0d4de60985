//! Storage configuration for processes embedding drips lists.
//!
//! [`StorageConfig::load`] layers built-in defaults, an optional config
//! file and `DRIPS_*` environment variables (e.g. `DRIPS_LOG_LEVEL`).

use std::path::{Path, PathBuf};

use serde::Deserialize;

use drips_core::DripsError;

fn config_err(e: config::ConfigError) -> DripsError {
    DripsError::Config(e.to_string())
}

/// Configuration for a persistent list store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "debug", "drips_core=trace").
    pub log_level: String,
    /// "json" for structured logs, anything else for text.
    pub log_format: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drips");

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl StorageConfig {
    /// Path to the RocksDB list data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("listdata")
    }

    /// Load configuration from defaults, `file` (if given) and the environment.
    ///
    /// The file format follows its extension (TOML, JSON, YAML, ...).
    pub fn load(file: Option<&Path>) -> Result<Self, DripsError> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("data_dir", defaults.data_dir.to_string_lossy().into_owned())
            .map_err(config_err)?
            .set_default("log_level", defaults.log_level)
            .map_err(config_err)?
            .set_default("log_format", defaults.log_format)
            .map_err(config_err)?;
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(config::Environment::with_prefix("DRIPS"))
            .build()
            .map_err(config_err)?
            .try_deserialize()
            .map_err(config_err)
    }
}
