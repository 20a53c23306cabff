//! # Configuration
//!
//! One TOML document configures the whole stack:
//!
//! ```toml
//! seed = 42
//! frame_budget_us = 16666
//!
//! [grid]
//! cell_width = 32.0
//! buckets = 2048
//!
//! [factory]
//! capacity = 8192
//! ```
//!
//! Every section and field is optional.

use std::path::{Path, PathBuf};

use cinder_core::FactoryConfig;
use cinder_spatial::GridConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading a [`CinderConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The TOML did not parse.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The `[grid]` section is invalid.
    #[error(transparent)]
    Grid(#[from] cinder_spatial::ConfigError),

    /// A top-level field is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Configuration for a [`Scene`](crate::Scene).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CinderConfig {
    /// Spatial grid parameters.
    pub grid: GridConfig,
    /// Object pool parameters.
    pub factory: FactoryConfig,
    /// Seed of the service's random source.
    pub seed: u64,
    /// Frames slower than this are logged. `0` disables the check.
    pub frame_budget_us: u64,
    /// Sort the live list at the start of every frame.
    pub sort_every_frame: bool,
    /// Move every body by its velocity after the tick.
    pub integrate_velocity: bool,
    /// Gather broad-phase pairs after collect, for the next frame.
    pub gather_pairs: bool,
}

impl Default for CinderConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            factory: FactoryConfig::default(),
            seed: 0x1234,
            frame_budget_us: 16_666,
            sort_every_frame: false,
            integrate_velocity: false,
            gather_pairs: true,
        }
    }
}

impl CinderConfig {
    /// Checks every section.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.grid.validate()?;
        if self.factory.capacity == 0 {
            return Err(ConfigError::Invalid("factory.capacity must be > 0"));
        }
        if u32::try_from(self.factory.capacity).map_or(true, |c| c == u32::MAX) {
            return Err(ConfigError::Invalid("factory.capacity must fit in 32 bits"));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML, otherwise the
    /// first validation failure.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`CinderConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}
