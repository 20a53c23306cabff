//! # Grid Configuration
//!
//! Grid parameters are fixed for the lifetime of a grid. The bucket table
//! never grows, so `buckets` should comfortably exceed the expected number
//! of live bodies or aliasing degrades every query.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a grid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field is out of range.
    #[error("invalid grid config: {0}")]
    Invalid(&'static str),

    /// The TOML source did not parse.
    #[error("failed to parse grid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Construction parameters for [`SpatialGrid`](crate::SpatialGrid).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Edge length of one square cell in world units.
    pub cell_width: f32,
    /// Number of hash buckets.
    pub buckets: usize,
    /// Maximum number of bodies held at once.
    pub max_bodies: usize,
    /// Maximum number of cells one body's bound may cover.
    pub max_cells_per_body: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_width: 32.0,
            buckets: 1024,
            max_bodies: 4096,
            max_cells_per_body: 4096,
        }
    }
}

impl GridConfig {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_width.is_finite() && self.cell_width > 0.0) {
            return Err(ConfigError::Invalid("cell_width must be finite and > 0"));
        }
        if self.buckets == 0 {
            return Err(ConfigError::Invalid("buckets must be > 0"));
        }
        if self.max_bodies == 0 {
            return Err(ConfigError::Invalid("max_bodies must be > 0"));
        }
        if u32::try_from(self.max_bodies).map_or(true, |n| n == u32::MAX) {
            return Err(ConfigError::Invalid("max_bodies must fit in 32 bits"));
        }
        if self.max_cells_per_body == 0 {
            return Err(ConfigError::Invalid("max_cells_per_body must be > 0"));
        }
        Ok(())
    }

    /// Parses and validates a `[grid]`-less TOML table.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }
}
