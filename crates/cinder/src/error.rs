//! # Scene Errors

use cinder_core::ObjectError;
use cinder_spatial::SpatialError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors surfaced by the scene driver.
#[derive(Error, Debug)]
pub enum CinderError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An object factory operation failed.
    #[error(transparent)]
    Object(#[from] ObjectError),

    /// A spatial grid operation failed.
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

/// Result type for scene operations.
pub type CinderResult<T> = Result<T, CinderError>;
