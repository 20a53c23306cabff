//! # Spatial Errors

use thiserror::Error;

use crate::body::BodyId;

/// Errors from grid operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// The handle does not name a body in this grid (never inserted,
    /// already removed, or its slot was reused).
    #[error("no body {0} in the grid")]
    UnknownBody(BodyId),

    /// Radius is negative or not finite.
    #[error("invalid radius {0}")]
    InvalidRadius(f32),

    /// A position or query coordinate is not finite.
    #[error("invalid position ({x}, {y})")]
    InvalidPosition {
        /// X coordinate
        x: f32,
        /// Y coordinate
        y: f32,
    },

    /// A velocity is not finite.
    #[error("invalid velocity ({x}, {y})")]
    InvalidVelocity {
        /// X component
        x: f32,
        /// Y component
        y: f32,
    },

    /// A body's bound reaches past the largest cell coordinate the grid
    /// addresses. `(x, y)` is the offending bound corner.
    #[error("bound corner ({x}, {y}) is outside the grid")]
    OutOfRange {
        /// X coordinate
        x: f32,
        /// Y coordinate
        y: f32,
    },

    /// A body's bound covers more cells than one body may hold.
    #[error("body covers {cells} cells, limit is {limit}")]
    TooLarge {
        /// Cells the bound covers
        cells: u64,
        /// Configured `max_cells_per_body`
        limit: usize,
    },

    /// The body arena is full.
    #[error("grid is full ({capacity} bodies)")]
    Full {
        /// Arena capacity
        capacity: usize,
    },
}

/// Result alias for grid operations.
pub type SpatialResult<T> = Result<T, SpatialError>;
