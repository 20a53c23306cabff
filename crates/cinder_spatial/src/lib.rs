//! # Cinder Spatial
//!
//! Uniform-grid spatial hash used for broad-phase proximity queries.
//!
//! ## Layout
//!
//! World space is cut into square cells of `cell_width`. A cell is never
//! materialized; its integer coordinates are hashed into a fixed table of
//! buckets. Each bucket holds one slot per `(cell, body)` membership, and a
//! body has one slot for every cell its square bound `[pos - r, pos + r]`
//! overlaps.
//!
//! ## Queries
//!
//! | query                                   | result                             |
//! |-----------------------------------------|------------------------------------|
//! | [`SpatialGrid::query_collisions`]       | every overlapping pair, once       |
//! | [`SpatialGrid::query_radius`]           | bodies overlapping a circle        |
//! | [`SpatialGrid::query_rect`]             | bodies overlapping a rect          |
//! | [`SpatialGrid::query_ray`]              | bodies crossed by a segment        |
//! | [`SpatialGrid::query_ray_first`]        | nearest body crossed by a segment  |

#![deny(unsafe_code)]

mod body;
mod config;
mod error;
mod grid;
mod sets;

pub use body::{Body, BodyId};
pub use config::{ConfigError, GridConfig};
pub use error::{SpatialError, SpatialResult};
pub use grid::{GridCell, RayHit, SpatialGrid, MAX_CELL_COORD};
pub use sets::{BodyPair, BodyPairSet, BodySet};
