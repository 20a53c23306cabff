//! # Cinder
//!
//! Pooled game objects with deferred destruction, wired to a uniform-grid
//! spatial hash.
//!
//! ## Frame
//!
//! ```text
//! Scene::frame(dt)
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. SORT     (when requested)  stable, by order key           │
//! │ 2. TICK     every live object; may create / kill / move      │
//! │ 3. ADVANCE  (optional) bodies move by velocity * dt          │
//! │ 4. COLLECT  free count-0 objects; creators remove bodies     │
//! │ 5. PAIRS    (optional) broad-phase pairs for the next frame  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Crates
//!
//! - [`core`]: object factory, handles, creators
//! - [`spatial`]: bodies and the spatial grid
//! - [`shared`]: math, hashing, random numbers

pub mod config;
pub mod error;
pub mod scene;
pub mod service;

pub use cinder_core as core;
pub use cinder_shared as shared;
pub use cinder_spatial as spatial;

pub use config::{CinderConfig, ConfigError};
pub use error::{CinderError, CinderResult};
pub use scene::{FrameStats, FrameStatsAccumulator, Scene};
pub use service::Service;
