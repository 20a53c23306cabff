//! # Cinder Shared
//!
//! Common types used by the object pool, the spatial grid and the
//! application layer.
//!
//! - [`Vec2`] / [`Rect`]: world-space math
//! - [`hash`]: integer mixing used for bucket selection and pair identity
//! - [`Random`]: seeded deterministic random source handed to entity logic

#![deny(unsafe_code)]

pub mod hash;
pub mod math;
pub mod random;

pub use hash::{cell_hash, symmetric_pair_hash, wang_64};
pub use math::{Rect, RectClass, Vec2};
pub use random::Random;
