//! # Memory Management
//!
//! Fixed-capacity slot storage with generation-checked handles.
//!
//! All slots are allocated once when the pool is created. Freed slots are
//! recycled through a free list, and every free bumps the slot's generation
//! so that handles to the previous occupant stop resolving.

mod pool;

pub use pool::{PoolAllocator, PoolHandle};
