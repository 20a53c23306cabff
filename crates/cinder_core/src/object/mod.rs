//! # Object Lifecycle
//!
//! Pooled, reference-counted entities with deferred destruction.
//!
//! - [`ObjectRef`]: `(index, generation)` handle
//! - [`Object`]: per-frame behaviour, implemented by every entity type
//! - [`Creator`]: construct/destroy capability registered per [`ObjectType`]
//! - [`ObjectFactory`]: registry, live list, tick/sort/collect

mod context;
mod creator;
mod factory;
mod handle;
mod traits;

pub use context::Context;
pub use creator::{Constructed, Creator, TypedCreator};
pub use factory::{FactoryConfig, ObjectFactory};
pub use handle::{ObjectRef, ObjectType};
pub use traits::{AsAny, Object, Spawn, Tagged};
