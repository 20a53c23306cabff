//! # Cinder Core
//!
//! Entity lifecycle manager: a polymorphic object pool with manual reference
//! counting and deferred destruction.
//!
//! ## Frame discipline
//!
//! 1. [`ObjectFactory::tick`] updates every live, non-disposed object in
//!    order-key order. Objects may create or dispose other objects while
//!    ticking; nothing is freed.
//! 2. [`ObjectFactory::collect`] frees every object whose reference count is
//!    zero and removes it from the live list. This is the only removal path.
//!
//! Handles ([`ObjectRef`]) are `(index, generation)` pairs, so a reused pool
//! slot is never mistaken for its previous occupant.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinder_core::{ObjectFactory, FactoryConfig};
//!
//! let mut factory: ObjectFactory<MyService> = ObjectFactory::new(FactoryConfig::default());
//! factory.add_type::<Bullet>()?;
//! let bullet = factory.create_type::<Bullet>(&mut service, (pos, dir));
//! factory.tick(&mut service);
//! factory.collect(&mut service)?;
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod memory;
pub mod object;

pub use error::{ObjectError, ObjectResult};
pub use memory::{PoolAllocator, PoolHandle};
pub use object::{
    AsAny, Constructed, Context, Creator, FactoryConfig, Object, ObjectFactory, ObjectRef,
    ObjectType, Spawn, Tagged, TypedCreator,
};
