//! # Object Context
//!
//! What an object sees while it is constructed, updated or destroyed: the
//! factory that owns it, the application service, and its own handle.

use std::any::Any;

use super::factory::ObjectFactory;
use super::handle::{ObjectRef, ObjectType};
use super::traits::Spawn;
use crate::error::ObjectResult;

/// Borrowed access to the factory and the service on behalf of one object.
///
/// While a context exists, the object it was made for is checked out of its
/// pool slot: resolving [`Context::this`] through the factory yields
/// [`ObjectError::Busy`](crate::ObjectError::Busy). The slot itself stays
/// allocated, during `destroy` as well, so its counters (reference count,
/// order key, liveness) remain reachable.
pub struct Context<'a, S> {
    factory: &'a mut ObjectFactory<S>,
    service: &'a mut S,
    this: ObjectRef,
}

impl<'a, S: 'static> Context<'a, S> {
    pub(crate) fn new(factory: &'a mut ObjectFactory<S>, service: &'a mut S, this: ObjectRef) -> Self {
        Self {
            factory,
            service,
            this,
        }
    }

    /// Handle of the object this context was made for.
    #[inline]
    #[must_use]
    pub const fn this(&self) -> ObjectRef {
        self.this
    }

    /// The application service.
    #[inline]
    pub fn service(&mut self) -> &mut S {
        &mut *self.service
    }

    /// The owning factory.
    #[inline]
    pub fn factory(&mut self) -> &mut ObjectFactory<S> {
        &mut *self.factory
    }

    /// Factory and service at once, for calls that need both.
    #[inline]
    pub fn split(&mut self) -> (&mut ObjectFactory<S>, &mut S) {
        (&mut *self.factory, &mut *self.service)
    }

    /// Creates another object by tag. See [`ObjectFactory::create`].
    pub fn create<A: Any>(&mut self, tag: ObjectType, args: A) -> ObjectRef {
        self.factory.create(&mut *self.service, tag, args)
    }

    /// Creates another object by tag. See [`ObjectFactory::try_create`].
    ///
    /// # Errors
    ///
    /// Same as [`ObjectFactory::try_create`].
    pub fn try_create<A: Any>(&mut self, tag: ObjectType, args: A) -> ObjectResult<ObjectRef> {
        self.factory.try_create(&mut *self.service, tag, args)
    }

    /// Creates another object by type. See [`ObjectFactory::create_type`].
    pub fn create_type<T: Spawn<S>>(&mut self, args: T::Args) -> ObjectRef {
        self.factory.create_type::<T>(&mut *self.service, args)
    }

    /// Marks this object dead and drops the reference it holds on itself.
    /// See [`ObjectFactory::kill`].
    ///
    /// # Errors
    ///
    /// Same as [`ObjectFactory::kill`].
    pub fn kill(&mut self) -> ObjectResult<bool> {
        self.factory.kill(self.this)
    }

    /// Whether this object has not been killed yet.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.factory.is_alive(self.this)
    }

    /// Changes this object's order key; applied by the next `sort()`.
    ///
    /// # Errors
    ///
    /// Same as [`ObjectFactory::set_order`].
    pub fn set_order(&mut self, order: i32) -> ObjectResult<()> {
        self.factory.set_order(self.this, order)
    }

    /// Current order key of this object.
    ///
    /// # Errors
    ///
    /// Same as [`ObjectFactory::order`].
    pub fn order(&self) -> ObjectResult<i32> {
        self.factory.order(self.this)
    }
}
