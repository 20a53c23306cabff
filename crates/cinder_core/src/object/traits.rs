//! # Object Traits
//!
//! Entity types implement [`Object`] for their per-frame behaviour. Types
//! that also implement [`Tagged`] and [`Spawn`] can be registered with
//! [`ObjectFactory::add_type`](super::ObjectFactory::add_type) without
//! writing a [`Creator`](super::Creator) by hand.

use std::any::Any;

use super::context::Context;
use super::creator::Constructed;
use super::handle::ObjectType;
use crate::error::ObjectResult;

/// Upcast helper so that `dyn Object<S>` can be downcast to its concrete type.
///
/// Blanket-implemented for every `'static` type; never implement it by hand.
pub trait AsAny: Any {
    /// Borrows `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// Borrows `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
    /// Converts a boxed `self` into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A pooled entity.
///
/// `S` is the application's service context, handed to every constructor,
/// destructor and update through a [`Context`].
pub trait Object<S>: AsAny {
    /// Per-frame update.
    ///
    /// Called once per [`ObjectFactory::tick`](super::ObjectFactory::tick)
    /// while the object's reference count is above zero. The object may
    /// create or dispose other objects through `cx`; objects created here
    /// are first updated on the next tick.
    fn tick(&mut self, cx: &mut Context<'_, S>) {
        let _ = cx;
    }
}

impl<S: 'static> dyn Object<S> {
    /// Returns true if the concrete type is `T`.
    #[must_use]
    pub fn is<T: Object<S>>(&self) -> bool {
        AsAny::as_any(self).is::<T>()
    }

    /// Downcasts to the concrete type.
    #[must_use]
    pub fn downcast_ref<T: Object<S>>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref::<T>()
    }

    /// Mutably downcasts to the concrete type.
    pub fn downcast_mut<T: Object<S>>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut::<T>()
    }
}

/// Associates a concrete entity type with its type tag.
pub trait Tagged {
    /// The tag this type is registered and cast under.
    const TYPE: ObjectType;
}

/// Construction and destruction hooks for a concrete entity type.
///
/// [`TypedCreator`](super::TypedCreator) turns any `Spawn` type into a
/// registered creator.
pub trait Spawn<S>: Object<S> + Tagged + Sized {
    /// Arguments accepted by [`Spawn::spawn`].
    type Args: Any;

    /// Builds the object. `cx.this()` is already the new object's handle,
    /// so bodies registered here can point back at their owner.
    ///
    /// # Errors
    ///
    /// Returns an error to abort construction; the reserved slot is released
    /// and nothing is added to the live list.
    fn spawn(cx: &mut Context<'_, S>, args: Self::Args) -> ObjectResult<Constructed<Self>>;

    /// Releases resources owned outside the object (grid bodies, ...).
    ///
    /// Runs inside `collect()`, after the object left its pool slot.
    fn despawn(self: Box<Self>, cx: &mut Context<'_, S>) {
        let _ = cx;
    }
}
