//! # Creators
//!
//! A creator is the construct/destroy capability registered for one type tag.

use std::any::{type_name, Any};
use std::marker::PhantomData;

use super::context::Context;
use super::traits::{AsAny, Object, Spawn};
use crate::error::{ObjectError, ObjectResult};

/// Result of a successful construction.
#[derive(Debug)]
pub struct Constructed<O> {
    /// The constructed object.
    pub object: O,
    /// Initial order key. `None` keeps whatever the slot already holds
    /// (0, or a value set through `Context::set_order` during construction).
    pub order: Option<i32>,
    /// Drop the factory-held reference as soon as construction finishes.
    ///
    /// The object then starts with a reference count of zero (unless
    /// something retained it during construction) and is freed by the next
    /// `collect()`. One-shot spawners use this.
    pub disposable_on_create: bool,
}

impl<O> Constructed<O> {
    /// Wraps an object with default settings: order key untouched, kept
    /// alive by the factory-held reference.
    #[must_use]
    pub const fn new(object: O) -> Self {
        Self {
            object,
            order: None,
            disposable_on_create: false,
        }
    }

    /// Sets the initial order key.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Marks the object fire-and-forget.
    #[must_use]
    pub const fn fire_and_forget(mut self) -> Self {
        self.disposable_on_create = true;
        self
    }

    /// Transforms the wrapped object, keeping the settings.
    pub fn map<P>(self, f: impl FnOnce(O) -> P) -> Constructed<P> {
        Constructed {
            object: f(self.object),
            order: self.order,
            disposable_on_create: self.disposable_on_create,
        }
    }
}

/// Construct/destroy capability for one type tag.
pub trait Creator<S> {
    /// Builds a new object from type-erased arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::InvalidArguments`] (or any other error) to
    /// abort the construction.
    fn construct(
        &self,
        cx: &mut Context<'_, S>,
        args: Box<dyn Any>,
    ) -> ObjectResult<Constructed<Box<dyn Object<S>>>>;

    /// Releases an object during `collect()`.
    ///
    /// Must release everything the object owns outside itself, e.g. its body
    /// in the spatial grid.
    fn destroy(&self, object: Box<dyn Object<S>>, cx: &mut Context<'_, S>) {
        let _ = cx;
        drop(object);
    }
}

/// Creator for any [`Spawn`] type; arguments are downcast to `T::Args`.
pub struct TypedCreator<T>(PhantomData<fn() -> T>);

impl<T> TypedCreator<T> {
    /// Creates the creator.
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TypedCreator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: 'static, T: Spawn<S>> Creator<S> for TypedCreator<T> {
    fn construct(
        &self,
        cx: &mut Context<'_, S>,
        args: Box<dyn Any>,
    ) -> ObjectResult<Constructed<Box<dyn Object<S>>>> {
        let args = args
            .downcast::<T::Args>()
            .map_err(|_| ObjectError::InvalidArguments {
                tag: T::TYPE,
                reason: format!("expected arguments of type {}", type_name::<T::Args>()),
            })?;

        let built = T::spawn(cx, *args)?;
        Ok(built.map(|object| Box::new(object) as Box<dyn Object<S>>))
    }

    fn destroy(&self, object: Box<dyn Object<S>>, cx: &mut Context<'_, S>) {
        match <dyn Object<S> as AsAny>::into_any(object).downcast::<T>() {
            Ok(typed) => typed.despawn(cx),
            Err(_) => tracing::warn!(
                tag = %T::TYPE,
                "creator for {} received a foreign object; dropped without despawn",
                type_name::<T>()
            ),
        }
    }
}
