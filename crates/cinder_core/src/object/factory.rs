//! # Object Factory
//!
//! Owns every pooled object. Objects are created by type tag through a
//! registered [`Creator`], updated by [`ObjectFactory::tick`] and freed only
//! by [`ObjectFactory::collect`].

use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::context::Context;
use super::creator::{Creator, TypedCreator};
use super::handle::{ObjectRef, ObjectType};
use super::traits::{Object, Spawn, Tagged};
use crate::error::{ObjectError, ObjectResult};
use crate::memory::PoolAllocator;

/// Configuration for the object factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
    /// Number of object slots to pre-allocate. Fixed for the factory's lifetime.
    pub capacity: usize,
}

impl Default for FactoryConfig {
    fn default() -> Self {
        Self { capacity: 4096 }
    }
}

/// What the factory is doing right now; `tick`, `sort` and `collect` only
/// run from `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Ticking,
    Collecting,
}

impl Phase {
    const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ticking => "tick",
            Self::Collecting => "collect",
        }
    }
}

/// Bookkeeping for one pooled object.
struct ObjectSlot<S> {
    tag: ObjectType,
    order: i32,
    ref_count: u32,
    alive: bool,
    /// Whether `ref_count` still includes the reference the object holds on
    /// itself.
    self_ref: bool,
    /// `None` while the object is checked out (constructing, ticking or
    /// being destroyed).
    object: Option<Box<dyn Object<S>>>,
}

impl<S> ObjectSlot<S> {
    /// A freshly reserved slot holding the factory's own reference.
    const fn reserved(tag: ObjectType) -> Self {
        Self {
            tag,
            order: 0,
            ref_count: 1,
            alive: true,
            self_ref: true,
            object: None,
        }
    }

    /// Drops the self-held reference if it is still part of the count.
    ///
    /// Returns whether a reference was dropped.
    fn release_self(&mut self, this: ObjectRef) -> ObjectResult<bool> {
        if !self.self_ref {
            return Ok(false);
        }
        self.ref_count = self
            .ref_count
            .checked_sub(1)
            .ok_or(ObjectError::AlreadyDisposed(this))?;
        self.self_ref = false;
        Ok(true)
    }
}

/// Creator registry, live-object pool and deferred-destruction pipeline.
///
/// # Reference counting
///
/// A new object starts with a count of one: the reference the factory holds
/// for it. Objects built with
/// [`Constructed::fire_and_forget`](super::Constructed::fire_and_forget)
/// give that reference up immediately; [`kill`](Self::kill) gives it up
/// otherwise. Either way it is released at most once. [`inc`](Self::inc) and
/// [`dec`](Self::dec) add and release further references. At zero the
/// object is *disposed*: it is skipped by `tick()` but still resolvable
/// until the next `collect()` frees it.
///
/// # Reentrancy
///
/// Objects may create, retain, release and kill other objects from their
/// update. New objects are appended to the live list and first updated on
/// the next tick. `tick`, `sort` and `collect` themselves refuse to nest.
///
/// Dropping the factory drops every remaining object without running the
/// creators' destroy hooks.
pub struct ObjectFactory<S> {
    creators: HashMap<ObjectType, Rc<dyn Creator<S>>>,
    pool: PoolAllocator<ObjectSlot<S>>,
    /// Update order. Only `collect()` removes entries.
    live: Vec<ObjectRef>,
    phase: Phase,
    created_total: u64,
    freed_total: u64,
}

impl<S: 'static> ObjectFactory<S> {
    /// Creates a factory with a fixed number of object slots.
    ///
    /// # Panics
    ///
    /// Panics if `config.capacity` is zero.
    #[must_use]
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            creators: HashMap::new(),
            pool: PoolAllocator::new(config.capacity),
            live: Vec::with_capacity(config.capacity),
            phase: Phase::Idle,
            created_total: 0,
            freed_total: 0,
        }
    }

    /// Creates a factory with the given capacity and default settings.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::new(FactoryConfig { capacity })
    }

    // =========================================================================
    // Creator registry
    // =========================================================================

    /// Registers the creator for a tag.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::DuplicateCreator`] if the tag already has one;
    /// the existing creator is kept. Use [`replace_creator`](Self::replace_creator)
    /// to override deliberately.
    pub fn add_creator(
        &mut self,
        tag: ObjectType,
        creator: impl Creator<S> + 'static,
    ) -> ObjectResult<()> {
        match self.creators.entry(tag) {
            Entry::Occupied(_) => {
                tracing::warn!(%tag, "duplicate creator registration rejected");
                Err(ObjectError::DuplicateCreator(tag))
            }
            Entry::Vacant(slot) => {
                slot.insert(Rc::new(creator));
                tracing::debug!(%tag, "creator registered");
                Ok(())
            }
        }
    }

    /// Registers or overrides the creator for a tag.
    ///
    /// Returns true if a previous creator was replaced. Objects already
    /// alive under this tag are destroyed by the new creator.
    pub fn replace_creator(&mut self, tag: ObjectType, creator: impl Creator<S> + 'static) -> bool {
        let replaced = self.creators.insert(tag, Rc::new(creator)).is_some();
        tracing::debug!(%tag, replaced, "creator replaced");
        replaced
    }

    /// Registers the [`TypedCreator`] for `T` under `T::TYPE`.
    ///
    /// # Errors
    ///
    /// Same as [`add_creator`](Self::add_creator).
    pub fn add_type<T: Spawn<S>>(&mut self) -> ObjectResult<()> {
        self.add_creator(T::TYPE, TypedCreator::<T>::new())
    }

    /// Returns true if a creator is registered for the tag.
    #[must_use]
    pub fn has_creator(&self, tag: ObjectType) -> bool {
        self.creators.contains_key(&tag)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Creates an object by tag.
    ///
    /// Returns [`ObjectRef::NULL`] if the tag is unregistered, the pool is
    /// full or the creator rejects `args`; nothing is added in that case.
    /// Use [`try_create`](Self::try_create) to learn why.
    pub fn create<A: Any>(&mut self, service: &mut S, tag: ObjectType, args: A) -> ObjectRef {
        match self.try_create(service, tag, args) {
            Ok(this) => this,
            Err(ObjectError::UnknownType(_)) => {
                tracing::debug!(%tag, "create with unregistered tag");
                ObjectRef::NULL
            }
            Err(err) => {
                tracing::warn!(%tag, %err, "create failed");
                ObjectRef::NULL
            }
        }
    }

    /// Creates an object by tag, reporting failures.
    ///
    /// The new object is appended to the live list with order key 0 unless
    /// its creator sets one. If called during `tick()`, it is first updated on
    /// the following tick.
    ///
    /// # Errors
    ///
    /// - [`ObjectError::UnknownType`] if no creator is registered
    /// - [`ObjectError::PoolExhausted`] if every slot is in use
    /// - whatever the creator's `construct` returns
    pub fn try_create<A: Any>(
        &mut self,
        service: &mut S,
        tag: ObjectType,
        args: A,
    ) -> ObjectResult<ObjectRef> {
        self.create_boxed(service, tag, Box::new(args))
    }

    /// Creates an object by type. See [`create`](Self::create).
    pub fn create_type<T: Spawn<S>>(&mut self, service: &mut S, args: T::Args) -> ObjectRef {
        self.create(service, T::TYPE, args)
    }

    fn create_boxed(
        &mut self,
        service: &mut S,
        tag: ObjectType,
        args: Box<dyn Any>,
    ) -> ObjectResult<ObjectRef> {
        let creator = self
            .creators
            .get(&tag)
            .cloned()
            .ok_or(ObjectError::UnknownType(tag))?;

        let capacity = self.pool.capacity();
        let handle = self
            .pool
            .allocate(ObjectSlot::reserved(tag))
            .ok_or(ObjectError::PoolExhausted { capacity })?;
        let this = ObjectRef::from(handle);

        // The slot is reserved first so the constructor can hand out `this`.
        let built = match creator.construct(&mut Context::new(self, service, this), args) {
            Ok(built) => built,
            Err(err) => {
                self.pool.free(handle);
                return Err(err);
            }
        };

        let slot = self
            .pool
            .get_mut(handle)
            .ok_or(ObjectError::NoSuchEntity(this))?;
        slot.object = Some(built.object);
        if let Some(order) = built.order {
            slot.order = order;
        }
        if built.disposable_on_create {
            if let Err(err) = slot.release_self(this) {
                tracing::warn!(%tag, %err, "self reference released during construction");
            }
        }
        let ref_count = slot.ref_count;

        self.live.push(this);
        self.created_total += 1;

        tracing::debug!(
            %tag,
            index = this.index(),
            generation = this.generation(),
            ref_count,
            "object created"
        );
        Ok(this)
    }

    // =========================================================================
    // Frame phases
    // =========================================================================

    /// Updates every live object whose count is above zero, in live-list
    /// order (ascending order key as of the last [`sort`](Self::sort)).
    ///
    /// Objects created during the pass are not visited; objects disposed
    /// during the pass are skipped if not yet visited, but not freed.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Reentrant`] if called from inside `tick()` or
    /// `collect()`.
    ///
    /// # Returns
    ///
    /// Number of objects updated.
    pub fn tick(&mut self, service: &mut S) -> ObjectResult<usize> {
        self.ensure_idle("tick")?;
        self.phase = Phase::Ticking;

        // Entries appended during this pass are left for the next one.
        let pass_len = self.live.len();
        let mut ticked = 0;

        for i in 0..pass_len {
            let this = self.live[i];
            let Some(slot) = self.pool.get_mut(this.pool_handle()) else {
                continue;
            };
            if slot.ref_count == 0 {
                continue;
            }
            let Some(mut object) = slot.object.take() else {
                continue;
            };

            object.tick(&mut Context::new(self, service, this));

            // Nothing frees slots during tick, so the slot is still ours.
            if let Some(slot) = self.pool.get_mut(this.pool_handle()) {
                slot.object = Some(object);
            }
            ticked += 1;
        }

        self.phase = Phase::Idle;
        Ok(ticked)
    }

    /// Stable-sorts the live list by ascending order key.
    ///
    /// Objects with equal keys keep their relative order, so repeated calls
    /// without key changes leave the list untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Reentrant`] if called from inside `tick()` or
    /// `collect()`.
    pub fn sort(&mut self) -> ObjectResult<()> {
        self.ensure_idle("sort")?;
        let pool = &self.pool;
        self.live
            .sort_by_key(|this| pool.get(this.pool_handle()).map_or(0, |slot| slot.order));
        Ok(())
    }

    /// Frees every object whose reference count is exactly zero.
    ///
    /// Each freed object is handed to its creator's `destroy` hook, then its
    /// slot is released and it leaves the live list. During the hook the
    /// handle still resolves to its counters and order key; references added
    /// there are discarded with the object. Safe to call with nothing pending.
    /// Objects created by destroy hooks are appended to the live list;
    /// objects they dispose are freed by the next `collect()` at the latest.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Reentrant`] if called from inside `tick()` or
    /// `collect()`.
    ///
    /// # Returns
    ///
    /// Number of objects freed.
    pub fn collect(&mut self, service: &mut S) -> ObjectResult<usize> {
        self.ensure_idle("collect")?;
        self.phase = Phase::Collecting;

        let live = std::mem::take(&mut self.live);
        let mut kept = Vec::with_capacity(live.len());
        let mut freed = 0usize;

        for this in live {
            let (tag, object) = match self.pool.get_mut(this.pool_handle()) {
                None => continue,
                Some(slot) if slot.ref_count > 0 => {
                    kept.push(this);
                    continue;
                }
                Some(slot) => (slot.tag, slot.object.take()),
            };

            if let Some(object) = object {
                match self.creators.get(&tag).cloned() {
                    Some(creator) => {
                        creator.destroy(object, &mut Context::new(self, service, this));
                    }
                    None => drop(object),
                }
            }

            if self.pool.free(this.pool_handle()).is_some() {
                freed += 1;
            }
        }

        // Objects created by destroy hooks went into the (empty) live list.
        kept.append(&mut self.live);
        self.live = kept;
        self.freed_total += freed as u64;
        self.phase = Phase::Idle;

        if freed > 0 {
            tracing::debug!(freed, live = self.live.len(), "collect");
        }
        Ok(freed)
    }

    fn ensure_idle(&self, operation: &'static str) -> ObjectResult<()> {
        if self.phase == Phase::Idle {
            Ok(())
        } else {
            Err(ObjectError::Reentrant {
                operation,
                phase: self.phase.name(),
            })
        }
    }

    // =========================================================================
    // Reference counting
    // =========================================================================

    /// Adds a reference (the handle-copy operation).
    ///
    /// Retaining a disposed but not yet collected object brings it back.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NoSuchEntity`] for null or stale handles.
    pub fn inc(&mut self, this: ObjectRef) -> ObjectResult<ObjectRef> {
        let slot = self.slot_mut(this)?;
        slot.ref_count = slot.ref_count.saturating_add(1);
        Ok(this)
    }

    /// Releases a reference (the handle-release operation).
    ///
    /// Reaching zero marks the object disposed. It is not freed until the
    /// next `collect()`.
    ///
    /// # Errors
    ///
    /// - [`ObjectError::NoSuchEntity`] for null or stale handles
    /// - [`ObjectError::AlreadyDisposed`] if the count is already zero
    ///
    /// # Returns
    ///
    /// The new reference count.
    pub fn dec(&mut self, this: ObjectRef) -> ObjectResult<u32> {
        let slot = self.slot_mut(this)?;
        if slot.ref_count == 0 {
            return Err(ObjectError::AlreadyDisposed(this));
        }
        slot.ref_count -= 1;
        if slot.ref_count == 0 {
            tracing::trace!(%this, "object disposed");
        }
        Ok(slot.ref_count)
    }

    /// Current reference count.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NoSuchEntity`] for null or stale handles.
    pub fn ref_count(&self, this: ObjectRef) -> ObjectResult<u32> {
        Ok(self.slot(this)?.ref_count)
    }

    /// Whether the count reached zero and the object awaits `collect()`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NoSuchEntity`] for null or stale handles.
    pub fn is_disposed(&self, this: ObjectRef) -> ObjectResult<bool> {
        Ok(self.slot(this)?.ref_count == 0)
    }

    /// Marks the object dead and releases the reference it holds on itself,
    /// unless that reference was already given up at construction.
    ///
    /// Only the first call has an effect; returns whether it did.
    ///
    /// # Errors
    ///
    /// - [`ObjectError::NoSuchEntity`] for null or stale handles
    /// - [`ObjectError::AlreadyDisposed`] if the self-held reference is still
    ///   owed but the count is already zero; nothing changes in that case
    pub fn kill(&mut self, this: ObjectRef) -> ObjectResult<bool> {
        let slot = self.slot_mut(this)?;
        if !slot.alive {
            return Ok(false);
        }
        slot.release_self(this)?;
        slot.alive = false;
        Ok(true)
    }

    /// Whether the object exists and has not been killed.
    #[must_use]
    pub fn is_alive(&self, this: ObjectRef) -> bool {
        self.slot(this).is_ok_and(|slot| slot.alive)
    }

    /// Whether the handle still resolves to an object (disposed or not).
    #[must_use]
    pub fn contains(&self, this: ObjectRef) -> bool {
        self.pool.contains(this.pool_handle())
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Resolves a handle.
    ///
    /// # Errors
    ///
    /// - [`ObjectError::NoSuchEntity`] for null, stale or collected handles
    /// - [`ObjectError::Busy`] while the object runs its own update
    pub fn get(&self, this: ObjectRef) -> ObjectResult<&(dyn Object<S> + 'static)> {
        self.slot(this)?
            .object
            .as_deref()
            .ok_or(ObjectError::Busy(this))
    }

    /// Resolves a handle mutably.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn get_mut(&mut self, this: ObjectRef) -> ObjectResult<&mut (dyn Object<S> + 'static)> {
        self.slot_mut(this)?
            .object
            .as_deref_mut()
            .ok_or(ObjectError::Busy(this))
    }

    /// Typed access, gated by tag equality.
    ///
    /// # Errors
    ///
    /// - [`ObjectError::TypeMismatch`] if the object's tag is not `T::TYPE`
    /// - otherwise same as [`get`](Self::get)
    pub fn cast<T: Object<S> + Tagged>(&self, this: ObjectRef) -> ObjectResult<&T> {
        let slot = self.slot(this)?;
        let mismatch = ObjectError::TypeMismatch {
            expected: T::TYPE,
            actual: slot.tag,
        };
        if slot.tag != T::TYPE {
            return Err(mismatch);
        }
        let object = slot.object.as_deref().ok_or(ObjectError::Busy(this))?;
        object.downcast_ref::<T>().ok_or(mismatch)
    }

    /// Typed mutable access, gated by tag equality.
    ///
    /// # Errors
    ///
    /// Same as [`cast`](Self::cast).
    pub fn cast_mut<T: Object<S> + Tagged>(&mut self, this: ObjectRef) -> ObjectResult<&mut T> {
        let slot = self.slot_mut(this)?;
        let mismatch = ObjectError::TypeMismatch {
            expected: T::TYPE,
            actual: slot.tag,
        };
        if slot.tag != T::TYPE {
            return Err(mismatch);
        }
        let object = slot
            .object
            .as_deref_mut()
            .ok_or(ObjectError::Busy(this))?;
        object.downcast_mut::<T>().ok_or(mismatch)
    }

    /// Type tag of the object.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NoSuchEntity`] for null or stale handles.
    pub fn type_of(&self, this: ObjectRef) -> ObjectResult<ObjectType> {
        Ok(self.slot(this)?.tag)
    }

    /// Whether the object carries `tag`. False for unresolvable handles.
    #[must_use]
    pub fn is_a(&self, this: ObjectRef, tag: ObjectType) -> bool {
        self.type_of(this).is_ok_and(|own| own == tag)
    }

    /// Whether two objects carry the same tag. False if either is unresolvable.
    #[must_use]
    pub fn is_same_type(&self, this: ObjectRef, other: ObjectRef) -> bool {
        self.type_of(other).is_ok_and(|tag| self.is_a(this, tag))
    }

    /// Changes the object's order key; applied by the next `sort()`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NoSuchEntity`] for null or stale handles.
    pub fn set_order(&mut self, this: ObjectRef, order: i32) -> ObjectResult<()> {
        self.slot_mut(this)?.order = order;
        Ok(())
    }

    /// The object's order key.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::NoSuchEntity`] for null or stale handles.
    pub fn order(&self, this: ObjectRef) -> ObjectResult<i32> {
        Ok(self.slot(this)?.order)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// The live list in update order, including disposed objects awaiting
    /// `collect()`.
    #[must_use]
    pub fn live(&self) -> &[ObjectRef] {
        &self.live
    }

    /// Number of objects on the live list.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Number of disposed objects the next `collect()` will free.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.live
            .iter()
            .filter(|this| self.slot(**this).is_ok_and(|slot| slot.ref_count == 0))
            .count()
    }

    /// Fixed number of object slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Objects created since the factory was built.
    #[must_use]
    pub const fn created_total(&self) -> u64 {
        self.created_total
    }

    /// Objects freed since the factory was built.
    #[must_use]
    pub const fn freed_total(&self) -> u64 {
        self.freed_total
    }

    fn slot(&self, this: ObjectRef) -> ObjectResult<&ObjectSlot<S>> {
        self.pool
            .get(this.pool_handle())
            .ok_or(ObjectError::NoSuchEntity(this))
    }

    fn slot_mut(&mut self, this: ObjectRef) -> ObjectResult<&mut ObjectSlot<S>> {
        self.pool
            .get_mut(this.pool_handle())
            .ok_or(ObjectError::NoSuchEntity(this))
    }
}
