//! # Object Handles
//!
//! Handles are lightweight identifiers consisting of:
//! - An index into the factory's object pool
//! - A generation counter for safe slot reuse

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::memory::PoolHandle;

/// Type tag of a pooled object.
///
/// Each tag maps to exactly one registered [`Creator`](super::Creator).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ObjectType(pub u32);

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Reference to a pooled object.
///
/// The ID is split into two parts:
/// - Lower 32 bits: index into the factory's pool
/// - Upper 32 bits: generation counter for detecting stale references
///
/// An `ObjectRef` never owns memory. Copying the Rust value is free and does
/// not touch the object's reference count; counting is explicit through
/// [`ObjectFactory::inc`](super::ObjectFactory::inc) and
/// [`ObjectFactory::dec`](super::ObjectFactory::dec).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ObjectRef(u64);

impl ObjectRef {
    /// Null/invalid reference.
    pub const NULL: Self = Self(u64::MAX);

    /// Creates a reference from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the reference.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the reference.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Checks if this reference is null.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }

    /// Returns true unless this is the null reference.
    ///
    /// A valid reference may still be stale; resolve it through the factory
    /// to find out whether the object exists.
    #[inline]
    #[must_use]
    pub const fn valid(self) -> bool {
        !self.is_null()
    }

    /// Raw 64-bit identity, used for hashing.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    #[inline]
    pub(crate) const fn pool_handle(self) -> PoolHandle {
        PoolHandle::from_parts(self.index(), self.generation())
    }
}

impl Default for ObjectRef {
    fn default() -> Self {
        Self::NULL
    }
}

impl From<PoolHandle> for ObjectRef {
    fn from(handle: PoolHandle) -> Self {
        if handle.is_null() {
            Self::NULL
        } else {
            Self::new(handle.index(), handle.generation())
        }
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            f.write_str("ObjectRef(null)")
        } else {
            write!(f, "ObjectRef({}v{})", self.index(), self.generation())
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
