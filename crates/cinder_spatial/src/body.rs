//! # Bodies
//!
//! A body is the circular proxy an object keeps in the grid. The grid owns
//! every body; callers hold a [`BodyId`].

use std::fmt;

use cinder_core::{ObjectRef, PoolHandle};
use cinder_shared::{Rect, Vec2};

/// Generational handle to a body in a [`SpatialGrid`](crate::SpatialGrid).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyId(PoolHandle);

impl BodyId {
    /// Handle that never names a body.
    pub const NULL: Self = Self(PoolHandle::NULL);

    #[inline]
    pub(crate) const fn from_handle(handle: PoolHandle) -> Self {
        Self(handle)
    }

    #[inline]
    pub(crate) const fn handle(self) -> PoolHandle {
        self.0
    }

    /// Arena slot index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0.index()
    }

    /// Slot generation at insertion.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.0.generation()
    }

    /// Packed `(generation << 32) | index`, used for ordering pairs.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation() as u64) << 32) | self.index() as u64
    }
}

impl fmt::Debug for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BodyId({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Circular collision proxy.
///
/// Position and radius are only changed through the grid, which keeps cell
/// membership in step with them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pos: Vec2,
    radius: f32,
    velocity: Vec2,
    owner: ObjectRef,
}

impl Body {
    /// Creates a resting body.
    #[must_use]
    pub const fn new(pos: Vec2, radius: f32, owner: ObjectRef) -> Self {
        Self {
            pos,
            radius,
            velocity: Vec2::ZERO,
            owner,
        }
    }

    /// Sets the initial velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Center position.
    #[inline]
    #[must_use]
    pub const fn pos(&self) -> Vec2 {
        self.pos
    }

    /// Radius.
    #[inline]
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Velocity in world units per second.
    #[inline]
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// The object this body belongs to.
    #[inline]
    #[must_use]
    pub const fn owner(&self) -> ObjectRef {
        self.owner
    }

    /// Square bound `[pos - r, pos + r]`.
    #[must_use]
    pub fn bound(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    /// Whether two bodies overlap: `d² < (r1 + r2)²`. Touching is not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        let reach = self.radius + other.radius;
        self.pos.distance_squared(other.pos) < reach * reach
    }

    pub(crate) fn place(&mut self, pos: Vec2, radius: f32) {
        self.pos = pos;
        self.radius = radius;
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }
}
