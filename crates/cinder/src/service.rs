//! # Service
//!
//! The application context every object receives through its
//! [`Context`](cinder_core::Context): the spatial grid, the random source,
//! frame timing and last frame's broad-phase pairs.

use cinder_core::ObjectRef;
use cinder_shared::{Random, Vec2};
use cinder_spatial::{Body, BodyId, BodyPairSet, SpatialGrid, SpatialResult};

/// Shared state handed to objects while they are built, ticked and
/// destroyed.
#[derive(Debug)]
pub struct Service {
    /// The spatial grid. Objects insert their bodies here on spawn and
    /// remove them on despawn.
    pub grid: SpatialGrid,
    /// Deterministic random source for gameplay logic.
    pub random: Random,
    /// Overlapping pairs gathered at the end of the previous frame.
    pub pairs: BodyPairSet,
    frame: u64,
    dt: f32,
}

impl Service {
    /// Creates a service around a grid.
    #[must_use]
    pub fn new(grid: SpatialGrid, random: Random) -> Self {
        Self {
            grid,
            random,
            pairs: BodyPairSet::new(),
            frame: 0,
            dt: 0.0,
        }
    }

    /// Number of the frame being run.
    #[inline]
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Seconds covered by the frame being run.
    #[inline]
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    pub(crate) fn begin_frame(&mut self, frame: u64, dt: f32) {
        self.frame = frame;
        self.dt = dt;
    }

    /// Inserts a body owned by `owner`.
    ///
    /// # Errors
    ///
    /// Same as [`SpatialGrid::insert`].
    pub fn add_body(&mut self, owner: ObjectRef, pos: Vec2, radius: f32) -> SpatialResult<BodyId> {
        self.grid.insert(Body::new(pos, radius, owner))
    }

    /// Bodies that overlapped `body` when pairs were last gathered.
    pub fn contacts_of(&self, body: BodyId) -> impl Iterator<Item = BodyId> + '_ {
        self.pairs.iter().filter_map(move |pair| pair.other(body))
    }

    /// Owners of the bodies that overlapped `body` and still exist.
    pub fn contact_owners(&self, body: BodyId) -> impl Iterator<Item = ObjectRef> + '_ {
        self.contacts_of(body)
            .filter_map(|other| self.grid.body(other).map(Body::owner))
    }
}
