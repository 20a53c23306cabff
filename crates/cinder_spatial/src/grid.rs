//! # Spatial Grid
//!
//! Infinite uniform grid folded onto a fixed table of hash buckets.
//!
//! A body is registered in every cell its square bound overlaps, one slot per
//! cell. Distinct cells may alias onto the same bucket; each slot records its
//! own cell so that per-cell lookups can skip aliased neighbours. Region
//! queries visit every bucket of the region and confirm candidates with an
//! exact circle test.

use cinder_core::PoolAllocator;
use cinder_shared::{cell_hash, Rect, Vec2};
use tracing::{debug, trace, warn};

use crate::body::{Body, BodyId};
use crate::config::{ConfigError, GridConfig};
use crate::error::{SpatialError, SpatialResult};
use crate::sets::{BodyPairSet, BodySet};

/// Largest cell coordinate, in either direction, a body's bound may reach.
pub const MAX_CELL_COORD: i32 = 1 << 30;

/// Integer coordinates of one grid cell: `floor(p / cell_width)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCell {
    /// Column
    pub x: i32,
    /// Row
    pub y: i32,
}

impl GridCell {
    /// Creates a cell coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive block of cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CellRange {
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
}

impl CellRange {
    fn contains(&self, cell: GridCell) -> bool {
        cell.x >= self.x0 && cell.x <= self.x1 && cell.y >= self.y0 && cell.y <= self.y1
    }

    fn cell_count(&self) -> u64 {
        let w = i64::from(self.x1) - i64::from(self.x0) + 1;
        let h = i64::from(self.y1) - i64::from(self.y0) + 1;
        (w.max(0) as u64).saturating_mul(h.max(0) as u64)
    }

    fn cells(self) -> impl Iterator<Item = GridCell> {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| GridCell::new(x, y)))
    }
}

/// One `(cell, body)` membership.
#[derive(Debug, Clone, Copy)]
struct Slot {
    cell: GridCell,
    body: BodyId,
}

/// Nearest body crossed by a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// The body hit.
    pub body: BodyId,
    /// Entry parameter along the segment, `0.0` at the start and `1.0` at the
    /// end. `0.0` when the segment starts inside the body.
    pub t: f32,
    /// Entry point.
    pub point: Vec2,
}

/// Uniform-grid spatial hash owning a fixed-capacity arena of bodies.
pub struct SpatialGrid {
    cell_width: f32,
    buckets: Box<[Vec<Slot>]>,
    bodies: PoolAllocator<Body>,
    max_cells_per_body: usize,
    slot_count: usize,
    load_warned: bool,
}

impl SpatialGrid {
    /// Creates an empty grid.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration does not
    /// validate.
    pub fn new(config: &GridConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let buckets: Box<[Vec<Slot>]> = (0..config.buckets).map(|_| Vec::new()).collect();

        debug!(
            cell_width = config.cell_width,
            buckets = config.buckets,
            max_bodies = config.max_bodies,
            "spatial grid created"
        );

        Ok(Self {
            cell_width: config.cell_width,
            buckets,
            bodies: PoolAllocator::new(config.max_bodies),
            max_cells_per_body: config.max_cells_per_body,
            slot_count: 0,
            load_warned: false,
        })
    }

    // =========================================================================
    // GEOMETRY
    // =========================================================================

    /// Edge length of one cell.
    #[inline]
    #[must_use]
    pub const fn cell_width(&self) -> f32 {
        self.cell_width
    }

    /// Number of hash buckets.
    #[inline]
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Maximum number of bodies.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.bodies.capacity()
    }

    /// Cell containing `p`.
    ///
    /// Coordinates saturate at the `i32` range; bodies never reach that far
    /// (see [`MAX_CELL_COORD`]).
    #[must_use]
    pub fn cell_at(&self, p: Vec2) -> GridCell {
        GridCell::new(
            (p.x / self.cell_width).floor() as i32,
            (p.y / self.cell_width).floor() as i32,
        )
    }

    fn range_of(&self, rect: &Rect) -> CellRange {
        let lo = self.cell_at(rect.min());
        let hi = self.cell_at(rect.max());
        CellRange {
            x0: lo.x,
            y0: lo.y,
            x1: hi.x,
            y1: hi.y,
        }
    }

    /// Cells a body with this bound would occupy.
    ///
    /// Fails for bounds outside the addressable cells or covering more than
    /// `max_cells_per_body` cells.
    fn body_range(&self, bound: &Rect) -> SpatialResult<CellRange> {
        let limit = f64::from(MAX_CELL_COORD);
        let width = f64::from(self.cell_width);
        for corner in [bound.min(), bound.max()] {
            let cx = (f64::from(corner.x) / width).floor();
            let cy = (f64::from(corner.y) / width).floor();
            if cx.abs() > limit || cy.abs() > limit {
                return Err(SpatialError::OutOfRange {
                    x: corner.x,
                    y: corner.y,
                });
            }
        }

        let range = self.range_of(bound);
        let cells = range.cell_count();
        if cells > self.max_cells_per_body as u64 {
            return Err(SpatialError::TooLarge {
                cells,
                limit: self.max_cells_per_body,
            });
        }
        Ok(range)
    }

    fn bucket_of(&self, cell: GridCell) -> usize {
        (cell_hash(cell.x, cell.y) % self.buckets.len() as u64) as usize
    }

    fn link(&mut self, cell: GridCell, body: BodyId) {
        let bucket = self.bucket_of(cell);
        self.buckets[bucket].push(Slot { cell, body });
        self.slot_count += 1;
    }

    fn unlink(&mut self, cell: GridCell, body: BodyId) {
        let index = self.bucket_of(cell);
        let bucket = &mut self.buckets[index];
        if let Some(i) = bucket.iter().position(|s| s.cell == cell && s.body == body) {
            bucket.swap_remove(i);
            self.slot_count -= 1;
        } else {
            warn!(%body, x = cell.x, y = cell.y, "missing grid slot on unlink");
        }
    }

    fn check_point(p: Vec2) -> SpatialResult<()> {
        if p.is_finite() {
            Ok(())
        } else {
            Err(SpatialError::InvalidPosition { x: p.x, y: p.y })
        }
    }

    fn check_velocity(v: Vec2) -> SpatialResult<()> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(SpatialError::InvalidVelocity { x: v.x, y: v.y })
        }
    }

    fn check_radius(radius: f32) -> SpatialResult<()> {
        if radius.is_finite() && radius >= 0.0 {
            Ok(())
        } else {
            Err(SpatialError::InvalidRadius(radius))
        }
    }

    // =========================================================================
    // BODY LIFECYCLE
    // =========================================================================

    /// Adds a body and registers it in every cell its bound overlaps.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::InvalidPosition`] / [`SpatialError::InvalidRadius`]
    ///   for non-finite or negative geometry
    /// - [`SpatialError::InvalidVelocity`] for a non-finite velocity
    /// - [`SpatialError::OutOfRange`] / [`SpatialError::TooLarge`] for a
    ///   bound the grid cannot hold
    /// - [`SpatialError::Full`] when the arena is at capacity
    pub fn insert(&mut self, body: Body) -> SpatialResult<BodyId> {
        Self::check_point(body.pos())?;
        Self::check_radius(body.radius())?;
        Self::check_velocity(body.velocity())?;

        let range = self.body_range(&body.bound())?;
        let handle = self.bodies.allocate(body).ok_or(SpatialError::Full {
            capacity: self.bodies.capacity(),
        })?;
        let id = BodyId::from_handle(handle);

        for cell in range.cells() {
            self.link(cell, id);
        }

        if !self.load_warned && self.bodies.allocated_count() > self.buckets.len() {
            self.load_warned = true;
            warn!(
                bodies = self.bodies.allocated_count(),
                buckets = self.buckets.len(),
                "more live bodies than buckets; queries will degrade"
            );
        }

        trace!(%id, cells = range.cell_count(), "body inserted");
        Ok(id)
    }

    /// Removes a body and every slot it holds.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownBody`] for a stale or foreign handle.
    pub fn remove(&mut self, id: BodyId) -> SpatialResult<Body> {
        let range = self.range_of(&self.get(id)?.bound());
        for cell in range.cells() {
            self.unlink(cell, id);
        }
        let body = self
            .bodies
            .free(id.handle())
            .ok_or(SpatialError::UnknownBody(id))?;
        trace!(%id, "body removed");
        Ok(body)
    }

    /// Moves a body, keeping its radius.
    ///
    /// # Errors
    ///
    /// Same as [`SpatialGrid::move_and_resize`].
    pub fn move_to(&mut self, id: BodyId, pos: Vec2) -> SpatialResult<()> {
        let radius = self.get(id)?.radius();
        self.move_and_resize(id, pos, radius)
    }

    /// Moves a body and changes its radius.
    ///
    /// Only cells that leave or enter the bound are touched; a body that
    /// stays within the same cells costs no slot updates.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::UnknownBody`] for a stale handle
    /// - [`SpatialError::InvalidPosition`] / [`SpatialError::InvalidRadius`]
    ///   for bad geometry
    /// - [`SpatialError::OutOfRange`] / [`SpatialError::TooLarge`] for a
    ///   bound the grid cannot hold
    ///
    /// The body is left where it was on error.
    pub fn move_and_resize(&mut self, id: BodyId, pos: Vec2, radius: f32) -> SpatialResult<()> {
        Self::check_point(pos)?;
        Self::check_radius(radius)?;

        let mut moved = *self.get(id)?;
        let old = self.range_of(&moved.bound());
        moved.place(pos, radius);
        let new = self.body_range(&moved.bound())?;

        if let Some(body) = self.bodies.get_mut(id.handle()) {
            *body = moved;
        }
        if old == new {
            return Ok(());
        }

        for cell in old.cells() {
            if !new.contains(cell) {
                self.unlink(cell, id);
            }
        }
        for cell in new.cells() {
            if !old.contains(cell) {
                self.link(cell, id);
            }
        }
        Ok(())
    }

    /// Sets a body's velocity.
    ///
    /// # Errors
    ///
    /// [`SpatialError::UnknownBody`] or [`SpatialError::InvalidVelocity`]
    /// for a non-finite velocity.
    pub fn set_velocity(&mut self, id: BodyId, velocity: Vec2) -> SpatialResult<()> {
        Self::check_velocity(velocity)?;
        self.bodies
            .get_mut(id.handle())
            .ok_or(SpatialError::UnknownBody(id))?
            .set_velocity(velocity);
        Ok(())
    }

    /// Moves one body by `velocity * dt`.
    ///
    /// # Errors
    ///
    /// Same as [`SpatialGrid::move_to`].
    pub fn advance(&mut self, id: BodyId, dt: f32) -> SpatialResult<()> {
        let body = self.get(id)?;
        let pos = body.pos() + body.velocity() * dt;
        self.move_to(id, pos)
    }

    /// Moves every body with a non-zero velocity by `velocity * dt`.
    ///
    /// Returns how many bodies moved. A body whose step would leave the
    /// finite range stays put.
    pub fn advance_all(&mut self, dt: f32) -> usize {
        let moving: Vec<(BodyId, Vec2)> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.velocity().length_squared() > 0.0)
            .map(|(handle, body)| {
                (
                    BodyId::from_handle(handle),
                    body.pos() + body.velocity() * dt,
                )
            })
            .collect();

        let mut moved = 0;
        for (id, pos) in moving {
            match self.move_to(id, pos) {
                Ok(()) => moved += 1,
                Err(err) => debug!(%id, %err, "body not advanced"),
            }
        }
        moved
    }

    /// Removes every body.
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
        self.bodies.clear();
        self.slot_count = 0;
        self.load_warned = false;
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    /// Looks up a body.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownBody`] for a stale or foreign handle.
    pub fn get(&self, id: BodyId) -> SpatialResult<&Body> {
        self.bodies
            .get(id.handle())
            .ok_or(SpatialError::UnknownBody(id))
    }

    /// Looks up a body, `None` if the handle is stale.
    #[must_use]
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.handle())
    }

    /// Whether the handle names a body in this grid.
    #[must_use]
    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains(id.handle())
    }

    /// Iterates over all bodies.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies
            .iter()
            .map(|(handle, body)| (BodyId::from_handle(handle), body))
    }

    // =========================================================================
    // DIAGNOSTICS
    // =========================================================================

    /// Number of bodies.
    #[must_use]
    pub fn body_count(&self) -> usize {
        self.bodies.allocated_count()
    }

    /// Total `(cell, body)` memberships across all buckets.
    #[must_use]
    pub const fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of bodies registered in `cell`.
    #[must_use]
    pub fn occupancy(&self, cell: GridCell) -> usize {
        self.buckets[self.bucket_of(cell)]
            .iter()
            .filter(|slot| slot.cell == cell)
            .count()
    }

    /// Cells a body is actually registered in, sorted.
    ///
    /// Scans the whole table; meant for tests and debugging.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownBody`] for a stale handle.
    pub fn cells_of(&self, id: BodyId) -> SpatialResult<Vec<GridCell>> {
        self.get(id)?;
        let mut cells: Vec<GridCell> = self
            .buckets
            .iter()
            .flatten()
            .filter(|slot| slot.body == id)
            .map(|slot| slot.cell)
            .collect();
        cells.sort_unstable();
        Ok(cells)
    }

    /// Cells a body's bound overlaps, sorted; what [`SpatialGrid::cells_of`]
    /// must report.
    ///
    /// # Errors
    ///
    /// Returns [`SpatialError::UnknownBody`] for a stale handle.
    pub fn expected_cells_of(&self, id: BodyId) -> SpatialResult<Vec<GridCell>> {
        let range = self.range_of(&self.get(id)?.bound());
        let mut cells: Vec<GridCell> = range.cells().collect();
        cells.sort_unstable();
        Ok(cells)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Visits every slot registered in `range`.
    ///
    /// Ranges covering more cells than there are buckets are served by one
    /// pass over the whole table instead.
    fn scan(&self, range: CellRange, mut visit: impl FnMut(BodyId)) {
        if range.cell_count() >= self.buckets.len() as u64 {
            debug!(cells = range.cell_count(), "query spans the whole table");
            for slot in self.buckets.iter().flatten() {
                if range.contains(slot.cell) {
                    visit(slot.body);
                }
            }
            return;
        }

        for cell in range.cells() {
            for slot in &self.buckets[self.bucket_of(cell)] {
                if slot.cell == cell {
                    visit(slot.body);
                }
            }
        }
    }

    /// Adds every overlapping pair of bodies to `out`.
    ///
    /// Pairs are found by pairing slots within each bucket, so a pair that
    /// shares several cells is tested once and reported once. Pairs already
    /// in `out` are kept.
    ///
    /// Returns the number of exact circle tests performed.
    pub fn query_collisions(&self, out: &mut BodyPairSet) -> usize {
        let mut tests = 0;
        for bucket in self.buckets.iter() {
            for (i, a) in bucket.iter().enumerate() {
                for b in &bucket[i + 1..] {
                    if a.body == b.body || out.contains(a.body, b.body) {
                        continue;
                    }
                    let (Some(body_a), Some(body_b)) = (
                        self.bodies.get(a.body.handle()),
                        self.bodies.get(b.body.handle()),
                    ) else {
                        continue;
                    };
                    tests += 1;
                    if body_a.overlaps(body_b) {
                        out.insert(a.body, b.body);
                    }
                }
            }
        }
        trace!(tests, pairs = out.len(), "collision query");
        tests
    }

    /// Adds every body within `radius` of `center` to `out`.
    ///
    /// A body matches when `distance < radius + body.radius`.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidPosition`] / [`SpatialError::InvalidRadius`]
    /// for bad query geometry.
    pub fn query_radius(&self, center: Vec2, radius: f32, out: &mut BodySet) -> SpatialResult<()> {
        Self::check_point(center)?;
        Self::check_radius(radius)?;

        let range = self.range_of(&Rect::around(center, radius));
        self.scan(range, |id| {
            if out.contains(id) {
                return;
            }
            if let Some(body) = self.bodies.get(id.handle()) {
                let reach = radius + body.radius();
                if center.distance_squared(body.pos()) < reach * reach {
                    out.insert(id);
                }
            }
        });
        Ok(())
    }

    /// Adds every body overlapping the rectangle spanned by two corners to
    /// `out`.
    ///
    /// A body matches when its center lies inside the rectangle (edges
    /// included) or the rectangle point nearest its center is closer than
    /// its radius.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidPosition`] for non-finite corners.
    pub fn query_rect(&self, a: Vec2, b: Vec2, out: &mut BodySet) -> SpatialResult<()> {
        Self::check_point(a)?;
        Self::check_point(b)?;

        let rect = Rect::bound(a, b);
        let range = self.range_of(&rect);
        self.scan(range, |id| {
            if out.contains(id) {
                return;
            }
            if let Some(body) = self.bodies.get(id.handle()) {
                let pos = body.pos();
                let r = body.radius();
                if rect.contains(pos) || rect.closest_point(pos).distance_squared(pos) < r * r {
                    out.insert(id);
                }
            }
        });
        Ok(())
    }

    /// Walks the cells crossed by the segment `from -> to`, in order.
    ///
    /// Falls back to the whole table when the walk would visit more cells
    /// than there are buckets.
    fn walk_segment(&self, from: Vec2, to: Vec2, mut visit: impl FnMut(BodyId)) {
        let start = self.cell_at(from);
        let end = self.cell_at(to);
        let mut remaining_x = (i64::from(end.x) - i64::from(start.x)).unsigned_abs();
        let mut remaining_y = (i64::from(end.y) - i64::from(start.y)).unsigned_abs();

        if remaining_x.saturating_add(remaining_y) >= self.buckets.len() as u64 {
            debug!("segment spans the whole table");
            for slot in self.buckets.iter().flatten() {
                visit(slot.body);
            }
            return;
        }

        let d = to - from;
        let w = self.cell_width;
        let step_x = if end.x > start.x { 1 } else { -1 };
        let step_y = if end.y > start.y { 1 } else { -1 };

        // Segment parameter at which the next column / row boundary is crossed.
        let mut t_max_x = if d.x > 0.0 {
            ((start.x as f32 + 1.0) * w - from.x) / d.x
        } else if d.x < 0.0 {
            (start.x as f32 * w - from.x) / d.x
        } else {
            f32::INFINITY
        };
        let mut t_max_y = if d.y > 0.0 {
            ((start.y as f32 + 1.0) * w - from.y) / d.y
        } else if d.y < 0.0 {
            (start.y as f32 * w - from.y) / d.y
        } else {
            f32::INFINITY
        };
        let t_delta_x = if d.x == 0.0 { f32::INFINITY } else { w / d.x.abs() };
        let t_delta_y = if d.y == 0.0 { f32::INFINITY } else { w / d.y.abs() };

        let mut cell = start;
        loop {
            for slot in &self.buckets[self.bucket_of(cell)] {
                if slot.cell == cell {
                    visit(slot.body);
                }
            }

            // Step counts are fixed by the end cell so rounding can never
            // overshoot it.
            if remaining_x > 0 && (remaining_y == 0 || t_max_x < t_max_y) {
                cell.x += step_x;
                t_max_x += t_delta_x;
                remaining_x -= 1;
            } else if remaining_y > 0 {
                cell.y += step_y;
                t_max_y += t_delta_y;
                remaining_y -= 1;
            } else {
                break;
            }
        }
    }

    /// Entry parameter of the segment into a circle, if the segment passes
    /// strictly inside it.
    fn segment_entry(from: Vec2, to: Vec2, center: Vec2, radius: f32) -> Option<f32> {
        let d = to - from;
        let len2 = d.length_squared();
        let closest_t = if len2 > 0.0 {
            ((center - from).dot(d) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let closest = from + d * closest_t;
        let r2 = radius * radius;
        if closest.distance_squared(center) >= r2 {
            return None;
        }

        let f = from - center;
        let c = f.length_squared() - r2;
        if c < 0.0 || len2 == 0.0 {
            return Some(0.0);
        }
        let b = f.dot(d);
        let disc = (b * b - len2 * c).max(0.0);
        Some(((-b - disc.sqrt()) / len2).clamp(0.0, closest_t))
    }

    /// Adds every body the segment `from -> to` passes through to `out`.
    ///
    /// A body matches when the segment point nearest its center is closer
    /// than its radius; grazing the edge does not count.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidPosition`] for non-finite endpoints.
    pub fn query_ray(&self, from: Vec2, to: Vec2, out: &mut BodySet) -> SpatialResult<()> {
        Self::check_point(from)?;
        Self::check_point(to)?;

        self.walk_segment(from, to, |id| {
            if out.contains(id) {
                return;
            }
            if let Some(body) = self.bodies.get(id.handle()) {
                if Self::segment_entry(from, to, body.pos(), body.radius()).is_some() {
                    out.insert(id);
                }
            }
        });
        Ok(())
    }

    /// Nearest body the segment `from -> to` passes through.
    ///
    /// Ties on the entry parameter go to the body with the lower handle.
    ///
    /// # Errors
    ///
    /// [`SpatialError::InvalidPosition`] for non-finite endpoints.
    pub fn query_ray_first(&self, from: Vec2, to: Vec2) -> SpatialResult<Option<RayHit>> {
        Self::check_point(from)?;
        Self::check_point(to)?;

        let mut best: Option<RayHit> = None;
        self.walk_segment(from, to, |id| {
            let Some(body) = self.bodies.get(id.handle()) else {
                return;
            };
            let Some(t) = Self::segment_entry(from, to, body.pos(), body.radius()) else {
                return;
            };
            let closer = match best {
                None => true,
                Some(hit) => t < hit.t || (t == hit.t && id.to_bits() < hit.body.to_bits()),
            };
            if closer {
                best = Some(RayHit {
                    body: id,
                    t,
                    point: from + (to - from) * t,
                });
            }
        });
        Ok(best)
    }
}

impl std::fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("cell_width", &self.cell_width)
            .field("buckets", &self.buckets.len())
            .field("bodies", &self.bodies.allocated_count())
            .field("slots", &self.slot_count)
            .finish()
    }
}
