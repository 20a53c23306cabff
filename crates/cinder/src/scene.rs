//! # Scene
//!
//! Frame orchestration for one object factory and its service.
//!
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. BEGIN FRAME                                                      │
//! │    └─ Stamp frame number and dt into the service                    │
//! │                                                                     │
//! │ 2. SORT (if requested or configured)                                │
//! │    └─ Stable sort of the live list by order key                     │
//! │                                                                     │
//! │ 3. TICK                                                             │
//! │    ├─ Objects move bodies and query the grid                        │
//! │    └─ Objects spawn (visited next frame) and kill (freed in 5)      │
//! │                                                                     │
//! │ 4. ADVANCE (if configured)                                          │
//! │    └─ Bodies move by velocity * dt                                  │
//! │                                                                     │
//! │ 5. COLLECT                                                          │
//! │    └─ Count-0 objects freed; their creators remove their bodies     │
//! │                                                                     │
//! │ 6. PAIRS (if configured)                                            │
//! │    └─ Broad-phase pairs stored in the service for frame N+1         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use std::any::Any;
use std::time::Instant;

use cinder_core::{Creator, ObjectFactory, ObjectRef, ObjectResult, ObjectType, Spawn};
use cinder_shared::Random;
use cinder_spatial::SpatialGrid;
use tracing::{debug, info, warn};

use crate::config::CinderConfig;
use crate::error::CinderResult;
use crate::service::Service;

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Objects updated.
    pub ticked: usize,
    /// Objects created during the frame.
    pub created: u64,
    /// Objects freed by collect.
    pub freed: usize,
    /// Objects on the live list after collect.
    pub live: usize,
    /// Bodies moved by velocity integration.
    pub advanced: usize,
    /// Broad-phase pairs gathered at the end of the frame.
    pub pairs: usize,
    /// Wall time of the frame in microseconds.
    pub total_us: u64,
}

/// Owns the factory and the service and runs frames over them.
pub struct Scene {
    factory: ObjectFactory<Service>,
    service: Service,
    config: CinderConfig,
    frame_count: u64,
    sort_requested: bool,
    stats: FrameStatsAccumulator,
}

impl Scene {
    /// Creates an empty scene.
    ///
    /// # Errors
    ///
    /// Returns [`CinderError::Config`](crate::CinderError::Config) if the
    /// configuration does not validate.
    pub fn new(config: CinderConfig) -> CinderResult<Self> {
        config.validate()?;
        let grid = SpatialGrid::new(&config.grid).map_err(crate::ConfigError::from)?;
        let service = Service::new(grid, Random::new(config.seed));

        debug!(
            capacity = config.factory.capacity,
            seed = config.seed,
            "scene created"
        );

        Ok(Self {
            factory: ObjectFactory::new(config.factory),
            service,
            config,
            frame_count: 0,
            sort_requested: false,
            stats: FrameStatsAccumulator::new(),
        })
    }

    /// Creates a scene from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`CinderError::Config`](crate::CinderError::Config) on parse
    /// or validation failure.
    pub fn from_toml_str(source: &str) -> CinderResult<Self> {
        Self::new(CinderConfig::from_toml_str(source)?)
    }

    // =========================================================================
    // REGISTRATION & CREATION
    // =========================================================================

    /// Registers a creator for `tag`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::DuplicateCreator`](cinder_core::ObjectError::DuplicateCreator)
    /// if the tag is taken.
    pub fn add_creator(
        &mut self,
        tag: ObjectType,
        creator: impl Creator<Service> + 'static,
    ) -> CinderResult<()> {
        self.factory.add_creator(tag, creator)?;
        Ok(())
    }

    /// Registers the default creator for `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Scene::add_creator`].
    pub fn add_type<T: Spawn<Service>>(&mut self) -> CinderResult<()> {
        self.factory.add_type::<T>()?;
        Ok(())
    }

    /// Creates an object by tag; invalid handle on failure.
    pub fn create<A: Any>(&mut self, tag: ObjectType, args: A) -> ObjectRef {
        self.factory.create(&mut self.service, tag, args)
    }

    /// Creates an object by tag.
    ///
    /// # Errors
    ///
    /// Same as [`ObjectFactory::try_create`].
    pub fn try_create<A: Any>(&mut self, tag: ObjectType, args: A) -> ObjectResult<ObjectRef> {
        self.factory.try_create(&mut self.service, tag, args)
    }

    /// Creates an object by type; invalid handle on failure.
    pub fn create_type<T: Spawn<Service>>(&mut self, args: T::Args) -> ObjectRef {
        self.factory.create_type::<T>(&mut self.service, args)
    }

    /// Sorts the live list at the start of the next frame.
    pub fn request_sort(&mut self) {
        self.sort_requested = true;
    }

    // =========================================================================
    // FRAME
    // =========================================================================

    /// Runs one frame covering `dt` seconds.
    ///
    /// # Errors
    ///
    /// Propagates factory phase errors. None occur unless an object drives
    /// the factory's phases itself.
    pub fn frame(&mut self, dt: f32) -> CinderResult<FrameStats> {
        let start = Instant::now();
        let frame = self.frame_count;
        self.service.begin_frame(frame, dt);
        let created_before = self.factory.created_total();

        if self.sort_requested || self.config.sort_every_frame {
            self.factory.sort()?;
            self.sort_requested = false;
        }

        let ticked = self.factory.tick(&mut self.service)?;

        let advanced = if self.config.integrate_velocity {
            self.service.grid.advance_all(dt)
        } else {
            0
        };

        let freed = self.factory.collect(&mut self.service)?;

        let pairs = if self.config.gather_pairs {
            let service = &mut self.service;
            service.pairs.clear();
            service.grid.query_collisions(&mut service.pairs);
            service.pairs.len()
        } else {
            0
        };

        let stats = FrameStats {
            frame,
            ticked,
            created: self.factory.created_total() - created_before,
            freed,
            live: self.factory.live_count(),
            advanced,
            pairs,
            total_us: u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
        };

        self.end_frame(stats);
        Ok(stats)
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        let budget = self.config.frame_budget_us;
        self.stats.record(stats, budget);

        if budget > 0 && stats.total_us > budget {
            warn!(
                frame = stats.frame,
                total_us = stats.total_us,
                budget_us = budget,
                live = stats.live,
                "frame exceeded budget"
            );
        }
    }

    // =========================================================================
    // ACCESS
    // =========================================================================

    /// Number of frames run.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The factory.
    #[must_use]
    pub const fn factory(&self) -> &ObjectFactory<Service> {
        &self.factory
    }

    /// The factory, mutably. Handle operations (`inc`, `dec`, `kill`,
    /// `cast_mut`) go through here between frames.
    pub fn factory_mut(&mut self) -> &mut ObjectFactory<Service> {
        &mut self.factory
    }

    /// The service.
    #[must_use]
    pub const fn service(&self) -> &Service {
        &self.service
    }

    /// The service, mutably.
    pub fn service_mut(&mut self) -> &mut Service {
        &mut self.service
    }

    /// Factory and service at once.
    pub fn split(&mut self) -> (&mut ObjectFactory<Service>, &mut Service) {
        (&mut self.factory, &mut self.service)
    }

    /// Accumulated frame statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }

    /// The configuration the scene was built with.
    #[must_use]
    pub const fn config(&self) -> &CinderConfig {
        &self.config
    }
}

/// Running totals over many frames.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of frame times.
    pub total_us_sum: u64,
    /// Fastest frame.
    pub min_frame_us: u64,
    /// Slowest frame.
    pub max_frame_us: u64,
    /// Frames that exceeded the budget.
    pub frames_over_budget: u64,
    /// Objects created over all frames.
    pub created_sum: u64,
    /// Objects freed over all frames.
    pub freed_sum: u64,
    /// Largest live count seen after a collect.
    pub peak_live: usize,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            frames_recorded: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            created_sum: 0,
            freed_sum: 0,
            peak_live: 0,
        }
    }

    /// Records one frame. A `budget_us` of 0 never counts as over budget.
    pub fn record(&mut self, stats: FrameStats, budget_us: u64) {
        self.frames_recorded += 1;
        self.total_us_sum += stats.total_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.created_sum += stats.created;
        self.freed_sum += stats.freed as u64;
        self.peak_live = self.peak_live.max(stats.live);

        if budget_us > 0 && stats.total_us > budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Average frame time in milliseconds.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a one-line summary at `info`.
    pub fn log_summary(&self) {
        info!(
            frames = self.frames_recorded,
            avg_ms = self.avg_frame_ms(),
            max_us = self.max_frame_us,
            over_budget = self.frames_over_budget,
            created = self.created_sum,
            freed = self.freed_sum,
            peak_live = self.peak_live,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
