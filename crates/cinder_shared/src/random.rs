//! Seeded deterministic random source.
//!
//! Entity logic draws from a [`Random`] carried in the application service.
//! The core never interprets it; it only passes it through.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Deterministic random number generator.
///
/// Two instances created with the same seed produce identical sequences,
/// which keeps simulation runs reproducible.
#[derive(Clone, Debug)]
pub struct Random {
    rng: ChaCha8Rng,
    seed: u64,
}

impl Random {
    /// Creates a new generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// The seed this generator was created with.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Restarts the sequence from the original seed.
    pub fn reset(&mut self) {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Next raw 32-bit value.
    #[inline]
    pub fn rand_u32(&mut self) -> u32 {
        self.rng.gen()
    }

    /// Returns true with probability `1 / n`. Always false for `n == 0`.
    #[inline]
    pub fn rand_chance(&mut self, n: u32) -> bool {
        n != 0 && self.rng.gen_range(0..n) == 0
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn unit_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Uniform float in `[lo, hi)`. Returns `lo` when the range is empty.
    #[inline]
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Uniform integer in `[lo, hi)`. Returns `lo` when the range is empty.
    #[inline]
    pub fn range_i32(&mut self, lo: i32, hi: i32) -> i32 {
        if hi > lo {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new(0x1234)
    }
}
