//! # Deterministic RNG
//!
//! Thin wrapper over ChaCha8. The stream is fully determined by the seed it
//! was built from; nothing here reads the clock or the OS entropy pool.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::seed::WorldSeed;

/// Seeded pseudo-random source used by generation and vegetation.
#[derive(Clone, Debug)]
pub struct WorldRng {
    inner: ChaCha8Rng,
}

impl WorldRng {
    /// Creates a stream from a seed.
    #[must_use]
    pub fn new(seed: WorldSeed) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed.value()),
        }
    }

    /// Stream private to one world column under `seed`.
    #[must_use]
    pub fn for_column(seed: WorldSeed, x: i32, z: i32) -> Self {
        Self::new(seed.column(x, z))
    }

    /// Uniform float in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// Uniform float in `[lo, hi)`. Returns `lo` when the range is empty.
    #[inline]
    pub fn range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            lo
        } else {
            self.inner.gen_range(lo..hi)
        }
    }

    /// Uniform integer in `[lo, hi]` (inclusive). Returns `lo` when `hi < lo`.
    #[inline]
    pub fn range_i32(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            lo
        } else {
            self.inner.gen_range(lo..=hi)
        }
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "index() on an empty range");
        self.inner.gen_range(0..len.max(1))
    }

    /// True with probability `p` (clamped to `[0, 1]`).
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.next_f64() < p
        }
    }
}
