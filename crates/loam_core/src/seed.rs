//! # World Seeds
//!
//! Every generated block traces back to one `WorldSeed`. Independent
//! streams (terrain, trees, rivers) come from [`WorldSeed::derive`], and
//! per-column streams from [`WorldSeed::column`], so no generator ever
//! shares mutable RNG state with another.

use serde::{Deserialize, Serialize};

/// World seed for deterministic generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., tree placement).
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        Self(mix(self.0 ^ purpose.wrapping_mul(0x9E37_79B9_7F4A_7C15)))
    }

    /// Derives a seed unique to one world column.
    #[inline]
    #[must_use]
    pub const fn column(self, x: i32, z: i32) -> Self {
        let packed = ((x as u32 as u64) << 32) | (z as u32 as u64);
        Self(mix(self.0 ^ mix(packed)))
    }
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self(0xDEAD_BEEF_CAFE_BABE)
    }
}

impl From<u64> for WorldSeed {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// SplitMix64 finalizer.
#[inline]
const fn mix(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
