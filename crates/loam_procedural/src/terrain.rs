//! # Terrain Generator
//!
//! Column heights from layered noise, and column materialization into any
//! [`WorldMutation`].
//!
//! ## Height Model
//!
//! ```text
//! r      = roughness(x, z)               low frequency, [0, 1]
//! base   = base_height + mountain_boost * r^3
//! detail = octaves(x, z) * (detail_amp + rough_amp * r)
//! height = clamp(round(base + detail), 1, max_height)
//! ```
//!
//! The cubic keeps most of the world gentle and reserves tall peaks for the
//! rare high-roughness patches.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use loam_core::{BlockPos, BlockType, WorldMutation, WorldSeed};

use crate::noise::SimplexNoise;

/// Seed purpose for the roughness field.
const ROUGHNESS_PURPOSE: u64 = 1;
/// Seed purpose for the detail octaves.
const DETAIL_PURPOSE: u64 = 2;

/// Memo entries kept before the cache is flushed.
const HEIGHT_CACHE_LIMIT: usize = 1 << 20;

/// Tunables for height generation and column layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Water fills up to this Y in low columns.
    pub sea_level: i32,
    /// Height of flat, smooth terrain.
    pub base_height: i32,
    /// Upper clamp for column heights.
    pub max_height: i32,
    /// Extra height at full roughness.
    pub mountain_boost: f64,
    /// Frequency of the roughness field.
    pub roughness_scale: f64,
    /// Base frequency of the detail octaves.
    pub detail_scale: f64,
    /// Detail amplitude on smooth ground.
    pub detail_amplitude: f64,
    /// Additional detail amplitude at full roughness.
    pub rough_amplitude: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            sea_level: 24,
            base_height: 26,
            max_height: 96,
            mountain_boost: 48.0,
            roughness_scale: 0.003,
            detail_scale: 0.02,
            detail_amplitude: 6.0,
            rough_amplitude: 14.0,
        }
    }
}

impl TerrainConfig {
    /// Detail octave count.
    pub const OCTAVES: u32 = 4;
    /// Amplitude multiplier per octave.
    pub const PERSISTENCE: f64 = 0.4;
    /// Frequency multiplier per octave.
    pub const LACUNARITY: f64 = 2.5;

    /// True if a column of this height is covered by water.
    #[inline]
    #[must_use]
    pub const fn is_underwater(&self, height: i32) -> bool {
        height < self.sea_level
    }

    /// True if a column of this height is beach (sand-capped).
    #[inline]
    #[must_use]
    pub const fn is_beach(&self, height: i32) -> bool {
        height <= self.sea_level + 1
    }
}

/// What caps a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Dry land.
    Grass,
    /// Sand under standing water.
    Water,
}

/// Everything needed to lay out one column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Y of the top solid block.
    pub height: i32,
    /// Top block type (grass or sand).
    pub cap: BlockType,
    /// Block type between stone and the cap.
    pub filler: BlockType,
    /// Number of water blocks stacked on the cap.
    pub water_depth: i32,
}

impl ColumnSpec {
    /// Writes the column at `(x, z)`: bedrock at y=0, stone up to
    /// `height - 3`, filler up to `height - 1`, the cap at `height`, then
    /// water. Returns the number of blocks placed.
    pub fn write<W: WorldMutation + ?Sized>(&self, world: &mut W, x: i32, z: i32) -> usize {
        let mut placed = 0;
        let mut put = |y: i32, block: BlockType| {
            if world.add_block(BlockPos::new(x, y, z), block) {
                placed += 1;
            }
        };

        put(0, BlockType::Bedrock);
        for y in 1..self.height {
            let block = if y <= self.height - 3 {
                BlockType::Stone
            } else {
                self.filler
            };
            put(y, block);
        }
        if self.height > 0 {
            put(self.height, self.cap);
        }
        for y in self.height + 1..=self.height + self.water_depth {
            put(y, BlockType::Water);
        }
        placed
    }
}

/// Per-seed height field with a read-mostly memo.
pub struct TerrainGenerator {
    config: TerrainConfig,
    roughness: SimplexNoise,
    detail: SimplexNoise,
    heights: RwLock<HashMap<(i32, i32), i32>>,
}

impl TerrainGenerator {
    /// Creates a generator for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed, config: TerrainConfig) -> Self {
        Self {
            config,
            roughness: SimplexNoise::new(seed.derive(ROUGHNESS_PURPOSE)),
            detail: SimplexNoise::new(seed.derive(DETAIL_PURPOSE)),
            heights: RwLock::new(HashMap::new()),
        }
    }

    /// Layout configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Surface height of column `(x, z)`, in `[1, max_height]`.
    #[must_use]
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        if let Some(&h) = self.heights.read().get(&(x, z)) {
            return h;
        }
        let h = self.compute_height(x, z);
        let mut heights = self.heights.write();
        if heights.len() >= HEIGHT_CACHE_LIMIT {
            heights.clear();
        }
        heights.insert((x, z), h);
        h
    }

    /// Number of memoized columns.
    #[must_use]
    pub fn cached_columns(&self) -> usize {
        self.heights.read().len()
    }

    fn compute_height(&self, x: i32, z: i32) -> i32 {
        let c = &self.config;
        let (fx, fz) = (f64::from(x), f64::from(z));

        let r = self
            .roughness
            .sample01(fx * c.roughness_scale, fz * c.roughness_scale);
        let base = f64::from(c.base_height) + c.mountain_boost * r * r * r;

        let octaves = self.detail.octaved(
            fx * c.detail_scale,
            fz * c.detail_scale,
            TerrainConfig::OCTAVES,
            TerrainConfig::PERSISTENCE,
            TerrainConfig::LACUNARITY,
        );
        let detail = octaves * (c.detail_amplitude + c.rough_amplitude * r);

        ((base + detail).round() as i32).clamp(1, c.max_height.max(1))
    }

    /// Surface kind of column `(x, z)`.
    #[must_use]
    pub fn surface_at(&self, x: i32, z: i32) -> Surface {
        if self.config.is_underwater(self.height_at(x, z)) {
            Surface::Water
        } else {
            Surface::Grass
        }
    }

    /// Layout of column `(x, z)`.
    #[must_use]
    pub fn column_spec(&self, x: i32, z: i32) -> ColumnSpec {
        let height = self.height_at(x, z);
        let sandy = self.config.is_beach(height);
        let water_depth = if self.config.is_underwater(height) {
            self.config.sea_level - height
        } else {
            0
        };
        ColumnSpec {
            height,
            cap: if sandy { BlockType::Sand } else { BlockType::Grass },
            filler: if sandy { BlockType::Sand } else { BlockType::Dirt },
            water_depth,
        }
    }

    /// Writes column `(x, z)` into `world`. Returns the column height.
    pub fn generate_column<W: WorldMutation + ?Sized>(&self, world: &mut W, x: i32, z: i32) -> i32 {
        let spec = self.column_spec(x, z);
        spec.write(world, x, z);
        spec.height
    }
}
