//! # Tree Placement
//!
//! Decides which columns grow a tree and stamps trees through
//! [`WorldMutation`].
//!
//! Every decision for column `(x, z)` comes from noise and a column-private
//! RNG stream, never from what is already in the world. Stamping only
//! writes into empty coordinates. Together these make the block at any
//! coordinate depend only on the trees within [`MAX_TREE_RADIUS`] columns,
//! applied in world raster order, so neighboring chunks agree on trees that
//! straddle their border.

use serde::{Deserialize, Serialize};

use loam_core::{BlockPos, BlockType, WorldMutation, WorldRng, WorldSeed};

use crate::noise::SimplexNoise;

/// Seed purpose for the forest mask.
const FOREST_PURPOSE: u64 = 10;
/// Seed purpose for the density band.
const DENSITY_PURPOSE: u64 = 11;
/// Seed purpose for per-column tree streams.
const COLUMN_PURPOSE: u64 = 12;

/// Horizontal reach of a tree's canopy from its trunk.
pub const MAX_TREE_RADIUS: i32 = 2;

/// Canopy layers relative to the trunk top, with their radius.
const CANOPY: [(i32, i32); 4] = [(-2, 2), (-1, 2), (0, 1), (1, 1)];

/// Tunables for tree placement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Frequency of the forest mask.
    pub forest_scale: f64,
    /// Mask value at or above which a column is forest.
    pub forest_threshold: f64,
    /// Frequency of the density band inside forests.
    pub density_scale: f64,
    /// Density value at or above which the forest chance applies.
    pub density_threshold: f64,
    /// Per-column chance in dense forest.
    pub forest_chance: f64,
    /// Per-column chance everywhere else.
    pub fallback_chance: f64,
    /// Shortest trunk.
    pub min_trunk: i32,
    /// Tallest trunk.
    pub max_trunk: i32,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            forest_scale: 0.008,
            forest_threshold: 0.55,
            density_scale: 0.09,
            density_threshold: 0.4,
            forest_chance: 0.07,
            fallback_chance: 0.004,
            min_trunk: 4,
            max_trunk: 7,
        }
    }
}

/// A tree decided for one column, before stamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreePlan {
    /// Trunk length in blocks.
    pub trunk_height: i32,
    /// One bit per canopy corner (4 per layer); set bits are left out.
    pub skipped_corners: u16,
}

/// Seeded tree placement.
pub struct TreePlanter {
    config: TreeConfig,
    forest: SimplexNoise,
    density: SimplexNoise,
    column_seed: WorldSeed,
}

impl TreePlanter {
    /// Creates a planter for `seed`.
    #[must_use]
    pub fn new(seed: WorldSeed, config: TreeConfig) -> Self {
        Self {
            config,
            forest: SimplexNoise::new(seed.derive(FOREST_PURPOSE)),
            density: SimplexNoise::new(seed.derive(DENSITY_PURPOSE)),
            column_seed: seed.derive(COLUMN_PURPOSE),
        }
    }

    /// Base chance that column `(x, z)` grows a tree.
    #[must_use]
    pub fn chance_at(&self, x: i32, z: i32) -> f64 {
        let c = &self.config;
        let (fx, fz) = (f64::from(x), f64::from(z));
        let mask = self.forest.sample01(fx * c.forest_scale, fz * c.forest_scale);
        if mask < c.forest_threshold {
            return c.fallback_chance;
        }
        let density = self
            .density
            .sample01(fx * c.density_scale, fz * c.density_scale);
        if density >= c.density_threshold {
            c.forest_chance
        } else {
            c.fallback_chance
        }
    }

    /// Decides whether column `(x, z)` grows a tree. `multiplier` scales the
    /// chance (biome density); the caller checks the ground is suitable.
    #[must_use]
    pub fn plan(&self, x: i32, z: i32, multiplier: f64) -> Option<TreePlan> {
        let mut rng = WorldRng::for_column(self.column_seed, x, z);
        let roll = rng.next_f64();
        if roll >= self.chance_at(x, z) * multiplier {
            return None;
        }

        let trunk_height = rng.range_i32(self.config.min_trunk, self.config.max_trunk);
        let mut skipped_corners = 0u16;
        for bit in 0..(CANOPY.len() * 4) {
            if rng.chance(0.5) {
                skipped_corners |= 1 << bit;
            }
        }
        Some(TreePlan {
            trunk_height,
            skipped_corners,
        })
    }

    /// Stamps `plan` rooted on the ground block at `ground`. Returns the
    /// number of blocks placed.
    pub fn plant<W: WorldMutation + ?Sized>(world: &mut W, ground: BlockPos, plan: TreePlan) -> usize {
        let mut placed = 0;
        let top = ground.y + plan.trunk_height;

        for y in ground.y + 1..=top {
            if world.add_block(BlockPos::new(ground.x, y, ground.z), BlockType::Wood) {
                placed += 1;
            }
        }

        for (layer, &(dy, radius)) in CANOPY.iter().enumerate() {
            let y = top + dy;
            for dz in -radius..=radius {
                for dx in -radius..=radius {
                    if dx == 0 && dz == 0 && y <= top {
                        continue;
                    }
                    if dx.abs() == radius && dz.abs() == radius {
                        let corner = usize::from(dx > 0) + 2 * usize::from(dz > 0);
                        if plan.skipped_corners & (1 << (layer * 4 + corner)) != 0 {
                            continue;
                        }
                    }
                    let pos = BlockPos::new(ground.x + dx, y, ground.z + dz);
                    if world.add_block(pos, BlockType::Leaves) {
                        placed += 1;
                    }
                }
            }
        }
        placed
    }
}
