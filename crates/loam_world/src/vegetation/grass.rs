//! # Grass Spread
//!
//! Every `interval_secs` of simulated time a fixed number of random blocks
//! is sampled from the store and run through three rules:
//!
//! | Block | Condition | Result |
//! |-------|-----------|--------|
//! | grass | block above | becomes dirt |
//! | grass | open above, `spread_chance` | one dirt in its ±1 cube with sky becomes grass |
//! | dirt  | sky, grass in its 26-neighborhood, `revive_chance` | becomes grass |

use serde::{Deserialize, Serialize};

use loam_core::{BlockPos, BlockType, WorldRng, WorldSeed};

use crate::store::BlockStore;

/// Seed purpose for the grass RNG.
const GRASS_PURPOSE: u64 = 40;

/// Tunables for the grass tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    /// Simulated seconds between ticks.
    pub interval_secs: f64,
    /// Blocks sampled per tick.
    pub samples_per_tick: usize,
    /// Chance that exposed grass spreads when sampled.
    pub spread_chance: f64,
    /// Chance that sampled dirt next to grass turns back.
    pub revive_chance: f64,
    /// Blocks above a column checked for sky access.
    pub sky_scan_height: i32,
    /// Ticks run by one `update` at most; the rest of the backlog is dropped.
    pub max_ticks_per_update: u32,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0.75,
            samples_per_tick: 64,
            spread_chance: 0.3,
            revive_chance: 0.05,
            sky_scan_height: 32,
            max_ticks_per_update: 4,
        }
    }
}

/// Running totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrassStats {
    /// Ticks run.
    pub ticks: u64,
    /// Grass smothered into dirt.
    pub smothered: u64,
    /// Dirt converted by spreading grass.
    pub spread: u64,
    /// Dirt revived next to grass.
    pub revived: u64,
}

/// Grass simulation.
#[derive(Debug)]
pub struct GrassSystem {
    config: GrassConfig,
    rng: WorldRng,
    elapsed: f64,
    stats: GrassStats,
}

impl GrassSystem {
    /// Creates a system drawing randomness from `seed`.
    #[must_use]
    pub fn new(config: GrassConfig, seed: WorldSeed) -> Self {
        Self {
            config,
            rng: WorldRng::new(seed.derive(GRASS_PURPOSE)),
            elapsed: 0.0,
            stats: GrassStats::default(),
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &GrassConfig {
        &self.config
    }

    /// Running totals.
    #[must_use]
    pub const fn stats(&self) -> GrassStats {
        self.stats
    }

    /// Advances simulated time by `dt` seconds, ticking whenever a full
    /// interval has passed. Returns the number of blocks changed.
    pub fn update(&mut self, store: &mut BlockStore, dt: f64) -> usize {
        self.elapsed += dt.max(0.0);
        let mut changed = 0;
        let mut ticks = 0;
        while self.elapsed >= self.config.interval_secs {
            self.elapsed -= self.config.interval_secs;
            if ticks == self.config.max_ticks_per_update {
                self.elapsed %= self.config.interval_secs;
                break;
            }
            changed += self.tick(store);
            ticks += 1;
        }
        changed
    }

    /// Runs one tick over `samples_per_tick` random blocks.
    pub fn tick(&mut self, store: &mut BlockStore) -> usize {
        self.stats.ticks += 1;
        let mut changed = 0;
        for _ in 0..self.config.samples_per_tick {
            let Some(pos) = store.sample_position(&mut self.rng) else {
                break;
            };
            if self.tick_block(store, pos) {
                changed += 1;
            }
        }
        changed
    }

    /// Applies the rules to the block at `pos`. Returns `true` if anything
    /// changed.
    pub fn tick_block(&mut self, store: &mut BlockStore, pos: BlockPos) -> bool {
        match store.block_type(pos) {
            Some(BlockType::Grass) => self.tick_grass(store, pos),
            Some(BlockType::Dirt) => self.tick_dirt(store, pos),
            _ => false,
        }
    }

    fn tick_grass(&mut self, store: &mut BlockStore, pos: BlockPos) -> bool {
        if store.contains(pos.above()) {
            self.stats.smothered += 1;
            return store.replace(pos, BlockType::Dirt);
        }
        if !self.rng.chance(self.config.spread_chance) {
            return false;
        }
        let view: &BlockStore = store;
        let targets: Vec<BlockPos> = cube_around(pos)
            .filter(|&n| view.block_type(n) == Some(BlockType::Dirt) && self.has_sky(view, n))
            .collect();
        if targets.is_empty() {
            return false;
        }
        let target = targets[self.rng.index(targets.len())];
        self.stats.spread += 1;
        store.replace(target, BlockType::Grass)
    }

    fn tick_dirt(&mut self, store: &mut BlockStore, pos: BlockPos) -> bool {
        if !self.has_sky(store, pos) {
            return false;
        }
        let near_grass = cube_around(pos).any(|n| store.block_type(n) == Some(BlockType::Grass));
        if !near_grass || !self.rng.chance(self.config.revive_chance) {
            return false;
        }
        self.stats.revived += 1;
        store.replace(pos, BlockType::Grass)
    }

    /// Nothing in the `sky_scan_height` blocks above `pos`.
    fn has_sky(&self, store: &BlockStore, pos: BlockPos) -> bool {
        (1..=self.config.sky_scan_height.max(1)).all(|dy| !store.contains(pos.offset(0, dy, 0)))
    }
}

/// The 26 positions of the ±1 cube around `pos`.
fn cube_around(pos: BlockPos) -> impl Iterator<Item = BlockPos> {
    (-1..=1).flat_map(move |dy| {
        (-1..=1).flat_map(move |dz| {
            (-1..=1)
                .filter(move |&dx| (dx, dy, dz) != (0, 0, 0))
                .map(move |dx| pos.offset(dx, dy, dz))
        })
    })
}
