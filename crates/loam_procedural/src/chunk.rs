//! # Chunk Generation
//!
//! Produces the blocks of one 16x16 chunk, split into two lists:
//!
//! - **exposed**: candidates that may need a render slot. Every block on
//!   the chunk's outer columns lands here, since its outside neighbors
//!   are not known until it meets the live world.
//! - **hidden**: interior blocks whose six neighbors are all inside the
//!   chunk and occlude them. These can skip exposure checks entirely.
//!
//! Generation writes into a private scratch map covering the chunk plus a
//! [`MAX_TREE_RADIUS`] border, so trees rooted next door still stamp their
//! canopy into this chunk exactly as they do in their own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use loam_core::{is_exposed, BlockEntry, BlockPos, BlockType, ChunkCoord, WorldSeed, CHUNK_SIZE};

use crate::terrain::{TerrainConfig, TerrainGenerator};
use crate::terrain_map::{RiverConfig, TerrainMap};
use crate::trees::{TreeConfig, TreePlanter, MAX_TREE_RADIUS};
use crate::river::River;

/// Which generation path builds the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    /// Unbounded noise terrain.
    #[default]
    Procedural,
    /// Bounded terrain map with carved rivers.
    RiverMap,
}

/// Everything a generator needs besides the seed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Generation path.
    pub mode: GenerationMode,
    /// Height field and column layout.
    pub terrain: TerrainConfig,
    /// Tree placement.
    pub trees: TreeConfig,
    /// River map bounds and carving.
    pub river: RiverConfig,
}

impl GenerationConfig {
    /// Inclusive chunk range the world is limited to, or `None` when
    /// unbounded.
    #[must_use]
    pub fn chunk_bounds(&self) -> Option<(ChunkCoord, ChunkCoord)> {
        match self.mode {
            GenerationMode::Procedural => None,
            GenerationMode::RiverMap => {
                let half = self.river.half_size.max(1);
                Some((
                    ChunkCoord::from_block_pos(-half, -half),
                    ChunkCoord::from_block_pos(half - 1, half - 1),
                ))
            }
        }
    }
}

/// Output of generating one chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratedChunk {
    /// Chunk key.
    pub coord: ChunkCoord,
    /// Blocks that may be visible.
    pub exposed: Vec<BlockEntry>,
    /// Blocks known to be fully occluded.
    pub hidden: Vec<BlockEntry>,
}

impl GeneratedChunk {
    /// Total number of blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.exposed.len() + self.hidden.len()
    }

    /// True if the chunk holds no blocks (off-map chunks).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.exposed.is_empty() && self.hidden.is_empty()
    }
}

/// Terrain source for one generation path.
enum Source {
    Procedural,
    RiverMap(TerrainMap),
}

/// Chunk generator for one seed.
pub struct ChunkGenerator {
    seed: WorldSeed,
    terrain: TerrainGenerator,
    trees: TreePlanter,
    source: Source,
}

impl ChunkGenerator {
    /// Creates a generator. In river mode this builds and carves the whole
    /// terrain map up front.
    #[must_use]
    pub fn new(seed: WorldSeed, config: &GenerationConfig) -> Self {
        let terrain = TerrainGenerator::new(seed, config.terrain.clone());
        let source = match config.mode {
            GenerationMode::Procedural => Source::Procedural,
            GenerationMode::RiverMap => {
                let mut map = TerrainMap::generate(seed, &terrain, config.river.half_size);
                River::carve(&mut map, seed, &config.river);
                Source::RiverMap(map)
            }
        };
        Self {
            seed,
            terrain,
            trees: TreePlanter::new(seed, config.trees.clone()),
            source,
        }
    }

    /// Seed this generator was built for.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Height field.
    #[inline]
    #[must_use]
    pub const fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// Carved terrain map, in river mode.
    #[must_use]
    pub fn terrain_map(&self) -> Option<&TerrainMap> {
        match &self.source {
            Source::Procedural => None,
            Source::RiverMap(map) => Some(map),
        }
    }

    /// Generates a chunk at the given coordinates.
    #[must_use]
    pub fn generate(&self, coord: ChunkCoord) -> GeneratedChunk {
        let (x0, z0) = (coord.world_x(), coord.world_z());
        let (x1, z1) = (x0 + CHUNK_SIZE - 1, z0 + CHUNK_SIZE - 1);
        let blocks = self.generate_area(x0, z0, x1, z1);

        let mut exposed = Vec::new();
        let mut hidden = Vec::new();
        for (&pos, &block) in &blocks {
            let edge = pos.x == x0 || pos.x == x1 || pos.z == z0 || pos.z == z1;
            let entry = BlockEntry::new(pos, block);
            if edge || is_exposed(&blocks, pos, block) {
                exposed.push(entry);
            } else {
                hidden.push(entry);
            }
        }
        let order = |e: &BlockEntry| (e.pos.y, e.pos.z, e.pos.x);
        exposed.sort_unstable_by_key(order);
        hidden.sort_unstable_by_key(order);

        GeneratedChunk {
            coord,
            exposed,
            hidden,
        }
    }

    /// Generates every block in the inclusive column range
    /// `[min_x, max_x] x [min_z, max_z]`, trees included.
    #[must_use]
    pub fn generate_area(
        &self,
        min_x: i32,
        min_z: i32,
        max_x: i32,
        max_z: i32,
    ) -> HashMap<BlockPos, BlockType> {
        let pad = MAX_TREE_RADIUS;
        let (px0, pz0, px1, pz1) = (min_x - pad, min_z - pad, max_x + pad, max_z + pad);
        let mut scratch: HashMap<BlockPos, BlockType> = HashMap::new();

        // Pass 1: terrain for the padded region
        for z in pz0..=pz1 {
            for x in px0..=px1 {
                match &self.source {
                    Source::Procedural => {
                        self.terrain.generate_column(&mut scratch, x, z);
                    }
                    Source::RiverMap(map) => {
                        map.materialize_column(&mut scratch, x, z);
                    }
                }
            }
        }

        // Pass 2: trees, in world raster order
        for z in pz0..=pz1 {
            for x in px0..=px1 {
                if let Some((ground_y, multiplier)) = self.tree_site(x, z) {
                    if let Some(plan) = self.trees.plan(x, z, multiplier) {
                        TreePlanter::plant(&mut scratch, BlockPos::new(x, ground_y, z), plan);
                    }
                }
            }
        }

        let map = self.terrain_map();
        scratch.retain(|pos, _| {
            pos.x >= min_x
                && pos.x <= max_x
                && pos.z >= min_z
                && pos.z <= max_z
                && map.map_or(true, |m| m.contains(pos.x, pos.z))
        });
        scratch
    }

    /// Ground height and density multiplier if column `(x, z)` can root a
    /// tree.
    fn tree_site(&self, x: i32, z: i32) -> Option<(i32, f64)> {
        match &self.source {
            Source::Procedural => {
                let spec = self.terrain.column_spec(x, z);
                (spec.cap == BlockType::Grass).then_some((spec.height, 1.0))
            }
            Source::RiverMap(map) => {
                let cell = map.cell(x, z)?;
                cell.supports_tree()
                    .then(|| (cell.height, cell.biome.tree_density()))
            }
        }
    }
}
