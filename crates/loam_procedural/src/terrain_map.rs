//! # Terrain Map
//!
//! Bounded square grid of [`TerrainCell`]s used by the river generation
//! path. The map is built once per seed, rivers are carved into it, and
//! columns are then materialized straight from the cells.

use serde::{Deserialize, Serialize};

use loam_core::{BlockType, WorldMutation, WorldSeed};

use crate::biome::{Biome, BiomeClassifier};
use crate::terrain::{ColumnSpec, Surface, TerrainGenerator};

/// Tunables for the bounded river map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverConfig {
    /// The map covers `[-half_size, half_size)` on both axes.
    pub half_size: i32,
    /// Rivers routed across the map.
    pub river_count: u32,
    /// Manhattan radius of the carved swath.
    pub swath_radius: i32,
    /// Water depth cut into land by a river.
    pub river_depth: i32,
    /// Cells closer than this to the origin are never carved.
    pub safe_zone_radius: f64,
    /// Weight of the destination height in the walk score.
    pub height_weight: f64,
    /// Weight of the remaining distance in the walk score.
    pub distance_weight: f64,
    /// Weight of the random term in the walk score.
    pub jitter: f64,
}

impl Default for RiverConfig {
    fn default() -> Self {
        Self {
            half_size: 96,
            river_count: 2,
            swath_radius: 2,
            river_depth: 2,
            safe_zone_radius: 12.0,
            height_weight: 1.0,
            distance_weight: 0.8,
            jitter: 2.0,
        }
    }
}

/// One column of the terrain map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TerrainCell {
    /// World X.
    pub x: i32,
    /// World Z.
    pub z: i32,
    /// Y of the top solid block. Never negative.
    pub height: i32,
    /// Biome label.
    pub biome: Biome,
    /// What caps the column.
    pub surface: Surface,
    /// Water blocks above `height`; at least 1 when `surface` is water.
    pub water_depth: i32,
    /// Euclidean distance from the world origin.
    pub distance_to_center: f64,
}

impl TerrainCell {
    /// Layout of this cell's column.
    #[must_use]
    pub const fn column_spec(&self) -> ColumnSpec {
        let sandy = matches!(self.surface, Surface::Water) || matches!(self.biome, Biome::Beach);
        ColumnSpec {
            height: self.height,
            cap: if sandy { BlockType::Sand } else { BlockType::Grass },
            filler: if sandy { BlockType::Sand } else { BlockType::Dirt },
            water_depth: if matches!(self.surface, Surface::Water) {
                self.water_depth
            } else {
                0
            },
        }
    }

    /// True if a tree may root on this cell.
    #[inline]
    #[must_use]
    pub const fn supports_tree(&self) -> bool {
        matches!(self.surface, Surface::Grass) && !matches!(self.biome, Biome::Beach)
    }
}

/// Square grid of cells centered on the origin.
#[derive(Clone, Debug)]
pub struct TerrainMap {
    half_size: i32,
    cells: Vec<TerrainCell>,
}

impl TerrainMap {
    /// Builds the map from the height field. No rivers yet.
    #[must_use]
    pub fn generate(seed: WorldSeed, terrain: &TerrainGenerator, half_size: i32) -> Self {
        let half_size = half_size.max(1);
        let sea_level = terrain.config().sea_level;
        let classifier = BiomeClassifier::new(seed, sea_level);
        let side = (half_size * 2) as usize;

        let mut cells = Vec::with_capacity(side * side);
        for z in -half_size..half_size {
            for x in -half_size..half_size {
                let height = terrain.height_at(x, z).max(0);
                let underwater = height < sea_level;
                cells.push(TerrainCell {
                    x,
                    z,
                    height,
                    biome: classifier.classify(x, z, height),
                    surface: if underwater { Surface::Water } else { Surface::Grass },
                    water_depth: if underwater { sea_level - height } else { 0 },
                    distance_to_center: f64::from(x).hypot(f64::from(z)),
                });
            }
        }
        Self { half_size, cells }
    }

    /// Half the side length.
    #[inline]
    #[must_use]
    pub const fn half_size(&self) -> i32 {
        self.half_size
    }

    /// Side length in columns.
    #[inline]
    #[must_use]
    pub const fn side(&self) -> i32 {
        self.half_size * 2
    }

    /// True if column `(x, z)` lies on the map.
    #[inline]
    #[must_use]
    pub const fn contains(&self, x: i32, z: i32) -> bool {
        x >= -self.half_size && x < self.half_size && z >= -self.half_size && z < self.half_size
    }

    fn index(&self, x: i32, z: i32) -> Option<usize> {
        if !self.contains(x, z) {
            return None;
        }
        let side = self.side();
        Some(((z + self.half_size) * side + (x + self.half_size)) as usize)
    }

    /// Cell at column `(x, z)`.
    #[must_use]
    pub fn cell(&self, x: i32, z: i32) -> Option<&TerrainCell> {
        self.index(x, z).map(|i| &self.cells[i])
    }

    /// Mutable cell at column `(x, z)`.
    pub fn cell_mut(&mut self, x: i32, z: i32) -> Option<&mut TerrainCell> {
        self.index(x, z).map(move |i| &mut self.cells[i])
    }

    /// All cells in raster order (z outer, x inner).
    pub fn cells(&self) -> impl Iterator<Item = &TerrainCell> {
        self.cells.iter()
    }

    /// Writes column `(x, z)` from its cell. Columns off the map are empty.
    /// Returns the column height, or `None` off the map.
    pub fn materialize_column<W: WorldMutation + ?Sized>(
        &self,
        world: &mut W,
        x: i32,
        z: i32,
    ) -> Option<i32> {
        let cell = self.cell(x, z)?;
        cell.column_spec().write(world, x, z);
        Some(cell.height)
    }
}
