//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every section and field has a default,
//! so an empty file is a valid config.
//!
//! ```toml
//! [world]
//! seed = 123
//! mode = "river_map"
//!
//! [streaming]
//! view_radius = 8
//! workers = 4
//!
//! [render.capacities]
//! glass = 4096
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use loam_core::{BlockType, ChunkCoord, WorldSeed};
use loam_procedural::{GenerationConfig, GenerationMode, RiverConfig, TerrainConfig, TreeConfig};

use crate::chunk_manager::PumpBudget;
use crate::error::{ConfigError, ConfigResult};
use crate::render::ArenaSlotAllocator;
use crate::vegetation::{GrassConfig, LeafDecayConfig};

/// Largest accepted view radius, in chunks.
pub const MAX_VIEW_RADIUS: i32 = 64;

/// `[world]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed.
    pub seed: u64,
    /// Generation path.
    pub mode: GenerationMode,
    /// Optional square limit on chunk keys, `|cx|, |cz| <= radius`.
    pub radius_chunks: Option<i32>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            mode: GenerationMode::Procedural,
            radius_chunks: None,
        }
    }
}

/// `[streaming]`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Chunks within this Euclidean radius of the observer are kept loaded.
    pub view_radius: i32,
    /// Chunks dispatched per pump.
    pub max_chunks_per_pump: usize,
    /// Wall-clock budget per pump, in milliseconds.
    pub time_slice_ms: u64,
    /// Chunk cap multiplier while the initial load is running.
    pub initial_load_chunk_multiplier: usize,
    /// Time slice multiplier while the initial load is running.
    pub initial_load_time_multiplier: u32,
    /// Generation threads; 0 generates inline on the calling thread.
    pub workers: usize,
    /// Re-evaluate neighbor chunk borders after an eviction.
    pub refresh_borders_on_evict: bool,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            view_radius: 6,
            max_chunks_per_pump: 4,
            time_slice_ms: 4,
            initial_load_chunk_multiplier: 8,
            initial_load_time_multiplier: 4,
            workers: 2,
            refresh_borders_on_evict: false,
        }
    }
}

impl StreamingConfig {
    /// Budget for a regular frame.
    #[must_use]
    pub fn pump_budget(&self) -> PumpBudget {
        PumpBudget {
            max_chunks: self.max_chunks_per_pump,
            time_slice: Some(Duration::from_millis(self.time_slice_ms)),
        }
    }

    /// Budget while the initial load is in progress.
    #[must_use]
    pub fn initial_budget(&self) -> PumpBudget {
        let base = self.pump_budget();
        PumpBudget {
            max_chunks: base.max_chunks.saturating_mul(self.initial_load_chunk_multiplier.max(1)),
            time_slice: base
                .time_slice
                .map(|slice| slice.saturating_mul(self.initial_load_time_multiplier.max(1))),
        }
    }
}

/// `[render]`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Instance cap for types not listed in `capacities`.
    pub default_capacity: Option<usize>,
    /// Instance cap per block type name.
    pub capacities: HashMap<String, usize>,
}

impl RenderConfig {
    /// Capacity per type, indexed by [`BlockType::index`].
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a block type name.
    pub fn capacities(&self) -> ConfigResult<[Option<usize>; BlockType::COUNT]> {
        let mut out = [self.default_capacity; BlockType::COUNT];
        for (name, &cap) in &self.capacities {
            let block: BlockType = name
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("[render.capacities]: {e}")))?;
            out[block.index()] = Some(cap);
        }
        Ok(out)
    }

    /// Allocator honoring these capacities.
    ///
    /// # Errors
    ///
    /// Returns an error if a key is not a block type name.
    pub fn allocator(&self) -> ConfigResult<ArenaSlotAllocator> {
        Ok(ArenaSlotAllocator::with_capacities(self.capacities()?))
    }
}

/// `[vegetation]`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationConfig {
    /// `[vegetation.grass]`
    pub grass: GrassConfig,
    /// `[vegetation.leaf_decay]`
    pub leaf_decay: LeafDecayConfig,
}

/// Complete engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoamConfig {
    /// `[world]`
    pub world: WorldConfig,
    /// `[terrain]`
    pub terrain: TerrainConfig,
    /// `[trees]`
    pub trees: TreeConfig,
    /// `[river]`
    pub river: RiverConfig,
    /// `[streaming]`
    pub streaming: StreamingConfig,
    /// `[render]`
    pub render: RenderConfig,
    /// `[vegetation]`
    pub vegetation: VegetationConfig,
}

impl LoamConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed TOML or out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Seed as a [`WorldSeed`].
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        WorldSeed::new(self.world.seed)
    }

    /// Generator settings.
    #[must_use]
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            mode: self.world.mode,
            terrain: self.terrain.clone(),
            trees: self.trees.clone(),
            river: self.river.clone(),
        }
    }

    /// Inclusive chunk range combining the generation bounds and
    /// `[world] radius_chunks`. `None` when unbounded.
    #[must_use]
    pub fn chunk_bounds(&self) -> Option<(ChunkCoord, ChunkCoord)> {
        let radius = self
            .world
            .radius_chunks
            .map(|r| (ChunkCoord::new(-r, -r), ChunkCoord::new(r, r)));
        match (self.generation().chunk_bounds(), radius) {
            (Some((a_min, a_max)), Some((b_min, b_max))) => Some((
                ChunkCoord::new(a_min.x.max(b_min.x), a_min.z.max(b_min.z)),
                ChunkCoord::new(a_max.x.min(b_max.x), a_max.z.min(b_max.z)),
            )),
            (bounds, None) | (None, bounds) => bounds,
        }
    }

    /// Checks every value that would otherwise fail later.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let s = &self.streaming;
        if s.view_radius < 1 || s.view_radius > MAX_VIEW_RADIUS {
            return invalid(format!(
                "streaming.view_radius must be in 1..={MAX_VIEW_RADIUS}, got {}",
                s.view_radius
            ));
        }
        if s.max_chunks_per_pump == 0 {
            return invalid("streaming.max_chunks_per_pump must be at least 1".into());
        }
        if self.world.radius_chunks.is_some_and(|r| r < 0) {
            return invalid("world.radius_chunks must not be negative".into());
        }

        let t = &self.terrain;
        if t.max_height < 1 || t.base_height < 1 || t.sea_level < 1 {
            return invalid("terrain heights must be positive".into());
        }
        if t.sea_level >= t.max_height {
            return invalid(format!(
                "terrain.sea_level ({}) must be below terrain.max_height ({})",
                t.sea_level, t.max_height
            ));
        }

        let trees = &self.trees;
        if trees.min_trunk < 1 || trees.min_trunk > trees.max_trunk {
            return invalid(format!(
                "trees trunk range {}..={} is empty",
                trees.min_trunk, trees.max_trunk
            ));
        }

        if self.river.half_size < 1 {
            return invalid("river.half_size must be at least 1".into());
        }

        let grass = &self.vegetation.grass;
        if grass.interval_secs <= 0.0 {
            return invalid("vegetation.grass.interval_secs must be positive".into());
        }
        let decay = &self.vegetation.leaf_decay;
        if decay.min_delay < 0.0 || decay.min_delay > decay.max_delay {
            return invalid(format!(
                "vegetation.leaf_decay delay window [{}, {}] is inverted",
                decay.min_delay, decay.max_delay
            ));
        }

        let probabilities = [
            ("trees.forest_chance", trees.forest_chance),
            ("trees.fallback_chance", trees.fallback_chance),
            ("vegetation.grass.spread_chance", grass.spread_chance),
            ("vegetation.grass.revive_chance", grass.revive_chance),
        ];
        for (name, p) in probabilities {
            if !(0.0..=1.0).contains(&p) {
                return invalid(format!("{name} must be in [0, 1], got {p}"));
            }
        }

        self.render.capacities()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = LoamConfig::from_toml_str("").unwrap();
        assert_eq!(config, LoamConfig::default());
        assert_eq!(config.streaming.view_radius, 6);
        assert!(config.chunk_bounds().is_none());
    }

    #[test]
    fn test_sections_parse() {
        let text = r#"
            [world]
            seed = 123
            mode = "river_map"

            [river]
            half_size = 64

            [streaming]
            view_radius = 3
            workers = 0

            [render]
            default_capacity = 100000

            [render.capacities]
            glass = 16

            [vegetation.grass]
            spread_chance = 0.5

            [vegetation.leaf_decay]
            min_delay = 0.1
            max_delay = 0.2
        "#;
        let config = LoamConfig::from_toml_str(text).unwrap();
        assert_eq!(config.seed(), WorldSeed::new(123));
        assert_eq!(config.world.mode, GenerationMode::RiverMap);
        assert_eq!(config.streaming.workers, 0);
        assert_eq!(config.vegetation.grass.spread_chance, 0.5);
        assert_eq!(config.vegetation.grass.interval_secs, 0.75);

        let caps = config.render.capacities().unwrap();
        assert_eq!(caps[BlockType::Glass.index()], Some(16));
        assert_eq!(caps[BlockType::Stone.index()], Some(100_000));

        let (min, max) = config.chunk_bounds().unwrap();
        assert_eq!((min, max), (ChunkCoord::new(-4, -4), ChunkCoord::new(3, 3)));
    }

    #[test]
    fn test_radius_intersects_map_bounds() {
        let mut config = LoamConfig::default();
        config.world.radius_chunks = Some(2);
        assert_eq!(
            config.chunk_bounds(),
            Some((ChunkCoord::new(-2, -2), ChunkCoord::new(2, 2)))
        );
        config.world.mode = GenerationMode::RiverMap;
        config.river.half_size = 16;
        assert_eq!(
            config.chunk_bounds(),
            Some((ChunkCoord::new(-1, -1), ChunkCoord::new(0, 0)))
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let cases = [
            "[streaming]\nview_radius = 0",
            "[streaming]\nview_radius = 65",
            "[vegetation.leaf_decay]\nmin_delay = 3.0\nmax_delay = 1.0",
            "[vegetation.grass]\nspread_chance = 1.5",
            "[vegetation.grass]\ninterval_secs = 0.0",
            "[render.capacities]\nobsidian = 5",
            "[terrain]\nsea_level = 200",
        ];
        for text in cases {
            let result = LoamConfig::from_toml_str(text);
            assert!(matches!(result, Err(ConfigError::Invalid(_))), "{text:?} -> {result:?}");
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            LoamConfig::from_toml_str("[streaming\nview_radius = 2"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            LoamConfig::from_toml_str("[streaming]\nview_radius = \"far\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_initial_budget_is_larger() {
        let streaming = StreamingConfig::default();
        let normal = streaming.pump_budget();
        let initial = streaming.initial_budget();
        assert_eq!(initial.max_chunks, normal.max_chunks * 8);
        assert_eq!(initial.time_slice, Some(Duration::from_millis(16)));
    }
}
