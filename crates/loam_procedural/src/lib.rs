//! # LOAM Procedural Generation
//!
//! Deterministic world generation for reproducible worlds.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same world
//! 2. **Chunked**: World is generated in 16x16 columns of unbounded height
//! 3. **Streamable**: Chunks can be generated independently, in any order,
//!    on any thread
//!
//! ## Core Components
//!
//! - `SimplexNoise`: seeded 2D noise
//! - `TerrainGenerator`: memoized heights and column layout
//! - `TreePlanter`: forest-mask tree placement
//! - `TerrainMap` + `River`: bounded map with carved rivers
//! - `ChunkGenerator`: produces exposed/hidden block lists per chunk
//!
//! ## Example
//!
//! ```rust,ignore
//! use loam_procedural::{ChunkGenerator, GenerationConfig};
//! use loam_core::{ChunkCoord, WorldSeed};
//!
//! let gen = ChunkGenerator::new(WorldSeed::new(12345), &GenerationConfig::default());
//! let chunk = gen.generate(ChunkCoord::new(0, 0));
//! println!("{} exposed, {} hidden", chunk.exposed.len(), chunk.hidden.len());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod biome;
pub mod chunk;
pub mod noise;
pub mod river;
pub mod terrain;
pub mod terrain_map;
pub mod trees;

pub use biome::{Biome, BiomeClassifier};
pub use chunk::{ChunkGenerator, GeneratedChunk, GenerationConfig, GenerationMode};
pub use noise::SimplexNoise;
pub use river::River;
pub use terrain::{ColumnSpec, Surface, TerrainConfig, TerrainGenerator};
pub use terrain_map::{RiverConfig, TerrainCell, TerrainMap};
pub use trees::{TreeConfig, TreePlan, TreePlanter, MAX_TREE_RADIUS};
