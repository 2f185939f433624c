//! # LOAM
//!
//! A voxel world engine: a sparse block store, chunk streaming around an
//! observer, deterministic generation from a seed, occlusion-driven render
//! slots, and vegetation rules.
//!
//! ## Crates
//!
//! | Crate | Role |
//! |-------|------|
//! | `loam_core` | coordinates, block types, seeds, occlusion |
//! | `loam_procedural` | noise, terrain, trees, rivers, chunk generation |
//! | `loam_world` | store, streaming, persistence, relay, vegetation, config |
//! | `loam` | [`Engine`] frame loop |
//!
//! ## Quick Start
//!
//! ```no_run
//! use loam::{Engine, LoamConfig};
//!
//! let mut engine = Engine::new(LoamConfig::default())?;
//! for frame in 0..600 {
//!     let x = f64::from(frame) * 0.2;
//!     engine.update(x, 0.0, 1.0 / 60.0);
//! }
//! println!("{} blocks", engine.store().len());
//! # Ok::<(), loam::WorldError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod engine;

pub use engine::{Engine, FrameStats, SLOW_FRAME};

/// Shared vocabulary.
pub use loam_core as core;
/// World generation.
pub use loam_procedural as procedural;
/// Live world.
pub use loam_world as world;

pub use loam_core::{BlockPos, BlockType, ChunkCoord, WorldSeed};
pub use loam_world::{LoamConfig, WorldError, WorldResult};
