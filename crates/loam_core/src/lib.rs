//! # LOAM Core
//!
//! Shared vocabulary for the LOAM voxel engine:
//! - Block positions, faces and chunk keys
//! - Block types and their static render properties
//! - World seeds and the deterministic RNG
//! - The occlusion predicate
//! - Slot arenas for render handles
//!
//! ## Architecture Rules
//!
//! 1. **Same seed, same world** - nothing here reads the clock or OS entropy
//! 2. **Absence is a value** - lookups return `Option`/`bool`, never errors
//! 3. **Narrow seams** - generators and the store meet only at
//!    [`WorldMutation`] and [`BlockLookup`]

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod block;
pub mod coord;
pub mod error;
pub mod memory;
pub mod occlusion;
pub mod rng;
pub mod seed;

pub use access::{BlockLookup, WorldMutation};
pub use block::{BlockEntry, BlockProperties, BlockType};
pub use coord::{BlockPos, ChunkCoord, Face, CHUNK_SIZE, WORLD_FLOOR_Y, WORLD_LIMIT};
pub use error::{ParseError, ParseResult};
pub use memory::{SlotArena, SlotId};
pub use occlusion::{exposed_faces, face_exposed, is_exposed, occludes};
pub use rng::WorldRng;
pub use seed::WorldSeed;
