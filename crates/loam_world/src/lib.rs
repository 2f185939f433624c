//! # LOAM World
//!
//! Everything that touches the live world:
//! - [`BlockStore`]: the authoritative block map
//! - [`ChunkManager`]: streaming around an observer
//! - [`NetworkRelay`]: block updates to and from peers
//! - [`vegetation`]: grass and leaf rules
//! - [`persistence`]: saved chunks
//!
//! ## Frame Order
//!
//! ```text
//! update_observer -> pump_frame -> grass.update -> leaf_decay.update -> relay.drain_outbound
//! ```
//!
//! All of it runs on one thread. Only chunk generation leaves it, through
//! [`GenerationWorker`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

pub mod chunk_manager;
pub mod config;
pub mod error;
pub mod events;
pub mod persistence;
pub mod relay;
pub mod render;
pub mod store;
pub mod vegetation;
pub mod worker;

pub use chunk_manager::{ChunkManager, ChunkState, PumpBudget, WorldStats};
pub use config::{LoamConfig, RenderConfig, StreamingConfig, VegetationConfig, WorldConfig};
pub use error::{
    ConfigError, ConfigResult, PersistenceError, PersistenceResult, RelayError, RelayResult,
    WorldError, WorldResult,
};
pub use events::{BlockAction, BlockEvent, ChangeOrigin, EventHub};
pub use persistence::{ChunkRecord, ChunkStore, FileChunkStore, MemoryChunkStore, WorldSnapshot};
pub use relay::{BlockUpdateMessage, NetworkRelay, RelayStats, MAX_OUTBOUND};
pub use render::{ArenaSlotAllocator, RenderSlotAllocator};
pub use store::{BlockRecord, BlockStore};
pub use vegetation::{GrassConfig, GrassStats, GrassSystem, LeafDecay, LeafDecayConfig};
pub use worker::{GenerationReply, GenerationRequest, GenerationWorker};
