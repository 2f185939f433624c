//! # Engine
//!
//! One frame of the world:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ 1. STREAM      observer -> needed set -> pump queue        │
//! │ 2. VEGETATION  grass tick, leaf decay checks               │
//! │ 3. RELAY       collect local changes for peers             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Edits from the embedding (player actions) go through
//! [`Engine::place_block`] and [`Engine::break_block`] so they are relayed.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use loam_core::{BlockPos, BlockType, WorldSeed};
use loam_world::{
    BlockRecord, BlockStore, ChunkManager, ChunkStore, GrassStats, GrassSystem, LeafDecay,
    LoamConfig, NetworkRelay, PersistenceResult, RelayResult, RelayStats, WorldResult, WorldStats,
};

/// Frames slower than this are logged.
pub const SLOW_FRAME: Duration = Duration::from_millis(33);

/// What one frame did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Whole frame, in microseconds.
    pub total_us: u64,
    /// Streaming, in microseconds.
    pub stream_us: u64,
    /// Vegetation, in microseconds.
    pub vegetation_us: u64,
    /// Chunks that finished loading.
    pub chunks_loaded: usize,
    /// Blocks changed by grass.
    pub grass_changes: usize,
    /// Leaves that decayed.
    pub leaves_decayed: usize,
}

/// The world and everything that runs over it.
pub struct Engine {
    config: LoamConfig,
    store: BlockStore,
    chunks: ChunkManager,
    grass: GrassSystem,
    leaf_decay: LeafDecay,
    relay: NetworkRelay,
    frame: u64,
}

impl Engine {
    /// Builds an engine without persistence.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration or if generation workers
    /// cannot be started.
    pub fn new(config: LoamConfig) -> WorldResult<Self> {
        Self::build(config, None)
    }

    /// Builds an engine backed by `chunk_store`. A world already saved there
    /// is resumed under its own seed.
    ///
    /// # Errors
    ///
    /// Same as [`Engine::new`].
    pub fn with_chunk_store(config: LoamConfig, chunk_store: Box<dyn ChunkStore>) -> WorldResult<Self> {
        Self::build(config, Some(chunk_store))
    }

    fn build(config: LoamConfig, chunk_store: Option<Box<dyn ChunkStore>>) -> WorldResult<Self> {
        config.validate()?;
        let saved_seed = chunk_store.as_ref().and_then(|s| s.saved_seed());
        let seed = saved_seed.unwrap_or_else(|| config.seed());
        if let Some(saved) = saved_seed {
            tracing::info!("Resuming saved world (seed {})", saved.value());
        }

        let mut store = BlockStore::with_allocator(Box::new(config.render.allocator()?));
        let mut chunks = ChunkManager::new(seed, config.generation(), config.streaming.clone())?
            .with_bounds(config.chunk_bounds());
        if let Some(chunk_store) = chunk_store {
            chunks = chunks.with_chunk_store(chunk_store);
        }
        let grass = GrassSystem::new(config.vegetation.grass.clone(), seed);
        let leaf_decay = LeafDecay::new(&mut store, config.vegetation.leaf_decay.clone(), seed);
        let relay = NetworkRelay::new(&mut store);

        Ok(Self {
            config,
            store,
            chunks,
            grass,
            leaf_decay,
            relay,
            frame: 0,
        })
    }

    // =========================================================================
    // Frame
    // =========================================================================

    /// Runs one frame with the observer at world `(x, z)` and `dt` seconds
    /// of simulated time.
    pub fn update(&mut self, observer_x: f64, observer_z: f64, dt: f64) -> FrameStats {
        let start = Instant::now();
        self.chunks.update_observer(&mut self.store, observer_x, observer_z);
        let chunks_loaded = self.chunks.pump_frame(&mut self.store);
        let streamed = Instant::now();

        let grass_changes = self.grass.update(&mut self.store, dt);
        let leaves_decayed = self.leaf_decay.update(&mut self.store, dt);
        let simulated = Instant::now();

        self.relay.collect();

        let total = start.elapsed();
        let stats = FrameStats {
            frame: self.frame,
            total_us: total.as_micros() as u64,
            stream_us: streamed.duration_since(start).as_micros() as u64,
            vegetation_us: simulated.duration_since(streamed).as_micros() as u64,
            chunks_loaded,
            grass_changes,
            leaves_decayed,
        };
        if total > SLOW_FRAME {
            tracing::debug!(
                "Slow frame {}: {:?} ({} chunks loaded)",
                self.frame,
                total,
                chunks_loaded
            );
        }
        self.frame += 1;
        stats
    }

    /// Places the observer at `(x, z)` and starts tracking the load of
    /// everything it needs. See [`ChunkManager::begin_initial_load`].
    pub fn begin_initial_load(
        &mut self,
        observer_x: f64,
        observer_z: f64,
        callback: impl FnMut(usize, usize) + Send + 'static,
    ) -> Receiver<()> {
        self.chunks.update_observer(&mut self.store, observer_x, observer_z);
        self.chunks.begin_initial_load(callback)
    }

    /// Loads every queued chunk now.
    pub fn force_load_all(&mut self) -> usize {
        self.chunks.force_load_all(&mut self.store)
    }

    // =========================================================================
    // Edits
    // =========================================================================

    /// Local placement. Returns `false` if occupied.
    pub fn place_block(&mut self, pos: BlockPos, block: BlockType) -> bool {
        self.store.add(pos, block)
    }

    /// Local removal.
    pub fn break_block(&mut self, pos: BlockPos) -> Option<BlockRecord> {
        self.store.remove(pos)
    }

    /// Applies a block update received from a peer.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is malformed; it is dropped.
    pub fn apply_remote(&mut self, message: &str) -> RelayResult<bool> {
        self.relay.apply_remote(&mut self.store, message)
    }

    /// Block updates to send to peers.
    pub fn drain_outbound(&mut self) -> Vec<String> {
        self.relay.drain_outbound()
    }

    /// Saves every loaded chunk. Returns the number of chunks written.
    ///
    /// # Errors
    ///
    /// Returns the store's error; the world is untouched.
    pub fn save(&mut self) -> PersistenceResult<usize> {
        self.chunks.save(&self.store)
    }

    /// Regenerates the world from `seed`.
    pub fn set_seed(&mut self, seed: WorldSeed) {
        self.chunks.set_seed(&mut self.store, seed);
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &LoamConfig {
        &self.config
    }

    /// Current seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.chunks.seed()
    }

    /// Frames run so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// The block store.
    #[must_use]
    pub const fn store(&self) -> &BlockStore {
        &self.store
    }

    /// The chunk manager.
    #[must_use]
    pub const fn chunks(&self) -> &ChunkManager {
        &self.chunks
    }

    /// Streaming counters.
    #[must_use]
    pub fn world_stats(&self) -> WorldStats {
        self.chunks.stats()
    }

    /// Grass counters.
    #[must_use]
    pub const fn grass_stats(&self) -> GrassStats {
        self.grass.stats()
    }

    /// Leaves removed by decay so far.
    #[must_use]
    pub const fn leaves_decayed(&self) -> u64 {
        self.leaf_decay.decayed()
    }

    /// Relay counters.
    #[must_use]
    pub const fn relay_stats(&self) -> RelayStats {
        self.relay.stats()
    }
}
