//! # Chunk Manager
//!
//! Decides which chunks should be resident around the observer, feeds the
//! generator, and applies finished chunks to the block store.
//!
//! ## Chunk Lifecycle
//!
//! ```text
//! unloaded ──needed──> queued ──pump──> generating ──reply──> loaded
//!     ^                  │                   │                   │
//!     └──── dropped ─────┴──── dropped ──────┴───── evicted ─────┘
//! ```
//!
//! A reply is applied only if its chunk is still `generating` and it was
//! requested under the current seed epoch. Anything else is counted and
//! thrown away.
//!
//! ## Edited Chunks
//!
//! Evicting a chunk that took a `Local` or `Remote` change keeps a copy of
//! its blocks. Coming back into view restores that copy instead of
//! regenerating, and [`ChunkManager::snapshot`] includes it, so edits
//! survive until the next successful save writes them to the chunk store.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};

use loam_core::{ChunkCoord, WorldSeed};
use loam_procedural::{ChunkGenerator, GeneratedChunk, GenerationConfig};

use crate::config::StreamingConfig;
use crate::error::{PersistenceResult, WorldError, WorldResult};
use crate::events::ChangeOrigin;
use crate::persistence::{ChunkRecord, ChunkStore, WorldSnapshot};
use crate::store::BlockStore;
use crate::worker::{GenerationReply, GenerationRequest, GenerationWorker};

/// Load state of a tracked chunk. Untracked chunks are unloaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkState {
    /// Waiting in the load queue.
    Queued,
    /// Dispatched to a generator.
    Generating,
    /// Blocks are in the store.
    Loaded,
}

/// How much work one pump may do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PumpBudget {
    /// Chunks dispatched at most.
    pub max_chunks: usize,
    /// Wall-clock limit, checked between chunks.
    pub time_slice: Option<Duration>,
}

impl PumpBudget {
    /// No limit at all.
    pub const UNLIMITED: Self = Self {
        max_chunks: usize::MAX,
        time_slice: None,
    };
}

/// Streaming counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks currently loaded.
    pub loaded: usize,
    /// Chunks waiting in the queue.
    pub queued: usize,
    /// Chunks being generated.
    pub generating: usize,
    /// Chunks loaded from the generator.
    pub generated: u64,
    /// Chunks loaded from the chunk store or the edited-chunk cache.
    pub restored: u64,
    /// Edited chunks held in memory.
    pub retained: usize,
    /// Chunks evicted.
    pub unloaded: u64,
    /// Generator replies thrown away.
    pub stale_discarded: u64,
    /// Chunk store reads that failed.
    pub persistence_errors: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct QueueEntry {
    dist_sq: i64,
    seq: u64,
    coord: ChunkCoord,
}

impl Ord for QueueEntry {
    // Reversed: BinaryHeap pops the nearest, oldest entry.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist_sq
            .cmp(&self.dist_sq)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

type ProgressCallback = Box<dyn FnMut(usize, usize) + Send>;

struct InitialLoad {
    pending: HashSet<ChunkCoord>,
    total: usize,
    callback: ProgressCallback,
    done: Sender<()>,
}

/// Streams chunks in and out around one observer.
pub struct ChunkManager {
    streaming: StreamingConfig,
    generation: GenerationConfig,
    bounds: Option<(ChunkCoord, ChunkCoord)>,
    seed: WorldSeed,
    epoch: u64,
    states: HashMap<ChunkCoord, ChunkState>,
    queue: BinaryHeap<QueueEntry>,
    seq: u64,
    observer: Option<ChunkCoord>,
    needed: HashSet<ChunkCoord>,
    worker: Option<GenerationWorker>,
    inline: Option<ChunkGenerator>,
    chunk_store: Option<Box<dyn ChunkStore>>,
    retained: HashMap<ChunkCoord, ChunkRecord>,
    stats: WorldStats,
    initial: Option<InitialLoad>,
}

impl ChunkManager {
    /// Creates a manager. Starts `streaming.workers` generation threads, or
    /// none to generate inline.
    ///
    /// # Errors
    ///
    /// Returns an error if worker threads cannot be started.
    pub fn new(
        seed: WorldSeed,
        generation: GenerationConfig,
        streaming: StreamingConfig,
    ) -> WorldResult<Self> {
        let worker = if streaming.workers > 0 {
            Some(GenerationWorker::spawn(streaming.workers, &generation).map_err(WorldError::Worker)?)
        } else {
            None
        };
        Ok(Self {
            bounds: generation.chunk_bounds(),
            streaming,
            generation,
            seed,
            epoch: 0,
            states: HashMap::new(),
            queue: BinaryHeap::new(),
            seq: 0,
            observer: None,
            needed: HashSet::new(),
            worker,
            inline: None,
            chunk_store: None,
            retained: HashMap::new(),
            stats: WorldStats::default(),
            initial: None,
        })
    }

    /// Overrides the chunk range the world is limited to.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Option<(ChunkCoord, ChunkCoord)>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Consults `store` for saved chunks before generating.
    #[must_use]
    pub fn with_chunk_store(mut self, store: Box<dyn ChunkStore>) -> Self {
        self.chunk_store = Some(store);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Current seed.
    #[inline]
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.seed
    }

    /// Seed epoch; bumped by every [`set_seed`](Self::set_seed).
    #[inline]
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Chunk the observer is in, once known.
    #[inline]
    #[must_use]
    pub const fn observer_chunk(&self) -> Option<ChunkCoord> {
        self.observer
    }

    /// Load state of `coord`; `None` means unloaded.
    #[must_use]
    pub fn state(&self, coord: ChunkCoord) -> Option<ChunkState> {
        self.states.get(&coord).copied()
    }

    /// True if `coord` is loaded.
    #[must_use]
    pub fn is_loaded(&self, coord: ChunkCoord) -> bool {
        self.state(coord) == Some(ChunkState::Loaded)
    }

    /// Chunks that should be resident, sorted.
    #[must_use]
    pub fn needed_chunks(&self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self.needed.iter().copied().collect();
        out.sort_unstable();
        out
    }

    /// Loaded chunks, sorted.
    #[must_use]
    pub fn loaded_chunks(&self) -> Vec<ChunkCoord> {
        let mut out: Vec<ChunkCoord> = self
            .states
            .iter()
            .filter(|(_, &state)| state == ChunkState::Loaded)
            .map(|(&coord, _)| coord)
            .collect();
        out.sort_unstable();
        out
    }

    /// True while an initial load is being tracked.
    #[must_use]
    pub const fn initial_load_active(&self) -> bool {
        self.initial.is_some()
    }

    /// Streaming counters.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        let mut stats = self.stats;
        stats.retained = self.retained.len();
        for state in self.states.values() {
            match state {
                ChunkState::Queued => stats.queued += 1,
                ChunkState::Generating => stats.generating += 1,
                ChunkState::Loaded => stats.loaded += 1,
            }
        }
        stats
    }

    /// True if `coord` lies inside the world bounds.
    #[must_use]
    pub fn in_bounds(&self, coord: ChunkCoord) -> bool {
        self.bounds.map_or(true, |(min, max)| {
            (min.x..=max.x).contains(&coord.x) && (min.z..=max.z).contains(&coord.z)
        })
    }

    // =========================================================================
    // Streaming
    // =========================================================================

    /// Moves the observer to world `(x, z)`. Recomputes the needed set when
    /// the observer chunk changes; returns whether it did.
    pub fn update_observer(&mut self, store: &mut BlockStore, world_x: f64, world_z: f64) -> bool {
        let chunk = ChunkCoord::from_world(world_x, world_z);
        if self.observer == Some(chunk) {
            return false;
        }
        self.observer = Some(chunk);
        self.recompute(store);
        true
    }

    /// Recomputes the needed set around the current observer: evicts loaded
    /// chunks that left it, forgets queued and generating ones, and queues
    /// missing ones nearest first.
    pub fn recompute(&mut self, store: &mut BlockStore) {
        let Some(center) = self.observer else {
            return;
        };
        let r = self.streaming.view_radius;
        let mut needed = HashSet::new();
        for dz in -r..=r {
            for dx in -r..=r {
                let coord = ChunkCoord::new(center.x + dx, center.z + dz);
                if dx * dx + dz * dz <= r * r && self.in_bounds(coord) {
                    needed.insert(coord);
                }
            }
        }
        self.needed = needed;

        let mut leaving: Vec<(ChunkCoord, ChunkState)> = self
            .states
            .iter()
            .filter(|(coord, _)| !self.needed.contains(*coord))
            .map(|(&coord, &state)| (coord, state))
            .collect();
        leaving.sort_unstable_by_key(|&(coord, _)| coord);
        for (coord, state) in leaving {
            self.states.remove(&coord);
            if state == ChunkState::Loaded {
                self.evict(store, coord);
            }
        }

        let mut missing: Vec<ChunkCoord> = self
            .needed
            .iter()
            .filter(|&&coord| {
                !matches!(
                    self.states.get(&coord),
                    Some(ChunkState::Generating | ChunkState::Loaded)
                )
            })
            .copied()
            .collect();
        missing.sort_unstable_by_key(|&c| (c.distance_sq(center), c.z, c.x));
        self.queue.clear();
        for coord in missing {
            self.states.insert(coord, ChunkState::Queued);
            self.seq += 1;
            self.queue.push(QueueEntry {
                dist_sq: coord.distance_sq(center),
                seq: self.seq,
                coord,
            });
        }

        let dropped: Vec<ChunkCoord> = self
            .initial
            .as_ref()
            .map(|initial| {
                initial
                    .pending
                    .iter()
                    .filter(|&&coord| !self.needed.contains(&coord))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        for coord in dropped {
            self.settle_initial(coord);
        }
        tracing::debug!(
            "Observer at chunk {}: {} needed, {} queued",
            center,
            self.needed.len(),
            self.queue.len()
        );
    }

    /// Runs one frame's worth of streaming with the regular budget, or the
    /// larger initial budget while an initial load is tracked.
    pub fn pump_frame(&mut self, store: &mut BlockStore) -> usize {
        let budget = if self.initial.is_some() {
            self.streaming.initial_budget()
        } else {
            self.streaming.pump_budget()
        };
        self.pump(store, budget)
    }

    /// Applies finished replies and dispatches queued chunks until `budget`
    /// runs out. Returns the number of chunks that became loaded.
    pub fn pump(&mut self, store: &mut BlockStore, budget: PumpBudget) -> usize {
        let start = Instant::now();
        let mut loaded = self.collect_replies(store);
        let mut dispatched = 0;
        while dispatched < budget.max_chunks {
            if budget.time_slice.is_some_and(|slice| start.elapsed() >= slice) {
                break;
            }
            let Some(entry) = self.queue.pop() else {
                break;
            };
            if self.states.get(&entry.coord) != Some(&ChunkState::Queued) {
                continue;
            }
            dispatched += 1;
            if self.dispatch(store, entry.coord) {
                loaded += 1;
            }
        }
        loaded + self.collect_replies(store)
    }

    /// Loads everything queued, waiting on the workers. Returns the number
    /// of chunks that became loaded.
    pub fn force_load_all(&mut self, store: &mut BlockStore) -> usize {
        let mut loaded = 0;
        loop {
            loaded += self.pump(store, PumpBudget::UNLIMITED);
            let Some(reply) = self.worker.as_mut().and_then(GenerationWorker::recv) else {
                break;
            };
            if self.apply_reply(store, reply) {
                loaded += 1;
            }
        }
        loaded
    }

    /// Applies a generator reply if its chunk is still wanted. Returns
    /// `false` (and counts it) for stale replies.
    pub fn apply_reply(&mut self, store: &mut BlockStore, reply: GenerationReply) -> bool {
        let GenerationReply { request, chunk } = reply;
        let wanted = request.epoch == self.epoch
            && self.states.get(&request.coord) == Some(&ChunkState::Generating);
        if !wanted {
            self.stats.stale_discarded += 1;
            tracing::debug!("Discarding stale chunk {} (epoch {})", request.coord, request.epoch);
            return false;
        }
        store.with_origin(ChangeOrigin::Generation, |s| {
            s.add_hidden(&chunk.hidden);
            s.add_batch(&chunk.exposed);
        });
        self.states.insert(request.coord, ChunkState::Loaded);
        self.stats.generated += 1;
        tracing::debug!("Loaded chunk {} ({} blocks)", request.coord, chunk.len());
        self.settle_initial(request.coord);
        true
    }

    /// Switches to `seed`: evicts every chunk, forgets queue and states,
    /// bumps the epoch and requeues around the observer.
    pub fn set_seed(&mut self, store: &mut BlockStore, seed: WorldSeed) {
        let mut evicted = 0;
        for coord in store.chunk_keys() {
            store.remove_chunk(coord);
            evicted += 1;
        }
        self.stats.unloaded += self
            .states
            .values()
            .filter(|&&state| state == ChunkState::Loaded)
            .count() as u64;
        self.states.clear();
        self.queue.clear();
        self.retained.clear();
        self.epoch += 1;
        self.seed = seed;
        self.inline = None;
        tracing::info!(
            "World seed set to {} (epoch {}, {} chunks dropped)",
            seed.value(),
            self.epoch,
            evicted
        );
        self.recompute(store);
    }

    /// Starts tracking the load of the current needed set. `callback`
    /// receives `(completed, total)` now and after every completed chunk;
    /// the receiver fires once everything is loaded or no longer needed.
    pub fn begin_initial_load(
        &mut self,
        mut callback: impl FnMut(usize, usize) + Send + 'static,
    ) -> Receiver<()> {
        let (done, finished) = bounded(1);
        let pending: HashSet<ChunkCoord> = self
            .needed
            .iter()
            .filter(|&&coord| !self.is_loaded(coord))
            .copied()
            .collect();
        let total = self.needed.len();
        callback(total - pending.len(), total);

        if pending.is_empty() {
            let _ = done.send(());
            tracing::info!("Initial load complete ({} chunks)", total);
        } else {
            self.initial = Some(InitialLoad {
                pending,
                total,
                callback: Box::new(callback),
                done,
            });
        }
        finished
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Seed and blocks of every loaded chunk, plus the kept copies of
    /// edited chunks that are not loaded. Sorted by key.
    #[must_use]
    pub fn snapshot(&self, store: &BlockStore) -> WorldSnapshot {
        let mut chunks: Vec<ChunkRecord> = self
            .loaded_chunks()
            .into_iter()
            .map(|key| ChunkRecord {
                key,
                blocks: store.chunk_blocks(key),
            })
            .collect();
        chunks.extend(
            self.retained
                .values()
                .filter(|record| !self.is_loaded(record.key))
                .cloned(),
        );
        chunks.sort_unstable_by_key(|record| record.key);
        WorldSnapshot {
            seed: self.seed,
            chunks,
        }
    }

    /// Writes a snapshot to the chunk store. Returns the number of chunks
    /// written; 0 without a store.
    ///
    /// # Errors
    ///
    /// Returns the store's error; nothing is reported as saved.
    pub fn save(&mut self, store: &BlockStore) -> PersistenceResult<usize> {
        let snapshot = self.snapshot(store);
        let Some(chunk_store) = self.chunk_store.as_mut() else {
            return Ok(0);
        };
        match chunk_store.save_world(&snapshot) {
            Ok(()) => {
                self.retained.clear();
                tracing::info!("Saved {} chunks", snapshot.chunks.len());
                Ok(snapshot.chunks.len())
            }
            Err(e) => {
                tracing::error!("World save failed: {}", e);
                Err(e)
            }
        }
    }

    /// Seed recorded by the chunk store.
    #[must_use]
    pub fn saved_seed(&self) -> Option<WorldSeed> {
        self.chunk_store.as_ref().and_then(|s| s.saved_seed())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn evict(&mut self, store: &mut BlockStore, coord: ChunkCoord) {
        if store.chunk_edited(coord) {
            let record = ChunkRecord {
                key: coord,
                blocks: store.chunk_blocks(coord),
            };
            tracing::debug!("Keeping edited chunk {} ({} blocks)", coord, record.blocks.len());
            self.retained.insert(coord, record);
        }
        let removed = store.remove_chunk(coord);
        if self.streaming.refresh_borders_on_evict {
            store.refresh_chunk_border(coord);
        }
        self.stats.unloaded += 1;
        tracing::debug!("Evicted chunk {} ({} blocks)", coord, removed);
    }

    /// Loads `coord` from the edited-chunk cache or the chunk store, or
    /// hands it to a generator. Returns `true` if it loaded immediately.
    fn dispatch(&mut self, store: &mut BlockStore, coord: ChunkCoord) -> bool {
        let kept = self.retained.get(&coord).cloned();
        if let Some(record) = kept.or_else(|| self.load_saved(coord)) {
            store.with_origin(ChangeOrigin::Generation, |s| s.add_batch(&record.blocks));
            self.states.insert(coord, ChunkState::Loaded);
            self.stats.restored += 1;
            tracing::debug!("Restored chunk {} ({} blocks)", coord, record.blocks.len());
            self.settle_initial(coord);
            return true;
        }

        self.states.insert(coord, ChunkState::Generating);
        let request = GenerationRequest {
            coord,
            seed: self.seed,
            epoch: self.epoch,
        };
        if let Some(worker) = self.worker.as_mut() {
            if worker.submit(request) {
                return false;
            }
            tracing::warn!("Generation workers are gone; generating inline");
            self.worker = None;
        }
        let chunk = self.generate_inline(coord);
        self.apply_reply(store, GenerationReply { request, chunk })
    }

    fn load_saved(&mut self, coord: ChunkCoord) -> Option<ChunkRecord> {
        let chunk_store = self.chunk_store.as_ref()?;
        if chunk_store.saved_seed() != Some(self.seed) {
            return None;
        }
        match chunk_store.load_chunk(coord) {
            Ok(record) => record,
            Err(e) => {
                self.stats.persistence_errors += 1;
                tracing::warn!("Cannot read saved chunk {}: {}; generating instead", coord, e);
                None
            }
        }
    }

    fn generate_inline(&mut self, coord: ChunkCoord) -> GeneratedChunk {
        if self.inline.as_ref().map(ChunkGenerator::seed) != Some(self.seed) {
            self.inline = Some(ChunkGenerator::new(self.seed, &self.generation));
        }
        self.inline
            .as_ref()
            .map_or_else(GeneratedChunk::default, |generator| generator.generate(coord))
    }

    fn collect_replies(&mut self, store: &mut BlockStore) -> usize {
        let mut loaded = 0;
        while let Some(reply) = self.worker.as_mut().and_then(GenerationWorker::try_recv) {
            if self.apply_reply(store, reply) {
                loaded += 1;
            }
        }
        loaded
    }

    fn settle_initial(&mut self, coord: ChunkCoord) {
        let Some(initial) = self.initial.as_mut() else {
            return;
        };
        if !initial.pending.remove(&coord) {
            return;
        }
        let completed = initial.total - initial.pending.len();
        (initial.callback)(completed, initial.total);
        if initial.pending.is_empty() {
            let _ = initial.done.send(());
            tracing::info!("Initial load complete ({} chunks)", initial.total);
            self.initial = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryChunkStore;
    use loam_core::{BlockEntry, BlockPos, BlockType};
    use loam_procedural::GenerationMode;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn inline_manager(seed: u64, radius: i32) -> ChunkManager {
        let streaming = StreamingConfig {
            view_radius: radius,
            workers: 0,
            ..StreamingConfig::default()
        };
        ChunkManager::new(WorldSeed::new(seed), GenerationConfig::default(), streaming).unwrap()
    }

    fn one_at_a_time() -> PumpBudget {
        PumpBudget {
            max_chunks: 1,
            time_slice: None,
        }
    }

    #[test]
    fn test_needed_set_is_a_disc() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(1, 2);
        assert!(manager.update_observer(&mut store, 8.0, 8.0));
        assert!(!manager.update_observer(&mut store, 9.0, 3.0), "same chunk");
        assert_eq!(manager.needed_chunks().len(), 13);
        assert_eq!(manager.stats().queued, 13);
        assert!(!manager.needed_chunks().contains(&ChunkCoord::new(2, 2)));
    }

    #[test]
    fn test_nearest_chunk_loads_first() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(1, 1);
        manager.update_observer(&mut store, 40.0, -8.0);
        assert_eq!(manager.pump(&mut store, one_at_a_time()), 1);
        assert_eq!(manager.loaded_chunks(), vec![ChunkCoord::new(2, -1)]);
        assert!(store.chunk_len(ChunkCoord::new(2, -1)) > 0);
        assert_eq!(manager.stats().queued, 4);
    }

    #[test]
    fn test_moving_away_evicts_everything() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(2, 1);
        manager.update_observer(&mut store, 0.0, 0.0);
        assert_eq!(manager.force_load_all(&mut store), 5);
        assert!(!store.is_empty());

        manager.update_observer(&mut store, 1000.0, 1000.0);
        assert!(store.is_empty(), "{} blocks left", store.len());
        assert_eq!(manager.stats().unloaded, 5);
        assert_eq!(store.visible_count(), 0);
    }

    #[test]
    fn test_stale_replies_are_discarded() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(3, 1);
        manager.update_observer(&mut store, 0.0, 0.0);
        let coord = ChunkCoord::new(0, 0);
        let chunk = GeneratedChunk {
            coord,
            exposed: vec![BlockEntry::new(BlockPos::new(0, 1, 0), BlockType::Stone)],
            hidden: Vec::new(),
        };

        // Still queued, not generating.
        let request = GenerationRequest {
            coord,
            seed: manager.seed(),
            epoch: manager.epoch(),
        };
        assert!(!manager.apply_reply(&mut store, GenerationReply { request, chunk: chunk.clone() }));

        manager.set_seed(&mut store, WorldSeed::new(4));
        let old = GenerationRequest {
            epoch: manager.epoch() - 1,
            ..request
        };
        assert!(!manager.apply_reply(&mut store, GenerationReply { request: old, chunk }));
        assert_eq!(manager.stats().stale_discarded, 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_world_bounds_limit_needed_set() {
        let mut store = BlockStore::new();
        let generation = GenerationConfig {
            mode: GenerationMode::RiverMap,
            river: loam_procedural::RiverConfig {
                half_size: 16,
                ..Default::default()
            },
            ..GenerationConfig::default()
        };
        let streaming = StreamingConfig {
            view_radius: 3,
            workers: 0,
            ..StreamingConfig::default()
        };
        let mut manager = ChunkManager::new(WorldSeed::new(5), generation, streaming).unwrap();
        manager.update_observer(&mut store, 0.0, 0.0);
        assert_eq!(
            manager.needed_chunks(),
            vec![
                ChunkCoord::new(-1, -1),
                ChunkCoord::new(-1, 0),
                ChunkCoord::new(0, -1),
                ChunkCoord::new(0, 0)
            ]
        );
    }

    #[test]
    fn test_saved_chunk_bypasses_generation() {
        let seed = WorldSeed::new(6);
        let mut saved = MemoryChunkStore::new();
        saved.insert(
            seed,
            ChunkRecord {
                key: ChunkCoord::new(0, 0),
                blocks: vec![BlockEntry::new(BlockPos::new(3, 9, 3), BlockType::Planks)],
            },
        );

        let mut store = BlockStore::new();
        let mut manager = inline_manager(6, 1).with_chunk_store(Box::new(saved));
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);

        assert_eq!(
            store.chunk_blocks(ChunkCoord::new(0, 0)),
            vec![BlockEntry::new(BlockPos::new(3, 9, 3), BlockType::Planks)]
        );
        let stats = manager.stats();
        assert_eq!(stats.restored, 1);
        assert_eq!(stats.generated, 4);
    }

    #[test]
    fn test_unreadable_store_falls_back_to_generation() {
        let mut saved = MemoryChunkStore::new();
        saved.insert(
            WorldSeed::new(7),
            ChunkRecord {
                key: ChunkCoord::new(9, 9),
                blocks: Vec::new(),
            },
        );
        saved.fail_loads(true);

        let mut store = BlockStore::new();
        let mut manager = inline_manager(7, 1).with_chunk_store(Box::new(saved));
        manager.update_observer(&mut store, 0.0, 0.0);
        assert_eq!(manager.force_load_all(&mut store), 5);
        let stats = manager.stats();
        assert_eq!(stats.persistence_errors, 5);
        assert_eq!(stats.generated, 5);
    }

    #[test]
    fn test_initial_load_reports_progress() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(8, 1);
        manager.update_observer(&mut store, 0.0, 0.0);

        let progress = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&progress);
        let done = manager.begin_initial_load(move |completed, total| sink.lock().push((completed, total)));
        assert!(done.try_recv().is_err());
        assert!(manager.initial_load_active());

        while done.try_recv().is_err() {
            manager.pump_frame(&mut store);
        }
        assert!(!manager.initial_load_active());

        let seen = progress.lock().clone();
        println!("progress: {seen:?}");
        assert_eq!(seen.first(), Some(&(0, 5)));
        assert_eq!(seen.last(), Some(&(5, 5)));
        assert!(seen.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_initial_load_with_nothing_pending_fires_at_once() {
        let mut manager = inline_manager(8, 1);
        let done = manager.begin_initial_load(|_, _| {});
        assert!(done.try_recv().is_ok());
    }

    #[test]
    fn test_set_seed_regenerates() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(9, 1);
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);
        manager.set_seed(&mut store, WorldSeed::new(10));
        assert!(store.is_empty());
        assert_eq!(manager.stats().queued, 5);
        manager.force_load_all(&mut store);

        let mut fresh_store = BlockStore::new();
        let mut fresh = inline_manager(10, 1);
        fresh.update_observer(&mut fresh_store, 0.0, 0.0);
        fresh.force_load_all(&mut fresh_store);

        for coord in fresh.loaded_chunks() {
            assert_eq!(store.chunk_blocks(coord), fresh_store.chunk_blocks(coord), "chunk {coord}");
        }
    }

    #[test]
    fn test_save_writes_loaded_chunks() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(11, 1).with_chunk_store(Box::new(MemoryChunkStore::new()));
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);
        store.add(BlockPos::new(0, 200, 0), BlockType::Glass);

        let snapshot = manager.snapshot(&store);
        assert_eq!(snapshot.chunks.len(), 5);
        let origin = snapshot.chunks.iter().find(|c| c.key == ChunkCoord::new(0, 0)).unwrap();
        assert!(origin.blocks.contains(&BlockEntry::new(BlockPos::new(0, 200, 0), BlockType::Glass)));

        assert_eq!(manager.save(&store).unwrap(), 5);
        assert_eq!(manager.saved_seed(), Some(WorldSeed::new(11)));
    }
    #[test]
    fn test_edits_survive_eviction() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(12, 1);
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);

        let placed = BlockPos::new(2, 200, 2);
        let broken = BlockPos::new(5, 0, 5);
        assert!(store.add(placed, BlockType::Cobblestone));
        assert!(store.remove(broken).is_some());

        manager.update_observer(&mut store, 1000.0, 1000.0);
        manager.force_load_all(&mut store);
        assert!(!store.contains(placed));
        assert_eq!(manager.stats().retained, 1);

        for _ in 0..2 {
            manager.update_observer(&mut store, 0.0, 0.0);
            manager.force_load_all(&mut store);
            assert_eq!(store.block_type(placed), Some(BlockType::Cobblestone));
            assert!(!store.contains(broken));
            manager.update_observer(&mut store, 1000.0, 1000.0);
            manager.force_load_all(&mut store);
        }
        assert_eq!(manager.stats().restored, 2);
        assert_eq!(manager.stats().retained, 1);
    }

    #[test]
    fn test_evicted_edits_reach_the_chunk_store() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(13, 1).with_chunk_store(Box::new(MemoryChunkStore::new()));
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);
        let placed = BlockPos::new(3, 180, 4);
        store.add(placed, BlockType::Planks);

        manager.update_observer(&mut store, 1000.0, 1000.0);
        manager.force_load_all(&mut store);
        let snapshot = manager.snapshot(&store);
        assert_eq!(snapshot.chunks.len(), 6);
        let origin = snapshot.chunks.iter().find(|c| c.key == ChunkCoord::new(0, 0)).unwrap();
        assert!(origin.blocks.contains(&BlockEntry::new(placed, BlockType::Planks)));

        assert_eq!(manager.save(&store).unwrap(), 6);
        assert_eq!(manager.stats().retained, 0);

        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);
        assert_eq!(store.block_type(placed), Some(BlockType::Planks));
    }

    #[test]
    fn test_set_seed_forgets_kept_edits() {
        let mut store = BlockStore::new();
        let mut manager = inline_manager(14, 1);
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);
        store.add(BlockPos::new(1, 220, 1), BlockType::Glass);
        manager.update_observer(&mut store, 1000.0, 1000.0);
        assert_eq!(manager.stats().retained, 1);

        manager.set_seed(&mut store, WorldSeed::new(15));
        assert_eq!(manager.stats().retained, 0);
        manager.update_observer(&mut store, 0.0, 0.0);
        manager.force_load_all(&mut store);
        assert!(!store.contains(BlockPos::new(1, 220, 1)));
    }
}
