//! # Block Store
//!
//! The authoritative sparse map from coordinate to [`BlockRecord`].
//!
//! ## Indexes
//!
//! ```text
//! blocks : BlockPos   -> (record, dense index)
//! dense  : Vec<BlockPos>                 O(1) uniform sampling
//! chunks : ChunkCoord -> {BlockPos}      O(chunk) eviction
//! edited : {ChunkCoord}                  touched by a Local/Remote change
//! ```
//!
//! A record holds a render slot exactly while the block is exposed and the
//! allocator had room. Every mutation re-evaluates the six face neighbors,
//! except the streaming fast paths ([`BlockStore::add_hidden`] and
//! [`BlockStore::remove_chunk`]).

use std::collections::{HashMap, HashSet};

use crossbeam_channel::Receiver;

use loam_core::{
    exposed_faces, is_exposed, occludes, BlockEntry, BlockLookup, BlockPos, BlockType, ChunkCoord,
    SlotId, WorldMutation, WorldRng, CHUNK_SIZE,
};

use crate::events::{BlockAction, BlockEvent, ChangeOrigin, EventHub};
use crate::render::{ArenaSlotAllocator, RenderSlotAllocator};

/// What the store keeps per occupied coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockRecord {
    /// Block type.
    pub block: BlockType,
    /// Render slot; `None` while hidden or when the allocator was full.
    pub slot: Option<SlotId>,
}

#[derive(Clone, Copy, Debug)]
struct Stored {
    record: BlockRecord,
    dense: usize,
}

/// Sparse block storage with exposure tracking.
pub struct BlockStore {
    blocks: HashMap<BlockPos, Stored>,
    dense: Vec<BlockPos>,
    chunks: HashMap<ChunkCoord, HashSet<BlockPos>>,
    edited: HashSet<ChunkCoord>,
    allocator: Box<dyn RenderSlotAllocator + Send>,
    events: EventHub,
    origin: ChangeOrigin,
    visible: usize,
}

impl Default for BlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockStore {
    /// Empty store backed by an unbounded [`ArenaSlotAllocator`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(Box::new(ArenaSlotAllocator::unbounded()))
    }

    /// Empty store drawing render slots from `allocator`.
    #[must_use]
    pub fn with_allocator(allocator: Box<dyn RenderSlotAllocator + Send>) -> Self {
        Self {
            blocks: HashMap::new(),
            dense: Vec::new(),
            chunks: HashMap::new(),
            edited: HashSet::new(),
            allocator,
            events: EventHub::new(),
            origin: ChangeOrigin::Local,
            visible: 0,
        }
    }

    /// Opens a change-event subscription.
    pub fn subscribe(&mut self) -> Receiver<BlockEvent> {
        self.events.subscribe()
    }

    /// Origin stamped on events right now.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> ChangeOrigin {
        self.origin
    }

    /// Runs `f` with events stamped as `origin`, then restores the previous
    /// origin.
    pub fn with_origin<R>(&mut self, origin: ChangeOrigin, f: impl FnOnce(&mut Self) -> R) -> R {
        let previous = std::mem::replace(&mut self.origin, origin);
        let result = f(self);
        self.origin = previous;
        result
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Places `block` at `pos`. Returns `false` if the coordinate is occupied
    /// or outside the world (below the floor or past [`loam_core::WORLD_LIMIT`]).
    pub fn add(&mut self, pos: BlockPos, block: BlockType) -> bool {
        if !self.insert(pos, block) {
            return false;
        }
        self.refresh(pos);
        for neighbor in pos.neighbors() {
            self.refresh(neighbor);
        }
        self.publish(pos, block, BlockAction::Add);
        true
    }

    /// Places every record, ending in the same state as calling
    /// [`add`](Self::add) on each in order. Returns the number placed.
    pub fn add_batch(&mut self, records: &[BlockEntry]) -> usize {
        let mut added: Vec<BlockEntry> = Vec::with_capacity(records.len());
        let mut batch: HashMap<BlockPos, BlockType> = HashMap::with_capacity(records.len());
        for entry in records {
            if self.insert(entry.pos, entry.block) {
                batch.insert(entry.pos, entry.block);
                added.push(*entry);
            }
        }

        for entry in &added {
            let neighbors = entry.pos.neighbors();
            let exposed = if neighbors.iter().all(|n| batch.contains_key(n)) {
                neighbors
                    .iter()
                    .any(|n| batch.get(n).map_or(true, |&t| !occludes(entry.block, t)))
            } else {
                is_exposed(&*self, entry.pos, entry.block)
            };
            if exposed {
                self.set_exposed(entry.pos, true);
            }
        }

        let mut outside: Vec<BlockPos> = added
            .iter()
            .flat_map(|entry| entry.pos.neighbors())
            .filter(|n| !batch.contains_key(n))
            .collect();
        outside.sort_unstable();
        outside.dedup();
        for pos in outside {
            self.refresh(pos);
        }

        for entry in &added {
            self.publish(entry.pos, entry.block, BlockAction::Add);
        }
        added.len()
    }

    /// Inserts records the caller knows are fully enclosed. No exposure
    /// check, no slot, no neighbor pass and no events. Occupied coordinates
    /// are skipped. Returns the number placed.
    pub fn add_hidden(&mut self, records: &[BlockEntry]) -> usize {
        records
            .iter()
            .filter(|entry| self.insert(entry.pos, entry.block))
            .count()
    }

    /// Removes the block at `pos`, returning its record as it was.
    pub fn remove(&mut self, pos: BlockPos) -> Option<BlockRecord> {
        let record = self.take(pos)?;
        for neighbor in pos.neighbors() {
            self.refresh(neighbor);
        }
        self.publish(pos, record.block, BlockAction::Remove);
        Some(record)
    }

    /// Swaps the block at `pos` for `block` through a remove and an add.
    /// Returns `false` if `pos` is empty or already holds `block`.
    pub fn replace(&mut self, pos: BlockPos, block: BlockType) -> bool {
        match self.block_type(pos) {
            Some(current) if current != block => {
                self.remove(pos);
                self.add(pos, block)
            }
            _ => false,
        }
    }

    /// Drops every block under `coord`, freeing their slots and clearing
    /// its edited flag. Neighbors in other chunks are not re-evaluated and
    /// no events are published. Returns the number of blocks removed.
    pub fn remove_chunk(&mut self, coord: ChunkCoord) -> usize {
        self.edited.remove(&coord);
        let Some(positions) = self.chunks.remove(&coord) else {
            return 0;
        };
        positions
            .iter()
            .filter(|&&pos| self.take(pos).is_some())
            .count()
    }

    /// Re-evaluates the blocks of the four adjacent chunks that touch
    /// `coord`'s edge. Returns how many changed visibility.
    pub fn refresh_chunk_border(&mut self, coord: ChunkCoord) -> usize {
        let (min_x, min_z) = (coord.world_x(), coord.world_z());
        let (max_x, max_z) = (min_x + CHUNK_SIZE - 1, min_z + CHUNK_SIZE - 1);
        let touching =
            |p: &BlockPos| p.x == min_x - 1 || p.x == max_x + 1 || p.z == min_z - 1 || p.z == max_z + 1;

        let mut border: Vec<BlockPos> = [(-1, 0), (1, 0), (0, -1), (0, 1)]
            .iter()
            .filter_map(|&(dx, dz)| self.chunks.get(&ChunkCoord::new(coord.x + dx, coord.z + dz)))
            .flat_map(|set| set.iter().copied().filter(touching))
            .collect();
        border.sort_unstable();
        border.into_iter().filter(|&pos| self.refresh(pos)).count()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True if a `Local` or `Remote` change landed in `coord` since it was
    /// last removed with [`remove_chunk`](Self::remove_chunk).
    #[must_use]
    pub fn chunk_edited(&self, coord: ChunkCoord) -> bool {
        self.edited.contains(&coord)
    }

    /// True if `pos` is occupied.
    #[inline]
    #[must_use]
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.blocks.contains_key(&pos)
    }

    /// Record at `pos`.
    #[inline]
    #[must_use]
    pub fn get(&self, pos: BlockPos) -> Option<BlockRecord> {
        self.blocks.get(&pos).map(|s| s.record)
    }

    /// Block type at `pos`.
    #[inline]
    #[must_use]
    pub fn block_type(&self, pos: BlockPos) -> Option<BlockType> {
        self.blocks.get(&pos).map(|s| s.record.block)
    }

    /// Number of stored blocks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// True if nothing is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Blocks currently holding a render slot.
    #[inline]
    #[must_use]
    pub const fn visible_count(&self) -> usize {
        self.visible
    }

    /// Snapshot of every record.
    #[must_use]
    pub fn entries(&self) -> Vec<(BlockPos, BlockRecord)> {
        self.blocks.iter().map(|(&pos, s)| (pos, s.record)).collect()
    }

    /// Number of blocks under `coord`.
    #[must_use]
    pub fn chunk_len(&self, coord: ChunkCoord) -> usize {
        self.chunks.get(&coord).map_or(0, HashSet::len)
    }

    /// Blocks under `coord`, sorted by position.
    #[must_use]
    pub fn chunk_blocks(&self, coord: ChunkCoord) -> Vec<BlockEntry> {
        let Some(set) = self.chunks.get(&coord) else {
            return Vec::new();
        };
        let mut out: Vec<BlockEntry> = set
            .iter()
            .filter_map(|&pos| self.block_type(pos).map(|block| BlockEntry::new(pos, block)))
            .collect();
        out.sort_unstable_by_key(|e| e.pos);
        out
    }

    /// Every chunk key with at least one block, sorted.
    #[must_use]
    pub fn chunk_keys(&self) -> Vec<ChunkCoord> {
        let mut keys: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Visibility of each face of the block at `pos`, ordered as
    /// [`loam_core::Face::ALL`].
    #[must_use]
    pub fn exposed_faces(&self, pos: BlockPos) -> Option<[bool; 6]> {
        let block = self.block_type(pos)?;
        Some(exposed_faces(self, pos, block))
    }

    /// Uniformly random occupied coordinate.
    pub fn sample_position(&self, rng: &mut WorldRng) -> Option<BlockPos> {
        if self.dense.is_empty() {
            return None;
        }
        self.dense.get(rng.index(self.dense.len())).copied()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn insert(&mut self, pos: BlockPos, block: BlockType) -> bool {
        if !pos.in_world() {
            return false;
        }
        match self.blocks.entry(pos) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(vacant) => {
                vacant.insert(Stored {
                    record: BlockRecord { block, slot: None },
                    dense: self.dense.len(),
                });
                self.dense.push(pos);
                self.chunks.entry(pos.chunk()).or_default().insert(pos);
                true
            }
        }
    }

    fn take(&mut self, pos: BlockPos) -> Option<BlockRecord> {
        let stored = self.blocks.remove(&pos)?;
        self.dense.swap_remove(stored.dense);
        if let Some(&moved) = self.dense.get(stored.dense) {
            if let Some(entry) = self.blocks.get_mut(&moved) {
                entry.dense = stored.dense;
            }
        }

        let key = pos.chunk();
        if let Some(set) = self.chunks.get_mut(&key) {
            set.remove(&pos);
            if set.is_empty() {
                self.chunks.remove(&key);
            }
        }

        if let Some(slot) = stored.record.slot {
            self.allocator.remove_instance(stored.record.block, slot);
            self.visible -= 1;
        }
        Some(stored.record)
    }

    /// Re-runs the exposure test for `pos`. Returns `true` if its slot
    /// changed.
    fn refresh(&mut self, pos: BlockPos) -> bool {
        let Some(block) = self.block_type(pos) else {
            return false;
        };
        let exposed = is_exposed(&*self, pos, block);
        self.set_exposed(pos, exposed)
    }

    fn set_exposed(&mut self, pos: BlockPos, exposed: bool) -> bool {
        let Some(stored) = self.blocks.get_mut(&pos) else {
            return false;
        };
        let record = &mut stored.record;
        match (exposed, record.slot) {
            (true, None) => {
                record.slot = self.allocator.place_instance(record.block, pos);
                if record.slot.is_some() {
                    self.visible += 1;
                }
                record.slot.is_some()
            }
            (false, Some(slot)) => {
                self.allocator.remove_instance(record.block, slot);
                record.slot = None;
                self.visible -= 1;
                true
            }
            _ => false,
        }
    }

    fn publish(&mut self, pos: BlockPos, block: BlockType, action: BlockAction) {
        if self.origin != ChangeOrigin::Generation {
            self.edited.insert(pos.chunk());
        }
        self.events.publish(BlockEvent {
            pos,
            block,
            action,
            origin: self.origin,
        });
    }
}

impl BlockLookup for BlockStore {
    #[inline]
    fn block_at(&self, pos: BlockPos) -> Option<BlockType> {
        self.block_type(pos)
    }
}

impl WorldMutation for BlockStore {
    fn add_block(&mut self, pos: BlockPos, block: BlockType) -> bool {
        self.add(pos, block)
    }

    #[inline]
    fn has_block(&self, pos: BlockPos) -> bool {
        self.contains(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::{Face, WorldSeed};

    fn cube(center: BlockPos, block: BlockType) -> Vec<BlockEntry> {
        let mut out = Vec::new();
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    out.push(BlockEntry::new(center.offset(dx, dy, dz), block));
                }
            }
        }
        out
    }

    #[test]
    fn test_one_record_per_coordinate() {
        let mut store = BlockStore::new();
        let pos = BlockPos::new(1, 2, 3);
        assert!(store.add(pos, BlockType::Stone));
        assert!(!store.add(pos, BlockType::Dirt));
        assert_eq!(store.len(), 1);
        assert_eq!(store.block_type(pos), Some(BlockType::Stone));
    }

    #[test]
    fn test_below_floor_is_rejected() {
        let mut store = BlockStore::new();
        assert!(!store.add(BlockPos::new(0, -1, 0), BlockType::Stone));
        assert!(store.is_empty());
    }

    #[test]
    fn test_edits_flag_their_chunk() {
        let mut store = BlockStore::new();
        let chunk = ChunkCoord::new(0, 0);
        store.with_origin(ChangeOrigin::Generation, |s| s.add(BlockPos::new(1, 1, 1), BlockType::Stone));
        assert!(!store.chunk_edited(chunk));

        store.add(BlockPos::new(2, 1, 1), BlockType::Planks);
        assert!(store.chunk_edited(chunk));
        assert!(!store.chunk_edited(ChunkCoord::new(1, 0)));

        store.with_origin(ChangeOrigin::Remote, |s| s.remove(BlockPos::new(17, 1, 1)));
        assert!(!store.chunk_edited(ChunkCoord::new(1, 0)));
        store.with_origin(ChangeOrigin::Remote, |s| s.add(BlockPos::new(17, 1, 1), BlockType::Glass));
        assert!(store.chunk_edited(ChunkCoord::new(1, 0)));

        store.remove_chunk(chunk);
        assert!(!store.chunk_edited(chunk));
    }

    #[test]
    fn test_positions_past_world_limit_are_rejected() {
        let mut store = BlockStore::new();
        let edge = loam_core::WORLD_LIMIT - 1;
        assert!(store.add(BlockPos::new(edge, 5, 0), BlockType::Stone));
        assert_eq!(store.exposed_faces(BlockPos::new(edge, 5, 0)), Some([true; 6]));

        for pos in [
            BlockPos::new(i32::MAX, 5, 0),
            BlockPos::new(i32::MIN, 5, 0),
            BlockPos::new(0, i32::MAX, 0),
            BlockPos::new(0, 5, i32::MAX),
        ] {
            assert!(!store.add(pos, BlockType::Stone), "{pos}");
            assert!(store.remove(pos).is_none());
        }
        assert_eq!(
            store.add_batch(&[BlockEntry::new(BlockPos::new(i32::MAX, 0, 0), BlockType::Dirt)]),
            0
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_then_remove_restores_state() {
        let mut store = BlockStore::new();
        store.add(BlockPos::new(0, 5, 0), BlockType::Stone);
        let visible = store.visible_count();

        let pos = BlockPos::new(1, 5, 0);
        store.add(pos, BlockType::Dirt);
        let removed = store.remove(pos).unwrap();
        assert_eq!(removed.block, BlockType::Dirt);
        assert!(removed.slot.is_some());

        assert_eq!(store.len(), 1);
        assert_eq!(store.visible_count(), visible);
        assert!(!store.contains(pos));
        assert!(store.remove(pos).is_none());
    }

    #[test]
    fn test_isolated_block_exposed_enclosed_block_hidden() {
        let mut store = BlockStore::new();
        let center = BlockPos::new(0, 10, 0);
        for entry in cube(center, BlockType::Stone) {
            store.add(entry.pos, entry.block);
        }
        assert_eq!(store.get(center).unwrap().slot, None);
        assert_eq!(store.visible_count(), 26);

        // Opening one face shows the center again.
        store.remove(center.neighbor(Face::Up));
        assert!(store.get(center).unwrap().slot.is_some());
    }

    #[test]
    fn test_two_stones_share_a_hidden_face() {
        let mut store = BlockStore::new();
        let a = BlockPos::new(5, 5, 5);
        store.add(a, BlockType::Stone);
        store.add(BlockPos::new(6, 5, 5), BlockType::Stone);

        let faces = store.exposed_faces(a).unwrap();
        for (face, exposed) in Face::ALL.iter().zip(faces) {
            assert_eq!(exposed, *face != Face::East, "{face:?}");
        }
        assert!(store.get(a).unwrap().slot.is_some());
    }

    #[test]
    fn test_transparency_and_merge_culling() {
        let mut store = BlockStore::new();
        let stone = BlockPos::new(0, 10, 0);
        for entry in cube(stone, BlockType::Glass) {
            if entry.pos != stone {
                store.add(entry.pos, entry.block);
            }
        }
        store.add(stone, BlockType::Stone);
        assert!(store.get(stone).unwrap().slot.is_some(), "glass does not hide stone");

        let mut pool = BlockStore::new();
        let center = BlockPos::new(0, 10, 0);
        pool.add_batch(&cube(center, BlockType::Water));
        assert!(pool.get(center).unwrap().slot.is_none(), "water hides water");
    }

    #[test]
    fn test_bedrock_underside_never_exposes() {
        let mut store = BlockStore::new();
        let mut layer = Vec::new();
        for z in -1..=1 {
            for x in -1..=1 {
                layer.push(BlockEntry::new(BlockPos::new(x, 0, z), BlockType::Bedrock));
                layer.push(BlockEntry::new(BlockPos::new(x, 1, z), BlockType::Stone));
            }
        }
        store.add_batch(&layer);
        assert!(store.get(BlockPos::new(0, 0, 0)).unwrap().slot.is_none());
    }

    #[test]
    fn test_batch_matches_sequential_add() {
        let mut rng = WorldRng::new(WorldSeed::new(77));
        let types = [BlockType::Stone, BlockType::Glass, BlockType::Leaves, BlockType::Water];
        let records: Vec<BlockEntry> = (0..600)
            .map(|_| {
                let pos = BlockPos::new(rng.range_i32(0, 6), rng.range_i32(0, 6), rng.range_i32(0, 6));
                BlockEntry::new(pos, types[rng.index(types.len())])
            })
            .collect();
        let seeded = [
            BlockEntry::new(BlockPos::new(7, 3, 3), BlockType::Stone),
            BlockEntry::new(BlockPos::new(3, 3, 3), BlockType::Dirt),
        ];

        let mut sequential = BlockStore::new();
        let mut batched = BlockStore::new();
        for entry in seeded {
            sequential.add(entry.pos, entry.block);
            batched.add(entry.pos, entry.block);
        }
        for entry in &records {
            sequential.add(entry.pos, entry.block);
        }
        batched.add_batch(&records);

        assert_eq!(sequential.len(), batched.len());
        assert_eq!(sequential.visible_count(), batched.visible_count());
        for (pos, record) in sequential.entries() {
            let other = batched.get(pos).unwrap();
            assert_eq!(record.block, other.block, "type at {pos}");
            assert_eq!(record.slot.is_some(), other.slot.is_some(), "visibility at {pos}");
        }
    }

    #[test]
    fn test_add_hidden_skips_occupied() {
        let mut store = BlockStore::new();
        let pos = BlockPos::new(0, 3, 0);
        store.add(pos, BlockType::Stone);
        let placed = store.add_hidden(&[
            BlockEntry::new(pos, BlockType::Dirt),
            BlockEntry::new(BlockPos::new(0, 2, 0), BlockType::Dirt),
        ]);
        assert_eq!(placed, 1);
        assert_eq!(store.block_type(pos), Some(BlockType::Stone));
        assert_eq!(store.get(BlockPos::new(0, 2, 0)).unwrap().slot, None);
    }

    #[test]
    fn test_replace_emits_remove_then_add() {
        let mut store = BlockStore::new();
        let pos = BlockPos::new(2, 2, 2);
        store.add(pos, BlockType::Grass);
        let events = store.subscribe();

        assert!(!store.replace(pos, BlockType::Grass));
        assert!(store.replace(pos, BlockType::Dirt));
        assert!(!store.replace(BlockPos::new(9, 9, 9), BlockType::Dirt));

        let seen: Vec<(BlockAction, BlockType)> = events.try_iter().map(|e| (e.action, e.block)).collect();
        assert_eq!(
            seen,
            vec![(BlockAction::Remove, BlockType::Grass), (BlockAction::Add, BlockType::Dirt)]
        );
    }

    #[test]
    fn test_events_carry_origin() {
        let mut store = BlockStore::new();
        let events = store.subscribe();
        store.add(BlockPos::new(0, 1, 0), BlockType::Stone);
        store.with_origin(ChangeOrigin::Remote, |s| s.add(BlockPos::new(1, 1, 0), BlockType::Stone));
        assert_eq!(store.origin(), ChangeOrigin::Local);

        let origins: Vec<ChangeOrigin> = events.try_iter().map(|e| e.origin).collect();
        assert_eq!(origins, vec![ChangeOrigin::Local, ChangeOrigin::Remote]);
    }

    #[test]
    fn test_remove_chunk_is_silent_and_frees_slots() {
        let mut store = BlockStore::new();
        let inside = cube(BlockPos::new(8, 4, 8), BlockType::Stone);
        store.add_batch(&inside);
        store.add(BlockPos::new(40, 4, 8), BlockType::Stone);
        let events = store.subscribe();

        let removed = store.remove_chunk(ChunkCoord::new(0, 0));
        assert_eq!(removed, 27);
        assert_eq!(store.len(), 1);
        assert_eq!(store.visible_count(), 1);
        assert_eq!(store.chunk_len(ChunkCoord::new(0, 0)), 0);
        assert_eq!(store.chunk_keys(), vec![ChunkCoord::new(2, 0)]);
        assert!(events.try_recv().is_err());
        assert_eq!(store.remove_chunk(ChunkCoord::new(0, 0)), 0);
    }

    #[test]
    fn test_border_refresh_after_eviction() {
        let mut store = BlockStore::new();
        let center = BlockPos::new(15, 5, 5);
        store.add_batch(&cube(center, BlockType::Stone));
        assert!(store.get(center).unwrap().slot.is_none());

        store.remove_chunk(ChunkCoord::new(1, 0));
        assert!(store.get(center).unwrap().slot.is_none(), "eviction does not re-evaluate");

        let changed = store.refresh_chunk_border(ChunkCoord::new(1, 0));
        assert!(changed >= 1);
        assert!(store.get(center).unwrap().slot.is_some());
    }

    #[test]
    fn test_allocator_exhaustion_stores_without_slot() {
        let mut caps = [None; BlockType::COUNT];
        caps[BlockType::Stone.index()] = Some(1);
        let mut store = BlockStore::with_allocator(Box::new(ArenaSlotAllocator::with_capacities(caps)));

        store.add(BlockPos::new(0, 1, 0), BlockType::Stone);
        store.add(BlockPos::new(5, 1, 0), BlockType::Stone);
        assert_eq!(store.len(), 2);
        assert_eq!(store.visible_count(), 1);
        assert!(store.get(BlockPos::new(5, 1, 0)).unwrap().slot.is_none());

        // The freed slot is picked up by the next re-evaluation.
        store.remove(BlockPos::new(0, 1, 0));
        store.add(BlockPos::new(5, 2, 0), BlockType::Dirt);
        assert!(store.get(BlockPos::new(5, 1, 0)).unwrap().slot.is_some());
    }

    #[test]
    fn test_sample_position_covers_all_blocks() {
        let mut store = BlockStore::new();
        let mut rng = WorldRng::new(WorldSeed::new(3));
        assert_eq!(store.sample_position(&mut rng), None);

        let positions = [BlockPos::new(0, 1, 0), BlockPos::new(4, 1, 0), BlockPos::new(8, 1, 0)];
        for pos in positions {
            store.add(pos, BlockType::Stone);
        }
        store.remove(positions[0]);

        let mut seen = HashSet::new();
        for _ in 0..300 {
            seen.insert(store.sample_position(&mut rng).unwrap());
        }
        assert_eq!(seen, HashSet::from([positions[1], positions[2]]));
    }
}
