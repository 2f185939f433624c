//! # Leaf Decay
//!
//! Leaves need a trunk. When wood or leaves disappear, each face-adjacent
//! leaves block gets a check after a random delay. A check that finds no
//! wood within `search_radius` face-connected leaves removes the block,
//! which in turn schedules its own neighbors.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

use loam_core::{BlockPos, BlockType, WorldRng, WorldSeed};

use crate::events::{BlockAction, BlockEvent};
use crate::store::BlockStore;

/// Seed purpose for decay delays.
const DECAY_PURPOSE: u64 = 41;

/// Tunables for leaf decay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafDecayConfig {
    /// Shortest delay before a check, in seconds.
    pub min_delay: f64,
    /// Longest delay before a check, in seconds.
    pub max_delay: f64,
    /// Leaves hops searched for wood.
    pub search_radius: u32,
}

impl Default for LeafDecayConfig {
    fn default() -> Self {
        Self {
            min_delay: 0.5,
            max_delay: 2.5,
            search_radius: 4,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct PendingCheck {
    due: f64,
    seq: u64,
    pos: BlockPos,
}

impl PartialEq for PendingCheck {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PendingCheck {}

impl Ord for PendingCheck {
    // Reversed: BinaryHeap pops the earliest check.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for PendingCheck {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Event-driven leaf decay.
#[derive(Debug)]
pub struct LeafDecay {
    config: LeafDecayConfig,
    rng: WorldRng,
    events: Receiver<BlockEvent>,
    pending: BinaryHeap<PendingCheck>,
    scheduled: HashSet<BlockPos>,
    clock: f64,
    seq: u64,
    decayed: u64,
}

impl LeafDecay {
    /// Subscribes to `store` and starts with nothing scheduled.
    pub fn new(store: &mut BlockStore, config: LeafDecayConfig, seed: WorldSeed) -> Self {
        Self {
            config,
            rng: WorldRng::new(seed.derive(DECAY_PURPOSE)),
            events: store.subscribe(),
            pending: BinaryHeap::new(),
            scheduled: HashSet::new(),
            clock: 0.0,
            seq: 0,
            decayed: 0,
        }
    }

    /// Checks waiting to fire.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Leaves removed so far.
    #[must_use]
    pub const fn decayed(&self) -> u64 {
        self.decayed
    }

    /// Advances the decay clock by `dt` seconds and runs every check that
    /// came due. Returns the number of leaves removed.
    pub fn update(&mut self, store: &mut BlockStore, dt: f64) -> usize {
        self.clock += dt.max(0.0);
        self.drain_events(store);

        let mut removed = 0;
        while self.pending.peek().is_some_and(|check| check.due <= self.clock) {
            let Some(check) = self.pending.pop() else {
                break;
            };
            self.scheduled.remove(&check.pos);
            if store.block_type(check.pos) != Some(BlockType::Leaves) {
                continue;
            }
            if Self::is_supported(store, check.pos, self.config.search_radius) {
                continue;
            }
            if store.remove(check.pos).is_some() {
                removed += 1;
                self.decayed += 1;
            }
            self.drain_events(store);
        }
        if removed > 0 {
            tracing::debug!("Leaf decay removed {} blocks ({} pending)", removed, self.pending.len());
        }
        removed
    }

    /// Schedules a check for every face-adjacent leaves block of `pos`
    /// that is not already waiting.
    pub fn schedule_neighbors(&mut self, store: &BlockStore, pos: BlockPos) {
        for neighbor in pos.neighbors() {
            if store.block_type(neighbor) != Some(BlockType::Leaves) {
                continue;
            }
            if !self.scheduled.insert(neighbor) {
                continue;
            }
            let delay = self.rng.range_f64(self.config.min_delay, self.config.max_delay);
            self.seq += 1;
            self.pending.push(PendingCheck {
                due: self.clock + delay,
                seq: self.seq,
                pos: neighbor,
            });
        }
    }

    /// True if wood is reachable from `pos` through at most `radius`
    /// face-connected steps, moving only through leaves.
    #[must_use]
    pub fn is_supported(store: &BlockStore, pos: BlockPos, radius: u32) -> bool {
        let mut visited: HashSet<BlockPos> = HashSet::from([pos]);
        let mut frontier: VecDeque<(BlockPos, u32)> = VecDeque::from([(pos, 0)]);
        while let Some((current, hops)) = frontier.pop_front() {
            if hops >= radius {
                continue;
            }
            for neighbor in current.neighbors() {
                match store.block_type(neighbor) {
                    Some(BlockType::Wood) => return true,
                    Some(BlockType::Leaves) if visited.insert(neighbor) => {
                        frontier.push_back((neighbor, hops + 1));
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn drain_events(&mut self, store: &BlockStore) {
        while let Ok(event) = self.events.try_recv() {
            let trigger = matches!(event.block, BlockType::Wood | BlockType::Leaves);
            if event.action == BlockAction::Remove && trigger {
                self.schedule_neighbors(store, event.pos);
            }
        }
    }
}
