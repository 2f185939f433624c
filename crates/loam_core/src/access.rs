//! # World Access Traits
//!
//! The two narrow seams every algorithm works through:
//!
//! - [`BlockLookup`]: read a coordinate (occlusion, vegetation, queries)
//! - [`WorldMutation`]: write a coordinate (terrain and tree generators)
//!
//! The authoritative block store implements both, and so do the
//! chunk-local scratch maps generators build privately.

use std::collections::HashMap;

use crate::block::BlockType;
use crate::coord::BlockPos;

/// Read access to block types by coordinate.
pub trait BlockLookup {
    /// The block at `pos`, or `None` if the coordinate is empty.
    fn block_at(&self, pos: BlockPos) -> Option<BlockType>;

    /// True if `pos` is occupied.
    fn is_occupied(&self, pos: BlockPos) -> bool {
        self.block_at(pos).is_some()
    }
}

/// Write access used by generators.
///
/// Generators treat this as write-once: `add_block` never overwrites, and
/// they only trust `has_block` for coordinates they wrote themselves.
pub trait WorldMutation {
    /// Places a block. Returns `false` (and changes nothing) if occupied.
    fn add_block(&mut self, pos: BlockPos, block: BlockType) -> bool;

    /// True if `pos` is occupied.
    fn has_block(&self, pos: BlockPos) -> bool;
}

impl BlockLookup for HashMap<BlockPos, BlockType> {
    #[inline]
    fn block_at(&self, pos: BlockPos) -> Option<BlockType> {
        self.get(&pos).copied()
    }
}

impl WorldMutation for HashMap<BlockPos, BlockType> {
    fn add_block(&mut self, pos: BlockPos, block: BlockType) -> bool {
        match self.entry(pos) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(block);
                true
            }
        }
    }

    #[inline]
    fn has_block(&self, pos: BlockPos) -> bool {
        self.contains_key(&pos)
    }
}
