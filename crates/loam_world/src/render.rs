//! # Render Slot Allocation
//!
//! The block store asks a [`RenderSlotAllocator`] for one stable slot per
//! visible block instance. The renderer behind it is external; the store
//! only sees `place_instance`/`remove_instance`.
//!
//! [`ArenaSlotAllocator`] is the reference implementation: one
//! [`SlotArena`] per block type, reusing freed slots before growing.

use loam_core::{BlockPos, BlockType, SlotArena, SlotId};

/// Contract between the block store and the renderer.
///
/// A slot handed out by `place_instance` stays reserved until the store
/// returns it through `remove_instance` for the same type.
pub trait RenderSlotAllocator {
    /// Reserves a slot for a visible `block` at `pos`. `None` means the
    /// type's instance capacity is exhausted.
    fn place_instance(&mut self, block: BlockType, pos: BlockPos) -> Option<SlotId>;

    /// Releases `slot` of `block`.
    fn remove_instance(&mut self, block: BlockType, slot: SlotId);
}

/// Per-type slot arenas with optional capacity limits.
#[derive(Debug)]
pub struct ArenaSlotAllocator {
    arenas: Vec<SlotArena<BlockPos>>,
    exhausted_warned: [bool; BlockType::COUNT],
}

impl Default for ArenaSlotAllocator {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl ArenaSlotAllocator {
    /// Allocator with no capacity limit for any type.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::with_capacities([None; BlockType::COUNT])
    }

    /// Allocator with a capacity per type, indexed by [`BlockType::index`].
    #[must_use]
    pub fn with_capacities(capacities: [Option<usize>; BlockType::COUNT]) -> Self {
        let arenas = capacities
            .iter()
            .map(|cap| match cap {
                Some(n) => SlotArena::with_capacity(*n),
                None => SlotArena::unbounded(),
            })
            .collect();
        Self {
            arenas,
            exhausted_warned: [false; BlockType::COUNT],
        }
    }

    /// Live instances of `block`.
    #[must_use]
    pub fn allocated(&self, block: BlockType) -> usize {
        self.arenas[block.index()].allocated_count()
    }

    /// Live instances of every type.
    #[must_use]
    pub fn total_allocated(&self) -> usize {
        self.arenas.iter().map(SlotArena::allocated_count).sum()
    }

    /// Position currently drawn in `slot` of `block`.
    #[must_use]
    pub fn position_of(&self, block: BlockType, slot: SlotId) -> Option<BlockPos> {
        self.arenas[block.index()].get(slot).copied()
    }
}

impl RenderSlotAllocator for ArenaSlotAllocator {
    fn place_instance(&mut self, block: BlockType, pos: BlockPos) -> Option<SlotId> {
        let arena = &mut self.arenas[block.index()];
        let slot = arena.allocate(pos);
        if slot.is_none() && !self.exhausted_warned[block.index()] {
            self.exhausted_warned[block.index()] = true;
            tracing::warn!(
                "Render capacity exhausted for {} ({} instances); further blocks stay hidden",
                block,
                arena.allocated_count()
            );
        }
        slot
    }

    fn remove_instance(&mut self, block: BlockType, slot: SlotId) {
        if self.arenas[block.index()].free(slot).is_none() {
            tracing::debug!("Ignoring release of unallocated {} slot {:?}", block, slot);
        }
    }
}
