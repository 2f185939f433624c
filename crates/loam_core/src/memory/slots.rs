//! # Slot Arena
//!
//! Growable dense array of slots with a free stack. Freed indices are reused
//! before the array grows, so handed-out [`SlotId`]s stay small and dense.

use serde::{Deserialize, Serialize};

/// Stable handle to a slot in a [`SlotArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(u32);

impl SlotId {
    /// Creates a handle from a raw index.
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Raw index into the arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// An arena of slots holding `T`, reusing freed slots before growing.
///
/// # Thread Safety
///
/// Not thread-safe. The block store calls it from the mutation thread only.
#[derive(Debug, Clone)]
pub struct SlotArena<T> {
    /// Slot storage. `None` marks a free slot.
    storage: Vec<Option<T>>,
    /// Indices of freed slots, most recently freed on top.
    free_list: Vec<u32>,
    /// Number of occupied slots.
    allocated_count: usize,
    /// Upper bound on `storage.len()`, if any.
    capacity: Option<usize>,
}

impl<T> Default for SlotArena<T> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<T> SlotArena<T> {
    /// Creates an arena that grows without limit.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            storage: Vec::new(),
            free_list: Vec::new(),
            allocated_count: 0,
            capacity: None,
        }
    }

    /// Creates an arena that never holds more than `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Vec::with_capacity(capacity.min(4096)),
            free_list: Vec::new(),
            allocated_count: 0,
            capacity: Some(capacity),
        }
    }

    /// Slot limit, or `None` if unbounded.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Number of occupied slots.
    #[inline]
    #[must_use]
    pub const fn allocated_count(&self) -> usize {
        self.allocated_count
    }

    /// Number of slots ever created (occupied or free).
    #[inline]
    #[must_use]
    pub fn high_water(&self) -> usize {
        self.storage.len()
    }

    /// Stores `value` in a free slot, growing if none is free.
    ///
    /// Returns `None` when the arena is at capacity.
    pub fn allocate(&mut self, value: T) -> Option<SlotId> {
        if let Some(index) = self.free_list.pop() {
            self.storage[index as usize] = Some(value);
            self.allocated_count += 1;
            return Some(SlotId(index));
        }

        let next = self.storage.len();
        if self.capacity.is_some_and(|cap| next >= cap) {
            return None;
        }
        let index = u32::try_from(next).ok()?;
        self.storage.push(Some(value));
        self.allocated_count += 1;
        Some(SlotId(index))
    }

    /// Frees a slot, returning its value. Freeing a free or unknown slot
    /// returns `None` and changes nothing.
    pub fn free(&mut self, slot: SlotId) -> Option<T> {
        let value = self.storage.get_mut(slot.index())?.take()?;
        self.free_list.push(slot.0);
        self.allocated_count -= 1;
        Some(value)
    }

    /// Value in an occupied slot.
    #[inline]
    #[must_use]
    pub fn get(&self, slot: SlotId) -> Option<&T> {
        self.storage.get(slot.index())?.as_ref()
    }

    /// True if `slot` is currently occupied.
    #[inline]
    #[must_use]
    pub fn is_allocated(&self, slot: SlotId) -> bool {
        self.get(slot).is_some()
    }

    /// Drops every value and forgets every slot.
    pub fn clear(&mut self) {
        self.storage.clear();
        self.free_list.clear();
        self.allocated_count = 0;
    }

    /// Iterates over occupied slots.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &T)> {
        self.storage
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|v| (SlotId(index as u32), v)))
    }
}
