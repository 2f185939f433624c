//! # Occlusion
//!
//! Decides whether a block needs a render slot. A block is *exposed* when at
//! least one face neighbor lets light through:
//!
//! - the neighbor is empty, or
//! - the neighbor is transparent, unless it has the same type and that type
//!   merge-culls (two water blocks do not show each other).
//!
//! Coordinates below the world floor count as solid.

use crate::access::BlockLookup;
use crate::block::BlockType;
use crate::coord::{BlockPos, Face};

/// True if `neighbor` hides the face of a `block` it touches.
#[inline]
#[must_use]
pub const fn occludes(block: BlockType, neighbor: BlockType) -> bool {
    let props = neighbor.properties();
    if !props.transparent {
        return true;
    }
    props.merge_culled && neighbor as u8 == block as u8
}

/// True if the face of `block` at `pos` pointing across `face` is visible.
#[inline]
#[must_use]
pub fn face_exposed<L: BlockLookup + ?Sized>(
    lookup: &L,
    pos: BlockPos,
    block: BlockType,
    face: Face,
) -> bool {
    let neighbor = pos.neighbor(face);
    if neighbor.is_below_floor() {
        return false;
    }
    match lookup.block_at(neighbor) {
        None => true,
        Some(other) => !occludes(block, other),
    }
}

/// Per-face visibility, ordered as [`Face::ALL`].
#[must_use]
pub fn exposed_faces<L: BlockLookup + ?Sized>(
    lookup: &L,
    pos: BlockPos,
    block: BlockType,
) -> [bool; 6] {
    Face::ALL.map(|face| face_exposed(lookup, pos, block, face))
}

/// True if any face of `block` at `pos` is visible.
#[must_use]
pub fn is_exposed<L: BlockLookup + ?Sized>(lookup: &L, pos: BlockPos, block: BlockType) -> bool {
    Face::ALL
        .iter()
        .any(|&face| face_exposed(lookup, pos, block, face))
}
