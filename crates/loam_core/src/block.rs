//! # Block Types
//!
//! Every occupied coordinate holds exactly one [`BlockType`]. Air is not a
//! block type: an empty coordinate is simply absent from the store.
//!
//! Render properties live in a const table indexed by the enum
//! discriminant, so lookups never touch strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::coord::BlockPos;
use crate::error::ParseError;

/// Block type identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BlockType {
    /// Indestructible floor layer.
    Bedrock = 0,
    /// Deep fill.
    Stone = 1,
    /// Subsurface filler.
    Dirt = 2,
    /// Surface of dry land.
    Grass = 3,
    /// Beach and sea floor.
    Sand = 4,
    /// Still water.
    Water = 5,
    /// Tree trunk.
    Wood = 6,
    /// Tree canopy.
    Leaves = 7,
    /// Player-built planks.
    Planks = 8,
    /// Player-built cobblestone.
    Cobblestone = 9,
    /// Player-built glass.
    Glass = 10,
}

/// Static render properties of a block type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockProperties {
    /// Neighbors can be seen through this block.
    pub transparent: bool,
    /// Two touching blocks of this type hide their shared face
    /// (contiguous water reads as one volume).
    pub merge_culled: bool,
}

impl BlockProperties {
    const OPAQUE: Self = Self {
        transparent: false,
        merge_culled: false,
    };
    const SEE_THROUGH: Self = Self {
        transparent: true,
        merge_culled: false,
    };
    const MERGING: Self = Self {
        transparent: true,
        merge_culled: true,
    };
}

const PROPERTIES: [BlockProperties; BlockType::COUNT] = [
    BlockProperties::OPAQUE,      // Bedrock
    BlockProperties::OPAQUE,      // Stone
    BlockProperties::OPAQUE,      // Dirt
    BlockProperties::OPAQUE,      // Grass
    BlockProperties::OPAQUE,      // Sand
    BlockProperties::MERGING,     // Water
    BlockProperties::OPAQUE,      // Wood
    BlockProperties::SEE_THROUGH, // Leaves
    BlockProperties::OPAQUE,      // Planks
    BlockProperties::OPAQUE,      // Cobblestone
    BlockProperties::MERGING,     // Glass
];

impl BlockType {
    /// Number of block types.
    pub const COUNT: usize = 11;

    /// Every block type, in discriminant order.
    pub const ALL: [BlockType; Self::COUNT] = [
        Self::Bedrock,
        Self::Stone,
        Self::Dirt,
        Self::Grass,
        Self::Sand,
        Self::Water,
        Self::Wood,
        Self::Leaves,
        Self::Planks,
        Self::Cobblestone,
        Self::Glass,
    ];

    /// Dense index of this type, suitable for per-type arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Static properties of this type.
    #[inline]
    #[must_use]
    pub const fn properties(self) -> BlockProperties {
        PROPERTIES[self as usize]
    }

    /// Shorthand for `properties().transparent`.
    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.properties().transparent
    }

    /// Canonical name used in saved chunks and network messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bedrock => "bedrock",
            Self::Stone => "stone",
            Self::Dirt => "dirt",
            Self::Grass => "grass",
            Self::Sand => "sand",
            Self::Water => "water",
            Self::Wood => "wood",
            Self::Leaves => "leaves",
            Self::Planks => "planks",
            Self::Cobblestone => "cobblestone",
            Self::Glass => "glass",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlockType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ParseError::UnknownBlockType(s.to_owned()))
    }
}

/// A block type at a position. Serializes as `{"x", "y", "z", "type"}`,
/// the shape used by generated chunks, saved chunks and block updates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Where the block sits.
    #[serde(flatten)]
    pub pos: BlockPos,
    /// What the block is.
    #[serde(rename = "type")]
    pub block: BlockType,
}

impl BlockEntry {
    /// Creates a new entry.
    #[inline]
    #[must_use]
    pub const fn new(pos: BlockPos, block: BlockType) -> Self {
        Self { pos, block }
    }
}
