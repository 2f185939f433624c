//! # Coordinates
//!
//! Block positions are integer triples. Chunks are 16x16 columns of
//! unbounded height, keyed by `(floor(x / 16), floor(z / 16))`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Chunk width/depth in blocks.
pub const CHUNK_SIZE: i32 = 16;

/// Lowest Y a block may occupy. Everything below counts as solid ground.
pub const WORLD_FLOOR_Y: i32 = 0;

/// Exclusive bound on `|x|`, `|z|` and `y` of a placeable block. Keeps
/// neighbor, column and chunk-origin arithmetic clear of `i32` overflow.
pub const WORLD_LIMIT: i32 = 1 << 24;

/// One of the six axis-aligned block faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Face {
    /// +X
    East,
    /// -X
    West,
    /// +Y
    Up,
    /// -Y
    Down,
    /// +Z
    South,
    /// -Z
    North,
}

impl Face {
    /// All faces, in the order used by [`BlockPos::neighbors`].
    pub const ALL: [Face; 6] = [
        Face::East,
        Face::West,
        Face::Up,
        Face::Down,
        Face::South,
        Face::North,
    ];

    /// Unit offset pointing out of this face.
    #[inline]
    #[must_use]
    pub const fn offset(self) -> (i32, i32, i32) {
        match self {
            Face::East => (1, 0, 0),
            Face::West => (-1, 0, 0),
            Face::Up => (0, 1, 0),
            Face::Down => (0, -1, 0),
            Face::South => (0, 0, 1),
            Face::North => (0, 0, -1),
        }
    }
}

/// Integer world position of a single block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate (up).
    pub y: i32,
    /// Z coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Creates a new block position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Returns the position shifted by the given delta.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
        }
    }

    /// Neighbor across `face`.
    #[inline]
    #[must_use]
    pub const fn neighbor(self, face: Face) -> Self {
        let (dx, dy, dz) = face.offset();
        self.offset(dx, dy, dz)
    }

    /// The six face-adjacent positions, ordered as [`Face::ALL`].
    #[inline]
    #[must_use]
    pub fn neighbors(self) -> [BlockPos; 6] {
        Face::ALL.map(|face| self.neighbor(face))
    }

    /// The block directly above.
    #[inline]
    #[must_use]
    pub const fn above(self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Chunk this position belongs to.
    #[inline]
    #[must_use]
    pub const fn chunk(self) -> ChunkCoord {
        ChunkCoord::from_block_pos(self.x, self.z)
    }

    /// True if the position lies below the world floor.
    #[inline]
    #[must_use]
    pub const fn is_below_floor(self) -> bool {
        self.y < WORLD_FLOOR_Y
    }

    /// True if a block may be placed here: on or above the floor and
    /// inside [`WORLD_LIMIT`] on every axis.
    #[inline]
    #[must_use]
    pub const fn in_world(self) -> bool {
        !self.is_below_floor()
            && self.y < WORLD_LIMIT
            && self.x > -WORLD_LIMIT
            && self.x < WORLD_LIMIT
            && self.z > -WORLD_LIMIT
            && self.z < WORLD_LIMIT
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Chunk coordinate (identifies a chunk in the world grid).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkCoord {
    /// X coordinate (in chunks, not blocks).
    pub x: i32,
    /// Z coordinate (in chunks, not blocks).
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Converts world block coordinates to chunk coordinate.
    #[inline]
    #[must_use]
    pub const fn from_block_pos(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_SIZE),
            z: block_z.div_euclid(CHUNK_SIZE),
        }
    }

    /// Chunk containing a fractional world position (observer coordinates).
    /// Positions past [`WORLD_LIMIT`] are clamped to the edge chunk.
    #[inline]
    #[must_use]
    pub fn from_world(world_x: f64, world_z: f64) -> Self {
        let edge = f64::from(WORLD_LIMIT - 1);
        let clamp = |v: f64| v.floor().clamp(-edge, edge) as i32;
        Self::from_block_pos(clamp(world_x), clamp(world_z))
    }

    /// World X coordinate of the chunk's origin corner.
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i32 {
        self.x * CHUNK_SIZE
    }

    /// World Z coordinate of the chunk's origin corner.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i32 {
        self.z * CHUNK_SIZE
    }

    /// True if the world column `(x, z)` lies inside this chunk.
    #[inline]
    #[must_use]
    pub const fn contains_column(self, x: i32, z: i32) -> bool {
        x.div_euclid(CHUNK_SIZE) == self.x && z.div_euclid(CHUNK_SIZE) == self.z
    }

    /// Squared distance in chunk units, used for load prioritization.
    #[inline]
    #[must_use]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dz = i64::from(self.z - other.z);
        dx * dx + dz * dz
    }

    /// Iterates the world columns `(x, z)` covered by this chunk.
    pub fn columns(self) -> impl Iterator<Item = (i32, i32)> {
        let (x0, z0) = (self.world_x(), self.world_z());
        (0..CHUNK_SIZE).flat_map(move |dz| (0..CHUNK_SIZE).map(move |dx| (x0 + dx, z0 + dz)))
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

impl FromStr for ChunkCoord {
    type Err = ParseError;

    /// Parses the `"cx,cz"` key form used by saved worlds.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseError::MalformedChunkKey(s.to_owned());
        let (x, z) = s.split_once(',').ok_or_else(malformed)?;
        let x = x.trim().parse().map_err(|_| malformed())?;
        let z = z.trim().parse().map_err(|_| malformed())?;
        Ok(Self { x, z })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_coord_from_block() {
        assert_eq!(ChunkCoord::from_block_pos(0, 0), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block_pos(15, 15), ChunkCoord::new(0, 0));
        assert_eq!(ChunkCoord::from_block_pos(16, 16), ChunkCoord::new(1, 1));
        assert_eq!(ChunkCoord::from_block_pos(-1, -1), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block_pos(-16, -16), ChunkCoord::new(-1, -1));
        assert_eq!(ChunkCoord::from_block_pos(-17, -17), ChunkCoord::new(-2, -2));
    }

    #[test]
    fn test_from_world_floors_fractions() {
        assert_eq!(ChunkCoord::from_world(-0.5, 15.9), ChunkCoord::new(-1, 0));
        assert_eq!(ChunkCoord::from_world(32.0, -16.0), ChunkCoord::new(2, -1));
        let edge = ChunkCoord::from_block_pos(WORLD_LIMIT - 1, -(WORLD_LIMIT - 1));
        assert_eq!(ChunkCoord::from_world(1e15, -1e15), edge);
    }

    #[test]
    fn test_neighbors_are_face_adjacent() {
        let pos = BlockPos::new(5, 5, 5);
        let neighbors = pos.neighbors();
        assert_eq!(neighbors[0], BlockPos::new(6, 5, 5));
        assert_eq!(neighbors[3], BlockPos::new(5, 4, 5));
        for n in neighbors {
            let d = (n.x - pos.x).abs() + (n.y - pos.y).abs() + (n.z - pos.z).abs();
            assert_eq!(d, 1);
        }
    }

    #[test]
    fn test_world_limit() {
        assert!(BlockPos::new(0, 0, 0).in_world());
        assert!(BlockPos::new(WORLD_LIMIT - 1, WORLD_LIMIT - 1, -(WORLD_LIMIT - 1)).in_world());
        assert!(!BlockPos::new(0, -1, 0).in_world());
        assert!(!BlockPos::new(WORLD_LIMIT, 5, 0).in_world());
        assert!(!BlockPos::new(0, 5, -WORLD_LIMIT).in_world());
        assert!(!BlockPos::new(i32::MAX, 5, 0).in_world());
        assert!(!BlockPos::new(0, i32::MAX, 0).in_world());
        assert!(!BlockPos::new(i32::MIN, 5, i32::MIN).in_world());
    }

    #[test]
    fn test_chunk_key_round_trip_and_errors() {
        let coord = ChunkCoord::new(-3, 12);
        assert_eq!(coord.to_string(), "-3,12");
        assert_eq!("-3,12".parse::<ChunkCoord>().unwrap(), coord);
        assert_eq!(" 4 , -1".parse::<ChunkCoord>().unwrap(), ChunkCoord::new(4, -1));
        assert!("4;1".parse::<ChunkCoord>().is_err());
        assert!("a,1".parse::<ChunkCoord>().is_err());
    }

    #[test]
    fn test_columns_cover_chunk_exactly() {
        let coord = ChunkCoord::new(-1, 2);
        let columns: Vec<_> = coord.columns().collect();
        assert_eq!(columns.len(), 256);
        assert!(columns.iter().all(|&(x, z)| coord.contains_column(x, z)));
    }
}
