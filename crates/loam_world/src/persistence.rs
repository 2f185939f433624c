//! # Chunk Persistence
//!
//! Record shapes crossing the save/load boundary plus two stores:
//!
//! - [`MemoryChunkStore`]: in-process, with failure injection for tests
//! - [`FileChunkStore`]: one LZ4-compressed JSON file per world
//!
//! ## Wire Format
//!
//! ```text
//! { "key": "cx,cz", "blocks": [ { "x": 0, "y": 0, "z": 0, "type": "bedrock" }, ... ] }
//! ```
//!
//! `key` is also accepted as `{ "x": cx, "z": cz }` on read.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use loam_core::{BlockEntry, ChunkCoord, WorldSeed};

use crate::error::{PersistenceError, PersistenceResult};

/// World file name inside the save directory.
pub const WORLD_FILE: &str = "world.loam";
/// Scratch file written before the rename.
const TEMP_FILE: &str = "world.loam.tmp";

/// Saved contents of one chunk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk key.
    #[serde(with = "chunk_key")]
    pub key: ChunkCoord,
    /// Every block under the key. May be empty.
    #[serde(default)]
    pub blocks: Vec<BlockEntry>,
}

/// Everything a store needs to write a world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Seed the chunks were generated from.
    pub seed: WorldSeed,
    /// Loaded chunks.
    pub chunks: Vec<ChunkRecord>,
}

mod chunk_key {
    use serde::{Deserialize, Deserializer, Serializer};

    use loam_core::ChunkCoord;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Pair { x: i32, z: i32 },
    }

    pub fn serialize<S: Serializer>(key: &ChunkCoord, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ChunkCoord, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(serde::de::Error::custom),
            Repr::Pair { x, z } => Ok(ChunkCoord::new(x, z)),
        }
    }
}

/// Backing store for saved chunks.
pub trait ChunkStore: Send {
    /// Saved record for `coord`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn load_chunk(&self, coord: ChunkCoord) -> PersistenceResult<Option<ChunkRecord>>;

    /// Seed of the saved world, if anything was saved.
    fn saved_seed(&self) -> Option<WorldSeed>;

    /// Writes `snapshot`. Chunks missing from the snapshot keep their saved
    /// contents unless the seed changed.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing was written; the previous save is intact.
    fn save_world(&mut self, snapshot: &WorldSnapshot) -> PersistenceResult<()>;
}

/// Merges `snapshot` over `saved`, starting afresh when the seed differs.
fn merge(saved: &mut SavedWorld, snapshot: &WorldSnapshot) {
    if saved.seed != Some(snapshot.seed) {
        saved.chunks.clear();
        saved.seed = Some(snapshot.seed);
    }
    for record in &snapshot.chunks {
        saved.chunks.insert(record.key, record.clone());
    }
}

#[derive(Clone, Debug, Default)]
struct SavedWorld {
    seed: Option<WorldSeed>,
    chunks: HashMap<ChunkCoord, ChunkRecord>,
}

impl SavedWorld {
    fn to_snapshot(&self) -> Option<WorldSnapshot> {
        let seed = self.seed?;
        let mut chunks: Vec<ChunkRecord> = self.chunks.values().cloned().collect();
        chunks.sort_unstable_by_key(|r| r.key);
        Some(WorldSnapshot { seed, chunks })
    }

    fn from_snapshot(snapshot: WorldSnapshot) -> Self {
        Self {
            seed: Some(snapshot.seed),
            chunks: snapshot.chunks.into_iter().map(|r| (r.key, r)).collect(),
        }
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Chunk records kept in memory.
#[derive(Debug, Default)]
pub struct MemoryChunkStore {
    saved: SavedWorld,
    fail_next_save: bool,
    fail_loads: bool,
    saves: usize,
}

impl MemoryChunkStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `save_world` fail.
    pub fn fail_next_save(&mut self) {
        self.fail_next_save = true;
    }

    /// Makes every `load_chunk` fail while `fail` is set.
    pub fn fail_loads(&mut self, fail: bool) {
        self.fail_loads = fail;
    }

    /// Successful saves so far.
    #[must_use]
    pub const fn saves(&self) -> usize {
        self.saves
    }

    /// Saved chunk count.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.saved.chunks.len()
    }

    /// Stores `record` directly, as if saved under `seed`.
    pub fn insert(&mut self, seed: WorldSeed, record: ChunkRecord) {
        merge(
            &mut self.saved,
            &WorldSnapshot {
                seed,
                chunks: vec![record],
            },
        );
    }
}

impl ChunkStore for MemoryChunkStore {
    fn load_chunk(&self, coord: ChunkCoord) -> PersistenceResult<Option<ChunkRecord>> {
        if self.fail_loads {
            return Err(PersistenceError::Injected("load"));
        }
        Ok(self.saved.chunks.get(&coord).cloned())
    }

    fn saved_seed(&self) -> Option<WorldSeed> {
        self.saved.seed
    }

    fn save_world(&mut self, snapshot: &WorldSnapshot) -> PersistenceResult<()> {
        if std::mem::take(&mut self.fail_next_save) {
            return Err(PersistenceError::Injected("save"));
        }
        merge(&mut self.saved, snapshot);
        self.saves += 1;
        Ok(())
    }
}

// =============================================================================
// FILE STORE
// =============================================================================

/// One world per directory, stored as LZ4-compressed JSON.
#[derive(Debug)]
pub struct FileChunkStore {
    dir: PathBuf,
    saved: SavedWorld,
}

impl FileChunkStore {
    /// Opens the world in `dir`, reading `world.loam` if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(dir: impl AsRef<Path>) -> PersistenceResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(WORLD_FILE);
        let saved = if path.exists() {
            let bytes = fs::read(&path).map_err(|source| PersistenceError::Io {
                path: path.clone(),
                source,
            })?;
            SavedWorld::from_snapshot(decode(&bytes)?)
        } else {
            SavedWorld::default()
        };
        tracing::debug!("Opened world store {} ({} chunks)", path.display(), saved.chunks.len());
        Ok(Self { dir, saved })
    }

    /// Path of the world file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(WORLD_FILE)
    }

    fn write(&self, saved: &SavedWorld) -> PersistenceResult<()> {
        let Some(snapshot) = saved.to_snapshot() else {
            return Ok(());
        };
        let bytes = encode(&snapshot)?;
        let io_err = |path: PathBuf| move |source: std::io::Error| PersistenceError::Io { path, source };

        fs::create_dir_all(&self.dir).map_err(io_err(self.dir.clone()))?;
        let tmp = self.dir.join(TEMP_FILE);
        fs::write(&tmp, &bytes).map_err(io_err(tmp.clone()))?;
        let path = self.path();
        fs::rename(&tmp, &path).map_err(io_err(path))?;
        Ok(())
    }
}

impl ChunkStore for FileChunkStore {
    fn load_chunk(&self, coord: ChunkCoord) -> PersistenceResult<Option<ChunkRecord>> {
        Ok(self.saved.chunks.get(&coord).cloned())
    }

    fn saved_seed(&self) -> Option<WorldSeed> {
        self.saved.seed
    }

    fn save_world(&mut self, snapshot: &WorldSnapshot) -> PersistenceResult<()> {
        let mut next = self.saved.clone();
        merge(&mut next, snapshot);
        self.write(&next)?;
        self.saved = next;
        Ok(())
    }
}

/// JSON, then LZ4 with the uncompressed size prepended.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be serialized.
pub fn encode(snapshot: &WorldSnapshot) -> PersistenceResult<Vec<u8>> {
    let json = serde_json::to_vec(snapshot)?;
    Ok(lz4_flex::compress_prepend_size(&json))
}

/// Inverse of [`encode`].
///
/// # Errors
///
/// Returns an error if the bytes are not a valid compressed snapshot.
pub fn decode(bytes: &[u8]) -> PersistenceResult<WorldSnapshot> {
    let json = lz4_flex::decompress_size_prepended(bytes)
        .map_err(|e| PersistenceError::Compression(e.to_string()))?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::{BlockPos, BlockType};

    fn record(x: i32, z: i32, blocks: usize) -> ChunkRecord {
        ChunkRecord {
            key: ChunkCoord::new(x, z),
            blocks: (0..blocks)
                .map(|i| BlockEntry::new(BlockPos::new(x * 16, i as i32, z * 16), BlockType::Stone))
                .collect(),
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("loam-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_record_key_forms() {
        let text: ChunkRecord =
            serde_json::from_str(r#"{"key":"-2,5","blocks":[{"x":-32,"y":1,"z":80,"type":"dirt"}]}"#).unwrap();
        assert_eq!(text.key, ChunkCoord::new(-2, 5));
        assert_eq!(text.blocks[0].block, BlockType::Dirt);

        let pair: ChunkRecord = serde_json::from_str(r#"{"key":{"x":3,"z":-1},"blocks":[]}"#).unwrap();
        assert_eq!(pair.key, ChunkCoord::new(3, -1));
        assert!(pair.blocks.is_empty());

        let out = serde_json::to_string(&pair).unwrap();
        assert_eq!(out, r#"{"key":"3,-1","blocks":[]}"#);

        assert!(serde_json::from_str::<ChunkRecord>(r#"{"key":"nope","blocks":[]}"#).is_err());
    }

    #[test]
    fn test_memory_store_merges_and_injects() {
        let mut store = MemoryChunkStore::new();
        let seed = WorldSeed::new(1);
        store
            .save_world(&WorldSnapshot {
                seed,
                chunks: vec![record(0, 0, 3), record(1, 0, 2)],
            })
            .unwrap();
        store
            .save_world(&WorldSnapshot {
                seed,
                chunks: vec![record(0, 0, 1)],
            })
            .unwrap();
        assert_eq!(store.chunk_count(), 2);
        assert_eq!(store.load_chunk(ChunkCoord::new(0, 0)).unwrap().unwrap().blocks.len(), 1);
        assert!(store.load_chunk(ChunkCoord::new(5, 5)).unwrap().is_none());

        store.fail_next_save();
        let failed = store.save_world(&WorldSnapshot {
            seed,
            chunks: vec![record(0, 0, 9)],
        });
        assert!(failed.is_err());
        assert_eq!(store.saves(), 2);
        assert_eq!(store.load_chunk(ChunkCoord::new(0, 0)).unwrap().unwrap().blocks.len(), 1);

        store.fail_loads(true);
        assert!(store.load_chunk(ChunkCoord::new(0, 0)).is_err());
    }

    #[test]
    fn test_new_seed_replaces_saved_chunks() {
        let mut store = MemoryChunkStore::new();
        store.insert(WorldSeed::new(1), record(0, 0, 1));
        store.insert(WorldSeed::new(2), record(1, 1, 1));
        assert_eq!(store.saved_seed(), Some(WorldSeed::new(2)));
        assert_eq!(store.chunk_count(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = scratch_dir("reopen");
        let snapshot = WorldSnapshot {
            seed: WorldSeed::new(42),
            chunks: vec![record(0, 0, 4), record(-1, 2, 0)],
        };
        {
            let mut store = FileChunkStore::open(&dir).unwrap();
            assert_eq!(store.saved_seed(), None);
            store.save_world(&snapshot).unwrap();
        }
        let store = FileChunkStore::open(&dir).unwrap();
        assert_eq!(store.saved_seed(), Some(WorldSeed::new(42)));
        assert_eq!(store.load_chunk(ChunkCoord::new(0, 0)).unwrap(), Some(record(0, 0, 4)));
        assert_eq!(store.load_chunk(ChunkCoord::new(-1, 2)).unwrap(), Some(record(-1, 2, 0)));
        assert!(!dir.join(TEMP_FILE).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_failed_file_save_keeps_previous() {
        let dir = scratch_dir("failed-save");
        let mut store = FileChunkStore::open(&dir).unwrap();
        let first = WorldSnapshot {
            seed: WorldSeed::new(7),
            chunks: vec![record(0, 0, 2)],
        };
        store.save_world(&first).unwrap();

        // A directory squatting on the temp name makes the write fail.
        fs::create_dir_all(dir.join(TEMP_FILE)).unwrap();
        let second = WorldSnapshot {
            seed: WorldSeed::new(7),
            chunks: vec![record(0, 0, 5)],
        };
        assert!(store.save_world(&second).is_err());
        assert_eq!(store.load_chunk(ChunkCoord::new(0, 0)).unwrap(), Some(record(0, 0, 2)));

        let bytes = fs::read(dir.join(WORLD_FILE)).unwrap();
        assert_eq!(decode(&bytes).unwrap(), first);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = scratch_dir("corrupt");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(WORLD_FILE), lz4_flex::compress_prepend_size(b"{not json")).unwrap();
        assert!(FileChunkStore::open(&dir).is_err());
        let _ = fs::remove_dir_all(&dir);
    }
}
