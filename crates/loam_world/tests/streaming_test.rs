//! Streaming integration tests: independent managers must build identical
//! worlds, and evictions must account for every block.

use loam_core::{BlockPos, BlockType, ChunkCoord, WorldSeed};
use loam_procedural::{ChunkGenerator, GenerationConfig};
use loam_world::{BlockStore, ChunkManager, NetworkRelay, StreamingConfig};

fn manager(seed: u64, radius: i32, workers: usize) -> ChunkManager {
    let streaming = StreamingConfig {
        view_radius: radius,
        workers,
        ..StreamingConfig::default()
    };
    ChunkManager::new(WorldSeed::new(seed), GenerationConfig::default(), streaming).unwrap()
}

fn load_around(seed: u64, workers: usize, x: f64, z: f64) -> (ChunkManager, BlockStore) {
    let mut store = BlockStore::new();
    let mut manager = manager(seed, 2, workers);
    manager.update_observer(&mut store, x, z);
    manager.force_load_all(&mut store);
    (manager, store)
}

#[test]
fn test_worker_and_inline_build_the_same_world() {
    let (a_manager, a) = load_around(123, 3, 0.0, 0.0);
    let (b_manager, b) = load_around(123, 0, 0.0, 0.0);

    assert_eq!(a_manager.loaded_chunks(), b_manager.loaded_chunks());
    assert_eq!(a.len(), b.len());
    assert_eq!(a.visible_count(), b.visible_count());
    for coord in a_manager.loaded_chunks() {
        assert_eq!(a.chunk_blocks(coord), b.chunk_blocks(coord), "chunk {coord}");
    }
}

#[test]
fn test_load_order_does_not_change_the_world() {
    // Reach the same chunk from two directions.
    let (_, direct) = load_around(77, 0, 8.0, 8.0);

    let mut store = BlockStore::new();
    let mut wandering = manager(77, 2, 0);
    wandering.update_observer(&mut store, -90.0, 60.0);
    wandering.force_load_all(&mut store);
    wandering.update_observer(&mut store, 8.0, 8.0);
    wandering.force_load_all(&mut store);

    let origin = ChunkCoord::new(0, 0);
    assert_eq!(direct.chunk_blocks(origin), store.chunk_blocks(origin));
}

#[test]
fn test_origin_column_layout() {
    let (manager, store) = load_around(123, 0, 0.0, 0.0);
    let generator = ChunkGenerator::new(manager.seed(), &GenerationConfig::default());
    let height = generator.terrain().height_at(0, 0);
    let sea_level = generator.terrain().config().sea_level;
    println!("height at origin: {height}, sea level {sea_level}");

    assert_eq!(store.block_type(BlockPos::new(0, 0, 0)), Some(BlockType::Bedrock));
    for y in 0..=height {
        assert!(store.contains(BlockPos::new(0, y, 0)), "gap at y={y}");
    }
    let cap = store.block_type(BlockPos::new(0, height, 0));
    assert!(matches!(cap, Some(BlockType::Grass | BlockType::Sand)), "cap {cap:?}");
    if height < sea_level {
        for y in height + 1..=sea_level {
            assert_eq!(store.block_type(BlockPos::new(0, y, 0)), Some(BlockType::Water));
        }
        assert!(!store.contains(BlockPos::new(0, sea_level + 1, 0)));
    }
}

#[test]
fn test_eviction_accounts_for_every_block() {
    let mut store = BlockStore::new();
    let mut manager = manager(5, 2, 0);
    manager.update_observer(&mut store, 0.0, 0.0);
    manager.force_load_all(&mut store);

    let per_chunk: usize = manager
        .loaded_chunks()
        .iter()
        .map(|&coord| store.chunk_len(coord))
        .sum();
    assert_eq!(per_chunk, store.len());

    // Moving one chunk east drops the western rim.
    let before = store.len();
    let leaving: Vec<ChunkCoord> = manager
        .loaded_chunks()
        .into_iter()
        .filter(|c| (c.x - 1).pow(2) + c.z.pow(2) > 4)
        .collect();
    let leaving_blocks: usize = leaving.iter().map(|&c| store.chunk_len(c)).sum();

    manager.update_observer(&mut store, 20.0, 0.0);
    assert_eq!(store.len(), before - leaving_blocks);
    for coord in leaving {
        assert_eq!(store.chunk_len(coord), 0);
        assert!(!manager.is_loaded(coord));
    }
}

#[test]
fn test_player_edit_on_generated_terrain() {
    let (_, mut store) = load_around(9, 0, 0.0, 0.0);
    let mut relay = NetworkRelay::new(&mut store);

    let a = BlockPos::new(5, 200, 5);
    let b = BlockPos::new(6, 200, 5);
    assert!(store.add(a, BlockType::Stone));
    assert!(store.add(b, BlockType::Stone));

    let faces = store.exposed_faces(a).unwrap();
    assert!(!faces[0], "east face touches the second stone");
    assert!(faces[1..].iter().all(|&open| open));
    assert!(store.get(a).unwrap().slot.is_some());
    assert_eq!(relay.drain_outbound().len(), 2);
}
