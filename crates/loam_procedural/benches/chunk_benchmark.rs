//! Benchmark for chunk generation.
//!
//! Run with: cargo bench --package loam_procedural --bench chunk_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use loam_core::{ChunkCoord, WorldSeed};
use loam_procedural::{ChunkGenerator, GenerationConfig, GenerationMode};

fn benchmark_single_chunk(c: &mut Criterion) {
    let gen = ChunkGenerator::new(WorldSeed::new(42), &GenerationConfig::default());

    c.bench_function("single_chunk_generation", |b| {
        let mut coord = 0i32;
        b.iter(|| {
            coord = coord.wrapping_add(1);
            black_box(gen.generate(ChunkCoord::new(coord, coord / 2)))
        });
    });
}

fn benchmark_chunk_grid(c: &mut Criterion) {
    let gen = ChunkGenerator::new(WorldSeed::new(42), &GenerationConfig::default());

    let mut group = c.benchmark_group("chunk_grid");
    group.sample_size(10);

    // 8x8 chunks = 128x128 columns
    group.throughput(Throughput::Elements(8 * 8));
    group.bench_function("8x8_chunks", |b| {
        b.iter(|| {
            for z in 0..8 {
                for x in 0..8 {
                    black_box(gen.generate(ChunkCoord::new(x, z)));
                }
            }
        });
    });

    group.finish();
}

fn benchmark_river_map_build(c: &mut Criterion) {
    let config = GenerationConfig {
        mode: GenerationMode::RiverMap,
        ..GenerationConfig::default()
    };
    let mut group = c.benchmark_group("river_map");
    group.sample_size(10);
    group.bench_function("build_and_carve", |b| {
        b.iter(|| black_box(ChunkGenerator::new(WorldSeed::new(42), &config)));
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_single_chunk,
    benchmark_chunk_grid,
    benchmark_river_map_build
);
criterion_main!(benches);
