//! # LOAM Headless
//!
//! Streams a world around an observer walking east and prints what the
//! engine did. No window, no renderer.
//!
//! ```bash
//! loam_headless                       # defaults, no saving
//! loam_headless loam.toml             # custom config
//! loam_headless loam.toml ./saves     # resume / save the world in ./saves
//! ```

use std::process::ExitCode;

use loam::world::FileChunkStore;
use loam::{Engine, LoamConfig};

/// Simulated frames after the initial load.
const FRAMES: u32 = 1200;
/// Seconds per frame.
const DT: f64 = 1.0 / 60.0;
/// Observer speed in blocks per second.
const WALK_SPEED: f64 = 12.0;
/// Frames between progress lines.
const REPORT_EVERY: u32 = 240;

fn main() -> ExitCode {
    println!("═══════════════════════════════════════════════════════════════════");
    println!("                         LOAM HEADLESS");
    println!("═══════════════════════════════════════════════════════════════════");

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match LoamConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("   ✗ {e}");
                return ExitCode::FAILURE;
            }
        },
        None => LoamConfig::default(),
    };

    let engine = match args.next() {
        Some(dir) => match FileChunkStore::open(&dir) {
            Ok(store) => {
                println!("  Saves:    {dir}");
                Engine::with_chunk_store(config, Box::new(store))
            }
            Err(e) => {
                eprintln!("   ✗ cannot open save directory {dir}: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => Engine::new(config),
    };
    let mut engine = match engine {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("   ✗ {e}");
            return ExitCode::FAILURE;
        }
    };

    let c = engine.config();
    println!("  Seed:     {}", engine.seed().value());
    println!("  Mode:     {:?}", c.world.mode);
    println!("  Radius:   {} chunks", c.streaming.view_radius);
    println!("  Workers:  {}", c.streaming.workers);
    println!();

    let done = engine.begin_initial_load(0.0, 0.0, |completed, total| {
        if completed == total || completed % 16 == 0 {
            println!("  Loading   {completed}/{total}");
        }
    });
    while done.try_recv().is_err() {
        engine.update(0.0, 0.0, DT);
    }
    println!("  ✓ Initial load: {} blocks, {} visible", engine.store().len(), engine.store().visible_count());
    println!();

    let mut slowest = 0;
    for frame in 1..=FRAMES {
        let x = f64::from(frame) * DT * WALK_SPEED;
        let stats = engine.update(x, 0.0, DT);
        slowest = slowest.max(stats.total_us);
        if frame % REPORT_EVERY == 0 {
            let world = engine.world_stats();
            println!(
                "  frame {frame:>5}  x={x:>7.1}  loaded={:>4}  queued={:>4}  blocks={:>8}  visible={:>7}",
                world.loaded,
                world.queued,
                engine.store().len(),
                engine.store().visible_count()
            );
        }
    }

    let world = engine.world_stats();
    let grass = engine.grass_stats();
    println!();
    println!("  Streaming");
    println!("    generated         {}", world.generated);
    println!("    restored          {}", world.restored);
    println!("    unloaded          {}", world.unloaded);
    println!("    stale discarded   {}", world.stale_discarded);
    println!("    store read errors {}", world.persistence_errors);
    println!("    edited kept       {}", world.retained);
    println!("  Vegetation");
    println!("    grass ticks       {}", grass.ticks);
    println!("    smothered         {}", grass.smothered);
    println!("    spread            {}", grass.spread);
    println!("    revived           {}", grass.revived);
    println!("    leaves decayed    {}", engine.leaves_decayed());
    println!("  Relay");
    println!("    outbound dropped  {}", engine.relay_stats().overflowed);
    println!("  Slowest frame       {slowest} us");

    match engine.save() {
        Ok(0) => {}
        Ok(n) => println!("  ✓ Saved {n} chunks"),
        Err(e) => {
            eprintln!("   ✗ save failed: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
