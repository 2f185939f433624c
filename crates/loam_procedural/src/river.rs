//! # River Carving
//!
//! Routes rivers across a [`TerrainMap`]. Each river starts at a random
//! point on one edge and walks greedily toward a random point on the
//! opposite edge. At every step it moves to the unvisited 4-neighbor with
//! the lowest score:
//!
//! ```text
//! height_weight * dest.height + distance_weight * |dest - target| + jitter * rng
//! ```
//!
//! Every cell within `swath_radius` (Manhattan) of the path becomes water,
//! except inside the safe zone around the origin.

use std::collections::HashSet;

use loam_core::{WorldRng, WorldSeed};

use crate::terrain::Surface;
use crate::terrain_map::{RiverConfig, TerrainMap};

/// Seed purpose for river routing.
const RIVER_PURPOSE: u64 = 20;

/// One map edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Edge {
    West,
    East,
    North,
    South,
}

impl Edge {
    const ALL: [Edge; 4] = [Edge::West, Edge::East, Edge::North, Edge::South];

    const fn opposite(self) -> Self {
        match self {
            Edge::West => Edge::East,
            Edge::East => Edge::West,
            Edge::North => Edge::South,
            Edge::South => Edge::North,
        }
    }

    /// Cell on this edge at offset `t` along it.
    const fn point(self, half: i32, t: i32) -> (i32, i32) {
        match self {
            Edge::West => (-half, t),
            Edge::East => (half - 1, t),
            Edge::North => (t, -half),
            Edge::South => (t, half - 1),
        }
    }

    const fn holds(self, half: i32, (x, z): (i32, i32)) -> bool {
        match self {
            Edge::West => x == -half,
            Edge::East => x == half - 1,
            Edge::North => z == -half,
            Edge::South => z == half - 1,
        }
    }
}

/// River router over a terrain map.
pub struct River;

impl River {
    /// Carves `config.river_count` rivers into `map`. Returns each river's
    /// path in walk order.
    pub fn carve(map: &mut TerrainMap, seed: WorldSeed, config: &RiverConfig) -> Vec<Vec<(i32, i32)>> {
        let mut rng = WorldRng::new(seed.derive(RIVER_PURPOSE));
        (0..config.river_count)
            .map(|_| {
                let path = Self::route(map, &mut rng, config);
                for &(x, z) in &path {
                    Self::carve_swath(map, x, z, config);
                }
                path
            })
            .collect()
    }

    fn route(map: &TerrainMap, rng: &mut WorldRng, config: &RiverConfig) -> Vec<(i32, i32)> {
        let half = map.half_size();
        let side = map.side();
        let start_edge = Edge::ALL[rng.index(Edge::ALL.len())];
        let end_edge = start_edge.opposite();
        let start = start_edge.point(half, rng.range_i32(-half, half - 1));
        let target = end_edge.point(half, rng.range_i32(-half, half - 1));

        let mut path = vec![start];
        let mut visited: HashSet<(i32, i32)> = HashSet::from([start]);
        let mut current = start;
        let max_steps = (side as usize) * (side as usize);

        while !end_edge.holds(half, current) && path.len() < max_steps {
            let (cx, cz) = current;
            let mut best: Option<((i32, i32), f64)> = None;
            for (dx, dz) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                let next = (cx + dx, cz + dz);
                // Draw jitter for every direction so the stream does not
                // depend on which neighbors exist.
                let jitter = rng.next_f64();
                if visited.contains(&next) {
                    continue;
                }
                let Some(cell) = map.cell(next.0, next.1) else {
                    continue;
                };
                let distance = f64::from(next.0 - target.0).hypot(f64::from(next.1 - target.1));
                let score = config.height_weight * f64::from(cell.height)
                    + config.distance_weight * distance
                    + config.jitter * jitter;
                if best.map_or(true, |(_, s)| score < s) {
                    best = Some((next, score));
                }
            }
            let Some((next, _)) = best else {
                break;
            };
            visited.insert(next);
            path.push(next);
            current = next;
        }
        path
    }

    fn carve_swath(map: &mut TerrainMap, x: i32, z: i32, config: &RiverConfig) {
        let r = config.swath_radius.max(0);
        let depth = config.river_depth.max(1);
        for dz in -r..=r {
            let reach = r - dz.abs();
            for dx in -reach..=reach {
                let Some(cell) = map.cell_mut(x + dx, z + dz) else {
                    continue;
                };
                if cell.distance_to_center < config.safe_zone_radius {
                    continue;
                }
                if cell.surface == Surface::Water {
                    cell.water_depth = cell.water_depth.max(1);
                    continue;
                }
                let bed = (cell.height - depth).max(1);
                cell.water_depth = (cell.height - bed).max(1);
                cell.height = bed;
                cell.surface = Surface::Water;
            }
        }
    }
}
