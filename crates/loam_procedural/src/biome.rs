//! # Biome Classification
//!
//! Labels terrain-map cells from their height and a humidity channel.
//! Biomes only steer decoration (tree density); heights come from the
//! terrain generator.

use serde::{Deserialize, Serialize};

use loam_core::WorldSeed;

use crate::noise::SimplexNoise;

/// Seed purpose for the humidity channel.
const HUMIDITY_PURPOSE: u64 = 3;

/// Biome types on the terrain map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Biome {
    /// Shoreline and sea floor.
    Beach = 0,
    /// Open grassland.
    Plains = 1,
    /// Humid lowland.
    Forest = 2,
    /// Raised ground.
    Hills = 3,
    /// High peaks.
    Mountains = 4,
}

impl Biome {
    /// Multiplier applied to the base tree chance.
    #[must_use]
    pub const fn tree_density(self) -> f64 {
        match self {
            Self::Beach => 0.0,
            Self::Plains => 1.0,
            Self::Forest => 3.0,
            Self::Hills => 0.6,
            Self::Mountains => 0.2,
        }
    }
}

/// Biome classifier driven by a humidity noise channel.
pub struct BiomeClassifier {
    humidity_noise: SimplexNoise,
    sea_level: i32,
}

impl BiomeClassifier {
    /// Scale for humidity noise (larger = more gradual changes).
    const HUMIDITY_SCALE: f64 = 0.006;
    /// Height above sea level where hills begin.
    const HILLS_RISE: i32 = 16;
    /// Height above sea level where mountains begin.
    const MOUNTAIN_RISE: i32 = 36;

    /// Creates a new classifier from a world seed.
    #[must_use]
    pub fn new(seed: WorldSeed, sea_level: i32) -> Self {
        Self {
            humidity_noise: SimplexNoise::new(seed.derive(HUMIDITY_PURPOSE)),
            sea_level,
        }
    }

    /// Humidity at world coordinates, in [-1, 1].
    #[must_use]
    pub fn humidity(&self, x: f64, z: f64) -> f64 {
        self.humidity_noise
            .octaved(x * Self::HUMIDITY_SCALE, z * Self::HUMIDITY_SCALE, 3, 0.5, 2.0)
    }

    /// Classifies a column of the given height.
    #[must_use]
    pub fn classify(&self, x: i32, z: i32, height: i32) -> Biome {
        let humidity = self.humidity(f64::from(x), f64::from(z));
        Self::classify_from_climate(height - self.sea_level, humidity)
    }

    fn classify_from_climate(rise: i32, humidity: f64) -> Biome {
        match rise {
            r if r <= 1 => Biome::Beach,
            r if r >= Self::MOUNTAIN_RISE => Biome::Mountains,
            r if r >= Self::HILLS_RISE => Biome::Hills,
            _ if humidity > 0.15 => Biome::Forest,
            _ => Biome::Plains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_biome_determinism() {
        let classifier1 = BiomeClassifier::new(WorldSeed::new(42), 24);
        let classifier2 = BiomeClassifier::new(WorldSeed::new(42), 24);

        for i in 0..100 {
            let (x, z) = (i * 100, i * 73);
            assert_eq!(classifier1.classify(x, z, 30), classifier2.classify(x, z, 30));
        }
    }

    #[test]
    fn test_height_bands() {
        assert_eq!(BiomeClassifier::classify_from_climate(-4, 0.9), Biome::Beach);
        assert_eq!(BiomeClassifier::classify_from_climate(1, 0.9), Biome::Beach);
        assert_eq!(BiomeClassifier::classify_from_climate(5, 0.9), Biome::Forest);
        assert_eq!(BiomeClassifier::classify_from_climate(5, -0.9), Biome::Plains);
        assert_eq!(BiomeClassifier::classify_from_climate(20, 0.9), Biome::Hills);
        assert_eq!(BiomeClassifier::classify_from_climate(40, 0.0), Biome::Mountains);
    }

    #[test]
    fn test_forests_are_denser() {
        assert!(Biome::Forest.tree_density() > Biome::Plains.tree_density());
        assert_eq!(Biome::Beach.tree_density(), 0.0);
    }

    #[test]
    fn test_both_lowland_biomes_reachable() {
        let classifier = BiomeClassifier::new(WorldSeed::new(12345), 24);
        let mut found = std::collections::HashSet::new();
        for x in (-2000..2000).step_by(40) {
            for z in (-2000..2000).step_by(40) {
                found.insert(classifier.classify(x, z, 30));
            }
        }
        assert!(found.contains(&Biome::Forest) && found.contains(&Biome::Plains), "found: {found:?}");
    }
}
