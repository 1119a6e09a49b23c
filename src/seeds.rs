//! Seed management for level generation
//!
//! Every generation stage gets its own seed, derived from a master seed by
//! default. Overriding one stage's seed leaves the others untouched, so e.g.
//! the islands can be rerolled on an otherwise identical level.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Seeds for all level generation stages.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Height step random walks
    pub terrain: u64,
    /// Grass noise fields
    pub grass: u64,
    /// Island placement and erosion
    pub islands: u64,
    /// Object spawning
    pub objects: u64,
    /// Middle tile selection during autotiling
    pub tiles: u64,
}

impl LevelSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            terrain: derive_seed(master, "terrain"),
            grass: derive_seed(master, "grass"),
            islands: derive_seed(master, "islands"),
            objects: derive_seed(master, "objects"),
            tiles: derive_seed(master, "tiles"),
        }
    }

    pub fn builder(master: u64) -> LevelSeedsBuilder {
        LevelSeedsBuilder::new(master)
    }

    pub fn terrain_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.terrain)
    }

    pub fn grass_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.grass)
    }

    pub fn islands_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.islands)
    }

    pub fn objects_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.objects)
    }

    pub fn tiles_rng(&self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.tiles)
    }
}

impl Default for LevelSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Builder for customizing individual seeds while deriving others from master
pub struct LevelSeedsBuilder {
    seeds: LevelSeeds,
}

impl LevelSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: LevelSeeds::from_master(master),
        }
    }

    pub fn terrain(mut self, seed: u64) -> Self {
        self.seeds.terrain = seed;
        self
    }

    pub fn grass(mut self, seed: u64) -> Self {
        self.seeds.grass = seed;
        self
    }

    pub fn islands(mut self, seed: u64) -> Self {
        self.seeds.islands = seed;
        self
    }

    pub fn objects(mut self, seed: u64) -> Self {
        self.seeds.objects = seed;
        self
    }

    pub fn tiles(mut self, seed: u64) -> Self {
        self.seeds.tiles = seed;
        self
    }

    pub fn build(self) -> LevelSeeds {
        self.seeds
    }
}

/// Hash a master seed together with a stage name.
fn derive_seed(master: u64, stage: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    stage.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for LevelSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LevelSeeds {{ master: {}, terrain: {}, grass: {}, islands: {}, objects: {}, tiles: {} }}",
            self.master, self.terrain, self.grass, self.islands, self.objects, self.tiles,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_derivation() {
        let a = LevelSeeds::from_master(12345);
        let b = LevelSeeds::from_master(12345);
        assert_eq!(a, b);
    }

    #[test]
    fn test_stages_get_different_seeds() {
        let seeds = LevelSeeds::from_master(12345);
        assert_ne!(seeds.terrain, seeds.grass);
        assert_ne!(seeds.grass, seeds.islands);
        assert_ne!(seeds.islands, seeds.objects);
        assert_ne!(seeds.objects, seeds.tiles);
    }

    #[test]
    fn test_builder_override() {
        let seeds = LevelSeeds::builder(12345).islands(99999).build();
        assert_eq!(seeds.islands, 99999);
        assert_eq!(seeds.terrain, LevelSeeds::from_master(12345).terrain);
    }
}
