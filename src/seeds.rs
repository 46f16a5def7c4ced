//! Seed management for map generation
//!
//! One master seed drives everything random about a map: the generator's
//! pipeline, the noise source that perturbs cell heights and the feature hash
//! grid. Each gets its own derived seed so they can be varied independently.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::metrics::MapMetrics;

/// Seeds for the map-level random systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapSeeds {
    /// Master seed (used for display/reference)
    pub master: u64,
    /// Terrain pipeline seed, kept to 31 bits like the generator's own seeds
    pub generator: i32,
    /// Perlin noise source for height and outline perturbation
    pub noise: u32,
    /// Feature hash grid
    pub hash_grid: u64,
}

impl MapSeeds {
    /// Create seeds from a master seed, deriving all sub-seeds deterministically.
    pub fn from_master(master: u64) -> Self {
        Self {
            master,
            generator: (derive_seed(master, "generator") as i32) & i32::MAX,
            noise: derive_seed(master, "noise") as u32,
            hash_grid: derive_seed(master, "hash_grid"),
        }
    }

    pub fn builder(master: u64) -> MapSeedsBuilder {
        MapSeedsBuilder::new(master)
    }

    /// Metrics seeded from the noise and hash grid seeds.
    pub fn metrics(&self) -> MapMetrics {
        MapMetrics::new(self.noise, self.hash_grid)
    }
}

impl Default for MapSeeds {
    fn default() -> Self {
        Self::from_master(rand::random())
    }
}

/// Builder for overriding individual seeds while deriving the others
pub struct MapSeedsBuilder {
    seeds: MapSeeds,
}

impl MapSeedsBuilder {
    pub fn new(master: u64) -> Self {
        Self {
            seeds: MapSeeds::from_master(master),
        }
    }

    pub fn generator(mut self, seed: i32) -> Self {
        self.seeds.generator = seed & i32::MAX;
        self
    }

    pub fn noise(mut self, seed: u32) -> Self {
        self.seeds.noise = seed;
        self
    }

    pub fn hash_grid(mut self, seed: u64) -> Self {
        self.seeds.hash_grid = seed;
        self
    }

    pub fn build(self) -> MapSeeds {
        self.seeds
    }
}

/// Derive a sub-seed from a master seed and a system name.
fn derive_seed(master: u64, system: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    master.hash(&mut hasher);
    system.hash(&mut hasher);
    hasher.finish()
}

impl std::fmt::Display for MapSeeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MapSeeds {{ master: {}, generator: {}, noise: {}, hash_grid: {} }}",
            self.master, self.generator, self.noise, self.hash_grid,
        )
    }
}
