//! Hex geometry metrics and the map-wide sampling configuration
//!
//! Constants describe the shape of a single hex and how elevation maps to
//! world height. [`MapMetrics`] bundles the state that used to live in globals
//! (wrap size, noise source, feature hash grid) into one explicit object that
//! the grid owns and hands to anything that needs to sample it.

use noise::{NoiseFn, Perlin};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

// =============================================================================
// CONSTANTS
// =============================================================================

pub const OUTER_TO_INNER: f32 = 0.866_025_4;
pub const INNER_TO_OUTER: f32 = 1.0 / OUTER_TO_INNER;

/// Distance from a cell center to its corners.
pub const OUTER_RADIUS: f32 = 10.0;
/// Distance from a cell center to the middle of its edges.
pub const INNER_RADIUS: f32 = OUTER_RADIUS * OUTER_TO_INNER;
pub const INNER_DIAMETER: f32 = INNER_RADIUS * 2.0;

/// World height of one elevation level.
pub const ELEVATION_STEP: f32 = 3.0;
pub const ELEVATION_PERTURB_STRENGTH: f32 = 1.5;
pub const CELL_PERTURB_STRENGTH: f32 = 4.0;

pub const STREAM_BED_ELEVATION_OFFSET: f32 = -1.75;
pub const WATER_ELEVATION_OFFSET: f32 = -0.5;

/// Cells per chunk along each axis. Map dimensions must be multiples of these.
pub const CHUNK_SIZE_X: usize = 5;
pub const CHUNK_SIZE_Z: usize = 5;

pub const NOISE_SCALE: f32 = 0.003;

pub const HASH_GRID_SIZE: usize = 256;
pub const HASH_GRID_SCALE: f32 = 0.25;

/// Perlin frequency applied on top of `NOISE_SCALE` so one noise "tile"
/// carries several features, like the original noise texture.
const NOISE_FEATURE_FREQUENCY: f64 = 8.0;

// =============================================================================
// VECTOR
// =============================================================================

/// Minimal 3D vector for cell positions (x east, y up, z north).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Heading in degrees of the horizontal component, 0 = +z, clockwise.
    pub fn heading_degrees(&self) -> f32 {
        self.x.atan2(self.z).to_degrees().rem_euclid(360.0)
    }
}

impl std::ops::Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl std::ops::Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Quadratic Bezier point.
pub fn bezier_point(a: Vec3, b: Vec3, c: Vec3, t: f32) -> Vec3 {
    let r = 1.0 - t;
    a * (r * r) + b * (2.0 * r * t) + c * (t * t)
}

/// Quadratic Bezier first derivative.
pub fn bezier_derivative(a: Vec3, b: Vec3, c: Vec3, t: f32) -> Vec3 {
    ((b - a) * (1.0 - t) + (c - b) * t) * 2.0
}

/// Unperturbed world position of the cell at offset `(column, row)`.
pub fn cell_center(column: i32, row: i32) -> Vec3 {
    Vec3::new(
        (column as f32 + row as f32 * 0.5 - (row / 2) as f32) * INNER_DIAMETER,
        0.0,
        row as f32 * (OUTER_RADIUS * 1.5),
    )
}

// =============================================================================
// EDGE TYPES
// =============================================================================

/// Relationship between two adjacent cells' elevations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HexEdgeType {
    Flat,
    Slope,
    Cliff,
}

pub fn edge_type(elevation1: i32, elevation2: i32) -> HexEdgeType {
    match elevation2 - elevation1 {
        0 => HexEdgeType::Flat,
        1 | -1 => HexEdgeType::Slope,
        _ => HexEdgeType::Cliff,
    }
}

// =============================================================================
// MAP METRICS
// =============================================================================

/// Five random values in `[0, 0.999)` used for feature placement decisions.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HexHash {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
}

impl HexHash {
    pub fn create(rng: &mut impl Rng) -> Self {
        Self {
            a: rng.gen::<f32>() * 0.999,
            b: rng.gen::<f32>() * 0.999,
            c: rng.gen::<f32>() * 0.999,
            d: rng.gen::<f32>() * 0.999,
            e: rng.gen::<f32>() * 0.999,
        }
    }
}

/// Map-wide sampling configuration: wrap size, noise source and hash grid.
#[derive(Clone)]
pub struct MapMetrics {
    wrap_size: i32,
    noise_seed: u32,
    noise: [Perlin; 4],
    hash_grid: Vec<HexHash>,
}

impl MapMetrics {
    pub fn new(noise_seed: u32, hash_seed: u64) -> Self {
        let mut metrics = Self {
            wrap_size: 0,
            noise_seed,
            noise: noise_channels(noise_seed),
            hash_grid: Vec::new(),
        };
        metrics.initialize_hash_grid(hash_seed);
        metrics
    }

    /// Number of columns after which the map wraps, 0 if it does not.
    pub fn wrap_size(&self) -> i32 {
        self.wrap_size
    }

    pub fn wrapping(&self) -> bool {
        self.wrap_size > 0
    }

    pub fn set_wrap_size(&mut self, wrap_size: i32) {
        self.wrap_size = wrap_size.max(0);
    }

    pub fn noise_seed(&self) -> u32 {
        self.noise_seed
    }

    /// Replace the noise source with one derived from a new seed.
    pub fn reseed_noise(&mut self, noise_seed: u32) {
        self.noise_seed = noise_seed;
        self.noise = noise_channels(noise_seed);
    }

    /// Rebuild the feature hash grid deterministically from `seed`.
    pub fn initialize_hash_grid(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.hash_grid = (0..HASH_GRID_SIZE * HASH_GRID_SIZE)
            .map(|_| HexHash::create(&mut rng))
            .collect();
    }

    pub fn sample_hash_grid(&self, position: Vec3) -> HexHash {
        let size = HASH_GRID_SIZE as i32;
        let x = ((position.x * HASH_GRID_SCALE) as i32).rem_euclid(size) as usize;
        let z = ((position.z * HASH_GRID_SCALE) as i32).rem_euclid(size) as usize;
        self.hash_grid[x + z * HASH_GRID_SIZE]
    }

    /// Four noise channels in `[0, 1]` at a world position. Near the west edge
    /// of a wrapping map the sample is blended with the one from the far side
    /// so the seam is invisible.
    pub fn sample_noise(&self, position: Vec3) -> [f32; 4] {
        let sample = self.sample_raw(position.x, position.z);

        if self.wrapping() && position.x < INNER_DIAMETER * 1.5 {
            let far = self.sample_raw(position.x + self.wrap_size as f32 * INNER_DIAMETER, position.z);
            let t = (position.x * (1.0 / INNER_DIAMETER) - 0.5).clamp(0.0, 1.0);
            let mut blended = [0.0f32; 4];
            for (i, value) in blended.iter_mut().enumerate() {
                *value = far[i] + (sample[i] - far[i]) * t;
            }
            return blended;
        }

        sample
    }

    /// Jitter a position horizontally for irregular cell outlines.
    pub fn perturb(&self, mut position: Vec3) -> Vec3 {
        let sample = self.sample_noise(position);
        position.x += (sample[0] * 2.0 - 1.0) * CELL_PERTURB_STRENGTH;
        position.z += (sample[2] * 2.0 - 1.0) * CELL_PERTURB_STRENGTH;
        position
    }

    fn sample_raw(&self, x: f32, z: f32) -> [f32; 4] {
        let u = (x * NOISE_SCALE) as f64 * NOISE_FEATURE_FREQUENCY;
        let v = (z * NOISE_SCALE) as f64 * NOISE_FEATURE_FREQUENCY;
        let mut out = [0.0f32; 4];
        for (channel, perlin) in self.noise.iter().enumerate() {
            out[channel] = (perlin.get([u, v]) as f32 * 0.5 + 0.5).clamp(0.0, 1.0);
        }
        out
    }
}

impl Default for MapMetrics {
    fn default() -> Self {
        Self::new(0, 1234)
    }
}

impl std::fmt::Debug for MapMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapMetrics")
            .field("wrap_size", &self.wrap_size)
            .field("noise_seed", &self.noise_seed)
            .finish_non_exhaustive()
    }
}

fn noise_channels(seed: u32) -> [Perlin; 4] {
    [
        Perlin::new(seed),
        Perlin::new(seed.wrapping_add(1)),
        Perlin::new(seed.wrapping_add(2)),
        Perlin::new(seed.wrapping_add(3)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_types() {
        assert_eq!(edge_type(2, 2), HexEdgeType::Flat);
        assert_eq!(edge_type(2, 3), HexEdgeType::Slope);
        assert_eq!(edge_type(3, 2), HexEdgeType::Slope);
        assert_eq!(edge_type(0, 2), HexEdgeType::Cliff);
        assert_eq!(edge_type(5, -1), HexEdgeType::Cliff);
    }

    #[test]
    fn test_noise_in_unit_range() {
        let metrics = MapMetrics::new(7, 7);
        for i in 0..50 {
            let sample = metrics.sample_noise(Vec3::new(i as f32 * 13.7, 0.0, i as f32 * 5.1));
            for value in sample {
                assert!((0.0..=1.0).contains(&value));
            }
        }
    }

    #[test]
    fn test_hash_grid_is_deterministic() {
        let a = MapMetrics::new(1, 99);
        let b = MapMetrics::new(2, 99);
        let position = Vec3::new(123.0, 0.0, -45.0);
        assert_eq!(a.sample_hash_grid(position), b.sample_hash_grid(position));
        let hash = a.sample_hash_grid(position);
        assert!(hash.a < 0.999 && hash.e >= 0.0);
    }

    #[test]
    fn test_bezier_endpoints() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(5.0, 0.0, 5.0);
        let c = Vec3::new(10.0, 0.0, 0.0);
        assert_eq!(bezier_point(a, b, c, 0.0), a);
        assert_eq!(bezier_point(a, b, c, 1.0), c);
    }
}
