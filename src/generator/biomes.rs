//! Biome assignment from temperature and moisture
//!
//! Land cells look up a (terrain, plant level) pair in a 4 x 4 table indexed
//! by temperature band and moisture band, then get adjusted for altitude and
//! rivers. Submerged cells pick a seabed material from their depth and the
//! shape of the shore around them.

use tracing::debug;

use crate::cell::TerrainType;

use super::{GenerationRun, HemisphereMode};

/// Upper bounds of the cold, cool and temperate bands.
pub const TEMPERATURE_BANDS: [f32; 3] = [0.1, 0.3, 0.6];

/// Upper bounds of the dry, semi-dry and moist bands.
pub const MOISTURE_BANDS: [f32; 3] = [0.12, 0.28, 0.85];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Biome {
    pub terrain: TerrainType,
    pub plant: u8,
}

impl Biome {
    const fn new(terrain: TerrainType, plant: u8) -> Self {
        Self { terrain, plant }
    }
}

/// Land biomes, row per temperature band, column per moisture band.
#[rustfmt::skip]
pub const BIOMES: [Biome; 16] = [
    Biome::new(TerrainType::Sand, 0), Biome::new(TerrainType::Snow, 0),  Biome::new(TerrainType::Snow, 0),  Biome::new(TerrainType::Snow, 0),
    Biome::new(TerrainType::Sand, 0), Biome::new(TerrainType::Mud, 0),   Biome::new(TerrainType::Mud, 1),   Biome::new(TerrainType::Mud, 2),
    Biome::new(TerrainType::Sand, 0), Biome::new(TerrainType::Grass, 0), Biome::new(TerrainType::Grass, 1), Biome::new(TerrainType::Grass, 2),
    Biome::new(TerrainType::Sand, 0), Biome::new(TerrainType::Grass, 1), Biome::new(TerrainType::Grass, 2), Biome::new(TerrainType::Grass, 3),
];

fn band(value: f32, bounds: &[f32; 3]) -> usize {
    bounds.iter().position(|&bound| value < bound).unwrap_or(bounds.len())
}

/// Biome of a dry cell.
pub fn land_biome(
    temperature: f32,
    moisture: f32,
    elevation: i32,
    has_river: bool,
    rock_desert_elevation: i32,
    elevation_maximum: i32,
) -> Biome {
    let t = band(temperature, &TEMPERATURE_BANDS);
    let m = band(moisture, &MOISTURE_BANDS);
    let mut biome = BIOMES[t * 4 + m];

    if biome.terrain == TerrainType::Sand {
        if elevation >= rock_desert_elevation {
            biome.terrain = TerrainType::Stone;
        }
    } else if elevation == elevation_maximum {
        biome.terrain = TerrainType::Snow;
    }

    if biome.terrain == TerrainType::Snow {
        biome.plant = 0;
    } else if biome.plant < 3 && has_river {
        biome.plant += 1;
    }
    biome
}

impl GenerationRun<'_> {
    pub(crate) fn set_terrain_types(&mut self) {
        let jitter_channel = self.range(0, 4) as usize;
        let water_level = self.config.water_level;
        let elevation_maximum = self.config.elevation_maximum;
        let rock_desert_elevation = elevation_maximum - (elevation_maximum - water_level) / 2;

        for index in 0..self.cell_count {
            let temperature = self.determine_temperature(index, jitter_channel);
            let moisture = self.climate.get(index).map_or(0.0, |c| c.moisture);
            let cell = &self.grid.cells[index];

            if !cell.is_underwater() {
                let biome = land_biome(
                    temperature,
                    moisture,
                    cell.elevation,
                    cell.has_river(),
                    rock_desert_elevation,
                    elevation_maximum,
                );
                self.grid.set_terrain_type(index, biome.terrain);
                self.grid.set_plant_level(index, biome.plant);
                continue;
            }

            let mut terrain = if cell.elevation == water_level - 1 {
                self.shore_terrain(index)
            } else if cell.elevation >= water_level {
                TerrainType::Grass
            } else if cell.elevation < 0 {
                TerrainType::Stone
            } else {
                TerrainType::Mud
            };
            // frozen shallows
            if terrain == TerrainType::Grass && temperature < TEMPERATURE_BANDS[0] {
                terrain = TerrainType::Mud;
            }
            self.grid.set_terrain_type(index, terrain);
        }

        debug!(jitter_channel, "terrain types assigned");
    }

    /// Seabed just below the coastline: cliffs give stone, gentle shores
    /// give sand, crowded shores and open shallows give grass.
    fn shore_terrain(&self, index: usize) -> TerrainType {
        let cell = &self.grid.cells[index];
        let mut cliffs = 0;
        let mut slopes = 0;
        for (_, n) in cell.neighbors() {
            let delta = self.grid.cells[n].elevation - cell.water_level;
            if delta == 0 {
                slopes += 1;
            } else if delta > 0 {
                cliffs += 1;
            }
        }

        if cliffs + slopes > 3 {
            TerrainType::Grass
        } else if cliffs > 0 {
            TerrainType::Stone
        } else if slopes > 0 {
            TerrainType::Sand
        } else {
            TerrainType::Grass
        }
    }

    /// Temperature from latitude, cooled by altitude and jittered by noise.
    pub(crate) fn determine_temperature(&self, index: usize, jitter_channel: usize) -> f32 {
        let config = self.config;
        let cell = &self.grid.cells[index];

        let mut latitude = cell.coordinates.z() as f32 / self.grid.cell_count_z() as f32;
        match config.hemisphere {
            HemisphereMode::Both => {
                latitude *= 2.0;
                if latitude > 1.0 {
                    latitude = 2.0 - latitude;
                }
            }
            HemisphereMode::North => latitude = 1.0 - latitude,
            HemisphereMode::South => {}
        }

        let mut temperature =
            config.low_temperature + (config.high_temperature - config.low_temperature) * latitude;
        temperature *= 1.0
            - (cell.view_elevation() - config.water_level) as f32
                / ((config.elevation_maximum - config.water_level) as f32 + 1.0);

        let jitter = self.grid.metrics().sample_noise(cell.position * 0.1)[jitter_channel];
        temperature + (jitter * 2.0 - 1.0) * config.temperature_jitter
    }
}
