//! Generator parameters, map size presets and JSON loading

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::coordinates::HexDirection;
use crate::error::HexMapError;

/// Map size offered when creating a new map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MapSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl MapSize {
    pub fn all() -> &'static [Self] {
        &[Self::Small, Self::Medium, Self::Large]
    }

    /// Cell counts `(x, z)` for this preset.
    pub fn dimensions(&self) -> (i32, i32) {
        match self {
            Self::Small => (20, 15),
            Self::Medium => (40, 30),
            Self::Large => (80, 60),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Small => "20 x 15 cells, a few landmasses",
            Self::Medium => "40 x 30 cells, room for several regions",
            Self::Large => "80 x 60 cells, continent scale",
        }
    }
}

impl std::fmt::Display for MapSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Small => write!(f, "small"),
            Self::Medium => write!(f, "medium"),
            Self::Large => write!(f, "large"),
        }
    }
}

impl std::str::FromStr for MapSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("unknown map size '{other}' (small, medium, large)")),
        }
    }
}

/// Which latitudes are warm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HemisphereMode {
    /// Warm equator across the middle row, cold at both edges
    #[default]
    Both,
    /// Warm at the bottom row, cold at the top
    North,
    /// Warm at the top row, cold at the bottom
    South,
}

impl HemisphereMode {
    pub fn all() -> &'static [Self] {
        &[Self::Both, Self::North, Self::South]
    }
}

impl std::fmt::Display for HemisphereMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Both => write!(f, "both"),
            Self::North => write!(f, "north"),
            Self::South => write!(f, "south"),
        }
    }
}

/// Every knob of the terrain pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Reuse `seed` instead of picking a fresh one each run
    pub use_fixed_seed: bool,
    /// Seed of the last run (written back when not fixed)
    pub seed: i32,

    // =========================================================================
    // Land growth
    // =========================================================================

    /// Chance that a grown cell gets a +1 flood priority, roughening chunk outlines
    pub jitter_probability: f32,
    pub chunk_size_min: i32,
    pub chunk_size_max: i32,
    /// Chance that a chunk raises (or sinks) by two steps instead of one
    pub high_rise_probability: f32,
    /// Chance that a growth round lowers terrain instead of raising it
    pub sink_probability: f32,
    /// Share of cells that should end up above water, in percent
    pub land_percentage: i32,
    pub water_level: i32,
    pub elevation_minimum: i32,
    pub elevation_maximum: i32,
    pub map_border_x: i32,
    pub map_border_z: i32,
    /// Gap kept between regions (and around the seam of wrapping maps)
    pub region_border: i32,
    pub region_count: i32,

    // =========================================================================
    // Erosion
    // =========================================================================

    /// Percentage of erodible cells to erode away
    pub erosion_percentage: i32,

    // =========================================================================
    // Climate
    // =========================================================================

    pub starting_moisture: f32,
    pub evaporation_factor: f32,
    pub precipitation_factor: f32,
    pub runoff_factor: f32,
    pub seepage_factor: f32,
    /// Direction the wind blows from
    pub wind_direction: HexDirection,
    pub wind_strength: f32,

    // =========================================================================
    // Rivers and biomes
    // =========================================================================

    /// River cells budget as a percentage of land cells
    pub river_percentage: i32,
    pub extra_lake_probability: f32,
    pub low_temperature: f32,
    pub high_temperature: f32,
    pub hemisphere: HemisphereMode,
    pub temperature_jitter: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            use_fixed_seed: false,
            seed: 0,
            jitter_probability: 0.25,
            chunk_size_min: 30,
            chunk_size_max: 100,
            high_rise_probability: 0.25,
            sink_probability: 0.2,
            land_percentage: 50,
            water_level: 3,
            elevation_minimum: -2,
            elevation_maximum: 8,
            map_border_x: 5,
            map_border_z: 5,
            region_border: 5,
            region_count: 1,
            erosion_percentage: 50,
            starting_moisture: 0.1,
            evaporation_factor: 0.5,
            precipitation_factor: 0.25,
            runoff_factor: 0.25,
            seepage_factor: 0.125,
            wind_direction: HexDirection::NW,
            wind_strength: 4.0,
            river_percentage: 10,
            extra_lake_probability: 0.25,
            low_temperature: 0.0,
            high_temperature: 1.0,
            hemisphere: HemisphereMode::Both,
            temperature_jitter: 0.1,
        }
    }
}

impl GeneratorConfig {
    /// Load a config from JSON. Missing fields take their defaults and the
    /// result is validated.
    pub fn from_json_file(path: &Path) -> Result<Self, HexMapError> {
        if !path.exists() {
            return Err(HexMapError::MissingFile(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)?;
        config.validate();
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, HexMapError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A fixed-seed copy of this config.
    pub fn with_seed(mut self, seed: i32) -> Self {
        self.use_fixed_seed = true;
        self.seed = seed & i32::MAX;
        self
    }

    /// Clamp every value into its supported range, warning about each
    /// change. Returns the number of fields that were adjusted.
    pub fn validate(&mut self) -> usize {
        let mut adjusted = 0;

        adjusted += clamp_f32("jitter_probability", &mut self.jitter_probability, 0.0, 0.5);
        adjusted += clamp_i32("chunk_size_min", &mut self.chunk_size_min, 20, 200);
        adjusted += clamp_i32("chunk_size_max", &mut self.chunk_size_max, 20, 200);
        adjusted += clamp_f32("high_rise_probability", &mut self.high_rise_probability, 0.0, 1.0);
        adjusted += clamp_f32("sink_probability", &mut self.sink_probability, 0.0, 0.4);
        adjusted += clamp_i32("land_percentage", &mut self.land_percentage, 5, 95);
        adjusted += clamp_i32("water_level", &mut self.water_level, 1, 5);
        adjusted += clamp_i32("elevation_minimum", &mut self.elevation_minimum, -4, 0);
        adjusted += clamp_i32("elevation_maximum", &mut self.elevation_maximum, 6, 10);
        adjusted += clamp_i32("map_border_x", &mut self.map_border_x, 0, 10);
        adjusted += clamp_i32("map_border_z", &mut self.map_border_z, 0, 10);
        adjusted += clamp_i32("region_border", &mut self.region_border, 0, 10);
        adjusted += clamp_i32("region_count", &mut self.region_count, 1, 4);
        adjusted += clamp_i32("erosion_percentage", &mut self.erosion_percentage, 0, 100);
        adjusted += clamp_f32("starting_moisture", &mut self.starting_moisture, 0.0, 1.0);
        adjusted += clamp_f32("evaporation_factor", &mut self.evaporation_factor, 0.0, 1.0);
        adjusted += clamp_f32("precipitation_factor", &mut self.precipitation_factor, 0.0, 1.0);
        adjusted += clamp_f32("runoff_factor", &mut self.runoff_factor, 0.0, 1.0);
        adjusted += clamp_f32("seepage_factor", &mut self.seepage_factor, 0.0, 1.0);
        adjusted += clamp_f32("wind_strength", &mut self.wind_strength, 1.0, 10.0);
        adjusted += clamp_i32("river_percentage", &mut self.river_percentage, 0, 20);
        adjusted += clamp_f32("extra_lake_probability", &mut self.extra_lake_probability, 0.0, 1.0);
        adjusted += clamp_f32("low_temperature", &mut self.low_temperature, 0.0, 1.0);
        adjusted += clamp_f32("high_temperature", &mut self.high_temperature, 0.0, 1.0);
        adjusted += clamp_f32("temperature_jitter", &mut self.temperature_jitter, 0.0, 1.0);

        if self.chunk_size_max < self.chunk_size_min {
            warn!(
                min = self.chunk_size_min,
                max = self.chunk_size_max,
                "chunk_size_max below chunk_size_min, raising it"
            );
            self.chunk_size_max = self.chunk_size_min;
            adjusted += 1;
        }

        adjusted
    }
}

fn clamp_i32(name: &str, value: &mut i32, min: i32, max: i32) -> usize {
    let clamped = (*value).clamp(min, max);
    if clamped != *value {
        warn!(field = name, value = *value, clamped, "config value out of range");
        *value = clamped;
        return 1;
    }
    0
}

fn clamp_f32(name: &str, value: &mut f32, min: f32, max: f32) -> usize {
    let clamped = if value.is_nan() { min } else { value.clamp(min, max) };
    if clamped != *value {
        warn!(field = name, value = *value, clamped, "config value out of range");
        *value = clamped;
        return 1;
    }
    0
}
