//! Per-cell state of the hex grid
//!
//! A [`HexCell`] is a node in the grid's cell array. It stores terrain
//! attributes, river and road edges, fog-of-war counters and the bookkeeping
//! used by grid searches. Neighbors are cell indices into the same array.
//!
//! Mutations that touch more than one cell (rivers, roads, elevation) live on
//! [`HexGrid`](crate::grid::HexGrid) so the grid can keep both sides of an edge
//! consistent. This module only exposes read accessors and self-contained
//! updates.

use serde::{Deserialize, Serialize};

use crate::coordinates::{HexCoordinates, HexDirection};
use crate::metrics::{
    Vec3, ELEVATION_STEP, STREAM_BED_ELEVATION_OFFSET, WATER_ELEVATION_OFFSET,
};
use crate::unit::UnitId;

/// Terrain material of a cell, stored as its index in saves and textures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Sand,
    Grass,
    Mud,
    Stone,
    Snow,
}

impl TerrainType {
    pub fn all() -> &'static [Self] {
        &[Self::Sand, Self::Grass, Self::Mud, Self::Stone, Self::Snow]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::all().get(index as usize).copied()
    }
}

impl std::fmt::Display for TerrainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sand => write!(f, "sand"),
            Self::Grass => write!(f, "grass"),
            Self::Mud => write!(f, "mud"),
            Self::Stone => write!(f, "stone"),
            Self::Snow => write!(f, "snow"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HexCell {
    pub(crate) coordinates: HexCoordinates,
    pub(crate) index: usize,
    pub(crate) column_index: usize,
    pub(crate) chunk_index: usize,
    pub(crate) explorable: bool,
    pub(crate) position: Vec3,

    pub(crate) neighbors: [Option<usize>; 6],
    pub(crate) roads: [bool; 6],
    pub(crate) incoming_river: Option<HexDirection>,
    pub(crate) outgoing_river: Option<HexDirection>,

    pub(crate) elevation: i32,
    pub(crate) water_level: i32,
    pub(crate) terrain_type: TerrainType,
    pub(crate) urban_level: u8,
    pub(crate) farm_level: u8,
    pub(crate) plant_level: u8,
    pub(crate) special_index: u8,
    pub(crate) walled: bool,

    pub(crate) visibility: u32,
    pub(crate) explored: bool,
    pub(crate) unit: Option<UnitId>,

    // search bookkeeping, valid only while `search_phase` matches the search
    pub(crate) distance: i32,
    pub(crate) search_heuristic: i32,
    pub(crate) search_phase: u32,
    pub(crate) path_from: Option<usize>,
}

impl HexCell {
    pub(crate) fn new(
        coordinates: HexCoordinates,
        index: usize,
        column_index: usize,
        chunk_index: usize,
        explorable: bool,
        position: Vec3,
    ) -> Self {
        Self {
            coordinates,
            index,
            column_index,
            chunk_index,
            explorable,
            position,
            neighbors: [None; 6],
            roads: [false; 6],
            incoming_river: None,
            outgoing_river: None,
            elevation: 0,
            water_level: 0,
            terrain_type: TerrainType::default(),
            urban_level: 0,
            farm_level: 0,
            plant_level: 0,
            special_index: 0,
            walled: false,
            visibility: 0,
            explored: false,
            unit: None,
            distance: 0,
            search_heuristic: 0,
            search_phase: 0,
            path_from: None,
        }
    }

    // =========================================================================
    // Identity and topology
    // =========================================================================

    pub fn coordinates(&self) -> HexCoordinates {
        self.coordinates
    }

    /// Position in the grid's row-major cell array.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Chunk column the cell belongs to (used for wrap-seam handling).
    pub fn column_index(&self) -> usize {
        self.column_index
    }

    /// Render chunk that owns this cell.
    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn neighbor(&self, direction: HexDirection) -> Option<usize> {
        self.neighbors[direction.index()]
    }

    pub fn neighbors(&self) -> impl Iterator<Item = (HexDirection, usize)> + '_ {
        HexDirection::ALL
            .iter()
            .filter_map(move |&d| self.neighbors[d.index()].map(|n| (d, n)))
    }

    // =========================================================================
    // Terrain
    // =========================================================================

    pub fn elevation(&self) -> i32 {
        self.elevation
    }

    pub fn water_level(&self) -> i32 {
        self.water_level
    }

    pub fn terrain_type(&self) -> TerrainType {
        self.terrain_type
    }

    pub fn urban_level(&self) -> u8 {
        self.urban_level
    }

    pub fn farm_level(&self) -> u8 {
        self.farm_level
    }

    pub fn plant_level(&self) -> u8 {
        self.plant_level
    }

    pub fn special_index(&self) -> u8 {
        self.special_index
    }

    pub fn is_special(&self) -> bool {
        self.special_index > 0
    }

    pub fn walled(&self) -> bool {
        self.walled
    }

    pub fn is_underwater(&self) -> bool {
        self.water_level > self.elevation
    }

    /// Height that matters for line of sight: the water surface if submerged.
    pub fn view_elevation(&self) -> i32 {
        self.elevation.max(self.water_level)
    }

    // =========================================================================
    // Rivers and roads
    // =========================================================================

    pub fn incoming_river(&self) -> Option<HexDirection> {
        self.incoming_river
    }

    pub fn outgoing_river(&self) -> Option<HexDirection> {
        self.outgoing_river
    }

    pub fn has_incoming_river(&self) -> bool {
        self.incoming_river.is_some()
    }

    pub fn has_outgoing_river(&self) -> bool {
        self.outgoing_river.is_some()
    }

    pub fn has_river(&self) -> bool {
        self.incoming_river.is_some() || self.outgoing_river.is_some()
    }

    /// True for a river source or mouth.
    pub fn has_river_begin_or_end(&self) -> bool {
        self.incoming_river.is_some() != self.outgoing_river.is_some()
    }

    pub fn river_begin_or_end_direction(&self) -> Option<HexDirection> {
        self.incoming_river.or(self.outgoing_river)
    }

    pub fn has_river_through_edge(&self, direction: HexDirection) -> bool {
        self.incoming_river == Some(direction) || self.outgoing_river == Some(direction)
    }

    pub fn has_road_through_edge(&self, direction: HexDirection) -> bool {
        self.roads[direction.index()]
    }

    pub fn has_roads(&self) -> bool {
        self.roads.iter().any(|&road| road)
    }

    /// Road flags packed into a byte, bit `i` for direction `i`.
    pub fn road_mask(&self) -> u8 {
        let mut mask = 0u8;
        for (i, &road) in self.roads.iter().enumerate() {
            if road {
                mask |= 1 << i;
            }
        }
        mask
    }

    // =========================================================================
    // Renderer-facing geometry
    // =========================================================================

    /// World position including the noise-perturbed elevation height.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn stream_bed_y(&self) -> f32 {
        (self.elevation as f32 + STREAM_BED_ELEVATION_OFFSET) * ELEVATION_STEP
    }

    pub fn river_surface_y(&self) -> f32 {
        (self.elevation as f32 + WATER_ELEVATION_OFFSET) * ELEVATION_STEP
    }

    pub fn water_surface_y(&self) -> f32 {
        (self.water_level as f32 + WATER_ELEVATION_OFFSET) * ELEVATION_STEP
    }

    // =========================================================================
    // Fog of war
    // =========================================================================

    /// Border cells are excluded from fog of war so map edges stay hidden.
    pub fn explorable(&self) -> bool {
        self.explorable
    }

    pub fn is_visible(&self) -> bool {
        self.visibility > 0 && self.explorable
    }

    pub fn is_explored(&self) -> bool {
        self.explored && self.explorable
    }

    pub fn visibility(&self) -> u32 {
        self.visibility
    }

    /// Returns true if the cell just became visible.
    pub(crate) fn increase_visibility(&mut self) -> bool {
        self.visibility += 1;
        if self.visibility == 1 {
            self.explored = true;
            return true;
        }
        false
    }

    /// Returns true if the cell just stopped being visible.
    pub(crate) fn decrease_visibility(&mut self) -> bool {
        if self.visibility == 0 {
            return false;
        }
        self.visibility -= 1;
        self.visibility == 0
    }

    /// Returns true if the cell was visible before the reset.
    pub(crate) fn reset_visibility(&mut self) -> bool {
        if self.visibility > 0 {
            self.visibility = 0;
            return true;
        }
        false
    }

    // =========================================================================
    // Units and search
    // =========================================================================

    pub fn unit(&self) -> Option<UnitId> {
        self.unit
    }

    /// Accumulated cost of the most recent search that reached this cell.
    pub fn distance(&self) -> i32 {
        self.distance
    }

    pub fn search_priority(&self) -> usize {
        (self.distance + self.search_heuristic).max(0) as usize
    }

    pub fn path_from(&self) -> Option<usize> {
        self.path_from
    }
}
