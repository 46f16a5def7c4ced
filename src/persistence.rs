//! Versioned binary map files.
//!
//! Layout (little-endian):
//!
//! ```text
//! i32 version
//! i32 width, i32 height          (version >= 1, else 20 x 15)
//! bool wrapping                  (version >= 5)
//! per cell, row-major:
//!   u8 terrain, u8 elevation (+127 from version 4), u8 water level,
//!   u8 urban, u8 farm, u8 plant, u8 special, bool walled,
//!   u8 incoming river (direction + 128, 0 = none), u8 outgoing river,
//!   u8 road mask, bool explored (version >= 3)
//! i32 unit count                 (version >= 2)
//! per unit: i32 x, i32 z, f32 orientation
//! ```
//!
//! Loading decodes everything into a [`MapSnapshot`] first, so a truncated or
//! unsupported file never leaves the grid half-written.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::{error, info, warn};

use crate::cell::TerrainType;
use crate::coordinates::{HexCoordinates, HexDirection};
use crate::error::HexMapError;
use crate::grid::{HexGrid, DEFAULT_CELL_COUNT_X, DEFAULT_CELL_COUNT_Z};

/// Newest map format this crate reads and the one it writes.
pub const MAP_FILE_VERSION: i32 = 5;

/// Conventional extension for map files.
pub const MAP_FILE_EXTENSION: &str = "map";

// =============================================================================
// Snapshot
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct CellRecord {
    pub terrain: TerrainType,
    pub elevation: i32,
    pub water_level: i32,
    pub urban_level: u8,
    pub farm_level: u8,
    pub plant_level: u8,
    pub special_index: u8,
    pub walled: bool,
    pub incoming_river: Option<HexDirection>,
    pub outgoing_river: Option<HexDirection>,
    pub roads: u8,
    pub explored: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnitRecord {
    pub coordinates: HexCoordinates,
    pub orientation: f32,
}

/// Fully decoded contents of a map file.
#[derive(Clone, Debug, PartialEq)]
pub struct MapSnapshot {
    pub version: i32,
    pub width: i32,
    pub height: i32,
    pub wrapping: bool,
    pub cells: Vec<CellRecord>,
    pub units: Vec<UnitRecord>,
}

impl MapSnapshot {
    pub fn capture(grid: &HexGrid) -> Self {
        let cells = grid
            .cells()
            .iter()
            .map(|cell| CellRecord {
                terrain: cell.terrain_type(),
                elevation: cell.elevation(),
                water_level: cell.water_level(),
                urban_level: cell.urban_level(),
                farm_level: cell.farm_level(),
                plant_level: cell.plant_level(),
                special_index: cell.special_index(),
                walled: cell.walled(),
                incoming_river: cell.incoming_river(),
                outgoing_river: cell.outgoing_river(),
                roads: cell.road_mask(),
                explored: cell.is_explored(),
            })
            .collect();

        let units = grid
            .units()
            .iter()
            .map(|unit| UnitRecord {
                coordinates: grid.cells()[unit.location()].coordinates(),
                orientation: unit.orientation(),
            })
            .collect();

        Self {
            version: MAP_FILE_VERSION,
            width: grid.cell_count_x(),
            height: grid.cell_count_z(),
            wrapping: grid.wrapping(),
            cells,
            units,
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), HexMapError> {
        writer.write_all(&MAP_FILE_VERSION.to_le_bytes())?;
        writer.write_all(&self.width.to_le_bytes())?;
        writer.write_all(&self.height.to_le_bytes())?;
        writer.write_all(&[self.wrapping as u8])?;

        for cell in &self.cells {
            let record = [
                cell.terrain.index(),
                (cell.elevation + 127).clamp(0, 255) as u8,
                cell.water_level.clamp(0, 255) as u8,
                cell.urban_level,
                cell.farm_level,
                cell.plant_level,
                cell.special_index,
                cell.walled as u8,
                encode_river(cell.incoming_river),
                encode_river(cell.outgoing_river),
                cell.roads,
                cell.explored as u8,
            ];
            writer.write_all(&record)?;
        }

        writer.write_all(&(self.units.len() as i32).to_le_bytes())?;
        for unit in &self.units {
            writer.write_all(&unit.coordinates.x().to_le_bytes())?;
            writer.write_all(&unit.coordinates.z().to_le_bytes())?;
            writer.write_all(&unit.orientation.to_le_bytes())?;
        }
        Ok(())
    }

    /// Decode a map file of any supported version.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, HexMapError> {
        let mut input = FieldReader { inner: reader };

        let version = input.i32()?;
        if version > MAP_FILE_VERSION || version < 0 {
            warn!(version, "unknown map format");
            return Err(HexMapError::UnknownVersion {
                found: version,
                supported: MAP_FILE_VERSION,
            });
        }

        let (width, height) = if version >= 1 {
            (input.i32()?, input.i32()?)
        } else {
            (DEFAULT_CELL_COUNT_X, DEFAULT_CELL_COUNT_Z)
        };
        if width <= 0 || height <= 0 {
            return Err(HexMapError::InvalidMapSize { width, height });
        }
        let wrapping = version >= 5 && input.bool()?;

        let count = width as usize * height as usize;
        let mut cells = Vec::with_capacity(count.min(1 << 20));
        for i in 0..count {
            let terrain_index = input.u8()?;
            let terrain = TerrainType::from_index(terrain_index).ok_or_else(|| {
                HexMapError::CorruptData(format!("cell {i}: terrain index {terrain_index}"))
            })?;
            let mut elevation = input.u8()? as i32;
            if version >= 4 {
                elevation -= 127;
            }
            cells.push(CellRecord {
                terrain,
                elevation,
                water_level: input.u8()? as i32,
                urban_level: input.u8()?,
                farm_level: input.u8()?,
                plant_level: input.u8()?,
                special_index: input.u8()?,
                walled: input.bool()?,
                incoming_river: decode_river(input.u8()?),
                outgoing_river: decode_river(input.u8()?),
                roads: input.u8()?,
                explored: version >= 3 && input.bool()?,
            });
        }

        let mut units = Vec::new();
        if version >= 2 {
            let unit_count = input.i32()?;
            if unit_count < 0 {
                return Err(HexMapError::CorruptData(format!("unit count {unit_count}")));
            }
            for _ in 0..unit_count {
                let x = input.i32()?;
                let z = input.i32()?;
                let orientation = input.f32()?;
                units.push(UnitRecord {
                    coordinates: HexCoordinates::new(x, z),
                    orientation,
                });
            }
        }

        Ok(Self {
            version,
            width,
            height,
            wrapping,
            cells,
            units,
        })
    }

    /// Replace the grid's contents with this snapshot. The grid is recreated
    /// when its size or wrapping differs.
    pub fn apply(&self, grid: &mut HexGrid) -> Result<(), HexMapError> {
        if self.width != grid.cell_count_x()
            || self.height != grid.cell_count_z()
            || self.wrapping != grid.wrapping()
        {
            grid.create_map(self.width, self.height, self.wrapping)?;
        } else {
            grid.clear_path();
            grid.clear_units();
        }

        for (index, record) in self.cells.iter().enumerate() {
            let cell = &mut grid.cells[index];
            cell.terrain_type = record.terrain;
            cell.elevation = record.elevation;
            cell.water_level = record.water_level;
            cell.urban_level = record.urban_level;
            cell.farm_level = record.farm_level;
            cell.plant_level = record.plant_level;
            cell.special_index = record.special_index;
            cell.walled = record.walled;
            cell.incoming_river = record.incoming_river;
            cell.outgoing_river = record.outgoing_river;
            for (i, road) in cell.roads.iter_mut().enumerate() {
                *road = record.roads & (1 << i) != 0;
            }
            cell.explored = record.explored;
            cell.visibility = 0;
            grid.refresh_position(index);
            grid.refresh_tracker_mut().mark_terrain(index);
            grid.refresh_tracker_mut().mark_visibility(index);
        }
        for chunk in 0..grid.chunk_count() {
            grid.refresh_tracker_mut().mark_chunk(chunk);
        }

        for unit in &self.units {
            let placed = grid
                .cell_index_at(unit.coordinates)
                .and_then(|cell| grid.add_unit(cell, unit.orientation));
            if placed.is_none() {
                warn!(coordinates = %unit.coordinates, "skipping unit that cannot be placed");
            }
        }
        Ok(())
    }
}

fn encode_river(direction: Option<HexDirection>) -> u8 {
    direction.map_or(0, |d| d.index() as u8 + 128)
}

fn decode_river(data: u8) -> Option<HexDirection> {
    (data >= 128).then(|| HexDirection::from_index((data - 128) as usize))
}

struct FieldReader<'a, R: Read> {
    inner: &'a mut R,
}

impl<R: Read> FieldReader<'_, R> {
    fn bytes<const N: usize>(&mut self) -> Result<[u8; N], HexMapError> {
        let mut buffer = [0u8; N];
        self.inner.read_exact(&mut buffer).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                HexMapError::CorruptData("unexpected end of map data".to_string())
            } else {
                HexMapError::Io(e)
            }
        })?;
        Ok(buffer)
    }

    fn u8(&mut self) -> Result<u8, HexMapError> {
        Ok(self.bytes::<1>()?[0])
    }

    fn bool(&mut self) -> Result<bool, HexMapError> {
        Ok(self.u8()? != 0)
    }

    fn i32(&mut self) -> Result<i32, HexMapError> {
        Ok(i32::from_le_bytes(self.bytes()?))
    }

    fn f32(&mut self) -> Result<f32, HexMapError> {
        Ok(f32::from_le_bytes(self.bytes()?))
    }
}

// =============================================================================
// Grid entry points
// =============================================================================

pub fn save_map<W: Write>(grid: &HexGrid, writer: &mut W) -> Result<(), HexMapError> {
    MapSnapshot::capture(grid).write_to(writer)
}

/// Load a map into `grid`. On any error the grid is left untouched.
pub fn load_map<R: Read>(grid: &mut HexGrid, reader: &mut R) -> Result<(), HexMapError> {
    let snapshot = MapSnapshot::read_from(reader)?;
    snapshot.apply(grid)
}

pub fn save_map_file(grid: &HexGrid, path: &Path) -> Result<(), HexMapError> {
    let mut writer = BufWriter::new(File::create(path)?);
    save_map(grid, &mut writer)?;
    writer.flush()?;
    info!(path = %path.display(), cells = grid.cell_count(), "saved map");
    Ok(())
}

pub fn load_map_file(grid: &mut HexGrid, path: &Path) -> Result<(), HexMapError> {
    if !path.exists() {
        error!(path = %path.display(), "file does not exist");
        return Err(HexMapError::MissingFile(path.to_path_buf()));
    }
    let mut reader = BufReader::new(File::open(path)?);
    load_map(grid, &mut reader)?;
    info!(
        path = %path.display(),
        width = grid.cell_count_x(),
        height = grid.cell_count_z(),
        units = grid.units().len(),
        "loaded map"
    );
    Ok(())
}
