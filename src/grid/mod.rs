//! The hex grid: cell array, topology and lookups
//!
//! Cells are stored row-major by offset coordinates and refer to their
//! neighbors by index. Mutations that must keep both sides of an edge
//! consistent live in [`edit`]; searches (pathfinding and line of sight) in
//! [`search`]; the unit registry and travel animation in [`units`].
//!
//! The grid does not render. Geometry-relevant changes are reported through
//! the [`RefreshTracker`] and a renderer drains them once per frame after
//! calling [`HexGrid::tick`].

pub mod edit;
pub mod search;
pub mod units;

use tracing::{debug, error};

use crate::cell::HexCell;
use crate::coordinates::{HexCoordinates, HexDirection};
use crate::error::HexMapError;
use crate::metrics::{cell_center, MapMetrics, Vec3, CHUNK_SIZE_X, CHUNK_SIZE_Z, ELEVATION_PERTURB_STRENGTH, ELEVATION_STEP};
use crate::queue::PriorityBucketQueue;
use crate::refresh::RefreshTracker;
use crate::unit::HexUnit;

pub use search::HexPath;

/// Map created by [`HexGrid::default`], matching the smallest preset.
pub const DEFAULT_CELL_COUNT_X: i32 = 20;
pub const DEFAULT_CELL_COUNT_Z: i32 = 15;

pub struct HexGrid {
    cell_count_x: i32,
    cell_count_z: i32,
    chunk_count_x: usize,
    chunk_count_z: usize,
    wrapping: bool,

    pub(crate) cells: Vec<HexCell>,
    pub(crate) metrics: MapMetrics,
    refresh: RefreshTracker,

    search_frontier: PriorityBucketQueue,
    search_frontier_phase: u32,
    current_path: Option<HexPath>,

    units: Vec<HexUnit>,
    next_unit_id: u32,
}

impl HexGrid {
    /// An empty grid using `metrics` for noise and hashing. Call
    /// [`create_map`](Self::create_map) before use.
    pub fn new(metrics: MapMetrics) -> Self {
        Self {
            cell_count_x: 0,
            cell_count_z: 0,
            chunk_count_x: 0,
            chunk_count_z: 0,
            wrapping: false,
            cells: Vec::new(),
            metrics,
            refresh: RefreshTracker::default(),
            search_frontier: PriorityBucketQueue::default(),
            search_frontier_phase: 0,
            current_path: None,
            units: Vec::new(),
            next_unit_id: 1,
        }
    }

    /// Create a grid of the given size in one step.
    pub fn with_size(
        cell_count_x: i32,
        cell_count_z: i32,
        wrapping: bool,
        metrics: MapMetrics,
    ) -> Result<Self, HexMapError> {
        let mut grid = Self::new(metrics);
        grid.create_map(cell_count_x, cell_count_z, wrapping)?;
        Ok(grid)
    }

    /// Replace the whole cell array with a flat map of the given size.
    ///
    /// Both dimensions must be positive multiples of the chunk size. On
    /// failure the grid is left exactly as it was.
    pub fn create_map(&mut self, x: i32, z: i32, wrapping: bool) -> Result<(), HexMapError> {
        if x <= 0
            || x % CHUNK_SIZE_X as i32 != 0
            || z <= 0
            || z % CHUNK_SIZE_Z as i32 != 0
            || x.checked_mul(z).is_none()
        {
            error!(width = x, height = z, "unsupported map size");
            return Err(HexMapError::InvalidMapSize { width: x, height: z });
        }

        self.clear_path();
        self.clear_units();

        self.cell_count_x = x;
        self.cell_count_z = z;
        self.wrapping = wrapping;
        self.metrics.set_wrap_size(if wrapping { x } else { 0 });
        self.chunk_count_x = x as usize / CHUNK_SIZE_X;
        self.chunk_count_z = z as usize / CHUNK_SIZE_Z;

        self.refresh.reset();
        let cell_count = x as usize * z as usize;
        self.cells = Vec::with_capacity(cell_count);
        self.search_frontier = PriorityBucketQueue::new(cell_count);
        self.search_frontier_phase = 0;

        let mut i = 0;
        for row in 0..z {
            for column in 0..x {
                self.create_cell(column, row, i);
                i += 1;
            }
        }
        for chunk in 0..self.chunk_count() {
            self.refresh.mark_chunk(chunk);
        }

        debug!(width = x, height = z, wrapping, chunks = self.chunk_count(), "created map");
        Ok(())
    }

    fn create_cell(&mut self, x: i32, z: i32, i: usize) {
        let column_index = x as usize / CHUNK_SIZE_X;
        let chunk_index = column_index + (z as usize / CHUNK_SIZE_Z) * self.chunk_count_x;
        let explorable = if self.wrapping {
            z > 0 && z < self.cell_count_z - 1
        } else {
            x > 0 && z > 0 && x < self.cell_count_x - 1 && z < self.cell_count_z - 1
        };

        let mut position = cell_center(x, z);
        position.y = self.elevated_y(position, 0);
        self.cells.push(HexCell::new(
            HexCoordinates::from_offset_coordinates(x, z),
            i,
            column_index,
            chunk_index,
            explorable,
            position,
        ));

        let width = self.cell_count_x as usize;
        let xu = x as usize;
        if x > 0 {
            self.link(i, HexDirection::W, i - 1);
            if self.wrapping && x == self.cell_count_x - 1 {
                self.link(i, HexDirection::E, i - xu);
            }
        }
        if z > 0 {
            if z & 1 == 0 {
                self.link(i, HexDirection::SE, i - width);
                if x > 0 {
                    self.link(i, HexDirection::SW, i - width - 1);
                } else if self.wrapping {
                    self.link(i, HexDirection::SW, i - 1);
                }
            } else {
                self.link(i, HexDirection::SW, i - width);
                if x < self.cell_count_x - 1 {
                    self.link(i, HexDirection::SE, i - width + 1);
                } else if self.wrapping {
                    self.link(i, HexDirection::SE, i + 1 - width * 2);
                }
            }
        }
    }

    /// Set `a`'s neighbor in `direction` to `b`, and `b`'s opposite to `a`.
    fn link(&mut self, a: usize, direction: HexDirection, b: usize) {
        self.cells[a].neighbors[direction.index()] = Some(b);
        self.cells[b].neighbors[direction.opposite().index()] = Some(a);
    }

    /// Height of a cell at `elevation`, jittered by the noise source.
    fn elevated_y(&self, position: Vec3, elevation: i32) -> f32 {
        let noise = self.metrics.sample_noise(position);
        elevation as f32 * ELEVATION_STEP + (noise[1] * 2.0 - 1.0) * ELEVATION_PERTURB_STRENGTH
    }

    // =========================================================================
    // Dimensions
    // =========================================================================

    pub fn cell_count_x(&self) -> i32 {
        self.cell_count_x
    }

    pub fn cell_count_z(&self) -> i32 {
        self.cell_count_z
    }

    pub fn wrapping(&self) -> bool {
        self.wrapping
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn chunk_count_x(&self) -> usize {
        self.chunk_count_x
    }

    pub fn chunk_count_z(&self) -> usize {
        self.chunk_count_z
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count_x * self.chunk_count_z
    }

    pub fn metrics(&self) -> &MapMetrics {
        &self.metrics
    }

    /// Reseed the noise source and hash grid, then move every cell to its new
    /// perturbed height.
    pub fn reseed(&mut self, noise_seed: u32, hash_seed: u64) {
        self.metrics.reseed_noise(noise_seed);
        self.metrics.initialize_hash_grid(hash_seed);
        for index in 0..self.cells.len() {
            self.refresh_position(index);
        }
        for chunk in 0..self.chunk_count() {
            self.refresh.mark_chunk(chunk);
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn cells(&self) -> &[HexCell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> Option<&HexCell> {
        self.cells.get(index)
    }

    /// Index of the cell at offset `(x, z)`.
    pub fn cell_index_at_offset(&self, x: i32, z: i32) -> Option<usize> {
        if x < 0 || x >= self.cell_count_x || z < 0 || z >= self.cell_count_z {
            return None;
        }
        Some((x + z * self.cell_count_x) as usize)
    }

    pub fn cell_at_offset(&self, x: i32, z: i32) -> Option<&HexCell> {
        self.cell_index_at_offset(x, z).map(|i| &self.cells[i])
    }

    /// Index of the cell with the given cube coordinates, `None` outside the map.
    pub fn cell_index_at(&self, coordinates: HexCoordinates) -> Option<usize> {
        let z = coordinates.z();
        if z < 0 || z >= self.cell_count_z {
            return None;
        }
        let x = coordinates.x() + z / 2;
        if x < 0 || x >= self.cell_count_x {
            return None;
        }
        Some((x + z * self.cell_count_x) as usize)
    }

    /// Index of the cell under a world position.
    pub fn cell_index_at_position(&self, position: Vec3) -> Option<usize> {
        let coordinates = HexCoordinates::from_position(position, self.metrics.wrap_size());
        self.cell_index_at(coordinates)
    }

    pub fn neighbor(&self, index: usize, direction: HexDirection) -> Option<usize> {
        self.cells.get(index).and_then(|cell| cell.neighbor(direction))
    }

    /// Cube distance between two cells, taking wrapping into account.
    pub fn distance(&self, a: usize, b: usize) -> i32 {
        let (Some(a), Some(b)) = (self.cells.get(a), self.cells.get(b)) else {
            return 0;
        };
        a.coordinates()
            .wrapped_distance_to(&b.coordinates(), self.metrics.wrap_size())
    }

    // =========================================================================
    // Frame driver
    // =========================================================================

    pub fn refresh_tracker(&self) -> &RefreshTracker {
        &self.refresh
    }

    pub fn refresh_tracker_mut(&mut self) -> &mut RefreshTracker {
        &mut self.refresh
    }

    /// Advance the grid by one frame: apply a pending visibility reset, then
    /// move traveling units along their paths.
    pub fn tick(&mut self, delta_seconds: f32) {
        if self.refresh.take_visibility_reset() {
            self.reset_visibility();
        }
        self.advance_units(delta_seconds);
    }
}

impl Default for HexGrid {
    fn default() -> Self {
        let mut grid = Self::new(MapMetrics::default());
        // the default dimensions are valid multiples of the chunk size
        let _ = grid.create_map(DEFAULT_CELL_COUNT_X, DEFAULT_CELL_COUNT_Z, false);
        grid
    }
}

impl std::fmt::Debug for HexGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HexGrid")
            .field("cell_count_x", &self.cell_count_x)
            .field("cell_count_z", &self.cell_count_z)
            .field("wrapping", &self.wrapping)
            .field("units", &self.units.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(x: i32, z: i32, wrapping: bool) -> HexGrid {
        HexGrid::with_size(x, z, wrapping, MapMetrics::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_sizes() {
        let mut g = grid(10, 10, false);
        assert!(matches!(
            g.create_map(12, 10, false),
            Err(HexMapError::InvalidMapSize { width: 12, height: 10 })
        ));
        assert!(g.create_map(0, 5, false).is_err());
        assert!(g.create_map(5, -5, false).is_err());
        // cell count would not fit in an i32
        assert!(matches!(
            g.create_map(50000, 50000, true),
            Err(HexMapError::InvalidMapSize { width: 50000, height: 50000 })
        ));
        // grid left untouched
        assert_eq!(g.cell_count_x(), 10);
        assert_eq!(g.cell_count(), 100);
    }

    #[test]
    fn test_neighbors_are_symmetric() {
        for wrapping in [false, true] {
            let g = grid(10, 10, wrapping);
            for cell in g.cells() {
                for (direction, neighbor) in cell.neighbors() {
                    assert_eq!(
                        g.cells()[neighbor].neighbor(direction.opposite()),
                        Some(cell.index())
                    );
                }
            }
        }
    }

    #[test]
    fn test_neighbor_counts() {
        let g = grid(10, 10, false);
        let interior = g.cell_index_at_offset(4, 4).unwrap();
        assert_eq!(g.cells()[interior].neighbors().count(), 6);
        let corner = g.cell_index_at_offset(0, 0).unwrap();
        assert_eq!(g.cells()[corner].neighbors().count(), 2);

        let wrapped = grid(10, 10, true);
        let edge = wrapped.cell_index_at_offset(0, 4).unwrap();
        assert_eq!(wrapped.cells()[edge].neighbors().count(), 6);
    }

    #[test]
    fn test_wrapped_rows_link_across_the_seam() {
        let g = grid(20, 15, true);
        let first_row_start = g.cell_index_at_offset(0, 0).unwrap();
        let odd_row_end = g.cell_index_at_offset(19, 1).unwrap();
        assert_eq!(g.neighbor(odd_row_end, HexDirection::SE), Some(first_row_start));

        let even_row_start = g.cell_index_at_offset(0, 2).unwrap();
        assert_eq!(
            g.neighbor(even_row_start, HexDirection::SW),
            g.cell_index_at_offset(19, 1)
        );
        assert_eq!(
            g.neighbor(even_row_start, HexDirection::W),
            g.cell_index_at_offset(19, 2)
        );
    }

    #[test]
    fn test_lookup_by_coordinates_and_position() {
        let g = grid(10, 10, false);
        for cell in g.cells() {
            assert_eq!(g.cell_index_at(cell.coordinates()), Some(cell.index()));
            assert_eq!(g.cell_index_at_position(cell.position()), Some(cell.index()));
        }
        assert_eq!(g.cell_index_at(HexCoordinates::new(-5, 0)), None);
        assert_eq!(g.cell_index_at(HexCoordinates::new(0, 10)), None);
    }

    #[test]
    fn test_explorable_border() {
        let g = grid(10, 10, false);
        assert!(!g.cell_at_offset(0, 5).unwrap().explorable());
        assert!(!g.cell_at_offset(5, 9).unwrap().explorable());
        assert!(g.cell_at_offset(5, 5).unwrap().explorable());

        let w = grid(10, 10, true);
        assert!(w.cell_at_offset(0, 5).unwrap().explorable());
        assert!(!w.cell_at_offset(5, 0).unwrap().explorable());
    }

    #[test]
    fn test_chunk_indices() {
        let g = grid(10, 10, false);
        assert_eq!(g.chunk_count(), 4);
        assert_eq!(g.cell_at_offset(7, 2).unwrap().chunk_index(), 1);
        assert_eq!(g.cell_at_offset(2, 7).unwrap().chunk_index(), 2);
        assert_eq!(g.cell_at_offset(7, 7).unwrap().column_index(), 1);
    }

    #[test]
    fn test_wrapped_distance() {
        let g = grid(10, 10, true);
        let a = g.cell_index_at_offset(0, 4).unwrap();
        let b = g.cell_index_at_offset(9, 4).unwrap();
        assert_eq!(g.distance(a, b), 1);
    }
}
