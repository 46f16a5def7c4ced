//! Land growth: raise and sink random blobs until enough cells are dry.
//!
//! Each blob is a flood fill from a random cell in a region, ordered by
//! distance from the seed cell. A random +1 on some priorities frays the
//! outline so blobs do not come out as perfect hexagons.

use tracing::{debug, warn};

use super::regions::MapRegion;
use super::GenerationRun;

/// Growth rounds before giving up on the land budget.
const LAND_GUARD_ITERATIONS: usize = 10_000;

impl GenerationRun<'_> {
    pub(crate) fn create_land(&mut self) {
        let mut land_budget =
            (self.cell_count as f32 * self.config.land_percentage as f32 * 0.01).round_ties_even() as i32;
        self.report.land_cells = land_budget;

        let regions = self.regions.clone();
        for _ in 0..LAND_GUARD_ITERATIONS {
            let sink = self.value() < self.config.sink_probability;
            for &region in &regions {
                let chunk_size = self.range(self.config.chunk_size_min, self.config.chunk_size_max - 1);
                if sink {
                    land_budget = self.sink_terrain(chunk_size, land_budget, region);
                } else {
                    land_budget = self.raise_terrain(chunk_size, land_budget, region);
                    if land_budget == 0 {
                        debug!(land = self.report.land_cells, "land budget spent");
                        return;
                    }
                }
            }
        }

        if land_budget > 0 {
            warn!(budget = land_budget, "failed to use up land budget");
            self.report.land_cells -= land_budget;
            self.report.land_shortfall = land_budget;
        }
    }

    /// Raise a blob, returning the remaining budget.
    fn raise_terrain(&mut self, chunk_size: i32, mut budget: i32, region: MapRegion) -> i32 {
        let first = self.begin_chunk(region);
        let rise = if self.value() < self.config.high_rise_probability { 2 } else { 1 };
        let water_level = self.config.water_level;

        let mut size = 0;
        while size < chunk_size {
            let Some(current) = self.search_frontier.dequeue() else {
                break;
            };
            let original = self.grid.cells[current].elevation;
            let elevation = original + rise;
            if elevation > self.config.elevation_maximum {
                continue;
            }
            self.grid.set_elevation(current, elevation);

            if original < water_level && elevation >= water_level {
                budget -= 1;
                if budget == 0 {
                    break;
                }
            }
            size += 1;
            self.grow_frontier(current, first);
        }

        self.search_frontier.clear();
        budget
    }

    /// Sink a blob, giving budget back for every cell that drops under water.
    fn sink_terrain(&mut self, chunk_size: i32, mut budget: i32, region: MapRegion) -> i32 {
        let first = self.begin_chunk(region);
        let sink = if self.value() < self.config.high_rise_probability { 2 } else { 1 };
        let water_level = self.config.water_level;

        let mut size = 0;
        while size < chunk_size {
            let Some(current) = self.search_frontier.dequeue() else {
                break;
            };
            let original = self.grid.cells[current].elevation;
            let elevation = original - sink;
            if elevation < self.config.elevation_minimum {
                continue;
            }
            self.grid.set_elevation(current, elevation);

            if original >= water_level && elevation < water_level {
                budget += 1;
            }
            size += 1;
            self.grow_frontier(current, first);
        }

        self.search_frontier.clear();
        budget
    }

    /// Start a new flood phase from a random cell of `region`.
    fn begin_chunk(&mut self, region: MapRegion) -> usize {
        self.search_frontier_phase += 1;
        let first = self.random_cell(region);
        let cell = &mut self.grid.cells[first];
        cell.search_phase = self.search_frontier_phase;
        cell.distance = 0;
        cell.search_heuristic = 0;
        self.search_frontier.enqueue(first, 0);
        first
    }

    fn grow_frontier(&mut self, current: usize, center: usize) {
        let wrap_size = self.grid.metrics().wrap_size();
        let center = self.grid.cells[center].coordinates;
        let neighbors: Vec<usize> = self.grid.cells[current].neighbors().map(|(_, n)| n).collect();

        for neighbor in neighbors {
            if self.grid.cells[neighbor].search_phase >= self.search_frontier_phase {
                continue;
            }
            let jitter = if self.value() < self.config.jitter_probability { 1 } else { 0 };
            let cell = &mut self.grid.cells[neighbor];
            cell.search_phase = self.search_frontier_phase;
            cell.distance = cell.coordinates.wrapped_distance_to(&center, wrap_size);
            cell.search_heuristic = jitter;
            self.search_frontier.enqueue(neighbor, cell.search_priority());
        }
    }
}
