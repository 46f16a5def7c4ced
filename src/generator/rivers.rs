//! River tracing
//!
//! Wet highland cells get tickets in a lottery of river origins. A river
//! walks downhill (or level) from its origin, preferring steep drops and
//! avoiding sharp turns, until it reaches water, joins another river or gets
//! stuck. A stuck river fills its last cell into a lake.

use tracing::{debug, warn};

use crate::coordinates::HexDirection;

use super::GenerationRun;

impl GenerationRun<'_> {
    pub(crate) fn create_rivers(&mut self) {
        let water_level = self.config.water_level;
        let elevation_maximum = self.config.elevation_maximum;

        let mut origins = Vec::new();
        for index in 0..self.cell_count {
            let cell = &self.grid.cells[index];
            if cell.is_underwater() {
                continue;
            }
            let weight = self.climate[index].moisture * (cell.elevation - water_level) as f32
                / (elevation_maximum - water_level) as f32;
            if weight > 0.75 {
                origins.push(index);
                origins.push(index);
            }
            if weight > 0.5 {
                origins.push(index);
            }
            if weight > 0.25 {
                origins.push(index);
            }
        }

        let mut budget = (self.report.land_cells as f32 * self.config.river_percentage as f32 * 0.01)
            .round_ties_even() as i32;
        debug!(budget, tickets = origins.len(), "placing rivers");

        while budget > 0 && !origins.is_empty() {
            let pick = self.range(0, origins.len() as i32) as usize;
            let origin = origins.swap_remove(pick);
            if self.grid.cells[origin].has_river() {
                continue;
            }
            let valid_origin = self.grid.cells[origin].neighbors().all(|(_, n)| {
                let neighbor = &self.grid.cells[n];
                !neighbor.has_river() && !neighbor.is_underwater()
            });
            if valid_origin {
                let length = self.create_river(origin);
                if length > 0 {
                    self.report.rivers += 1;
                }
                budget -= length;
            }
        }

        if budget > 0 {
            warn!(budget, "failed to use up river budget");
            self.report.river_budget_left = budget;
        }
    }

    /// Trace one river from `origin`, returning its length in cells. A river
    /// that cannot leave its origin is not created and has length 0.
    pub(crate) fn create_river(&mut self, origin: usize) -> i32 {
        let mut length = 1;
        let mut cell = origin;
        let mut direction = HexDirection::NE;
        let mut flow_directions = Vec::with_capacity(36);

        for _ in 0..self.cell_count {
            if self.grid.cells[cell].is_underwater() {
                break;
            }

            let mut min_neighbor_elevation = i32::MAX;
            flow_directions.clear();
            let elevation = self.grid.cells[cell].elevation;
            let neighbors: Vec<(HexDirection, usize)> = self.grid.cells[cell].neighbors().collect();

            for (d, n) in neighbors {
                let neighbor = &self.grid.cells[n];
                min_neighbor_elevation = min_neighbor_elevation.min(neighbor.elevation);

                if n == origin || neighbor.has_incoming_river() {
                    continue;
                }
                let delta = neighbor.elevation - elevation;
                if delta > 0 {
                    continue;
                }
                if neighbor.has_outgoing_river() {
                    // join an existing river
                    self.grid.set_outgoing_river(cell, d);
                    return length;
                }

                if delta < 0 {
                    flow_directions.extend([d, d, d]);
                }
                if length == 1 || (d != direction.next2() && d != direction.previous2()) {
                    flow_directions.push(d);
                }
                flow_directions.push(d);
            }

            if flow_directions.is_empty() {
                if length == 1 {
                    return 0;
                }
                if min_neighbor_elevation >= elevation {
                    self.grid.set_water_level(cell, min_neighbor_elevation);
                    if min_neighbor_elevation == elevation {
                        self.grid.set_elevation(cell, min_neighbor_elevation - 1);
                    }
                    self.report.lakes_created += 1;
                }
                break;
            }

            let pick = self.range(0, flow_directions.len() as i32) as usize;
            direction = flow_directions[pick];
            self.grid.set_outgoing_river(cell, direction);
            length += 1;

            if min_neighbor_elevation >= elevation && self.value() < self.config.extra_lake_probability {
                self.grid.set_water_level(cell, elevation);
                self.grid.set_elevation(cell, elevation - 1);
                self.report.lakes_created += 1;
            }

            match self.grid.cells[cell].neighbor(direction) {
                Some(next) => cell = next,
                None => break,
            }
        }

        length
    }
}
