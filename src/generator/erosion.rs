//! Erosion: move height from steep cells to their low neighbors.
//!
//! A cell is erodible when some neighbor sits at least two steps below it.
//! Each step takes one level off a random erodible cell, drops it on one of
//! its low neighbors, and patches the erodible list for every cell whose
//! status may have changed.

use tracing::debug;

use super::GenerationRun;

impl GenerationRun<'_> {
    fn is_erodible(&self, index: usize) -> bool {
        let cell = &self.grid.cells[index];
        let erodible_elevation = cell.elevation - 2;
        cell.neighbors()
            .any(|(_, n)| self.grid.cells[n].elevation <= erodible_elevation)
    }

    fn erosion_target(&mut self, index: usize) -> Option<usize> {
        let erodible_elevation = self.grid.cells[index].elevation - 2;
        let candidates: Vec<usize> = self.grid.cells[index]
            .neighbors()
            .map(|(_, n)| n)
            .filter(|&n| self.grid.cells[n].elevation <= erodible_elevation)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = self.range(0, candidates.len() as i32) as usize;
        Some(candidates[pick])
    }

    pub(crate) fn erode_land(&mut self) {
        let mut erodible: Vec<usize> = (0..self.cell_count).filter(|&i| self.is_erodible(i)).collect();
        let mut listed = vec![false; self.cell_count];
        for &i in &erodible {
            listed[i] = true;
        }

        let target_count =
            (erodible.len() as f32 * (100 - self.config.erosion_percentage) as f32 * 0.01) as usize;
        self.report.erodible_before = erodible.len();

        while erodible.len() > target_count {
            let index = self.range(0, erodible.len() as i32) as usize;
            let cell = erodible[index];
            let Some(target) = self.erosion_target(cell) else {
                erodible.swap_remove(index);
                listed[cell] = false;
                continue;
            };

            let elevation = self.grid.cells[cell].elevation;
            self.grid.set_elevation(cell, elevation - 1);
            let target_elevation = self.grid.cells[target].elevation;
            self.grid.set_elevation(target, target_elevation + 1);

            if !self.is_erodible(cell) {
                erodible.swap_remove(index);
                listed[cell] = false;
            }

            let cell_elevation = self.grid.cells[cell].elevation;
            let neighbors: Vec<usize> = self.grid.cells[cell].neighbors().map(|(_, n)| n).collect();
            for neighbor in neighbors {
                if self.grid.cells[neighbor].elevation == cell_elevation + 2 && !listed[neighbor] {
                    erodible.push(neighbor);
                    listed[neighbor] = true;
                }
            }

            if self.is_erodible(target) && !listed[target] {
                erodible.push(target);
                listed[target] = true;
            }

            let target_elevation = self.grid.cells[target].elevation;
            let neighbors: Vec<usize> = self.grid.cells[target].neighbors().map(|(_, n)| n).collect();
            for neighbor in neighbors {
                if neighbor != cell
                    && self.grid.cells[neighbor].elevation == target_elevation + 1
                    && !self.is_erodible(neighbor)
                    && listed[neighbor]
                {
                    if let Some(position) = erodible.iter().position(|&i| i == neighbor) {
                        erodible.remove(position);
                    }
                    listed[neighbor] = false;
                }
            }
        }

        self.report.erodible_after = erodible.len();
        debug!(
            before = self.report.erodible_before,
            after = self.report.erodible_after,
            "eroded land"
        );
    }
}
