//! Turn-aware pathfinding and the line-of-sight flood.
//!
//! Both searches share the grid's bucket queue and use phase tagging: each
//! run bumps the phase by two, so a cell is "unvisited" when its phase is
//! below the current one, "in the frontier" when equal and "done" one above.

use crate::unit::MovementRules;

use super::HexGrid;

/// Result of a successful [`HexGrid::find_path`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HexPath {
    cells: Vec<usize>,
    distances: Vec<i32>,
    speed: i32,
}

impl HexPath {
    /// Cell indices from origin to destination, inclusive.
    pub fn cells(&self) -> &[usize] {
        &self.cells
    }

    /// Turn-adjusted cost accumulated on arrival at each path cell.
    pub fn distances(&self) -> &[i32] {
        &self.distances
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn origin(&self) -> Option<usize> {
        self.cells.first().copied()
    }

    pub fn destination(&self) -> Option<usize> {
        self.cells.last().copied()
    }

    pub fn total_cost(&self) -> i32 {
        self.distances.last().copied().unwrap_or(0)
    }

    /// Turn in which the unit reaches the `i`-th cell of the path. The
    /// origin is turn 0.
    pub fn turn_label(&self, i: usize) -> i32 {
        self.distances
            .get(i)
            .map(|&distance| (distance - 1) / self.speed)
            .unwrap_or(0)
    }

    /// Turns needed to reach the destination.
    pub fn turns(&self) -> i32 {
        self.turn_label(self.cells.len().saturating_sub(1))
    }
}

impl HexGrid {
    // =========================================================================
    // Pathfinding
    // =========================================================================

    /// Find the cheapest path for a mover with `rules`, remembering it as the
    /// grid's current path. Returns `None` when either end is invalid or the
    /// destination cannot be reached.
    pub fn find_path(&mut self, from: usize, to: usize, rules: MovementRules) -> Option<HexPath> {
        self.clear_path();
        if from >= self.cells.len() || to >= self.cells.len() || rules.speed <= 0 {
            return None;
        }
        if from != to && !rules.is_valid_destination(&self.cells[to]) {
            return None;
        }

        if !self.search(from, to, rules) {
            return None;
        }

        let mut cells = vec![to];
        let mut current = to;
        while current != from {
            match self.cells[current].path_from {
                Some(previous) => {
                    cells.push(previous);
                    current = previous;
                }
                None => return None,
            }
        }
        cells.reverse();
        let distances = cells.iter().map(|&i| self.cells[i].distance).collect();

        let path = HexPath {
            cells,
            distances,
            speed: rules.speed,
        };
        self.current_path = Some(path.clone());
        Some(path)
    }

    pub fn has_path(&self) -> bool {
        self.current_path.is_some()
    }

    pub fn current_path(&self) -> Option<&HexPath> {
        self.current_path.as_ref()
    }

    pub fn clear_path(&mut self) {
        self.current_path = None;
    }

    fn search(&mut self, from: usize, to: usize, rules: MovementRules) -> bool {
        let speed = rules.speed;
        let wrap_size = self.metrics.wrap_size();
        let goal = self.cells[to].coordinates;

        self.search_frontier_phase += 2;
        let phase = self.search_frontier_phase;
        self.search_frontier.clear();

        let cells = &mut self.cells;
        let frontier = &mut self.search_frontier;

        cells[from].search_phase = phase;
        cells[from].distance = 0;
        cells[from].search_heuristic = 0;
        cells[from].path_from = None;
        frontier.enqueue(from, 0);

        while let Some(current) = frontier.dequeue() {
            cells[current].search_phase += 1;
            if current == to {
                return true;
            }

            let current_distance = cells[current].distance;
            let current_turn = (current_distance - 1) / speed;

            for (direction, neighbor) in cells[current].neighbors().collect::<Vec<_>>() {
                if cells[neighbor].search_phase > phase {
                    continue;
                }
                if !rules.is_valid_destination(&cells[neighbor]) {
                    continue;
                }
                let Some(move_cost) = rules.move_cost(&cells[current], &cells[neighbor], direction) else {
                    continue;
                };

                let mut distance = current_distance + move_cost;
                let turn = (distance - 1) / speed;
                if turn > current_turn {
                    distance = turn * speed + move_cost;
                }

                let cell = &mut cells[neighbor];
                if cell.search_phase < phase {
                    cell.search_phase = phase;
                    cell.distance = distance;
                    cell.path_from = Some(current);
                    cell.search_heuristic = cell.coordinates.wrapped_distance_to(&goal, wrap_size);
                    frontier.enqueue(neighbor, cell.search_priority());
                } else if distance < cell.distance {
                    let old_priority = cell.search_priority();
                    cell.distance = distance;
                    cell.path_from = Some(current);
                    frontier.change_priority(neighbor, old_priority, cell.search_priority());
                }
            }
        }

        false
    }

    // =========================================================================
    // Visibility
    // =========================================================================

    /// Cells a viewer at `from` can see with the given base `range`. Height
    /// extends the range; higher terrain along the way blocks it.
    pub fn visible_cells(&mut self, from: usize, range: i32) -> Vec<usize> {
        let mut visible = Vec::new();
        if from >= self.cells.len() {
            return visible;
        }

        let wrap_size = self.metrics.wrap_size();
        self.search_frontier_phase += 2;
        let phase = self.search_frontier_phase;
        self.search_frontier.clear();

        let cells = &mut self.cells;
        let frontier = &mut self.search_frontier;

        let range = range + cells[from].view_elevation();
        let origin = cells[from].coordinates;

        cells[from].search_phase = phase;
        cells[from].distance = 0;
        cells[from].search_heuristic = 0;
        frontier.enqueue(from, 0);

        while let Some(current) = frontier.dequeue() {
            cells[current].search_phase += 1;
            visible.push(current);

            let current_distance = cells[current].distance;
            for (_, neighbor) in cells[current].neighbors().collect::<Vec<_>>() {
                let cell = &mut cells[neighbor];
                if cell.search_phase > phase || !cell.explorable {
                    continue;
                }

                let distance = current_distance + 1;
                if distance + cell.view_elevation() > range
                    || distance > origin.wrapped_distance_to(&cell.coordinates, wrap_size)
                {
                    continue;
                }

                if cell.search_phase < phase {
                    cell.search_phase = phase;
                    cell.distance = distance;
                    cell.search_heuristic = 0;
                    frontier.enqueue(neighbor, cell.search_priority());
                } else if distance < cell.distance {
                    let old_priority = cell.search_priority();
                    cell.distance = distance;
                    frontier.change_priority(neighbor, old_priority, cell.search_priority());
                }
            }
        }

        visible
    }

    pub fn increase_visibility(&mut self, from: usize, range: i32) {
        for index in self.visible_cells(from, range) {
            if self.cells[index].increase_visibility() {
                self.refresh.mark_visibility(index);
            }
        }
    }

    pub fn decrease_visibility(&mut self, from: usize, range: i32) {
        for index in self.visible_cells(from, range) {
            if self.cells[index].decrease_visibility() {
                self.refresh.mark_visibility(index);
            }
        }
    }

    /// Mark every explorable cell explored, lifting the fog without making
    /// anything visible.
    pub fn explore_all(&mut self) {
        for index in 0..self.cells.len() {
            let cell = &mut self.cells[index];
            if cell.explorable && !cell.explored {
                cell.explored = true;
                self.refresh.mark_visibility(index);
            }
        }
    }

    /// Clear every visibility count and re-apply each unit's vision.
    pub fn reset_visibility(&mut self) {
        for index in 0..self.cells.len() {
            if self.cells[index].reset_visibility() {
                self.refresh.mark_visibility(index);
            }
        }
        let viewers: Vec<(usize, i32)> = self
            .units
            .iter()
            .map(|unit| (unit.vision_cell(), unit.vision_range()))
            .collect();
        for (cell, range) in viewers {
            self.increase_visibility(cell, range);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinates::HexDirection;
    use crate::grid::HexGrid;
    use crate::metrics::MapMetrics;
    use crate::unit::MovementRules;

    fn explored_grid(x: i32, z: i32) -> HexGrid {
        let mut g = HexGrid::with_size(x, z, false, MapMetrics::default()).unwrap();
        for cell in g.cells.iter_mut() {
            cell.explored = true;
        }
        g
    }

    #[test]
    fn test_straight_path_on_flat_ground() {
        let mut g = explored_grid(10, 10);
        let from = g.cell_index_at_offset(1, 4).unwrap();
        let to = g.cell_index_at_offset(6, 4).unwrap();
        let path = g.find_path(from, to, MovementRules::default()).unwrap();

        assert_eq!(path.origin(), Some(from));
        assert_eq!(path.destination(), Some(to));
        assert_eq!(path.len(), 6);
        // four flat steps fit in the first turn, the fifth starts turn two
        assert_eq!(path.total_cost(), 29);
        assert_eq!(path.turn_label(4), 0);
        assert_eq!(path.turns(), 1);
        assert!(g.has_path());
    }

    #[test]
    fn test_turn_rounding_charges_remainder() {
        let mut g = explored_grid(10, 10);
        let from = g.cell_index_at_offset(1, 4).unwrap();
        let to = g.cell_index_at_offset(7, 4).unwrap();
        let path = g.find_path(from, to, MovementRules { speed: 12 }).unwrap();
        // 5, 10, then 15 crosses into turn 1 and becomes 12 + 5
        assert_eq!(path.distances(), &[0, 5, 10, 17, 22, 29, 34]);
    }

    #[test]
    fn test_path_prefers_road() {
        let mut g = explored_grid(10, 10);
        let from = g.cell_index_at_offset(2, 2).unwrap();
        let to = g.cell_index_at_offset(4, 2).unwrap();
        let mid = g.neighbor(from, HexDirection::E).unwrap();
        g.add_road(from, HexDirection::E);
        g.add_road(mid, HexDirection::E);
        let path = g.find_path(from, to, MovementRules::default()).unwrap();
        assert_eq!(path.cells(), &[from, mid, to]);
        assert_eq!(path.total_cost(), 2);
    }

    #[test]
    fn test_unreachable_target_surrounded_by_cliffs() {
        let mut g = explored_grid(10, 10);
        let from = g.cell_index_at_offset(1, 1).unwrap();
        let to = g.cell_index_at_offset(5, 5).unwrap();
        g.set_elevation(to, 4);
        assert!(g.find_path(from, to, MovementRules::default()).is_none());
        assert!(!g.has_path());
    }

    #[test]
    fn test_underwater_destination_rejected() {
        let mut g = explored_grid(10, 10);
        let from = g.cell_index_at_offset(1, 1).unwrap();
        let to = g.cell_index_at_offset(5, 5).unwrap();
        g.set_water_level(to, 2);
        assert!(g.find_path(from, to, MovementRules::default()).is_none());
    }

    #[test]
    fn test_repeated_searches_reuse_phases() {
        let mut g = explored_grid(10, 10);
        let a = g.cell_index_at_offset(1, 1).unwrap();
        let b = g.cell_index_at_offset(8, 8).unwrap();
        let first = g.find_path(a, b, MovementRules::default()).unwrap();
        let second = g.find_path(a, b, MovementRules::default()).unwrap();
        assert_eq!(first.total_cost(), second.total_cost());
        let back = g.find_path(b, a, MovementRules::default()).unwrap();
        assert_eq!(back.total_cost(), first.total_cost());
    }

    #[test]
    fn test_visibility_flood_on_flat_ground() {
        let mut g = explored_grid(15, 15);
        let center = g.cell_index_at_offset(7, 7).unwrap();
        let visible = g.visible_cells(center, 2);
        // a full hex disc of radius two
        assert_eq!(visible.len(), 19);
        for &cell in &visible {
            assert!(g.distance(center, cell) <= 2);
        }
    }

    #[test]
    fn test_ridge_blocks_vision() {
        let mut g = explored_grid(15, 15);
        let center = g.cell_index_at_offset(7, 7).unwrap();
        let blocked = g.neighbor(center, HexDirection::E).unwrap();
        g.set_elevation(blocked, 3);
        let visible = g.visible_cells(center, 3);
        assert!(!visible.contains(&blocked));

        // standing on the ridge extends the range
        let far = g.visible_cells(blocked, 3);
        assert!(far.len() > visible.len());
    }

    #[test]
    fn test_vision_does_not_bend_around_ridge() {
        let mut g = explored_grid(15, 15);
        let center = g.cell_index_at_offset(7, 7).unwrap();
        let ridge = g.neighbor(center, HexDirection::E).unwrap();
        let behind = g.neighbor(ridge, HexDirection::E).unwrap();
        g.set_elevation(ridge, 3);
        assert_eq!(g.distance(center, behind), 2);

        // the only route around the ridge takes three steps
        let visible = g.visible_cells(center, 3);
        assert!(!visible.contains(&ridge));
        assert!(!visible.contains(&behind));
        let beside = g.neighbor(ridge, HexDirection::NE).unwrap();
        assert!(visible.contains(&beside));
    }

    #[test]
    fn test_path_and_vision_cross_the_seam() {
        let mut g = HexGrid::with_size(20, 15, true, MapMetrics::default()).unwrap();
        for cell in g.cells.iter_mut() {
            cell.explored = true;
        }
        let west = g.cell_index_at_offset(0, 7).unwrap();
        let east = g.cell_index_at_offset(19, 7).unwrap();

        let path = g.find_path(west, east, MovementRules::default()).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path.cells(), &[west, east]);

        let visible = g.visible_cells(west, 2);
        assert!(visible.contains(&east));
        assert!(visible.contains(&g.cell_index_at_offset(18, 7).unwrap()));
        assert_eq!(visible.len(), 19);
    }

    #[test]
    fn test_increase_and_decrease_are_symmetric() {
        let mut g = explored_grid(10, 10);
        let center = g.cell_index_at_offset(5, 5).unwrap();
        g.increase_visibility(center, 3);
        assert!(g.cells()[center].is_visible());
        g.decrease_visibility(center, 3);
        assert!(g.cells().iter().all(|cell| cell.visibility() == 0));
        assert!(g.cells()[center].is_explored());
    }

    #[test]
    fn test_explore_all_skips_border() {
        let mut g = HexGrid::with_size(10, 10, false, MapMetrics::default()).unwrap();
        g.explore_all();
        let corner = g.cell_index_at_offset(0, 0).unwrap();
        let inner = g.cell_index_at_offset(4, 4).unwrap();
        assert!(!g.cells()[corner].is_explored());
        assert!(g.cells()[inner].is_explored());
        assert!(!g.cells()[inner].is_visible());
        assert_eq!(g.refresh_tracker_mut().take_visibility_changes().len(), 64);
    }
}
