//! Unit registry and travel animation.
//!
//! Occupancy is updated atomically when travel starts. The per-frame
//! [`HexGrid::tick`] then only moves the animated position along one
//! quadratic Bezier segment per path step and hands vision from cell to cell,
//! so cancelling at any point leaves consistent state.

use tracing::debug;

use crate::metrics::{bezier_derivative, bezier_point, Vec3, INNER_DIAMETER};
use crate::unit::{HexUnit, TravelProgress, TravelState, UnitId, TRAVEL_SPEED};

use super::HexGrid;

impl HexGrid {
    pub fn units(&self) -> &[HexUnit] {
        &self.units
    }

    pub fn unit(&self, id: UnitId) -> Option<&HexUnit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    fn unit_slot(&self, id: UnitId) -> Option<usize> {
        self.units.iter().position(|unit| unit.id == id)
    }

    /// Place a new unit on an unoccupied cell. The unit immediately sees its
    /// surroundings.
    pub fn add_unit(&mut self, location: usize, orientation: f32) -> Option<UnitId> {
        let cell = self.cells.get(location)?;
        if cell.unit.is_some() {
            return None;
        }

        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;
        let unit = HexUnit::new(id, location, orientation, cell.position);
        let range = unit.vision_range;
        self.units.push(unit);
        self.cells[location].unit = Some(id);
        self.increase_visibility(location, range);
        Some(id)
    }

    /// Remove a unit, releasing the vision it holds (which may be on a cell
    /// along its path if it is mid-travel).
    pub fn remove_unit(&mut self, id: UnitId) -> bool {
        let Some(slot) = self.unit_slot(id) else {
            return false;
        };
        let unit = self.units.remove(slot);
        self.decrease_visibility(unit.vision_cell(), unit.vision_range);
        if self.cells[unit.location].unit == Some(id) {
            self.cells[unit.location].unit = None;
        }
        true
    }

    pub fn clear_units(&mut self) {
        let ids: Vec<UnitId> = self.units.iter().map(|unit| unit.id).collect();
        for id in ids {
            self.remove_unit(id);
        }
    }

    /// Start moving a unit along `path`, which must begin on the unit's cell
    /// and step between neighbors. The unit occupies the last cell as soon as
    /// this returns; call [`tick`](Self::tick) to animate.
    pub fn travel(&mut self, id: UnitId, path: &[usize]) -> bool {
        let Some(slot) = self.unit_slot(id) else {
            return false;
        };
        if path.len() < 2 || path.iter().any(|&cell| cell >= self.cells.len()) {
            return false;
        }
        if path[0] != self.units[slot].location {
            return false;
        }
        let connected = path
            .windows(2)
            .all(|step| self.cells[step[0]].neighbors().any(|(_, next)| next == step[1]));
        if !connected {
            return false;
        }
        let destination = path[path.len() - 1];
        if self.cells[destination].unit.is_some_and(|other| other != id) {
            return false;
        }

        let vision_from = self.units[slot].vision_cell();
        let range = self.units[slot].vision_range;
        let old_location = self.units[slot].location;
        if self.cells[old_location].unit == Some(id) {
            self.cells[old_location].unit = None;
        }
        self.cells[destination].unit = Some(id);
        self.units[slot].location = destination;
        self.decrease_visibility(vision_from, range);

        let start = self.cells[path[0]].position;
        let mut facing = self.cells[path[1]].position;
        self.correct_for_wrap(start, &mut facing);
        let heading = facing - start;
        if heading.x != 0.0 || heading.z != 0.0 {
            self.units[slot].orientation = heading.heading_degrees();
        }

        self.units[slot].travel = TravelState::Moving(TravelProgress {
            path: path.to_vec(),
            segment: 0,
            t: 0.0,
            a: start,
            b: start,
            c: start,
            column: self.cells[path[0]].column_index,
        });
        self.units[slot].position = start;
        self.enter_segment(slot, 1);

        debug!(unit = %id, from = path[0], to = destination, steps = path.len() - 1, "unit travel started");
        true
    }

    /// Move a look-at target across the wrap seam if that brings it closer.
    fn correct_for_wrap(&self, from: Vec3, target: &mut Vec3) {
        if !self.metrics.wrapping() {
            return;
        }
        let wrap = self.metrics.wrap_size() as f32;
        let x_distance = target.x - from.x;
        if x_distance < -INNER_DIAMETER * 0.5 * wrap {
            target.x += INNER_DIAMETER * wrap;
        } else if x_distance > INNER_DIAMETER * 0.5 * wrap {
            target.x -= INNER_DIAMETER * wrap;
        }
    }

    /// Set up the curve for segment `segment` and take vision there.
    fn enter_segment(&mut self, slot: usize, segment: usize) {
        let wrap_shift = INNER_DIAMETER * self.metrics.wrap_size() as f32;
        let unit = &mut self.units[slot];
        let location = unit.location;
        let TravelState::Moving(progress) = &mut unit.travel else {
            return;
        };
        progress.segment = segment;

        let vision_cell = if segment < progress.path.len() {
            let cell = progress.path[segment];
            let mut a = progress.c;
            let mut b = self.cells[progress.path[segment - 1]].position;

            let next_column = self.cells[cell].column_index;
            if next_column != progress.column {
                if next_column + 1 < progress.column {
                    a.x -= wrap_shift;
                    b.x -= wrap_shift;
                } else if next_column > progress.column + 1 {
                    a.x += wrap_shift;
                    b.x += wrap_shift;
                }
                progress.column = next_column;
            }

            progress.a = a;
            progress.b = b;
            progress.c = (b + self.cells[cell].position) * 0.5;
            unit.travel_location = Some(cell);
            cell
        } else {
            progress.a = progress.c;
            progress.b = self.cells[location].position;
            progress.c = progress.b;
            unit.travel_location = None;
            location
        };

        let range = unit.vision_range;
        self.increase_visibility(vision_cell, range);
    }

    pub(crate) fn advance_units(&mut self, delta_seconds: f32) {
        for slot in 0..self.units.len() {
            self.advance_unit(slot, delta_seconds);
        }
    }

    fn advance_unit(&mut self, slot: usize, delta_seconds: f32) {
        let range = self.units[slot].vision_range;
        match &mut self.units[slot].travel {
            TravelState::Moving(progress) => progress.t += delta_seconds * TRAVEL_SPEED,
            TravelState::Idle => return,
        }

        loop {
            let unit = &mut self.units[slot];
            let TravelState::Moving(progress) = &mut unit.travel else {
                return;
            };
            if progress.t < 1.0 {
                break;
            }
            progress.t -= 1.0;

            let segment = progress.segment;
            if segment < progress.path.len() {
                let leaving = progress.path[segment];
                self.decrease_visibility(leaving, range);
                self.enter_segment(slot, segment + 1);
            } else {
                unit.travel = TravelState::Idle;
                unit.position = self.cells[unit.location].position;
                debug!(unit = %unit.id, cell = unit.location, "unit travel finished");
                return;
            }
        }

        let unit = &mut self.units[slot];
        if let TravelState::Moving(progress) = &unit.travel {
            let (a, b, c, t) = (progress.a, progress.b, progress.c, progress.t);
            unit.position = bezier_point(a, b, c, t);
            let direction = bezier_derivative(a, b, c, t);
            if direction.x != 0.0 || direction.z != 0.0 {
                unit.orientation = direction.heading_degrees();
            }
        }
    }

    /// Snap an idle unit on `cell` to the cell's current position.
    pub(crate) fn validate_unit_location(&mut self, cell: usize) {
        let Some(id) = self.cells[cell].unit else {
            return;
        };
        let position = self.cells[cell].position;
        if let Some(unit) = self.units.iter_mut().find(|unit| unit.id == id) {
            if !unit.is_traveling() {
                unit.position = position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinates::HexDirection;
    use crate::grid::HexGrid;
    use crate::metrics::MapMetrics;
    use crate::unit::{MovementRules, UNIT_VISION_RANGE};

    fn explored_grid() -> HexGrid {
        let mut g = HexGrid::with_size(15, 15, false, MapMetrics::default()).unwrap();
        for cell in g.cells.iter_mut() {
            cell.explored = true;
        }
        g
    }

    fn total_visibility(g: &HexGrid) -> u32 {
        g.cells().iter().map(|cell| cell.visibility()).sum()
    }

    fn run_until_idle(g: &mut HexGrid) {
        for _ in 0..200 {
            g.tick(0.05);
            if g.units().iter().all(|unit| !unit.is_traveling()) {
                return;
            }
        }
        panic!("travel did not finish");
    }

    #[test]
    fn test_add_and_remove_unit() {
        let mut g = explored_grid();
        let cell = g.cell_index_at_offset(7, 7).unwrap();
        let id = g.add_unit(cell, 90.0).unwrap();
        assert_eq!(g.cells()[cell].unit(), Some(id));
        assert_eq!(total_visibility(&g), 37);
        assert_eq!(g.unit(id).unwrap().vision_range(), UNIT_VISION_RANGE);

        // occupied cells refuse a second unit
        assert!(g.add_unit(cell, 0.0).is_none());

        assert!(g.remove_unit(id));
        assert_eq!(g.cells()[cell].unit(), None);
        assert_eq!(total_visibility(&g), 0);
        assert!(!g.remove_unit(id));
    }

    #[test]
    fn test_travel_moves_occupancy_at_once() {
        let mut g = explored_grid();
        let from = g.cell_index_at_offset(3, 7).unwrap();
        let to = g.cell_index_at_offset(8, 7).unwrap();
        let id = g.add_unit(from, 0.0).unwrap();
        let path = g.find_path(from, to, MovementRules::default()).unwrap();

        assert!(g.travel(id, path.cells()));
        assert_eq!(g.cells()[from].unit(), None);
        assert_eq!(g.cells()[to].unit(), Some(id));
        assert_eq!(g.unit(id).unwrap().location(), to);
        assert!(g.unit(id).unwrap().is_traveling());
    }

    #[test]
    fn test_travel_rejects_disconnected_paths() {
        let mut g = explored_grid();
        let home = g.cell_index_at_offset(3, 7).unwrap();
        let elsewhere = g.cell_index_at_offset(6, 7).unwrap();
        let id = g.add_unit(home, 0.0).unwrap();
        let before = total_visibility(&g);

        // starts away from the unit
        let next = g.neighbor(elsewhere, HexDirection::E).unwrap();
        assert!(!g.travel(id, &[elsewhere, next]));

        // jumps over a cell
        let far = g.cell_index_at_offset(5, 7).unwrap();
        assert!(!g.travel(id, &[home, far]));

        assert_eq!(g.unit(id).unwrap().location(), home);
        assert!(!g.unit(id).unwrap().is_traveling());
        assert_eq!(g.cells()[home].unit(), Some(id));
        assert_eq!(total_visibility(&g), before);
    }

    #[test]
    fn test_travel_hands_vision_to_destination() {
        let mut g = explored_grid();
        let from = g.cell_index_at_offset(3, 7).unwrap();
        let to = g.cell_index_at_offset(9, 8).unwrap();
        let id = g.add_unit(from, 0.0).unwrap();
        let path = g.find_path(from, to, MovementRules::default()).unwrap();
        g.travel(id, path.cells());
        run_until_idle(&mut g);

        let unit = g.unit(id).unwrap();
        assert_eq!(unit.position(), g.cells()[to].position());
        let expected = g.visible_cells(to, UNIT_VISION_RANGE).len() as u32;
        assert_eq!(total_visibility(&g), expected);
        assert!(g.cells()[from].is_explored());
    }

    #[test]
    fn test_cancelling_travel_releases_vision() {
        let mut g = explored_grid();
        let from = g.cell_index_at_offset(2, 7).unwrap();
        let to = g.cell_index_at_offset(11, 7).unwrap();
        let id = g.add_unit(from, 0.0).unwrap();
        let path = g.find_path(from, to, MovementRules::default()).unwrap();
        g.travel(id, path.cells());
        g.tick(0.3);
        g.tick(0.3);

        // redirect mid-path, then finish
        let back = g.cell_index_at_offset(5, 5).unwrap();
        let detour = g.find_path(to, back, MovementRules::default()).unwrap();
        assert!(g.travel(id, detour.cells()));
        run_until_idle(&mut g);
        let expected = g.visible_cells(back, UNIT_VISION_RANGE).len() as u32;
        assert_eq!(total_visibility(&g), expected);

        let path = g.find_path(back, from, MovementRules::default()).unwrap();
        g.travel(id, path.cells());
        g.tick(0.4);
        assert!(g.remove_unit(id));
        assert_eq!(total_visibility(&g), 0);
    }

    #[test]
    fn test_elevation_change_resets_visibility_on_tick() {
        let mut g = explored_grid();
        let cell = g.cell_index_at_offset(7, 7).unwrap();
        g.add_unit(cell, 0.0).unwrap();
        let before = total_visibility(&g);

        g.set_elevation(cell, 1);
        g.tick(0.0);
        assert!(!g.refresh_tracker().needs_visibility_reset());
        // standing higher sees at least as far
        assert!(total_visibility(&g) >= before);
        let expected = g.visible_cells(cell, UNIT_VISION_RANGE).len() as u32;
        assert_eq!(total_visibility(&g), expected);
    }

    #[test]
    fn test_idle_unit_follows_cell_height() {
        let mut g = explored_grid();
        let cell = g.cell_index_at_offset(7, 7).unwrap();
        let id = g.add_unit(cell, 0.0).unwrap();
        g.set_elevation(cell, 2);
        assert_eq!(g.unit(id).unwrap().position(), g.cells()[cell].position());
    }
}
