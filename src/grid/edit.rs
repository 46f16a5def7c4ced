//! Cell mutators that keep rivers, roads and elevation consistent.
//!
//! Every setter is a silent no-op when the request is illegal or changes
//! nothing. Callers that need to know ask the validity predicates first.

use crate::cell::TerrainType;
use crate::coordinates::HexDirection;
use crate::metrics::{edge_type, HexEdgeType};

use super::HexGrid;

impl HexGrid {
    // =========================================================================
    // Predicates
    // =========================================================================

    /// Whether a river may flow from `from` into `to`: downhill or level, or
    /// into a lake whose surface is at the source's elevation.
    pub fn is_valid_river_destination(&self, from: usize, to: usize) -> bool {
        let (Some(source), Some(dest)) = (self.cells.get(from), self.cells.get(to)) else {
            return false;
        };
        source.elevation >= dest.elevation || source.water_level == dest.elevation
    }

    pub fn elevation_difference(&self, index: usize, direction: HexDirection) -> Option<i32> {
        let cell = self.cells.get(index)?;
        let neighbor = &self.cells[cell.neighbor(direction)?];
        Some((cell.elevation - neighbor.elevation).abs())
    }

    pub fn edge_type(&self, index: usize, direction: HexDirection) -> Option<HexEdgeType> {
        let cell = self.cells.get(index)?;
        let neighbor = &self.cells[cell.neighbor(direction)?];
        Some(edge_type(cell.elevation, neighbor.elevation))
    }

    pub fn edge_type_between(&self, a: usize, b: usize) -> Option<HexEdgeType> {
        let (a, b) = (self.cells.get(a)?, self.cells.get(b)?);
        Some(edge_type(a.elevation, b.elevation))
    }

    // =========================================================================
    // Terrain
    // =========================================================================

    pub fn set_elevation(&mut self, index: usize, elevation: i32) {
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        if cell.elevation == elevation {
            return;
        }
        let original_view_elevation = cell.view_elevation();
        cell.elevation = elevation;
        if cell.view_elevation() != original_view_elevation {
            self.refresh.request_visibility_reset();
        }

        self.refresh_position(index);
        self.validate_rivers(index);

        for direction in HexDirection::ALL {
            if self.cells[index].roads[direction.index()]
                && self.elevation_difference(index, direction).unwrap_or(0) > 1
            {
                self.set_road(index, direction, false);
            }
        }

        self.refresh_cell(index);
    }

    pub fn set_water_level(&mut self, index: usize, water_level: i32) {
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        if cell.water_level == water_level {
            return;
        }
        let original_view_elevation = cell.view_elevation();
        cell.water_level = water_level;
        if cell.view_elevation() != original_view_elevation {
            self.refresh.request_visibility_reset();
        }
        self.validate_rivers(index);
        self.refresh_cell(index);
    }

    pub fn set_terrain_type(&mut self, index: usize, terrain: TerrainType) {
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        if cell.terrain_type != terrain {
            cell.terrain_type = terrain;
            self.refresh.mark_terrain(index);
        }
    }

    pub fn set_urban_level(&mut self, index: usize, level: u8) {
        self.set_feature_level(index, level, |cell| &mut cell.urban_level);
    }

    pub fn set_farm_level(&mut self, index: usize, level: u8) {
        self.set_feature_level(index, level, |cell| &mut cell.farm_level);
    }

    pub fn set_plant_level(&mut self, index: usize, level: u8) {
        self.set_feature_level(index, level, |cell| &mut cell.plant_level);
    }

    fn set_feature_level(
        &mut self,
        index: usize,
        level: u8,
        field: impl FnOnce(&mut crate::cell::HexCell) -> &mut u8,
    ) {
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        let slot = field(cell);
        if *slot != level {
            *slot = level;
            self.refresh_cell_only(index);
        }
    }

    pub fn set_walled(&mut self, index: usize, walled: bool) {
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        if cell.walled != walled {
            cell.walled = walled;
            self.refresh_cell(index);
        }
    }

    /// Special features replace roads and cannot share a cell with a river.
    pub fn set_special_index(&mut self, index: usize, special: u8) {
        let Some(cell) = self.cells.get_mut(index) else {
            return;
        };
        if cell.special_index != special && !cell.has_river() {
            cell.special_index = special;
            self.remove_roads(index);
            self.refresh_cell_only(index);
        }
    }

    // =========================================================================
    // Rivers
    // =========================================================================

    pub fn set_outgoing_river(&mut self, index: usize, direction: HexDirection) {
        let Some(cell) = self.cells.get(index) else {
            return;
        };
        if cell.outgoing_river == Some(direction) {
            return;
        }
        let Some(neighbor) = cell.neighbor(direction) else {
            return;
        };
        if !self.is_valid_river_destination(index, neighbor) {
            return;
        }

        self.remove_outgoing_river(index);
        if self.cells[index].incoming_river == Some(direction) {
            self.remove_incoming_river(index);
        }
        let cell = &mut self.cells[index];
        cell.outgoing_river = Some(direction);
        cell.special_index = 0;

        self.remove_incoming_river(neighbor);
        let target = &mut self.cells[neighbor];
        target.incoming_river = Some(direction.opposite());
        target.special_index = 0;

        self.set_road(index, direction, false);
    }

    pub fn remove_outgoing_river(&mut self, index: usize) {
        let Some(direction) = self.cells.get(index).and_then(|c| c.outgoing_river) else {
            return;
        };
        self.cells[index].outgoing_river = None;
        self.refresh_cell_only(index);

        if let Some(neighbor) = self.cells[index].neighbor(direction) {
            self.cells[neighbor].incoming_river = None;
            self.refresh_cell_only(neighbor);
        }
    }

    pub fn remove_incoming_river(&mut self, index: usize) {
        let Some(direction) = self.cells.get(index).and_then(|c| c.incoming_river) else {
            return;
        };
        self.cells[index].incoming_river = None;
        self.refresh_cell_only(index);

        if let Some(neighbor) = self.cells[index].neighbor(direction) {
            self.cells[neighbor].outgoing_river = None;
            self.refresh_cell_only(neighbor);
        }
    }

    pub fn remove_river(&mut self, index: usize) {
        self.remove_outgoing_river(index);
        self.remove_incoming_river(index);
    }

    /// Drop rivers whose flow became illegal after a height change.
    fn validate_rivers(&mut self, index: usize) {
        let cell = &self.cells[index];
        if let Some(direction) = cell.outgoing_river {
            let valid = cell
                .neighbor(direction)
                .is_some_and(|n| self.is_valid_river_destination(index, n));
            if !valid {
                self.remove_outgoing_river(index);
            }
        }

        let cell = &self.cells[index];
        if let Some(direction) = cell.incoming_river {
            let valid = cell
                .neighbor(direction)
                .is_some_and(|n| self.is_valid_river_destination(n, index));
            if !valid {
                self.remove_incoming_river(index);
            }
        }
    }

    // =========================================================================
    // Roads
    // =========================================================================

    pub fn add_road(&mut self, index: usize, direction: HexDirection) {
        let Some(cell) = self.cells.get(index) else {
            return;
        };
        let Some(neighbor) = cell.neighbor(direction) else {
            return;
        };
        if !cell.roads[direction.index()]
            && !cell.has_river_through_edge(direction)
            && !cell.is_special()
            && !self.cells[neighbor].is_special()
            && self.elevation_difference(index, direction).unwrap_or(i32::MAX) <= 1
        {
            self.set_road(index, direction, true);
        }
    }

    pub fn remove_roads(&mut self, index: usize) {
        for direction in HexDirection::ALL {
            if self.cells.get(index).is_some_and(|c| c.roads[direction.index()]) {
                self.set_road(index, direction, false);
            }
        }
    }

    /// Set the road flag on both sides of an edge.
    fn set_road(&mut self, index: usize, direction: HexDirection, state: bool) {
        let Some(neighbor) = self.cells[index].neighbor(direction) else {
            return;
        };
        self.cells[index].roads[direction.index()] = state;
        self.cells[neighbor].roads[direction.opposite().index()] = state;
        self.refresh_cell_only(neighbor);
        self.refresh_cell_only(index);
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Recompute the perturbed height of a cell after its elevation changed.
    pub(crate) fn refresh_position(&mut self, index: usize) {
        let position = self.cells[index].position;
        let y = self.elevated_y(position, self.cells[index].elevation);
        self.cells[index].position.y = y;
    }

    /// Mark the owning chunk and any neighboring chunks for rebuild.
    pub(crate) fn refresh_cell(&mut self, index: usize) {
        let chunk = self.cells[index].chunk_index;
        self.refresh.mark_chunk(chunk);
        for (_, neighbor) in self.cells[index].neighbors() {
            let other = self.cells[neighbor].chunk_index;
            if other != chunk {
                self.refresh.mark_chunk(other);
            }
        }
        self.validate_unit_location(index);
    }

    pub(crate) fn refresh_cell_only(&mut self, index: usize) {
        self.refresh.mark_chunk(self.cells[index].chunk_index);
        self.validate_unit_location(index);
    }
}

#[cfg(test)]
mod tests {
    use crate::coordinates::HexDirection;
    use crate::grid::HexGrid;
    use crate::metrics::{HexEdgeType, MapMetrics};

    fn grid() -> (HexGrid, usize) {
        let g = HexGrid::with_size(10, 10, false, MapMetrics::default()).unwrap();
        let center = g.cell_index_at_offset(4, 4).unwrap();
        (g, center)
    }

    #[test]
    fn test_outgoing_river_sets_both_sides_and_clears_road() {
        let (mut g, a) = grid();
        let b = g.neighbor(a, HexDirection::E).unwrap();
        g.add_road(a, HexDirection::E);
        assert!(g.cells()[b].has_road_through_edge(HexDirection::W));

        g.set_outgoing_river(a, HexDirection::E);
        assert_eq!(g.cells()[a].outgoing_river(), Some(HexDirection::E));
        assert_eq!(g.cells()[b].incoming_river(), Some(HexDirection::W));
        assert!(!g.cells()[a].has_road_through_edge(HexDirection::E));
        assert!(!g.cells()[b].has_road_through_edge(HexDirection::W));
    }

    #[test]
    fn test_river_refused_uphill() {
        let (mut g, a) = grid();
        let b = g.neighbor(a, HexDirection::E).unwrap();
        g.set_elevation(b, 1);
        g.set_outgoing_river(a, HexDirection::E);
        assert!(!g.cells()[a].has_river());

        // a lake at the source's height accepts the river
        g.set_water_level(a, 1);
        g.set_outgoing_river(a, HexDirection::E);
        assert!(g.cells()[a].has_outgoing_river());
    }

    #[test]
    fn test_raising_destination_removes_river() {
        let (mut g, a) = grid();
        let b = g.neighbor(a, HexDirection::SE).unwrap();
        g.set_outgoing_river(a, HexDirection::SE);
        assert!(g.cells()[b].has_incoming_river());

        g.set_elevation(b, 2);
        assert!(!g.cells()[a].has_river());
        assert!(!g.cells()[b].has_river());

        g.remove_river(a);
        assert!(!g.cells()[a].has_river());
    }

    #[test]
    fn test_replacing_outgoing_river_clears_old_edge() {
        let (mut g, a) = grid();
        let e = g.neighbor(a, HexDirection::E).unwrap();
        let w = g.neighbor(a, HexDirection::W).unwrap();
        g.set_outgoing_river(a, HexDirection::E);
        g.set_outgoing_river(a, HexDirection::W);
        assert!(!g.cells()[e].has_river());
        assert_eq!(g.cells()[w].incoming_river(), Some(HexDirection::E));

        // reversing flow over the incoming edge drops the incoming river
        g.set_outgoing_river(w, HexDirection::E);
        assert_eq!(g.cells()[w].outgoing_river(), Some(HexDirection::E));
        assert_eq!(g.cells()[w].incoming_river(), None);
        assert_eq!(g.cells()[a].outgoing_river(), None);
        assert_eq!(g.cells()[a].incoming_river(), Some(HexDirection::W));
    }

    #[test]
    fn test_road_rules() {
        let (mut g, a) = grid();
        let b = g.neighbor(a, HexDirection::NE).unwrap();
        g.set_elevation(b, 2);
        g.add_road(a, HexDirection::NE);
        assert!(!g.cells()[a].has_roads());

        g.set_elevation(b, 1);
        g.add_road(a, HexDirection::NE);
        assert!(g.cells()[a].has_road_through_edge(HexDirection::NE));

        // steepening the edge removes the road
        g.set_elevation(a, -1);
        assert!(!g.cells()[a].has_roads());
        assert!(!g.cells()[b].has_roads());
    }

    #[test]
    fn test_special_cells_and_roads() {
        let (mut g, a) = grid();
        g.add_road(a, HexDirection::E);
        g.set_special_index(a, 2);
        assert!(g.cells()[a].is_special());
        assert!(!g.cells()[a].has_roads());

        g.add_road(a, HexDirection::W);
        assert!(!g.cells()[a].has_roads());

        // a river clears the special index and prevents setting a new one
        g.set_outgoing_river(a, HexDirection::W);
        assert!(!g.cells()[a].is_special());
        g.set_special_index(a, 1);
        assert!(!g.cells()[a].is_special());
    }

    #[test]
    fn test_road_refused_across_river() {
        let (mut g, a) = grid();
        g.set_outgoing_river(a, HexDirection::E);
        g.add_road(a, HexDirection::E);
        assert!(!g.cells()[a].has_roads());
    }

    #[test]
    fn test_edits_mark_chunks_and_visibility_reset() {
        let (mut g, a) = grid();
        g.refresh_tracker_mut().reset();
        g.set_elevation(a, 3);
        assert!(g.refresh_tracker().needs_visibility_reset());
        assert!(g.refresh_tracker().dirty_chunks().count() >= 1);
        assert_eq!(g.edge_type(a, HexDirection::E), Some(HexEdgeType::Cliff));

        g.refresh_tracker_mut().reset();
        g.set_elevation(a, 3);
        assert!(g.refresh_tracker().is_clean());
    }

    #[test]
    fn test_position_follows_elevation() {
        let (mut g, a) = grid();
        let before = g.cells()[a].position().y;
        g.set_elevation(a, 2);
        let after = g.cells()[a].position().y;
        assert!((after - before - 6.0).abs() < 1e-4);
    }
}
