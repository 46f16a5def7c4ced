//! Units: occupancy, movement rules and travel animation state.
//!
//! A unit sits on exactly one cell; the cell keeps a back-reference by
//! [`UnitId`]. Travel is an explicit state machine advanced by
//! [`HexGrid::tick`](crate::grid::HexGrid::tick): occupancy moves to the
//! destination the moment travel starts, and only the animated position and
//! the vision hand-off follow the path over time.

use crate::cell::HexCell;
use crate::coordinates::HexDirection;
use crate::metrics::{edge_type, HexEdgeType, Vec3};

/// Movement budget per turn.
pub const UNIT_SPEED: i32 = 24;
/// Vision range in cells, before elevation bonuses.
pub const UNIT_VISION_RANGE: i32 = 3;
/// Path segments traversed per second.
pub const TRAVEL_SPEED: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u32);

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// How a unit moves across the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementRules {
    pub speed: i32,
}

impl Default for MovementRules {
    fn default() -> Self {
        Self { speed: UNIT_SPEED }
    }
}

impl MovementRules {
    /// A unit may end a move on explored, dry, unoccupied cells.
    pub fn is_valid_destination(&self, cell: &HexCell) -> bool {
        cell.is_explored() && !cell.is_underwater() && cell.unit().is_none()
    }

    /// Cost of stepping from `from` into `to` across `direction`, or `None`
    /// if the edge cannot be crossed (cliffs, or a wall without a road).
    pub fn move_cost(&self, from: &HexCell, to: &HexCell, direction: HexDirection) -> Option<i32> {
        let edge = edge_type(from.elevation(), to.elevation());
        if edge == HexEdgeType::Cliff {
            return None;
        }

        if from.has_road_through_edge(direction) {
            return Some(1);
        }

        if from.walled() != to.walled() {
            return None;
        }

        let base = if edge == HexEdgeType::Flat { 5 } else { 10 };
        Some(base + to.urban_level() as i32 + to.farm_level() as i32 + to.plant_level() as i32)
    }
}

/// Progress along a travel path.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TravelState {
    #[default]
    Idle,
    Moving(TravelProgress),
}

/// One Bezier segment per path step plus a final half-step into the
/// destination center. Segment `i` (1-based) ends between `path[i-1]` and
/// `path[i]`; segment `path.len()` ends at the destination.
#[derive(Clone, Debug, PartialEq)]
pub struct TravelProgress {
    pub path: Vec<usize>,
    pub segment: usize,
    pub t: f32,
    pub(crate) a: Vec3,
    pub(crate) b: Vec3,
    pub(crate) c: Vec3,
    pub(crate) column: usize,
}

#[derive(Clone, Debug)]
pub struct HexUnit {
    pub(crate) id: UnitId,
    pub(crate) location: usize,
    pub(crate) orientation: f32,
    pub(crate) movement: MovementRules,
    pub(crate) vision_range: i32,
    pub(crate) travel: TravelState,
    /// Cell whose vision the unit currently holds while traveling.
    pub(crate) travel_location: Option<usize>,
    pub(crate) position: Vec3,
}

impl HexUnit {
    pub(crate) fn new(id: UnitId, location: usize, orientation: f32, position: Vec3) -> Self {
        Self {
            id,
            location,
            orientation,
            movement: MovementRules::default(),
            vision_range: UNIT_VISION_RANGE,
            travel: TravelState::Idle,
            travel_location: None,
            position,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    /// Cell the unit occupies (the destination while traveling).
    pub fn location(&self) -> usize {
        self.location
    }

    /// Facing in degrees around the vertical axis.
    pub fn orientation(&self) -> f32 {
        self.orientation
    }

    pub fn movement(&self) -> MovementRules {
        self.movement
    }

    pub fn speed(&self) -> i32 {
        self.movement.speed
    }

    pub fn vision_range(&self) -> i32 {
        self.vision_range
    }

    pub fn travel_state(&self) -> &TravelState {
        &self.travel
    }

    pub fn is_traveling(&self) -> bool {
        matches!(self.travel, TravelState::Moving(_))
    }

    /// Animated world position. Equals the location's position when idle.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Cell whose surroundings the unit currently sees.
    pub fn vision_cell(&self) -> usize {
        self.travel_location.unwrap_or(self.location)
    }

    pub fn is_valid_destination(&self, cell: &HexCell) -> bool {
        self.movement.is_valid_destination(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinates::HexCoordinates;

    fn cell(elevation: i32) -> HexCell {
        let mut c = HexCell::new(HexCoordinates::new(0, 0), 0, 0, 0, true, Vec3::ZERO);
        c.elevation = elevation;
        c
    }

    #[test]
    fn test_move_costs() {
        let rules = MovementRules::default();
        let flat = rules.move_cost(&cell(1), &cell(1), HexDirection::E);
        assert_eq!(flat, Some(5));
        let slope = rules.move_cost(&cell(1), &cell(2), HexDirection::E);
        assert_eq!(slope, Some(10));
        assert_eq!(rules.move_cost(&cell(1), &cell(3), HexDirection::E), None);
    }

    #[test]
    fn test_features_add_cost_and_roads_override() {
        let rules = MovementRules::default();
        let mut from = cell(0);
        let mut to = cell(0);
        to.urban_level = 1;
        to.farm_level = 2;
        to.plant_level = 3;
        assert_eq!(rules.move_cost(&from, &to, HexDirection::E), Some(11));

        from.roads[HexDirection::E.index()] = true;
        assert_eq!(rules.move_cost(&from, &to, HexDirection::E), Some(1));
    }

    #[test]
    fn test_walls_block_without_road() {
        let rules = MovementRules::default();
        let from = cell(0);
        let mut to = cell(0);
        to.walled = true;
        assert_eq!(rules.move_cost(&from, &to, HexDirection::W), None);
    }

    #[test]
    fn test_destination_validity() {
        let rules = MovementRules::default();
        let mut c = cell(1);
        assert!(!rules.is_valid_destination(&c));
        c.explored = true;
        assert!(rules.is_valid_destination(&c));
        c.water_level = 2;
        assert!(!rules.is_valid_destination(&c));
        c.water_level = 0;
        c.unit = Some(UnitId(1));
        assert!(!rules.is_valid_destination(&c));
    }
}
