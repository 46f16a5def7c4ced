//! Hex coordinate system
//!
//! Cells are addressed with cube coordinates `(x, y, z)` where `x + y + z == 0`.
//! Only `x` and `z` are stored; `y` is derived. Offset coordinates `(column, row)`
//! map to the row-major cell array used by the grid.
//!
//! Horizontal wrapping is opt-in: callers pass the wrap size (the map width in
//! cells, or 0 for no wrapping) instead of relying on any global state.

use serde::{Deserialize, Serialize};

use crate::metrics::{Vec3, INNER_DIAMETER, OUTER_RADIUS};

// =============================================================================
// DIRECTIONS
// =============================================================================

/// The six directions out of a hex cell, clockwise starting at north-east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HexDirection {
    NE,
    E,
    SE,
    SW,
    W,
    NW,
}

impl HexDirection {
    /// All directions in index order.
    pub const ALL: [HexDirection; 6] = [
        HexDirection::NE,
        HexDirection::E,
        HexDirection::SE,
        HexDirection::SW,
        HexDirection::W,
        HexDirection::NW,
    ];

    pub fn all() -> &'static [Self] {
        &Self::ALL
    }

    /// Index 0-5 used for neighbor and road arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Direction for an index, wrapping modulo 6.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 6]
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn previous(self) -> Self {
        Self::from_index(self.index() + 5)
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn previous2(self) -> Self {
        Self::from_index(self.index() + 4)
    }

    pub fn next2(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}

impl std::fmt::Display for HexDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NE => "ne",
            Self::E => "e",
            Self::SE => "se",
            Self::SW => "sw",
            Self::W => "w",
            Self::NW => "nw",
        };
        write!(f, "{}", name)
    }
}

// =============================================================================
// CUBE COORDINATES
// =============================================================================

/// Cube coordinate of a hex cell. `y` is always `-x - z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoordinates {
    x: i32,
    z: i32,
}

impl HexCoordinates {
    /// Construct from axial `(x, z)` without wrap normalization.
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Construct from axial `(x, z)`, shifting `x` by one wrap width when the
    /// corresponding offset column falls outside `[0, wrap_size)`.
    pub fn wrapped(mut x: i32, z: i32, wrap_size: i32) -> Self {
        if wrap_size > 0 {
            let offset_x = x + z / 2;
            if offset_x < 0 {
                x += wrap_size;
            } else if offset_x >= wrap_size {
                x -= wrap_size;
            }
        }
        Self { x, z }
    }

    pub fn from_offset_coordinates(column: i32, row: i32) -> Self {
        Self::new(column - row / 2, row)
    }

    /// Inverse of the hex-to-world projection. Rounds each cube component and,
    /// if the rounded triple is not a valid cube coordinate, recomputes the
    /// component with the largest rounding error from the other two.
    pub fn from_position(position: Vec3, wrap_size: i32) -> Self {
        let mut x = position.x / INNER_DIAMETER;
        let mut y = -x;

        let offset = position.z / (OUTER_RADIUS * 3.0);
        x -= offset;
        y -= offset;

        let mut ix = x.round_ties_even() as i32;
        let iy = y.round_ties_even() as i32;
        let mut iz = (-x - y).round_ties_even() as i32;

        if ix + iy + iz != 0 {
            let dx = (x - ix as f32).abs();
            let dy = (y - iy as f32).abs();
            let dz = (-x - y - iz as f32).abs();

            if dx > dy && dx > dz {
                ix = -iy - iz;
            } else if dz > dy {
                iz = -ix - iy;
            }
        }

        Self::wrapped(ix, iz, wrap_size)
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        -self.x - self.z
    }

    pub fn z(&self) -> i32 {
        self.z
    }

    /// Offset column of this coordinate (may be outside the map).
    pub fn offset_column(&self) -> i32 {
        self.x + self.z / 2
    }

    /// Cube distance ignoring wrapping.
    pub fn distance_to(&self, other: &HexCoordinates) -> i32 {
        let xy = (self.x - other.x).abs() + (self.y() - other.y()).abs();
        (xy + (self.z - other.z).abs()) / 2
    }

    /// Cube distance on a map that wraps horizontally every `wrap_size` columns.
    /// Falls back to [`distance_to`](Self::distance_to) when `wrap_size` is 0.
    pub fn wrapped_distance_to(&self, other: &HexCoordinates, wrap_size: i32) -> i32 {
        let mut best = self.distance_to(other);
        if wrap_size > 0 {
            for shift in [wrap_size, -wrap_size] {
                let shifted = HexCoordinates::new(other.x + shift, other.z);
                best = best.min(self.distance_to(&shifted));
            }
        }
        best
    }

    /// Multi-line label (one component per line) for cell overlays.
    pub fn to_string_on_separate_lines(&self) -> String {
        format!("{}\n{}\n{}", self.x, self.y(), self.z)
    }
}

impl std::fmt::Display for HexCoordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y(), self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_invariant_holds() {
        for z in -6..6 {
            for x in -6..6 {
                let c = HexCoordinates::new(x, z);
                assert_eq!(c.x() + c.y() + c.z(), 0);
                let w = HexCoordinates::wrapped(x, z, 8);
                assert_eq!(w.x() + w.y() + w.z(), 0);
            }
        }
    }

    #[test]
    fn test_offset_conversion() {
        let c = HexCoordinates::from_offset_coordinates(3, 4);
        assert_eq!(c.x(), 1);
        assert_eq!(c.z(), 4);
        assert_eq!(c.offset_column(), 3);
    }

    #[test]
    fn test_direction_helpers() {
        assert_eq!(HexDirection::NE.opposite(), HexDirection::SW);
        assert_eq!(HexDirection::NW.opposite(), HexDirection::SE);
        assert_eq!(HexDirection::NE.previous(), HexDirection::NW);
        assert_eq!(HexDirection::NW.next(), HexDirection::NE);
        assert_eq!(HexDirection::E.previous2(), HexDirection::NW);
        assert_eq!(HexDirection::SW.next2(), HexDirection::NW);
        for d in HexDirection::all() {
            assert_eq!(d.opposite().opposite(), *d);
        }
    }

    #[test]
    fn test_distance() {
        let a = HexCoordinates::from_offset_coordinates(0, 0);
        let b = HexCoordinates::from_offset_coordinates(3, 0);
        assert_eq!(a.distance_to(&b), 3);
        let c = HexCoordinates::from_offset_coordinates(0, 4);
        assert_eq!(a.distance_to(&c), 4);
        assert_eq!(a.distance_to(&a), 0);
    }

    #[test]
    fn test_wrapped_distance_is_symmetric() {
        let a = HexCoordinates::from_offset_coordinates(0, 2);
        let b = HexCoordinates::from_offset_coordinates(9, 2);
        assert_eq!(a.distance_to(&b), 9);
        assert_eq!(a.wrapped_distance_to(&b, 10), 1);
        assert_eq!(b.wrapped_distance_to(&a, 10), 1);
    }

    #[test]
    fn test_wrapped_construction_normalizes_column() {
        let c = HexCoordinates::wrapped(-1, 0, 10);
        assert_eq!(c.offset_column(), 9);
        let d = HexCoordinates::wrapped(10, 0, 10);
        assert_eq!(d.offset_column(), 0);
    }

    #[test]
    fn test_from_position_round_trips_cell_centers() {
        for row in 0..6 {
            for column in 0..6 {
                let position = crate::metrics::cell_center(column, row);
                let c = HexCoordinates::from_position(position, 0);
                assert_eq!(c, HexCoordinates::from_offset_coordinates(column, row));
            }
        }
    }
}
