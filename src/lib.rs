//! Hex world library
//!
//! A hexagonal cell grid with pathfinding, fog of war and traveling units,
//! a procedural terrain generator and a binary map format. Re-exports
//! modules for use by binaries and tools.

pub mod ascii;
pub mod cell;
pub mod coordinates;
pub mod error;
pub mod export;
pub mod generator;
pub mod grid;
pub mod metrics;
pub mod persistence;
pub mod queue;
pub mod refresh;
pub mod seeds;
pub mod unit;

pub use cell::{HexCell, TerrainType};
pub use coordinates::{HexCoordinates, HexDirection};
pub use error::HexMapError;
pub use generator::{GenerationReport, GeneratorConfig, HexMapGenerator};
pub use grid::{HexGrid, HexPath};
pub use unit::{HexUnit, MovementRules, UnitId};
