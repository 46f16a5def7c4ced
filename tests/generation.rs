//! End-to-end: generate a map, walk a unit across it, save and reload it.

use std::io::Cursor;

use hex_world::generator::{GeneratorConfig, HexMapGenerator};
use hex_world::grid::HexGrid;
use hex_world::metrics::MapMetrics;
use hex_world::persistence::{load_map, save_map, MapSnapshot};
use hex_world::seeds::MapSeeds;
use hex_world::unit::MovementRules;

fn generated(seed: u64, wrapping: bool) -> (HexGrid, HexMapGenerator) {
    let seeds = MapSeeds::from_master(seed);
    let mut grid = HexGrid::new(seeds.metrics());
    let mut generator = HexMapGenerator::new(GeneratorConfig::default().with_seed(seeds.generator));
    generator.generate_map(&mut grid, 40, 30, wrapping).unwrap();
    (grid, generator)
}

#[test]
fn test_generated_map_is_consistent() {
    for wrapping in [false, true] {
        let (grid, generator) = generated(2024, wrapping);
        let config = &generator.config;
        assert_eq!(grid.cell_count(), 1200);

        let land = grid.cells().iter().filter(|c| !c.is_underwater()).count();
        assert!(land > 0 && land < 1200);

        for (index, cell) in grid.cells().iter().enumerate() {
            assert!(cell.elevation() <= config.elevation_maximum);
            assert!(cell.elevation() >= config.elevation_minimum - 1);
            assert!(!cell.has_roads());

            if let Some(direction) = cell.outgoing_river() {
                let next = cell.neighbor(direction).unwrap();
                assert!(grid.is_valid_river_destination(index, next));
                assert_eq!(grid.cells()[next].incoming_river(), Some(direction.opposite()));
            }
            if cell.terrain_type() == hex_world::TerrainType::Snow && !cell.is_underwater() {
                assert_eq!(cell.plant_level(), 0);
            }
        }

        assert_eq!(generator.climate().len(), 1200);
        assert!(generator
            .climate()
            .iter()
            .all(|c| (0.0..=1.0).contains(&c.moisture)));
    }
}

#[test]
fn test_seed_reproduces_map() {
    let (a, _) = generated(77, false);
    let (b, _) = generated(77, false);
    let (c, _) = generated(78, false);
    assert_eq!(MapSnapshot::capture(&a), MapSnapshot::capture(&b));
    assert_ne!(MapSnapshot::capture(&a), MapSnapshot::capture(&c));
}

#[test]
fn test_unit_travels_and_map_round_trips() {
    let (mut grid, _) = generated(9, false);
    grid.explore_all();
    let rules = MovementRules::default();

    // any pair of dry cells at least two steps apart with a path between them
    let land: Vec<usize> = (0..grid.cell_count())
        .filter(|&i| {
            let cell = &grid.cells()[i];
            cell.explorable() && !cell.is_underwater()
        })
        .collect();
    let mut found = None;
    'search: for &from in &land {
        for &to in &land {
            if grid.distance(from, to) < 2 {
                continue;
            }
            if let Some(path) = grid.find_path(from, to, rules) {
                found = Some(path);
                break 'search;
            }
        }
    }
    let path = found.expect("generated map has connected land");

    let cells = path.cells();
    for pair in cells.windows(2) {
        assert_eq!(grid.distance(pair[0], pair[1]), 1);
    }
    assert!(path.distances().windows(2).all(|d| d[0] < d[1]));

    let origin = path.origin().unwrap();
    let destination = path.destination().unwrap();
    let unit = grid.add_unit(origin, 0.0).unwrap();
    assert!(grid.travel(unit, cells));
    assert_eq!(grid.unit(unit).unwrap().location(), destination);

    for _ in 0..1000 {
        if !grid.unit(unit).unwrap().is_traveling() {
            break;
        }
        grid.tick(0.05);
    }
    assert!(!grid.unit(unit).unwrap().is_traveling());
    assert!(grid.cells()[destination].is_visible());

    let mut bytes = Vec::new();
    save_map(&grid, &mut bytes).unwrap();
    let mut loaded = HexGrid::new(MapMetrics::default());
    load_map(&mut loaded, &mut Cursor::new(bytes)).unwrap();
    assert_eq!(MapSnapshot::capture(&loaded), MapSnapshot::capture(&grid));
    assert_eq!(loaded.units().len(), 1);

    grid.remove_unit(unit);
    assert!(grid.cells().iter().all(|cell| cell.visibility() == 0));
}
