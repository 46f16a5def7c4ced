use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hex_world::ascii::{self, AsciiMode};
use hex_world::generator::{GeneratorConfig, HexMapGenerator, MapSize};
use hex_world::grid::HexGrid;
use hex_world::persistence;
use hex_world::seeds::MapSeeds;
use hex_world::unit::MovementRules;

#[derive(Parser, Debug)]
#[command(name = "hex_world")]
#[command(about = "Generate, inspect and save procedural hex maps")]
struct Args {
    /// Map size preset (small, medium, large)
    #[arg(long, default_value = "small")]
    size: MapSize,

    /// Cells per row, overriding the preset (multiple of 5)
    #[arg(short = 'W', long)]
    width: Option<i32>,

    /// Rows, overriding the preset (multiple of 5)
    #[arg(short = 'H', long)]
    height: Option<i32>,

    /// Wrap the map east-west
    #[arg(long)]
    wrap: bool,

    /// Master seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Generator settings as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Save the map to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Load a map instead of generating one
    #[arg(long)]
    load: Option<PathBuf>,

    /// ASCII view to print (terrain, elevation, moisture, rivers, visibility, path)
    #[arg(long, default_value = "terrain")]
    view: AsciiMode,

    /// Print with 24-bit terminal colors
    #[arg(long)]
    color: bool,

    /// Find a path between two offset coordinates, e.g. "3,4:12,9"
    #[arg(long)]
    path: Option<String>,

    /// Mark every cell explored before pathfinding
    #[arg(long)]
    reveal: bool,

    /// Export every view to a text file
    #[arg(long)]
    export: Option<PathBuf>,
}

fn parse_offset(text: &str) -> Option<(i32, i32)> {
    let (x, z) = text.split_once(',')?;
    Some((x.trim().parse().ok()?, z.trim().parse().ok()?))
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    let seeds = args.seed.map(MapSeeds::from_master).unwrap_or_default();
    info!(%seeds, "using seeds");
    let mut grid = HexGrid::new(seeds.metrics());

    let mut config = match &args.config {
        Some(path) => GeneratorConfig::from_json_file(path)?,
        None => GeneratorConfig::default(),
    };
    if args.seed.is_some() {
        config = config.with_seed(seeds.generator);
    }
    let mut generator = HexMapGenerator::new(config);

    let report = if let Some(path) = &args.load {
        println!("Loading map from {}", path.display());
        persistence::load_map_file(&mut grid, path)?;
        None
    } else {
        let (preset_x, preset_z) = args.size.dimensions();
        let x = args.width.unwrap_or(preset_x);
        let z = args.height.unwrap_or(preset_z);
        println!("Generating {}x{} map ({})", x, z, if args.wrap { "wrapping" } else { "flat" });
        let report = generator.generate_map(&mut grid, x, z, args.wrap)?;
        println!("{report}");
        Some(report)
    };

    if args.reveal {
        grid.explore_all();
    }

    let mut view = args.view;
    if let Some(text) = &args.path {
        let endpoints = text
            .split_once(':')
            .and_then(|(a, b)| Some((parse_offset(a)?, parse_offset(b)?)));
        let Some(((x1, z1), (x2, z2))) = endpoints else {
            return Err(format!("invalid path '{text}', expected x1,z1:x2,z2").into());
        };
        let from = grid.cell_index_at_offset(x1, z1).ok_or("path start outside the map")?;
        let to = grid.cell_index_at_offset(x2, z2).ok_or("path end outside the map")?;

        // a temporary unit at the start lifts the fog around it
        let unit = grid.add_unit(from, 0.0);
        match grid.find_path(from, to, MovementRules::default()) {
            Some(path) => {
                println!(
                    "Path: {} cells, cost {}, {} turn(s)",
                    path.len(),
                    path.total_cost(),
                    path.turns() + 1
                );
                view = AsciiMode::Path;
            }
            None => println!("No path from ({x1},{z1}) to ({x2},{z2})"),
        }
        if let Some(unit) = unit {
            grid.remove_unit(unit);
        }
    }

    println!("=== {} View ===", view.name());
    if args.color {
        ascii::print_colored_ascii_map(&grid, generator.climate(), view);
    } else {
        ascii::print_ascii_map(&grid, generator.climate(), view);
        if view == AsciiMode::Terrain {
            print!("{}", ascii::terrain_legend());
        }
    }

    if let Some(path) = &args.export {
        ascii::export_map_file(&grid, generator.climate(), report.as_ref(), path)?;
        println!("Exported views to {}", path.display());
    }

    if let Some(path) = &args.save {
        persistence::save_map_file(&grid, path)?;
        println!("Saved map to {}", path.display());
    }

    Ok(())
}
