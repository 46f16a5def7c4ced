//! Render a generated (or saved) map to PNG images, one per layer

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hex_world::export::{export_map_png, ImageLayer};
use hex_world::generator::{GeneratorConfig, HexMapGenerator, MapSize};
use hex_world::grid::HexGrid;
use hex_world::persistence;
use hex_world::seeds::MapSeeds;

#[derive(Parser, Debug)]
#[command(name = "render_map")]
#[command(about = "Render hex maps to PNG")]
struct Args {
    /// Map size preset (small, medium, large)
    #[arg(long, default_value = "medium")]
    size: MapSize,

    /// Wrap the map east-west
    #[arg(long)]
    wrap: bool,

    /// Master seed
    #[arg(short, long, default_value = "12345")]
    seed: u64,

    /// Render a saved map instead of generating one
    #[arg(long)]
    load: Option<PathBuf>,

    /// Pixels per world unit
    #[arg(long, default_value = "1.0")]
    scale: f32,

    /// Output file prefix; layers are written to <prefix>_<layer>.png
    #[arg(short, long, default_value = "hex_map")]
    output: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let seeds = MapSeeds::from_master(args.seed);
    let mut grid = HexGrid::new(seeds.metrics());
    let mut generator = HexMapGenerator::new(GeneratorConfig::default().with_seed(seeds.generator));

    match &args.load {
        Some(path) => persistence::load_map_file(&mut grid, path)?,
        None => {
            let (x, z) = args.size.dimensions();
            let report = generator.generate_map(&mut grid, x, z, args.wrap)?;
            println!("{report}");
        }
    }

    for layer in ImageLayer::all() {
        // saved maps carry no climate
        if *layer == ImageLayer::Moisture && generator.climate().is_empty() {
            continue;
        }
        let path = format!("{}_{}.png", args.output, layer.name());
        export_map_png(&grid, generator.climate(), *layer, args.scale, &path)?;
        println!("Wrote {}", path);
    }

    Ok(())
}
