use std::error::Error;
use std::path::PathBuf;

use clap::Parser;

use level_generator::biomes::LayerKind;
use level_generator::export::{write_level_json, PreviewRenderer};
use level_generator::{CpuGridProcessor, LevelConfig, LevelGenerator, LevelSeeds};

#[derive(Parser, Debug)]
#[command(name = "level_generator")]
#[command(about = "Generate layered 2D tile levels with cliffs, grass and floating islands")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Edge length of the level in cells (8-400, overrides the config)
    #[arg(short = 'w', long)]
    world_size: Option<usize>,

    /// JSON level config (defaults are used for missing fields)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep the outer border instead of cropping it
    #[arg(long)]
    no_crop: bool,

    /// Skip floating islands
    #[arg(long)]
    no_islands: bool,

    /// Skip object spawning
    #[arg(long)]
    no_objects: bool,

    /// Run grid operations on a single thread
    #[arg(long)]
    sequential: bool,

    /// Export the generated level as JSON
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// Export a PNG preview (one pixel per tile)
    #[arg(long)]
    export_png: Option<PathBuf>,

    /// Print the effective config as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => LevelConfig::from_json_file(path)?,
        None => LevelConfig::default(),
    };
    if let Some(world_size) = args.world_size {
        config.world_size = world_size;
    }
    if args.no_crop {
        config.crop_edges = false;
    }
    if args.no_islands {
        config.spawn_islands = false;
    }
    if args.no_objects {
        config.spawn_objects = false;
    }

    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let seeds = LevelSeeds::from_master(seed);
    let processor = if args.sequential {
        CpuGridProcessor::sequential()
    } else {
        CpuGridProcessor::new()
    };

    println!("Generating level with seed: {}", seed);
    println!(
        "World size: {}x{} ({} height steps)",
        config.world_size,
        config.world_size,
        config.step_count()
    );

    let mut renderer = PreviewRenderer::new();
    let level = {
        let mut generator = LevelGenerator::new(config, &processor, &mut renderer)?;
        generator.generate_new_level(&seeds)?
    };

    for step in 0..level.stack.len() {
        let bodies: Vec<_> = level.stack.find(step, LayerKind::TerrainBody).collect();
        if bodies.is_empty() {
            break;
        }
        let cells: usize = bodies.iter().map(|l| l.mask.count_active()).sum();
        let islands: usize = level
            .stack
            .find(step, LayerKind::IslandBody)
            .map(|l| l.mask.count_active())
            .sum();
        println!("Step {}: {} terrain cells, {} island cells", step, cells, islands);
    }
    println!("Layers: {}", level.layers.len());
    for placement in &level.objects {
        println!("Objects: {} x{}", placement.name, placement.positions.len());
    }

    if let Some(path) = &args.export_json {
        println!("Exporting level to {}...", path.display());
        write_level_json(&level, path)?;
    }
    if let Some(path) = &args.export_png {
        println!("Exporting preview to {}...", path.display());
        renderer.save(path)?;
    }

    println!("Done!");
    Ok(())
}
