//! Debug tool: print a single height step, its autotiled body and its cliffs as ASCII

use std::error::Error;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use level_generator::ascii::{render_cliffs, render_mask, render_tiles, tile_legend};
use level_generator::autotile::classify_tiles;
use level_generator::cliffs::classify_cliffs;
use level_generator::islands::generate_islands;
use level_generator::processor::GridPool;
use level_generator::terrain::{generate_height_step, split_cliffs};
use level_generator::tilemap::Mask;
use level_generator::{CpuGridProcessor, GridProcessor, LevelConfig};

#[derive(Parser, Debug)]
#[command(name = "debug_tiles")]
#[command(about = "Print one terrain step and its tiles as ASCII")]
struct Args {
    /// Random seed
    #[arg(short, long, default_value = "12345")]
    seed: u64,

    /// Grid edge length in cells
    #[arg(long, default_value = "24")]
    size: usize,

    /// Fraction of the height left below the step
    #[arg(long, default_value = "0.6")]
    baseline: f32,

    /// Fraction of the height the step may add on top
    #[arg(long, default_value = "0.2")]
    share: f32,

    /// Stamp islands instead of a height step
    #[arg(long)]
    islands: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();
    let config = LevelConfig::default();
    let processor = CpuGridProcessor::sequential();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    let full_map = Mask::bordered(args.size, args.size, 1);
    let mask = if args.islands {
        let pool = GridPool::new();
        generate_islands(&processor, &full_map, &config.island_strategy, &pool, &mut rng)?.mask
    } else {
        generate_height_step(
            &processor,
            &full_map,
            args.baseline,
            args.share,
            &config.continuation_strategy,
            &mut rng,
        )?
    };
    let (body, cliff) = split_cliffs(&processor, &mask)?;

    println!("=== MASK ({}x{}) seed={} ===", args.size, args.size, args.seed);
    print!("{}", render_mask(&mask));
    println!(
        "{} active cells, {} cliff cells",
        processor.active_count(&mask),
        processor.active_count(&cliff)
    );
    println!();

    let tiles = classify_tiles(&processor, &body, &config.middle_tile_strategy, &mut rng)?;
    println!("=== BODY TILES ({}x{}) ===", tiles.width, tiles.height);
    print!("{}", tile_legend());
    print!("{}", render_tiles(&tiles));
    println!();

    let cliffs = classify_cliffs(&processor, &cliff, &tiles)?;
    println!("=== CLIFF TILES ===");
    print!("{}", render_cliffs(&cliffs));

    Ok(())
}
