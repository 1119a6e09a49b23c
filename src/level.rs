//! Level orchestration.
//!
//! A pass runs in fixed stages: height steps, trimming, grass, islands,
//! objects, then autotiling of every layer. Nothing reaches the renderer
//! until the whole pass has succeeded.

use std::time::Instant;

use log::{debug, info};
use rand::Rng;
use serde::Serialize;

use crate::autotile::classify_tiles;
use crate::biomes::{Biome, BiomeLayer, LayerKind, LayerStack};
use crate::cliffs::classify_cliffs;
use crate::config::LevelConfig;
use crate::error::{LevelGenError, Result};
use crate::islands::generate_islands;
use crate::objects::{spawn_objects, ObjectPlacement};
use crate::processor::{GridPool, GridProcessor};
use crate::render::{LevelRenderer, RenderLayer};
use crate::seeds::LevelSeeds;
use crate::terrain::{
    create_grass, generate_height_step, leave_space_on_bottom_edges, split_cliffs,
};
use crate::tilemap::Mask;

/// Sorting orders reserved per height step.
pub const LAYER_ORDER_STRIDE: i32 = 10;

/// Everything one pass produced.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedLevel {
    pub seeds: LevelSeeds,
    /// Edge length of the level grid.
    pub size: usize,
    pub crop_offset: usize,
    pub layers: Vec<RenderLayer>,
    pub objects: Vec<ObjectPlacement>,
    #[serde(skip)]
    pub stack: LayerStack,
}

struct StepMasks {
    body: Mask,
    cliff: Mask,
}

struct IslandMasks {
    step: usize,
    body: Mask,
    cliff: Mask,
    sorting_order: i32,
}

fn base_order(step: usize) -> i32 {
    LAYER_ORDER_STRIDE * step as i32
}

fn terrain_atlas(config: &LevelConfig, step: usize) -> &str {
    config
        .terrain_strategy
        .get(step)
        .map_or("", |s| s.terrain_atlas.as_str())
}

fn push_layer(
    stack: &mut LayerStack,
    biome: Biome,
    kind: LayerKind,
    step: usize,
    sorting_order: i32,
    mask: &Mask,
) -> Result<()> {
    stack.push(BiomeLayer {
        biome,
        kind,
        step,
        sorting_order,
        mask: mask.clone(),
    })
}

/// Height steps, each generated inside the previous one's body.
fn generate_steps<P: GridProcessor, R: Rng + ?Sized>(
    config: &LevelConfig,
    processor: &P,
    full_map: &Mask,
    rng: &mut R,
) -> Result<Vec<StepMasks>> {
    let shares = config.terrain_strategy.shares();
    let mut steps = vec![StepMasks {
        body: full_map.clone(),
        cliff: Mask::new(full_map.width, full_map.height),
    }];

    for i in 1..shares.len() {
        let baseline: f32 = shares[i..].iter().sum();
        let mask = generate_height_step(
            processor,
            &steps[i - 1].body,
            baseline,
            shares[i],
            &config.continuation_strategy,
            rng,
        )?;
        let (body, cliff) = split_cliffs(processor, &mask)?;
        debug!(
            "step {i}: {} body cells, {} cliff cells",
            processor.active_count(&body),
            processor.active_count(&cliff)
        );
        steps.push(StepMasks { body, cliff });
    }
    Ok(steps)
}

/// Drop the parts of each step covered by the next one, keeping the cells
/// right next to the higher step so grass doesn't end abruptly under a cliff.
fn trim_hidden_terrain<P: GridProcessor>(
    processor: &P,
    steps: &mut [StepMasks],
    full_map: &Mask,
) -> Result<()> {
    for i in 0..steps.len().saturating_sub(1) {
        let (lower, upper) = steps.split_at_mut(i + 1);
        let (lower, upper) = (&mut lower[i].body, &upper[0].body);
        processor.intersect_remove(upper, lower)?;
        let lip = processor.neighbors_with(lower, upper)?;
        processor.intersect_add(&lip, lower)?;
        processor.intersect(full_map, lower)?;
    }
    Ok(())
}

/// Run a full pass without touching any renderer.
pub fn build_level<P: GridProcessor>(
    config: &LevelConfig,
    processor: &P,
    seeds: &LevelSeeds,
) -> Result<GeneratedLevel> {
    config.validate()?;

    let size = config.size();
    let crop_offset = config.crop_offset();
    let step_count = config.step_count();
    let full_map = Mask::bordered(size, size, 1);
    let pool = GridPool::new();

    let mut terrain_rng = seeds.terrain_rng();
    let mut grass_rng = seeds.grass_rng();
    let mut islands_rng = seeds.islands_rng();
    let mut objects_rng = seeds.objects_rng();
    let mut tiles_rng = seeds.tiles_rng();

    let mut steps = generate_steps(config, processor, &full_map, &mut terrain_rng)?;
    trim_hidden_terrain(processor, &mut steps, &full_map)?;

    let mut stack = LayerStack::new(size, size);
    for (i, step) in steps.iter().enumerate() {
        let order = base_order(i);
        push_layer(&mut stack, Biome::Dirt, LayerKind::TerrainBody, i, order, &step.body)?;
        push_layer(&mut stack, Biome::None, LayerKind::TerrainCliff, i, order + 1, &step.cliff)?;
    }

    // Each grass layer grows inside the one below it.
    for (i, strategy) in config.terrain_strategy.items().enumerate() {
        let mut available = steps[i].body.clone();
        let mut order = base_order(i) + 2;
        for layer in &strategy.grass_layers {
            let coverage = layer.coverage as f32 / 100.0;
            available = create_grass(processor, &available, coverage, &mut grass_rng)?;
            push_layer(&mut stack, layer.biome, LayerKind::Grass, i, order, &available)?;
            order += 1;
        }
    }

    let mut islands = Vec::new();
    if config.spawn_islands {
        for i in 0..step_count {
            let mut available = steps[i].body.clone();
            if let Some(next) = steps.get(i + 1) {
                let margin = processor.expand(&next.cliff);
                processor.intersect_remove(&margin, &mut available)?;
            }
            let available = leave_space_on_bottom_edges(processor, &available)?;

            let grass_count = config
                .terrain_strategy
                .get(i)
                .map_or(0, |s| s.grass_layers.len()) as i32;
            let start_order = base_order(i) + grass_count + 2;

            let strategy = &config.island_strategy;
            let placement =
                generate_islands(processor, &available, strategy, &pool, &mut islands_rng)?;
            let (body, cliff) = split_cliffs(processor, &placement.mask)?;
            push_layer(&mut stack, Biome::Dirt, LayerKind::IslandBody, i, start_order, &body)?;
            let cliff_order = start_order + 1;
            push_layer(&mut stack, Biome::None, LayerKind::IslandCliff, i, cliff_order, &cliff)?;

            // Islands borrow their look from two steps up.
            let island_style = config.terrain_strategy.get((i + 2) % step_count);
            if let Some(style) = island_style.filter(|s| !s.grass_layers.is_empty()) {
                let pick = islands_rng.gen_range(0..style.grass_layers.len());
                let layer = &style.grass_layers[pick];
                let coverage = layer.coverage as f32 / 100.0;
                let grass = create_grass(processor, &body, coverage, &mut islands_rng)?;
                let order = start_order + 2;
                push_layer(&mut stack, layer.biome, LayerKind::IslandGrass, i, order, &grass)?;
            }

            debug!("step {i}: {} island rects", placement.rects.len());
            islands.push(IslandMasks {
                step: i,
                body,
                cliff,
                sorting_order: start_order,
            });
        }
    }

    let objects = if config.spawn_objects {
        spawn_objects(processor, &config.spawnable_objects, &stack, &mut objects_rng)?
    } else {
        Vec::new()
    };

    let middle_tiles = &config.middle_tile_strategy;
    let mut layers = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        let mut bodies = vec![(
            (LayerKind::TerrainBody, LayerKind::TerrainCliff),
            &step.body,
            &step.cliff,
            base_order(i),
            terrain_atlas(config, i),
        )];
        if let Some(island) = islands.iter().find(|island| island.step == i) {
            bodies.push((
                (LayerKind::IslandBody, LayerKind::IslandCliff),
                &island.body,
                &island.cliff,
                island.sorting_order,
                terrain_atlas(config, (i + 2) % step_count),
            ));
        }

        for ((body_kind, cliff_kind), body, cliff, order, atlas) in bodies {
            let body_tiles = classify_tiles(processor, body, middle_tiles, &mut tiles_rng)?;
            let cliff_tiles = classify_cliffs(processor, cliff, &body_tiles)?;
            layers.push(RenderLayer::from_tiles(
                body_kind,
                Biome::Dirt,
                i,
                order,
                atlas,
                &body_tiles,
                crop_offset,
            ));
            layers.push(RenderLayer::from_tiles(
                cliff_kind,
                Biome::None,
                i,
                order + 1,
                &config.cliff_atlas,
                &cliff_tiles,
                crop_offset,
            ));
        }
    }

    let mut grass_layers: Vec<_> = stack
        .layers()
        .iter()
        .filter(|l| matches!(l.kind, LayerKind::Grass | LayerKind::IslandGrass))
        .collect();
    grass_layers.sort_by_key(|l| l.sorting_order);
    for layer in grass_layers {
        let atlas = config.atlas_for(layer.biome).ok_or_else(|| {
            LevelGenError::Config(format!("no atlas configured for {}", layer.biome))
        })?;
        let tiles = classify_tiles(processor, &layer.mask, middle_tiles, &mut tiles_rng)?;
        layers.push(RenderLayer::from_tiles(
            layer.kind,
            layer.biome,
            layer.step,
            layer.sorting_order,
            atlas,
            &tiles,
            crop_offset,
        ));
    }

    Ok(GeneratedLevel {
        seeds: seeds.clone(),
        size,
        crop_offset,
        layers,
        objects,
        stack,
    })
}

/// Drives passes against an injected processor and renderer.
pub struct LevelGenerator<'a, P, R> {
    config: LevelConfig,
    processor: &'a P,
    renderer: &'a mut R,
}

impl<'a, P: GridProcessor, R: LevelRenderer> LevelGenerator<'a, P, R> {
    /// Fails on an invalid config before any pass runs.
    pub fn new(config: LevelConfig, processor: &'a P, renderer: &'a mut R) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            processor,
            renderer,
        })
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    /// Build a complete level, then replace whatever the renderer showed before.
    pub fn generate_new_level(&mut self, seeds: &LevelSeeds) -> Result<GeneratedLevel> {
        let start = Instant::now();
        let level = build_level(&self.config, self.processor, seeds)?;

        self.renderer.cleanup();
        for layer in &level.layers {
            self.renderer.render_tilemap(layer);
        }
        if self.config.spawn_objects {
            self.renderer
                .render_objects(&level.objects, &self.config.spawnable_objects, level.size);
        }

        info!(
            "level {} generated in {}ms ({} layers, {} objects)",
            seeds.master,
            start.elapsed().as_millis(),
            level.layers.len(),
            level.objects.iter().map(|o| o.positions.len()).sum::<usize>()
        );
        Ok(level)
    }
}
