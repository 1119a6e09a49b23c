//! Object spawning on top of the isolated biome regions.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biomes::{Biome, LayerStack};
use crate::error::{LevelGenError, Result};
use crate::processor::{GridProcessor, Point};
use crate::tilemap::Mask;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnableObjectType {
    pub name: String,
    pub viable_biomes: Vec<Biome>,
    /// Footprint edge length in cells (1 or 2).
    pub size: u32,
    /// Vertical pivot shift in cells (0 to 2).
    pub pivot_offset: f32,
    /// Percentage of eligible cells to cover (0 to 100).
    pub coverage: u32,
}

impl Default for SpawnableObjectType {
    fn default() -> Self {
        Self {
            name: "object".to_string(),
            viable_biomes: vec![Biome::Dirt],
            size: 1,
            pivot_offset: 0.0,
            coverage: 5,
        }
    }
}

impl SpawnableObjectType {
    pub fn validate(&self) -> Result<()> {
        if !(1..=2).contains(&self.size) {
            return Err(LevelGenError::Config(format!(
                "object '{}': size must be 1 or 2, got {}",
                self.name, self.size
            )));
        }
        if self.coverage > 100 {
            return Err(LevelGenError::Config(format!(
                "object '{}': coverage must be within 0..=100, got {}",
                self.name, self.coverage
            )));
        }
        if !(0.0..=2.0).contains(&self.pivot_offset) {
            return Err(LevelGenError::Config(format!(
                "object '{}': pivot offset must be within 0..=2, got {}",
                self.name, self.pivot_offset
            )));
        }
        Ok(())
    }

    /// World-space position of an object placed at `point` on a
    /// `map_width` x `map_height` level, in tile units centered on the map.
    pub fn world_position(&self, point: Point, map_width: usize, map_height: usize) -> (f32, f32) {
        let x = point.x as f32 * 0.5 - map_width as f32 / 4.0 + 0.25;
        let y = (point.y as f32 - self.pivot_offset) * 0.5 - map_height as f32 / 4.0 + 0.25;
        (x, y)
    }

    /// How many objects to place on `eligible` cells.
    pub fn target_count(&self, eligible: usize) -> usize {
        let footprint = (self.size * self.size) as f32;
        let target = (self.coverage as f32 / 100.0 * eligible as f32 / footprint).round() as usize;
        target.min(eligible)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectPlacement {
    pub name: String,
    pub positions: Vec<Point>,
}

/// Place every object type in order. Earlier types claim cells first.
pub fn spawn_objects<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    object_types: &[SpawnableObjectType],
    stack: &LayerStack,
    rng: &mut R,
) -> Result<Vec<ObjectPlacement>> {
    let isolated = stack.isolate_all(processor)?;
    let mut occupied = Mask::new(stack.width(), stack.height());
    let mut placements = Vec::with_capacity(object_types.len());

    for object in object_types {
        let mut eligible = Mask::new(stack.width(), stack.height());
        for biome in &object.viable_biomes {
            if let Some(region) = isolated.get(biome) {
                processor.intersect_add(region, &mut eligible)?;
            }
        }
        if let Some(cliffs) = isolated.get(&Biome::None) {
            processor.intersect_remove(cliffs, &mut eligible)?;
        }
        processor.intersect_remove(&occupied, &mut eligible)?;
        if object.size > 1 {
            let outline = processor.outline_mask(&eligible);
            processor.intersect_remove(&outline, &mut eligible)?;
        }

        let mut candidates = processor.active_positions(&eligible);
        let available = candidates.len();
        let target = object.target_count(available);
        let mut positions = Vec::with_capacity(target);
        while positions.len() < target && !candidates.is_empty() {
            let point = candidates.swap_remove(rng.gen_range(0..candidates.len()));
            occupied.set(point.x, point.y, true);
            positions.push(point);
        }

        debug!("{}: {} of {} eligible cells", object.name, positions.len(), available);
        placements.push(ObjectPlacement {
            name: object.name.clone(),
            positions,
        });
    }

    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::biomes::{BiomeLayer, LayerKind};
    use crate::processor::CpuGridProcessor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn stack() -> LayerStack {
        let processor = CpuGridProcessor::new();
        let mut stack = LayerStack::new(12, 12);
        let mut dirt = Mask::new(12, 12);
        processor.fill_rect(&mut dirt, Point::new(1, 1), 10, 10);
        let mut grass = Mask::new(12, 12);
        processor.fill_rect(&mut grass, Point::new(1, 6), 10, 5);
        let mut cliff = Mask::new(12, 12);
        processor.fill_rect(&mut cliff, Point::new(1, 1), 10, 1);

        for (biome, kind, order, mask) in [
            (Biome::Dirt, LayerKind::TerrainBody, 0, dirt),
            (Biome::None, LayerKind::TerrainCliff, 1, cliff),
            (Biome::LightGrass1, LayerKind::Grass, 2, grass),
        ] {
            stack
                .push(BiomeLayer {
                    biome,
                    kind,
                    step: 0,
                    sorting_order: order,
                    mask,
                })
                .unwrap();
        }
        stack
    }

    #[test]
    fn test_target_count() {
        let object = SpawnableObjectType {
            size: 2,
            coverage: 50,
            ..Default::default()
        };
        assert_eq!(object.target_count(40), 5);
        assert_eq!(object.target_count(0), 0);
    }

    #[test]
    fn test_objects_respect_biomes_and_each_other() {
        let processor = CpuGridProcessor::new();
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let types = vec![
            SpawnableObjectType {
                name: "bush".into(),
                viable_biomes: vec![Biome::LightGrass1],
                coverage: 100,
                ..Default::default()
            },
            SpawnableObjectType {
                name: "rock".into(),
                viable_biomes: vec![Biome::Dirt, Biome::LightGrass1],
                coverage: 100,
                ..Default::default()
            },
        ];
        let placements = spawn_objects(&processor, &types, &stack(), &mut rng).unwrap();

        // Grass fills rows 6..=10, so every grass cell gets a bush.
        assert_eq!(placements[0].positions.len(), 50);
        assert!(placements[0].positions.iter().all(|p| p.y >= 6));
        // Rocks take the remaining dirt, never the cliff row.
        assert_eq!(placements[1].positions.len(), 40);
        assert!(placements[1].positions.iter().all(|p| (2..6).contains(&p.y)));

        let all: HashSet<_> = placements.iter().flat_map(|p| p.positions.iter()).collect();
        assert_eq!(all.len(), 90);
    }

    #[test]
    fn test_large_objects_skip_outline() {
        let processor = CpuGridProcessor::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let types = vec![SpawnableObjectType {
            name: "tree".into(),
            viable_biomes: vec![Biome::LightGrass1],
            size: 2,
            coverage: 100,
            ..Default::default()
        }];
        let placements = spawn_objects(&processor, &types, &stack(), &mut rng).unwrap();
        // Inner grass region is 8x3 = 24 cells, 24 / 4 = 6 trees.
        assert_eq!(placements[0].positions.len(), 6);
        for p in &placements[0].positions {
            assert!((2..=9).contains(&p.x) && (7..=9).contains(&p.y), "{p:?}");
        }
    }

    #[test]
    fn test_full_coverage_on_large_map() {
        let processor = CpuGridProcessor::new();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut stack = LayerStack::new(160, 160);
        stack
            .push(BiomeLayer {
                biome: Biome::Dirt,
                kind: LayerKind::TerrainBody,
                step: 0,
                sorting_order: 0,
                mask: Mask::bordered(160, 160, 1),
            })
            .unwrap();
        let types = vec![SpawnableObjectType {
            name: "rock".into(),
            coverage: 100,
            ..Default::default()
        }];
        let placements = spawn_objects(&processor, &types, &stack, &mut rng).unwrap();

        let positions = &placements[0].positions;
        assert_eq!(positions.len(), 158 * 158);
        let unique: HashSet<_> = positions.iter().collect();
        assert_eq!(unique.len(), positions.len());
    }

    #[test]
    fn test_world_position() {
        let object = SpawnableObjectType {
            pivot_offset: 1.0,
            ..Default::default()
        };
        assert_eq!(object.world_position(Point::new(4, 4), 8, 8), (0.25, -0.25));
    }
}
