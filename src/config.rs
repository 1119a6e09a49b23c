//! Level configuration.
//!
//! Everything a level pass needs besides its seeds. Loadable from JSON; any
//! field left out falls back to the defaults below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::autotile::validate_middle_tiles;
use crate::biomes::Biome;
use crate::error::{LevelGenError, Result};
use crate::islands::IslandStrategy;
use crate::objects::SpawnableObjectType;
use crate::terrain::HeightContinuation;
use crate::tiles::TileType;
use crate::weighted::WeightedSelection;

pub const MIN_WORLD_SIZE: usize = 8;
pub const MAX_WORLD_SIZE: usize = 400;

/// Grass layers a single step may own before its sorting orders would run
/// into the next step's.
pub const MAX_GRASS_LAYERS: usize = 5;

/// Extra border generated when `crop_edges` is on, cut off again before rendering.
pub const CROP_OFFSET: usize = 4;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GrassLayer {
    pub biome: Biome,
    /// 0-100
    pub coverage: u32,
}

/// One height step: its ground atlas and the grass grown on it, bottom first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TerrainStrategy {
    pub terrain_atlas: String,
    pub grass_layers: Vec<GrassLayer>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeAtlas {
    pub biome: Biome,
    pub atlas: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub world_size: usize,
    pub crop_edges: bool,
    pub spawn_objects: bool,
    pub spawn_islands: bool,
    pub cliff_atlas: String,
    /// Height steps, lowest first. Weights are each step's share of the map height.
    pub terrain_strategy: WeightedSelection<TerrainStrategy>,
    pub continuation_strategy: WeightedSelection<HeightContinuation>,
    pub spawnable_objects: Vec<SpawnableObjectType>,
    pub island_strategy: IslandStrategy,
    pub middle_tile_strategy: WeightedSelection<TileType>,
    pub biome_atlases: Vec<BiomeAtlas>,
}

fn grass(biome: Biome, coverage: u32) -> GrassLayer {
    GrassLayer { biome, coverage }
}

fn step(atlas: &str, grass_layers: Vec<GrassLayer>) -> TerrainStrategy {
    TerrainStrategy {
        terrain_atlas: atlas.to_string(),
        grass_layers,
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        let terrain_strategy = WeightedSelection::from_pairs([
            (
                step(
                    "terrain_meadow",
                    vec![grass(Biome::LightGrass1, 60), grass(Biome::LightGrass2, 35)],
                ),
                30,
            ),
            (
                step(
                    "terrain_forest",
                    vec![grass(Biome::DarkGrass1, 55), grass(Biome::DarkGrass2, 25)],
                ),
                25,
            ),
            (step("terrain_hills", vec![grass(Biome::LightGrass3, 45)]), 25),
            (step("terrain_peaks", vec![grass(Biome::DarkGrass3, 30)]), 20),
        ]);

        let continuation_strategy = WeightedSelection::from_pairs([
            (HeightContinuation::GoDownTwice, 1),
            (HeightContinuation::GoDown, 3),
            (HeightContinuation::Stay, 6),
            (HeightContinuation::GoUp, 3),
            (HeightContinuation::GoUpTwice, 1),
        ]);

        let all_grass = vec![
            Biome::LightGrass1,
            Biome::LightGrass2,
            Biome::LightGrass3,
            Biome::DarkGrass1,
            Biome::DarkGrass2,
            Biome::DarkGrass3,
        ];
        let spawnable_objects = vec![
            SpawnableObjectType {
                name: "tree".to_string(),
                viable_biomes: vec![Biome::DarkGrass1, Biome::DarkGrass2, Biome::DarkGrass3],
                size: 2,
                pivot_offset: 1.0,
                coverage: 12,
            },
            SpawnableObjectType {
                name: "bush".to_string(),
                viable_biomes: all_grass,
                size: 1,
                pivot_offset: 0.25,
                coverage: 6,
            },
            SpawnableObjectType {
                name: "rock".to_string(),
                viable_biomes: vec![Biome::Dirt],
                size: 1,
                pivot_offset: 0.0,
                coverage: 3,
            },
        ];

        let middle_tile_strategy = WeightedSelection::from_pairs([
            (TileType::Middle1BotL, 40),
            (TileType::Middle2BotL, 20),
            (TileType::Middle3BotL, 15),
            (TileType::Middle4BotL, 10),
            (TileType::Middle5BotL, 10),
            (TileType::Middle6BotL, 5),
        ]);

        let biome_atlases = [
            (Biome::LightGrass1, "grass_light_1"),
            (Biome::LightGrass2, "grass_light_2"),
            (Biome::LightGrass3, "grass_light_3"),
            (Biome::DarkGrass1, "grass_dark_1"),
            (Biome::DarkGrass2, "grass_dark_2"),
            (Biome::DarkGrass3, "grass_dark_3"),
        ]
        .into_iter()
        .map(|(biome, atlas)| BiomeAtlas {
            biome,
            atlas: atlas.to_string(),
        })
        .collect();

        Self {
            world_size: 50,
            crop_edges: true,
            spawn_objects: true,
            spawn_islands: true,
            cliff_atlas: "cliffs".to_string(),
            terrain_strategy,
            continuation_strategy,
            spawnable_objects,
            island_strategy: IslandStrategy::default(),
            middle_tile_strategy,
            biome_atlases,
        }
    }
}

impl LevelConfig {
    /// Load and validate a JSON config.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn crop_offset(&self) -> usize {
        if self.crop_edges {
            CROP_OFFSET
        } else {
            0
        }
    }

    /// Edge length of the generated (square) grid, crop margin included.
    pub fn size(&self) -> usize {
        self.world_size + self.crop_offset() / 2
    }

    pub fn step_count(&self) -> usize {
        self.terrain_strategy.len()
    }

    pub fn atlas_for(&self, biome: Biome) -> Option<&str> {
        self.biome_atlases
            .iter()
            .find(|entry| entry.biome == biome)
            .map(|entry| entry.atlas.as_str())
    }

    /// Reject anything that would make a pass fail halfway.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_WORLD_SIZE..=MAX_WORLD_SIZE).contains(&self.world_size) {
            return Err(LevelGenError::Config(format!(
                "world size must be within {MIN_WORLD_SIZE}..={MAX_WORLD_SIZE}, got {}",
                self.world_size
            )));
        }
        if self.terrain_strategy.is_empty() || self.terrain_strategy.total_weight() == 0 {
            return Err(LevelGenError::Config(
                "terrain strategy needs at least one step with a positive weight".to_string(),
            ));
        }
        if self.continuation_strategy.total_weight() == 0 {
            return Err(LevelGenError::Config(
                "continuation strategy needs at least one positive weight".to_string(),
            ));
        }
        validate_middle_tiles(&self.middle_tile_strategy)?;
        if self.spawn_islands {
            self.island_strategy.validate()?;
        }
        for object in &self.spawnable_objects {
            object.validate()?;
        }

        for (i, step) in self.terrain_strategy.items().enumerate() {
            if step.grass_layers.len() > MAX_GRASS_LAYERS {
                return Err(LevelGenError::Config(format!(
                    "terrain step {i} has {} grass layers, at most {MAX_GRASS_LAYERS} are supported",
                    step.grass_layers.len()
                )));
            }
            for layer in &step.grass_layers {
                if !layer.biome.is_grass() {
                    return Err(LevelGenError::Config(format!(
                        "terrain step {i}: {} is not a grass biome",
                        layer.biome
                    )));
                }
                if layer.coverage > 100 {
                    return Err(LevelGenError::Config(format!(
                        "terrain step {i}: grass coverage must be within 0..=100, got {}",
                        layer.coverage
                    )));
                }
                if self.atlas_for(layer.biome).is_none() {
                    return Err(LevelGenError::Config(format!(
                        "terrain step {i}: no atlas configured for {}",
                        layer.biome
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = LevelConfig::default();
        config.validate().unwrap();
        assert_eq!(config.size(), 52);
        let uncropped = LevelConfig {
            crop_edges: false,
            ..LevelConfig::default()
        };
        assert_eq!(uncropped.size(), 50);
    }

    #[test]
    fn test_rejects_world_size() {
        let config = LevelConfig {
            world_size: 4,
            ..LevelConfig::default()
        };
        assert!(matches!(config.validate(), Err(LevelGenError::Config(_))));
    }

    #[test]
    fn test_rejects_too_many_grass_layers() {
        let mut config = LevelConfig::default();
        let layers = (0..6).map(|_| grass(Biome::LightGrass1, 10)).collect();
        config.terrain_strategy.push(step("crowded", layers), 5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_atlas() {
        let mut config = LevelConfig::default();
        config.biome_atlases.retain(|a| a.biome != Biome::DarkGrass3);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "world_size": 64, "spawn_islands": false }"#;
        let config: LevelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.world_size, 64);
        assert!(!config.spawn_islands);
        assert_eq!(config.island_strategy, IslandStrategy::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_json_round_trip() {
        let config = LevelConfig::default();
        let back: LevelConfig = serde_json::from_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(back, config);
    }
}
