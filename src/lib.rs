//! Layered 2D level generation library
//!
//! Builds stepped terrain, grass, floating islands and object spawns on a
//! boolean grid model, then autotiles every layer for a tile renderer.

pub mod ascii;
pub mod autotile;
pub mod availability;
pub mod biomes;
pub mod cliffs;
pub mod config;
pub mod edges;
pub mod error;
pub mod export;
pub mod islands;
pub mod level;
pub mod objects;
pub mod processor;
pub mod render;
pub mod seeds;
pub mod terrain;
pub mod tilemap;
pub mod tiles;
pub mod weighted;

pub use config::LevelConfig;
pub use error::{LevelGenError, Result};
pub use level::{build_level, GeneratedLevel, LevelGenerator};
pub use processor::{CpuGridProcessor, GridProcessor};
pub use render::{LayerCollector, LevelRenderer};
pub use seeds::LevelSeeds;
