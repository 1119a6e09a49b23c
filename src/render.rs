//! Renderer boundary.
//!
//! A pass hands the renderer flattened tile arrays and object positions only
//! after every layer has been classified.

use serde::{Deserialize, Serialize};

use crate::biomes::{Biome, LayerKind};
use crate::objects::{ObjectPlacement, SpawnableObjectType};
use crate::tiles::{flatten, AtlasTile};
use crate::tilemap::Tilemap;

/// One flattened tile layer, ready to draw with its atlas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderLayer {
    pub kind: LayerKind,
    pub biome: Biome,
    pub step: usize,
    pub sorting_order: i32,
    pub atlas: String,
    /// Tile grid dimensions (twice the level grid).
    pub width: usize,
    pub height: usize,
    /// Row-major atlas indices, `-1` for empty or cropped cells.
    pub tiles: Vec<i32>,
}

impl RenderLayer {
    /// Flatten a classified tile grid, cropping `crop_offset / 2 + 1` tiles per side.
    pub fn from_tiles<T: AtlasTile>(
        kind: LayerKind,
        biome: Biome,
        step: usize,
        sorting_order: i32,
        atlas: &str,
        tiles: &Tilemap<T>,
        crop_offset: usize,
    ) -> Self {
        Self {
            kind,
            biome,
            step,
            sorting_order,
            atlas: atlas.to_string(),
            width: tiles.width,
            height: tiles.height,
            tiles: flatten(tiles, crop_offset),
        }
    }

    pub fn tile(&self, x: usize, y: usize) -> i32 {
        self.tiles[x + self.width * y]
    }

    pub fn drawn_tiles(&self) -> usize {
        self.tiles.iter().filter(|&&t| t >= 0).count()
    }
}

pub trait LevelRenderer {
    /// Forget everything from the previous level.
    fn cleanup(&mut self);

    fn render_tilemap(&mut self, layer: &RenderLayer);

    /// `map_size` is the edge length of the level grid the positions refer to.
    fn render_objects(
        &mut self,
        objects: &[ObjectPlacement],
        types: &[SpawnableObjectType],
        map_size: usize,
    );
}

/// Renderer that just keeps what it is given.
#[derive(Debug, Default)]
pub struct LayerCollector {
    pub layers: Vec<RenderLayer>,
    pub objects: Vec<ObjectPlacement>,
    pub map_size: usize,
    pub cleanups: usize,
}

impl LayerCollector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LevelRenderer for LayerCollector {
    fn cleanup(&mut self) {
        self.layers.clear();
        self.objects.clear();
        self.map_size = 0;
        self.cleanups += 1;
    }

    fn render_tilemap(&mut self, layer: &RenderLayer) {
        self.layers.push(layer.clone());
    }

    fn render_objects(
        &mut self,
        objects: &[ObjectPlacement],
        _types: &[SpawnableObjectType],
        map_size: usize,
    ) {
        self.objects.extend_from_slice(objects);
        self.map_size = map_size;
    }
}
