//! PNG previews and JSON dumps of generated levels.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::biomes::{Biome, LayerKind};
use crate::error::Result;
use crate::level::GeneratedLevel;
use crate::objects::{ObjectPlacement, SpawnableObjectType};
use crate::render::{LevelRenderer, RenderLayer};

/// Body atlas cells below this index are edge and corner tiles.
const EDGE_TILE_COUNT: i32 = 16;

const BACKGROUND: [u8; 3] = [24, 28, 36];

const OBJECT_COLORS: [[u8; 3]; 4] = [
    [30, 90, 40],   // Dark green
    [140, 180, 60], // Lime
    [150, 150, 160], // Grey
    [200, 90, 60],  // Rust
];

fn biome_color(biome: Biome) -> [u8; 3] {
    match biome {
        Biome::None => [110, 90, 80],
        Biome::Dirt => [150, 115, 75],
        Biome::LightGrass1 => [120, 190, 80],
        Biome::LightGrass2 => [140, 205, 95],
        Biome::LightGrass3 => [165, 215, 110],
        Biome::DarkGrass1 => [60, 130, 60],
        Biome::DarkGrass2 => [50, 115, 55],
        Biome::DarkGrass3 => [40, 100, 50],
    }
}

fn layer_color(layer: &RenderLayer, atlas_index: i32) -> [u8; 3] {
    if layer.kind.is_cliff() {
        // Cliff atlas rows run top to bottom; darken towards the foot.
        let row = atlas_index / 4;
        return shade(biome_color(Biome::None), 1.0 - row as f32 * 0.1);
    }
    let base = match layer.kind {
        LayerKind::IslandBody | LayerKind::IslandGrass => shade(biome_color(layer.biome), 1.1),
        _ => biome_color(layer.biome),
    };
    if atlas_index < EDGE_TILE_COUNT {
        shade(base, 0.8)
    } else {
        base
    }
}

fn shade(color: [u8; 3], factor: f32) -> [u8; 3] {
    [
        (color[0] as f32 * factor).clamp(0.0, 255.0) as u8,
        (color[1] as f32 * factor).clamp(0.0, 255.0) as u8,
        (color[2] as f32 * factor).clamp(0.0, 255.0) as u8,
    ]
}

/// Renderer that composites everything into a single top-down image,
/// one pixel per tile.
#[derive(Debug, Default)]
pub struct PreviewRenderer {
    layers: Vec<RenderLayer>,
    objects: Vec<(ObjectPlacement, u32)>,
}

impl PreviewRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the layers lowest sorting order first, then the objects.
    pub fn render_image(&self) -> RgbImage {
        let (width, height) = self
            .layers
            .first()
            .map_or((0, 0), |l| (l.width as u32, l.height as u32));
        let mut img: RgbImage = ImageBuffer::from_pixel(width, height, Rgb(BACKGROUND));

        let mut layers: Vec<_> = self.layers.iter().collect();
        layers.sort_by_key(|l| l.sorting_order);
        for layer in layers {
            for y in 0..layer.height {
                for x in 0..layer.width {
                    let index = layer.tile(x, y);
                    if index < 0 || x as u32 >= width || y as u32 >= height {
                        continue;
                    }
                    // Level row 0 is the bottom, image row 0 is the top.
                    img.put_pixel(x as u32, height - 1 - y as u32, Rgb(layer_color(layer, index)));
                }
            }
        }

        for (i, (placement, size)) in self.objects.iter().enumerate() {
            let color = OBJECT_COLORS[i % OBJECT_COLORS.len()];
            let footprint = size * 2;
            for point in &placement.positions {
                for dy in 0..footprint {
                    for dx in 0..footprint {
                        let px = point.x as u32 * 2 + dx;
                        let py = point.y as u32 * 2 + dy;
                        if px < width && py < height {
                            img.put_pixel(px, height - 1 - py, Rgb(color));
                        }
                    }
                }
            }
        }

        img
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.render_image().save(path)?;
        Ok(())
    }
}

impl LevelRenderer for PreviewRenderer {
    fn cleanup(&mut self) {
        self.layers.clear();
        self.objects.clear();
    }

    fn render_tilemap(&mut self, layer: &RenderLayer) {
        self.layers.push(layer.clone());
    }

    fn render_objects(
        &mut self,
        objects: &[ObjectPlacement],
        types: &[SpawnableObjectType],
        _map_size: usize,
    ) {
        for placement in objects {
            let size = types
                .iter()
                .find(|t| t.name == placement.name)
                .map_or(1, |t| t.size);
            self.objects.push((placement.clone(), size));
        }
    }
}

/// Write the level (seeds, layers, objects) as pretty-printed JSON.
pub fn write_level_json(level: &GeneratedLevel, path: impl AsRef<Path>) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, level)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::Point;

    fn layer(kind: LayerKind, biome: Biome, order: i32, tiles: Vec<i32>) -> RenderLayer {
        RenderLayer {
            kind,
            biome,
            step: 0,
            sorting_order: order,
            atlas: "test".to_string(),
            width: 2,
            height: 2,
            tiles,
        }
    }

    #[test]
    fn test_higher_layers_draw_on_top() {
        let mut renderer = PreviewRenderer::new();
        // Pushed out of order on purpose.
        let grass = layer(LayerKind::Grass, Biome::DarkGrass1, 2, vec![20, -1, -1, -1]);
        let dirt = layer(LayerKind::TerrainBody, Biome::Dirt, 0, vec![20, 20, 20, 20]);
        renderer.render_tilemap(&grass);
        renderer.render_tilemap(&dirt);

        let img = renderer.render_image();
        assert_eq!(img.dimensions(), (2, 2));
        // Tile (0, 0) is the bottom-left, so it lands on the last image row.
        assert_eq!(img.get_pixel(0, 1).0, biome_color(Biome::DarkGrass1));
        assert_eq!(img.get_pixel(1, 1).0, biome_color(Biome::Dirt));
        assert_eq!(img.get_pixel(0, 0).0, biome_color(Biome::Dirt));
    }

    #[test]
    fn test_edge_tiles_are_shaded() {
        let mut renderer = PreviewRenderer::new();
        let dirt = layer(LayerKind::TerrainBody, Biome::Dirt, 0, vec![0, 20, -1, -1]);
        renderer.render_tilemap(&dirt);
        let img = renderer.render_image();
        assert_eq!(img.get_pixel(0, 1).0, shade(biome_color(Biome::Dirt), 0.8));
        assert_eq!(img.get_pixel(1, 1).0, biome_color(Biome::Dirt));
        assert_eq!(img.get_pixel(0, 0).0, BACKGROUND);
    }

    #[test]
    fn test_cleanup_and_objects() {
        let mut renderer = PreviewRenderer::new();
        renderer.render_tilemap(&layer(LayerKind::TerrainBody, Biome::Dirt, 0, vec![20; 4]));
        let placement = ObjectPlacement {
            name: "rock".to_string(),
            positions: vec![Point::new(0, 0)],
        };
        renderer.render_objects(&[placement], &[], 1);
        let img = renderer.render_image();
        assert!(img.pixels().all(|p| p.0 == OBJECT_COLORS[0]));

        renderer.cleanup();
        assert_eq!(renderer.render_image().dimensions(), (0, 0));
    }
}
