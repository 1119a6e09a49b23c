//! Layered biome masks and topmost-wins isolation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{LevelGenError, Result};
use crate::processor::GridProcessor;
use crate::tilemap::Mask;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Biome {
    /// Cliffs and anything else nothing may spawn on.
    None,
    Dirt,
    LightGrass1,
    LightGrass2,
    LightGrass3,
    DarkGrass1,
    DarkGrass2,
    DarkGrass3,
}

impl Biome {
    pub const ALL: [Biome; 8] = [
        Biome::None,
        Biome::Dirt,
        Biome::LightGrass1,
        Biome::LightGrass2,
        Biome::LightGrass3,
        Biome::DarkGrass1,
        Biome::DarkGrass2,
        Biome::DarkGrass3,
    ];

    pub fn is_grass(self) -> bool {
        !matches!(self, Biome::None | Biome::Dirt)
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What produced a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayerKind {
    TerrainBody,
    TerrainCliff,
    Grass,
    IslandBody,
    IslandCliff,
    IslandGrass,
}

impl LayerKind {
    pub fn is_cliff(self) -> bool {
        matches!(self, LayerKind::TerrainCliff | LayerKind::IslandCliff)
    }
}

#[derive(Clone, Debug)]
pub struct BiomeLayer {
    pub biome: Biome,
    pub kind: LayerKind,
    /// Height step the layer belongs to.
    pub step: usize,
    pub sorting_order: i32,
    pub mask: Mask,
}

/// Every mask of a level with its biome and sorting order.
#[derive(Clone, Debug)]
pub struct LayerStack {
    width: usize,
    height: usize,
    layers: Vec<BiomeLayer>,
}

impl LayerStack {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layers: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Add a layer. Sorting orders are unique within a stack.
    pub fn push(&mut self, layer: BiomeLayer) -> Result<()> {
        if layer.mask.width != self.width || layer.mask.height != self.height {
            return Err(LevelGenError::ShapeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: layer.mask.width,
                height: layer.mask.height,
            });
        }
        if let Some(existing) = self.by_order(layer.sorting_order) {
            return Err(LevelGenError::Config(format!(
                "sorting order {} is taken by {:?} (step {}), cannot add {:?}",
                layer.sorting_order, existing.kind, existing.step, layer.kind
            )));
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn layers(&self) -> &[BiomeLayer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn by_order(&self, sorting_order: i32) -> Option<&BiomeLayer> {
        self.layers.iter().find(|l| l.sorting_order == sorting_order)
    }

    pub fn find(&self, step: usize, kind: LayerKind) -> impl Iterator<Item = &BiomeLayer> {
        self.layers.iter().filter(move |l| l.step == step && l.kind == kind)
    }

    /// Layers of one biome, lowest sorting order first.
    pub fn of_biome(&self, biome: Biome) -> Vec<&BiomeLayer> {
        let mut layers: Vec<_> = self.layers.iter().filter(|l| l.biome == biome).collect();
        layers.sort_by_key(|l| l.sorting_order);
        layers
    }

    /// Cells where `biome` is the topmost layer: each of its masks counts only
    /// where no higher layer of another biome covers it.
    pub fn isolate<P: GridProcessor>(&self, processor: &P, biome: Biome) -> Result<Mask> {
        let mut isolated = Mask::new(self.width, self.height);
        for layer in self.of_biome(biome) {
            processor.intersect_add(&layer.mask, &mut isolated)?;
            for other in &self.layers {
                if other.biome != biome && other.sorting_order > layer.sorting_order {
                    processor.intersect_remove(&other.mask, &mut isolated)?;
                }
            }
        }
        Ok(isolated)
    }

    pub fn isolate_all<P: GridProcessor>(&self, processor: &P) -> Result<BTreeMap<Biome, Mask>> {
        Biome::ALL
            .iter()
            .map(|&biome| Ok((biome, self.isolate(processor, biome)?)))
            .collect()
    }
}
