//! Island placement: rectangles stamped into free space, then roughened and
//! cleaned up so the result reads as floating islands rather than boxes.

use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::availability::AvailabilityIndex;
use crate::edges::EdgeFlags;
use crate::error::{LevelGenError, Result};
use crate::processor::{GridPool, GridProcessor, Point};
use crate::terrain::smooth_isolated_shapes;
use crate::tilemap::Mask;

/// Number of erosion passes applied to island outlines.
pub const STYLIZE_PASSES: usize = 5;

/// Fraction of outline cells eroded per pass.
pub const EROSION_DENSITY: f32 = 0.01;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IslandStrategy {
    /// 0-100, scales how many placement attempts a step gets.
    pub intensity: u32,
    pub min_width: u32,
    pub max_width: u32,
    /// Candidate island heights, in cells.
    pub heights: [u32; 4],
}

impl Default for IslandStrategy {
    fn default() -> Self {
        Self {
            intensity: 10,
            min_width: 3,
            max_width: 8,
            heights: [3, 4, 5, 7],
        }
    }
}

impl IslandStrategy {
    pub fn validate(&self) -> Result<()> {
        if self.intensity > 100 {
            return Err(LevelGenError::Config(format!(
                "island intensity must be within 0..=100, got {}",
                self.intensity
            )));
        }
        if self.min_width == 0 || self.min_width > self.max_width {
            return Err(LevelGenError::Config(format!(
                "island widths must satisfy 1 <= min <= max, got {}..{}",
                self.min_width, self.max_width
            )));
        }
        if self.heights.contains(&0) {
            return Err(LevelGenError::Config("island heights must be positive".to_string()));
        }
        Ok(())
    }
}

/// A stamped rectangle, anchored bottom-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedRect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl PlacedRect {
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn overlaps(&self, other: &PlacedRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

#[derive(Clone, Debug)]
pub struct IslandPlacement {
    pub mask: Mask,
    pub rects: Vec<PlacedRect>,
}

/// `ceil(lerp(0, active / 100, intensity / 100))`
pub fn iteration_budget(active_cells: usize, intensity: u32) -> usize {
    let max_iterations = (active_cells / 100) as f32;
    (max_iterations * intensity.min(100) as f32 / 100.0).ceil() as usize
}

/// Stamp up to `iterations` non-overlapping rectangles into `available`.
///
/// An iteration that finds no spot, even after falling back to smaller
/// heights, is skipped.
pub fn place_islands<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    available: &Mask,
    iterations: usize,
    strategy: &IslandStrategy,
    pool: &GridPool<bool>,
    rng: &mut R,
) -> Result<IslandPlacement> {
    let mut space = available.clone();
    let mut mask = Mask::new(available.width, available.height);
    let mut rects = Vec::new();

    for iteration in 0..iterations {
        let index = AvailabilityIndex::build(processor, &space, strategy.heights)?;

        let chosen = rng.gen_range(0..strategy.heights.len());
        let requested = rng.gen_range(strategy.min_width..=strategy.max_width);

        let found = (0..=chosen)
            .rev()
            .find_map(|k| index.sample(k, requested, u32::MAX, rng).map(|cell| (k, cell)));
        let Some((k, cell)) = found else {
            trace!("island iteration {iteration}: no spot for width {requested}");
            continue;
        };

        let upper = cell.available_width.min(strategy.max_width).max(requested);
        let rect = PlacedRect {
            x: cell.x,
            y: cell.y,
            width: rng.gen_range(requested..=upper) as usize,
            height: strategy.heights[k] as usize,
        };

        let mut stamp = pool.acquire(space.width, space.height);
        processor.fill_rect(&mut stamp, Point::new(rect.x, rect.y), rect.width, rect.height);
        processor.intersect_add(&stamp, &mut mask)?;
        processor.intersect_remove(&stamp, &mut space)?;
        rects.push(rect);
    }

    debug!("placed {} of {} islands", rects.len(), iterations);
    Ok(IslandPlacement { mask, rects })
}

/// Erode random outline cells so islands don't keep perfectly straight edges.
pub fn stylize_islands<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    mask: &mut Mask,
    rng: &mut R,
) -> Result<()> {
    for _ in 0..STYLIZE_PASSES {
        let mut discard = processor.outline_mask(mask);
        let noise = processor.noise_mask(mask.width, mask.height, EROSION_DENSITY, rng);
        processor.intersect(&noise, &mut discard)?;
        processor.intersect_remove(&discard, mask)?;
    }
    Ok(())
}

/// Drop one-row slivers (cells that are both top and bottom edges) and 1x2 shapes.
pub fn smooth_islands<P: GridProcessor>(processor: &P, mask: &mut Mask) -> Result<()> {
    let edges = processor.outline(mask);
    let mut slivers = processor.contains_flag(&edges, EdgeFlags::TOP);
    let bottoms = processor.contains_flag(&edges, EdgeFlags::BOTTOM);
    processor.intersect(&bottoms, &mut slivers)?;
    processor.intersect_remove(&slivers, mask)?;
    smooth_isolated_shapes(processor, mask);
    Ok(())
}

/// Full island pass over one step's available space.
pub fn generate_islands<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    available: &Mask,
    strategy: &IslandStrategy,
    pool: &GridPool<bool>,
    rng: &mut R,
) -> Result<IslandPlacement> {
    let iterations = iteration_budget(processor.active_count(available), strategy.intensity);
    let mut placement = place_islands(processor, available, iterations, strategy, pool, rng)?;
    stylize_islands(processor, &mut placement.mask, rng)?;
    smooth_islands(processor, &mut placement.mask)?;
    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::CpuGridProcessor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_iteration_budget() {
        assert_eq!(iteration_budget(0, 100), 0);
        assert_eq!(iteration_budget(99, 100), 0);
        assert_eq!(iteration_budget(2500, 10), 3);
        assert_eq!(iteration_budget(2500, 100), 25);
    }

    #[test]
    fn test_placements_are_disjoint_and_inside_available() {
        let processor = CpuGridProcessor::new();
        let pool = GridPool::new();
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut available = Mask::bordered(40, 30, 1);
            for x in 10..14 {
                for y in 0..30 {
                    available.set(x, y, false);
                }
            }
            let strategy = IslandStrategy::default();
            let placement =
                place_islands(&processor, &available, 20, &strategy, &pool, &mut rng).unwrap();

            assert!(!placement.rects.is_empty());
            for (i, a) in placement.rects.iter().enumerate() {
                for b in &placement.rects[i + 1..] {
                    assert!(!a.overlaps(b), "seed {seed}: {a:?} overlaps {b:?}");
                }
            }
            for (x, y, &active) in placement.mask.iter() {
                let stamped = placement.rects.iter().any(|r| r.contains(x, y));
                assert_eq!(active, stamped);
                if active {
                    assert!(*available.get(x, y));
                }
            }
        }
    }

    #[test]
    fn test_widths_within_strategy() {
        let processor = CpuGridProcessor::new();
        let pool = GridPool::new();
        let mut rng = ChaCha8Rng::seed_from_u64(77);
        let strategy = IslandStrategy::default();
        let available = Mask::bordered(64, 64, 1);
        let placement =
            place_islands(&processor, &available, 30, &strategy, &pool, &mut rng).unwrap();
        for rect in &placement.rects {
            assert!(rect.width >= strategy.min_width as usize);
            assert!(rect.width <= strategy.max_width as usize);
            assert!(strategy.heights.contains(&(rect.height as u32)));
        }
    }

    #[test]
    fn test_no_space_is_not_an_error() {
        let processor = CpuGridProcessor::new();
        let pool = GridPool::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let available = Mask::bordered(6, 6, 1);
        let strategy = IslandStrategy {
            min_width: 5,
            max_width: 8,
            ..IslandStrategy::default()
        };
        let placement =
            place_islands(&processor, &available, 4, &strategy, &pool, &mut rng).unwrap();
        assert!(placement.rects.is_empty());
        assert_eq!(placement.mask.count_active(), 0);
    }

    #[test]
    fn test_smooth_removes_slivers() {
        let processor = CpuGridProcessor::new();
        let mut mask = Mask::new(8, 6);
        for x in 1..6 {
            mask.set(x, 1, true);
        }
        processor.fill_rect(&mut mask, Point::new(1, 3), 3, 2);
        smooth_islands(&processor, &mut mask).unwrap();
        assert_eq!(mask.count_active(), 6);
        assert!(!*mask.get(2, 1));
    }

    #[test]
    fn test_generated_islands_stay_in_available() {
        let processor = CpuGridProcessor::new();
        let pool = GridPool::new();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let available = Mask::bordered(80, 80, 2);
        let strategy = IslandStrategy {
            intensity: 60,
            ..IslandStrategy::default()
        };
        let placement =
            generate_islands(&processor, &available, &strategy, &pool, &mut rng).unwrap();
        assert!(placement.mask.count_active() > 0);
        assert!(placement.mask.iter().all(|(x, y, &c)| !c || *available.get(x, y)));
    }

    #[test]
    fn test_strategy_validation() {
        assert!(IslandStrategy::default().validate().is_ok());
        let bad = IslandStrategy {
            min_width: 9,
            ..IslandStrategy::default()
        };
        assert!(bad.validate().is_err());
    }
}
