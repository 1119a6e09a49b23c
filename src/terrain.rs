//! Height-step terrain generation.
//!
//! Each step is a bounded random walk over column start heights: the walk
//! decides where the bottom cliff of the step sits in every column, and the
//! step occupies everything above it that the previous step left available.

use log::debug;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::edges::EdgeFlags;
use crate::error::{LevelGenError, Result};
use crate::processor::{Comparison, GridProcessor};
use crate::tilemap::{Mask, Tilemap};
use crate::weighted::WeightedSelection;

/// Rows of margin kept free above a lower step's bottom edge.
pub const BOTTOM_MARGIN_ROWS: usize = 2;

/// Upper limit for any step, as a fraction of the grid height.
pub const MAX_HEIGHT_FRACTION: f32 = 0.9;

/// Approximate size of a grass patch, in cells.
const GRASS_FEATURE_SIZE: f64 = 12.0;

/// How the bottom edge moves from one column to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeightContinuation {
    GoDownTwice,
    GoDown,
    #[default]
    Stay,
    GoUp,
    GoUpTwice,
}

impl HeightContinuation {
    pub const ALL: [HeightContinuation; 5] = [
        Self::GoDownTwice,
        Self::GoDown,
        Self::Stay,
        Self::GoUp,
        Self::GoUpTwice,
    ];

    /// Change in start row, in cells.
    pub fn offset(self) -> i32 {
        match self {
            Self::GoDownTwice => -2,
            Self::GoDown => -1,
            Self::Stay => 0,
            Self::GoUp => 1,
            Self::GoUpTwice => 2,
        }
    }
}

/// Inclusive row band the bottom edge of a step is allowed to occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightBounds {
    pub min: i32,
    pub max: i32,
}

impl HeightBounds {
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// `baseline` is the coverage still owed to this and every later step,
/// `own_share` the part that belongs to this step alone.
///
/// Bounds are whole rows. If rounding empties the band, `min` collapses onto
/// `max` so every column still gets a valid start.
pub fn height_bounds(grid_height: usize, baseline: f32, own_share: f32) -> HeightBounds {
    let h = grid_height as f32;
    let min_height = (1.0 - baseline) * h;
    let max_height = (h * MAX_HEIGHT_FRACTION).min(min_height + own_share * h);

    let max = (max_height.floor() as i32).max(0);
    let min = (min_height.ceil() as i32).max(0).min(max);
    HeightBounds { min, max }
}

/// Start rows for `width` columns, left to right.
pub fn random_walk_heights<R: Rng + ?Sized>(
    width: usize,
    bounds: HeightBounds,
    continuation: &WeightedSelection<HeightContinuation>,
    rng: &mut R,
) -> Vec<i32> {
    let mut starts = Vec::with_capacity(width);
    if width == 0 {
        return starts;
    }

    let t = rng.gen_range(0.3f32..0.7);
    let first = lerp(bounds.min as f32, bounds.max as f32, t).round() as i32;
    starts.push(bounds.clamp(first));

    for _ in 1..width {
        let previous = starts[starts.len() - 1];
        let step = continuation.select_random(rng).offset();
        starts.push(bounds.clamp(previous + step));
    }
    starts
}

/// Occupied at `(x, y)` iff `y >= starts[x]` and the cell is available.
pub fn height_based_terrain(available: &Mask, starts: &[i32]) -> Result<Mask> {
    if starts.len() != available.width {
        return Err(LevelGenError::ColumnCount {
            columns: available.width,
            len: starts.len(),
        });
    }
    let mut terrain = Mask::new(available.width, available.height);
    for (x, y, cell) in terrain.iter_mut() {
        *cell = y as i32 >= starts[x] && *available.get(x, y);
    }
    Ok(terrain)
}

/// Strip the bottom outline of the available space, twice.
pub fn leave_space_on_bottom_edges<P: GridProcessor>(
    processor: &P,
    available: &Mask,
) -> Result<Mask> {
    let mut map = available.clone();
    for _ in 0..BOTTOM_MARGIN_ROWS {
        let edges = processor.outline(&map);
        let bottom = processor.contains_flag(&edges, EdgeFlags::BOTTOM);
        processor.intersect_remove(&bottom, &mut map)?;
    }
    Ok(map)
}

/// Generate the mask of the next, higher terrain step inside `available`.
pub fn generate_height_step<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    available: &Mask,
    baseline: f32,
    own_share: f32,
    continuation: &WeightedSelection<HeightContinuation>,
    rng: &mut R,
) -> Result<Mask> {
    let space = leave_space_on_bottom_edges(processor, available)?;
    let bounds = height_bounds(available.height, baseline, own_share);
    let starts = random_walk_heights(available.width, bounds, continuation, rng);
    debug!(
        "height step: baseline {:.2}, share {:.2}, rows {}..={}",
        baseline, own_share, bounds.min, bounds.max
    );
    height_based_terrain(&space, &starts)
}

/// Split a mask into its body and its bottom cliff border.
pub fn split_cliffs<P: GridProcessor>(processor: &P, mask: &Mask) -> Result<(Mask, Mask)> {
    let edges = processor.outline(mask);
    let cliff = processor.contains_flag(&edges, EdgeFlags::BOTTOM);
    let mut body = mask.clone();
    processor.intersect_remove(&cliff, &mut body)?;
    Ok((body, cliff))
}

/// Remove shapes that are exactly one cell wide and two cells tall.
pub fn smooth_isolated_shapes<P: GridProcessor>(processor: &P, mask: &mut Mask) {
    let edges = processor.outline(mask);
    let lower = EdgeFlags::LEFT | EdgeFlags::RIGHT | EdgeFlags::BOTTOM;
    let upper = EdgeFlags::LEFT | EdgeFlags::RIGHT | EdgeFlags::TOP;

    let mut removed = Mask::new(mask.width, mask.height);
    for (x, y, cell) in removed.iter_mut() {
        let flags = *edges.get(x, y);
        *cell = (flags == lower && edges.get_offset(x, y, 0, 1) == Some(&upper))
            || (flags == upper && edges.get_offset(x, y, 0, -1) == Some(&lower));
    }
    for (cell, gone) in mask.as_mut_slice().iter_mut().zip(removed.as_slice()) {
        *cell &= !*gone;
    }
}

/// Fractional Brownian motion over 2D Perlin noise, roughly in [-1, 1].
fn fbm(noise: &Perlin, x: f64, y: f64, octaves: u32, persistence: f64, lacunarity: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}

/// Grass patches inside `available`. `coverage` is in [0, 1].
pub fn create_grass<P: GridProcessor, R: Rng + ?Sized>(
    processor: &P,
    available: &Mask,
    coverage: f32,
    rng: &mut R,
) -> Result<Mask> {
    let noise = Perlin::new(rng.gen());
    let offset_x = rng.gen_range(0.0..1000.0);
    let offset_y = rng.gen_range(0.0..1000.0);

    let (width, height) = (available.width, available.height);
    let mut field = Tilemap::<f32>::new(width, height);
    for (x, y, value) in field.iter_mut() {
        let nx = offset_x + x as f64 / GRASS_FEATURE_SIZE;
        let ny = offset_y + y as f64 / GRASS_FEATURE_SIZE;
        *value = ((fbm(&noise, nx, ny, 4, 0.5, 2.0) + 1.0) * 0.5) as f32;
    }
    processor.clamp_values(&mut field, Some(0.0), Some(1.0))?;

    let threshold = lerp(0.8, 0.3, coverage.clamp(0.0, 1.0));
    let mut grass = processor.compare(&field, Comparison::Greater, threshold);
    processor.intersect(available, &mut grass)?;
    smooth_isolated_shapes(processor, &mut grass);
    Ok(grass)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::CpuGridProcessor;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn even_continuation() -> WeightedSelection<HeightContinuation> {
        WeightedSelection::from_pairs(HeightContinuation::ALL.into_iter().map(|c| (c, 1)))
    }

    #[test]
    fn test_height_bounds() {
        let bounds = height_bounds(100, 0.5, 0.25);
        assert_eq!(bounds, HeightBounds { min: 50, max: 75 });

        // Capped at 90% of the grid.
        let bounds = height_bounds(100, 0.3, 0.3);
        assert_eq!(bounds, HeightBounds { min: 70, max: 90 });

        // Degenerate band collapses onto the upper bound.
        let bounds = height_bounds(10, 0.05, 0.05);
        assert!(bounds.min <= bounds.max);
        assert_eq!(bounds.max, 9);
    }

    #[test]
    fn test_walk_stays_in_bounds() {
        let continuation = even_continuation();
        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bounds = height_bounds(60, 0.6, 0.2);
            let starts = random_walk_heights(60, bounds, &continuation, &mut rng);
            assert_eq!(starts.len(), 60);
            assert!(starts.iter().all(|&s| bounds.contains(s)), "seed {seed}: {starts:?}");
            assert!(starts.windows(2).all(|w| (w[1] - w[0]).abs() <= 2));
        }
    }

    #[test]
    fn test_height_based_terrain() {
        let available = Mask::bordered(4, 6, 1);
        let terrain = height_based_terrain(&available, &[0, 2, 4, 1]).unwrap();
        assert!(!*terrain.get(0, 3));
        assert!(*terrain.get(1, 2));
        assert!(!*terrain.get(1, 1));
        assert!(*terrain.get(2, 4));
        assert!(!*terrain.get(2, 3));
        let err = height_based_terrain(&available, &[0, 0]).unwrap_err();
        assert!(matches!(err, LevelGenError::ColumnCount { columns: 4, len: 2 }));
        assert_eq!(err.to_string(), "expected one start height per column (4 columns), got 2");
    }

    #[test]
    fn test_leave_space_strips_two_rows() {
        let processor = CpuGridProcessor::new();
        let available = Mask::bordered(6, 8, 1);
        let map = leave_space_on_bottom_edges(&processor, &available).unwrap();
        assert!(!*map.get(2, 1));
        assert!(!*map.get(2, 2));
        assert!(*map.get(2, 3));
        assert_eq!(map.count_active(), 4 * 4);
    }

    #[test]
    fn test_split_cliffs() {
        let processor = CpuGridProcessor::new();
        let mask = Mask::bordered(5, 5, 1);
        let (body, cliff) = split_cliffs(&processor, &mask).unwrap();
        assert_eq!(cliff.count_active(), 3);
        assert!(cliff.iter().all(|(_, y, &c)| !c || y == 1));
        assert_eq!(body.count_active(), 6);
    }

    #[test]
    fn test_smooth_removes_vertical_pairs_only() {
        let processor = CpuGridProcessor::new();
        let mut mask = Mask::new(6, 5);
        mask.set(1, 1, true);
        mask.set(1, 2, true);
        // A 1x3 column survives.
        mask.set(4, 1, true);
        mask.set(4, 2, true);
        mask.set(4, 3, true);
        smooth_isolated_shapes(&processor, &mut mask);
        assert!(!*mask.get(1, 1));
        assert!(!*mask.get(1, 2));
        assert_eq!(mask.count_active(), 3);
    }

    #[test]
    fn test_generated_step_inside_available() {
        let processor = CpuGridProcessor::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let available = Mask::bordered(40, 40, 1);
        let continuation = even_continuation();
        let step = generate_height_step(&processor, &available, 0.5, 0.25, &continuation, &mut rng)
            .unwrap();
        assert!(step.count_active() > 0);
        assert!(step.iter().all(|(x, y, &c)| !c || *available.get(x, y)));
        // The two bottom rows of the available space stay free.
        assert!(step.iter().all(|(_, y, &c)| !c || y >= 3));
    }

    #[test]
    fn test_grass_stays_inside_available() {
        let processor = CpuGridProcessor::new();
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let mut available = Mask::bordered(48, 48, 1);
        available.set(10, 10, false);
        let grass = create_grass(&processor, &available, 0.9, &mut rng).unwrap();
        assert!(grass.count_active() > 0);
        assert!(grass.iter().all(|(x, y, &c)| !c || *available.get(x, y)));

        let none = create_grass(&processor, &available, 0.0, &mut rng).unwrap();
        assert!(none.count_active() < grass.count_active());
    }
}
