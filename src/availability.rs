//! Spatial availability: how much room each cell has for a rectangle anchored
//! at its bottom-left corner.

use rand::Rng;

use crate::error::Result;
use crate::processor::{AreaWidths, GridProcessor, RunLengths};
use crate::tilemap::{Mask, Tilemap};

/// A cell that can host a block, with the width actually free there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EligibleCell {
    pub x: usize,
    pub y: usize,
    pub available_width: u32,
}

/// Run lengths and per-height areas of one occupancy mask.
#[derive(Clone, Debug)]
pub struct AvailabilityIndex {
    pub heights: [u32; 4],
    pub runs: Tilemap<RunLengths>,
    pub areas: Tilemap<AreaWidths>,
}

impl AvailabilityIndex {
    pub fn build<P: GridProcessor>(processor: &P, mask: &Mask, heights: [u32; 4]) -> Result<Self> {
        let runs = processor.run_lengths(mask);
        let areas = processor.areas(mask, &runs, heights)?;
        Ok(Self { heights, runs, areas })
    }

    /// Available width for `heights[height_index]` at a cell.
    pub fn width_at(&self, x: usize, y: usize, height_index: usize) -> u32 {
        self.areas.get(x, y)[height_index]
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        height_index: usize,
        min_width: u32,
        max_width: u32,
        rng: &mut R,
    ) -> Option<EligibleCell> {
        sample_eligible_cell(&self.areas, height_index, min_width, max_width, rng)
    }
}

/// Uniformly pick one cell whose width for `height_index` lies in
/// `[min_width, max_width]`. Candidates are enumerated row-major so the pick
/// only depends on the random source.
pub fn sample_eligible_cell<R: Rng + ?Sized>(
    areas: &Tilemap<AreaWidths>,
    height_index: usize,
    min_width: u32,
    max_width: u32,
    rng: &mut R,
) -> Option<EligibleCell> {
    let eligible = |width: u32| width > 0 && width >= min_width && width <= max_width;
    let count = areas
        .as_slice()
        .iter()
        .filter(|widths| eligible(widths[height_index]))
        .count();
    if count == 0 {
        return None;
    }

    let target = rng.gen_range(0..count);
    areas
        .iter()
        .filter(|(_, _, widths)| eligible(widths[height_index]))
        .nth(target)
        .map(|(x, y, widths)| EligibleCell {
            x,
            y,
            available_width: widths[height_index],
        })
}
