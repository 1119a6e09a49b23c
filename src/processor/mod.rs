//! Grid Processor: elementwise primitives over masks, flag grids and run-length grids.
//!
//! Every primitive is a pure function of a bounded neighborhood (at most 2 cells
//! away, or a straight run for `run_lengths`), so implementations are free to
//! evaluate cells in any order or in parallel. Only the explicitly random
//! primitives draw from the caller's random source.

pub mod cpu;
pub mod pool;

pub use cpu::CpuGridProcessor;
pub use pool::{GridPool, PooledGrid};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::edges::EdgeFlags;
use crate::error::Result;
use crate::tilemap::{Mask, Tilemap};

/// Integer cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: usize,
    pub y: usize,
}

impl Point {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Neighbor offset `(dx, dy)`, `+dy` pointing up.
pub type Offset = (i32, i32);

/// Elementwise comparison used by `compare`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

impl Comparison {
    pub fn apply(self, a: f32, b: f32) -> bool {
        match self {
            Self::Equal => a == b,
            Self::NotEqual => a != b,
            Self::Greater => a > b,
            Self::GreaterOrEqual => a >= b,
            Self::Less => a < b,
            Self::LessOrEqual => a <= b,
        }
    }
}

/// Consecutive active cells from a cell (inclusive) in each direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunLengths {
    pub right: u32,
    pub left: u32,
    pub up: u32,
    pub down: u32,
}

/// Per-cell widths available for each of the 4 candidate heights.
pub type AreaWidths = [u32; 4];

pub trait GridProcessor {
    /// `grid[cell] op value` as a mask.
    fn compare(&self, grid: &Tilemap<f32>, op: Comparison, value: f32) -> Mask;

    /// `a[cell] op b[cell]` as a mask.
    fn compare_grids(&self, a: &Tilemap<f32>, b: &Tilemap<f32>, op: Comparison) -> Result<Mask>;

    /// Edge flags for every cell (out-of-grid neighbors count as inactive).
    fn outline(&self, mask: &Mask) -> Tilemap<EdgeFlags>;

    /// Active cells adjacent to empty space or the grid border.
    fn outline_mask(&self, mask: &Mask) -> Mask {
        let edges = self.outline(mask);
        let mut outline = self.equals_flag(&edges, EdgeFlags::empty());
        self.invert(&mut outline);
        outline
    }

    /// Grow the active region by one cell along its outline (4-neighborhood).
    fn expand(&self, mask: &Mask) -> Mask;

    /// 1 where the cell at `direction` is active.
    fn has_neighbor(&self, mask: &Mask, direction: Offset) -> Mask;

    /// 1 where `b` is active and 4-borders an active cell of `a`.
    fn neighbors_with(&self, a: &Mask, b: &Mask) -> Result<Mask>;

    /// `target &= mask`
    fn intersect(&self, mask: &Mask, target: &mut Mask) -> Result<()>;

    /// `target |= mask`
    fn intersect_add(&self, mask: &Mask, target: &mut Mask) -> Result<()>;

    /// `target &= !mask`
    fn intersect_remove(&self, mask: &Mask, target: &mut Mask) -> Result<()>;

    fn invert(&self, mask: &mut Mask);

    /// Cells whose flag code is exactly `flags`.
    fn equals_flag(&self, edges: &Tilemap<EdgeFlags>, flags: EdgeFlags) -> Mask;

    /// Cells whose flag code contains every bit of `flag`.
    fn contains_flag(&self, edges: &Tilemap<EdgeFlags>, flag: EdgeFlags) -> Mask;

    fn add_flag(&self, edges: &mut Tilemap<EdgeFlags>, flag: EdgeFlags);

    fn remove_flag(&self, edges: &mut Tilemap<EdgeFlags>, flag: EdgeFlags);

    fn run_lengths(&self, mask: &Mask) -> Tilemap<RunLengths>;

    /// For each height `h`, the width of the widest `width x h` block anchored
    /// bottom-left at the cell that stays inside the active region.
    fn areas(
        &self,
        mask: &Mask,
        runs: &Tilemap<RunLengths>,
        heights: [u32; 4],
    ) -> Result<Tilemap<AreaWidths>>;

    /// Active cells in row-major order (`x + width * y` ascending).
    fn active_positions(&self, mask: &Mask) -> Vec<Point>;

    fn active_count(&self, mask: &Mask) -> usize;

    fn random_active_position<R: Rng + ?Sized>(&self, mask: &Mask, rng: &mut R) -> Option<Point>;

    /// White-noise mask, each cell active with probability `density`.
    fn noise_mask<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        density: f32,
        rng: &mut R,
    ) -> Mask;

    /// Replicate every cell into a 2x2 block.
    fn double_resolution<T: Clone + Send + Sync>(&self, grid: &Tilemap<T>) -> Tilemap<T>;

    /// Activate a bottom-left anchored rectangle, clipped to the grid.
    fn fill_rect(&self, target: &mut Mask, origin: Point, width: usize, height: usize);

    /// Clamp values into `[min, max]`; at least one bound is required.
    fn clamp_values(
        &self,
        grid: &mut Tilemap<f32>,
        min: Option<f32>,
        max: Option<f32>,
    ) -> Result<()>;
}
