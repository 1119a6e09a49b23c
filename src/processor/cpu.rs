//! CPU implementation of the Grid Processor.
//!
//! Cells are evaluated with rayon parallel iterators. The sequential mode runs
//! the same closures in order and exists to check that results don't depend on
//! evaluation order.

use rand::Rng;
use rayon::prelude::*;

use super::{AreaWidths, Comparison, GridProcessor, Offset, Point, RunLengths};
use crate::edges::EdgeFlags;
use crate::error::{LevelGenError, Result};
use crate::tilemap::{Mask, Tilemap};

#[derive(Clone, Copy, Debug)]
pub struct CpuGridProcessor {
    parallel: bool,
}

impl Default for CpuGridProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuGridProcessor {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Same results, single thread.
    pub fn sequential() -> Self {
        Self { parallel: false }
    }

    fn map_cells<T, F>(&self, width: usize, height: usize, f: F) -> Tilemap<T>
    where
        T: Send,
        F: Fn(usize, usize) -> T + Sync + Send,
    {
        let count = width * height;
        let data: Vec<T> = if self.parallel {
            (0..count).into_par_iter().map(|i| f(i % width, i / width)).collect()
        } else {
            (0..count).map(|i| f(i % width, i / width)).collect()
        };
        Tilemap::from_raw(width, height, data)
    }

    fn map_lines<T, F>(&self, count: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        if self.parallel {
            (0..count).into_par_iter().map(f).collect()
        } else {
            (0..count).map(f).collect()
        }
    }

    fn update_cells<T, F>(&self, target: &mut Tilemap<T>, f: F)
    where
        T: Send,
        F: Fn(&mut T) + Sync + Send,
    {
        if self.parallel {
            target.as_mut_slice().par_iter_mut().for_each(f);
        } else {
            target.as_mut_slice().iter_mut().for_each(f);
        }
    }

    fn combine<F>(&self, mask: &Mask, target: &mut Mask, op: F) -> Result<()>
    where
        F: Fn(bool, bool) -> bool + Sync + Send,
    {
        target.ensure_same_shape(mask)?;
        let source = mask.as_slice();
        if self.parallel {
            target
                .as_mut_slice()
                .par_iter_mut()
                .zip(source.par_iter())
                .for_each(|(cell, &m)| *cell = op(*cell, m));
        } else {
            target
                .as_mut_slice()
                .iter_mut()
                .zip(source.iter())
                .for_each(|(cell, &m)| *cell = op(*cell, m));
        }
        Ok(())
    }
}

fn is_active(mask: &Mask, x: usize, y: usize, (dx, dy): Offset) -> bool {
    mask.get_offset(x, y, dx, dy).copied().unwrap_or(false)
}

fn edge_flags_at(mask: &Mask, x: usize, y: usize) -> EdgeFlags {
    if !*mask.get(x, y) {
        return EdgeFlags::empty();
    }
    let mut flags = EdgeFlags::empty();
    for (flag, offset) in EdgeFlags::DIRECTIONS {
        if !is_active(mask, x, y, offset) {
            flags |= flag;
        }
    }
    flags
}

/// (forward, backward) runs along one line of `len` cells.
fn line_runs(len: usize, active: impl Fn(usize) -> bool) -> Vec<(u32, u32)> {
    let mut runs = vec![(0u32, 0u32); len];
    let mut backward = 0;
    for (i, run) in runs.iter_mut().enumerate() {
        backward = if active(i) { backward + 1 } else { 0 };
        run.1 = backward;
    }
    let mut forward = 0;
    for i in (0..len).rev() {
        forward = if active(i) { forward + 1 } else { 0 };
        runs[i].0 = forward;
    }
    runs
}

impl GridProcessor for CpuGridProcessor {
    fn compare(&self, grid: &Tilemap<f32>, op: Comparison, value: f32) -> Mask {
        self.map_cells(grid.width, grid.height, |x, y| op.apply(*grid.get(x, y), value))
    }

    fn compare_grids(&self, a: &Tilemap<f32>, b: &Tilemap<f32>, op: Comparison) -> Result<Mask> {
        a.ensure_same_shape(b)?;
        Ok(self.map_cells(a.width, a.height, |x, y| op.apply(*a.get(x, y), *b.get(x, y))))
    }

    fn outline(&self, mask: &Mask) -> Tilemap<EdgeFlags> {
        self.map_cells(mask.width, mask.height, |x, y| edge_flags_at(mask, x, y))
    }

    fn expand(&self, mask: &Mask) -> Mask {
        self.map_cells(mask.width, mask.height, |x, y| {
            *mask.get(x, y)
                || EdgeFlags::DIRECTIONS
                    .iter()
                    .any(|&(_, offset)| is_active(mask, x, y, offset))
        })
    }

    fn has_neighbor(&self, mask: &Mask, direction: Offset) -> Mask {
        self.map_cells(mask.width, mask.height, |x, y| is_active(mask, x, y, direction))
    }

    fn neighbors_with(&self, a: &Mask, b: &Mask) -> Result<Mask> {
        a.ensure_same_shape(b)?;
        Ok(self.map_cells(b.width, b.height, |x, y| {
            *b.get(x, y)
                && EdgeFlags::DIRECTIONS
                    .iter()
                    .any(|&(_, offset)| is_active(a, x, y, offset))
        }))
    }

    fn intersect(&self, mask: &Mask, target: &mut Mask) -> Result<()> {
        self.combine(mask, target, |t, m| t && m)
    }

    fn intersect_add(&self, mask: &Mask, target: &mut Mask) -> Result<()> {
        self.combine(mask, target, |t, m| t || m)
    }

    fn intersect_remove(&self, mask: &Mask, target: &mut Mask) -> Result<()> {
        self.combine(mask, target, |t, m| t && !m)
    }

    fn invert(&self, mask: &mut Mask) {
        self.update_cells(mask, |cell| *cell = !*cell);
    }

    fn equals_flag(&self, edges: &Tilemap<EdgeFlags>, flags: EdgeFlags) -> Mask {
        self.map_cells(edges.width, edges.height, |x, y| *edges.get(x, y) == flags)
    }

    fn contains_flag(&self, edges: &Tilemap<EdgeFlags>, flag: EdgeFlags) -> Mask {
        self.map_cells(edges.width, edges.height, |x, y| edges.get(x, y).contains(flag))
    }

    fn add_flag(&self, edges: &mut Tilemap<EdgeFlags>, flag: EdgeFlags) {
        self.update_cells(edges, |cell| cell.insert(flag));
    }

    fn remove_flag(&self, edges: &mut Tilemap<EdgeFlags>, flag: EdgeFlags) {
        self.update_cells(edges, |cell| cell.remove(flag));
    }

    fn run_lengths(&self, mask: &Mask) -> Tilemap<RunLengths> {
        let (width, height) = (mask.width, mask.height);
        let rows = self.map_lines(height, |y| line_runs(width, |x| *mask.get(x, y)));
        let columns = self.map_lines(width, |x| line_runs(height, |y| *mask.get(x, y)));
        self.map_cells(width, height, |x, y| {
            let (right, left) = rows[y][x];
            let (up, down) = columns[x][y];
            RunLengths { right, left, up, down }
        })
    }

    fn areas(
        &self,
        mask: &Mask,
        runs: &Tilemap<RunLengths>,
        heights: [u32; 4],
    ) -> Result<Tilemap<AreaWidths>> {
        mask.ensure_same_shape(runs)?;
        Ok(self.map_cells(mask.width, mask.height, |x, y| {
            let mut widths = [0u32; 4];
            if !*mask.get(x, y) {
                return widths;
            }
            let up = runs.get(x, y).up;
            for (slot, &h) in widths.iter_mut().zip(heights.iter()) {
                if h == 0 || up < h {
                    continue;
                }
                *slot = (0..h as usize)
                    .map(|dy| runs.get(x, y + dy).right)
                    .min()
                    .unwrap_or(0);
            }
            widths
        }))
    }

    fn active_positions(&self, mask: &Mask) -> Vec<Point> {
        mask.iter()
            .filter(|(_, _, active)| **active)
            .map(|(x, y, _)| Point::new(x, y))
            .collect()
    }

    fn active_count(&self, mask: &Mask) -> usize {
        if self.parallel {
            mask.as_slice().par_iter().filter(|&&active| active).count()
        } else {
            mask.count_active()
        }
    }

    fn random_active_position<R: Rng + ?Sized>(&self, mask: &Mask, rng: &mut R) -> Option<Point> {
        let positions = self.active_positions(mask);
        if positions.is_empty() {
            return None;
        }
        Some(positions[rng.gen_range(0..positions.len())])
    }

    fn noise_mask<R: Rng + ?Sized>(
        &self,
        width: usize,
        height: usize,
        density: f32,
        rng: &mut R,
    ) -> Mask {
        // Draw sequentially so the stream doesn't depend on thread scheduling.
        let values: Vec<f32> = (0..width * height).map(|_| rng.gen::<f32>()).collect();
        let field = Tilemap::from_raw(width, height, values);
        self.compare(&field, Comparison::Less, density)
    }

    fn double_resolution<T: Clone + Send + Sync>(&self, grid: &Tilemap<T>) -> Tilemap<T> {
        self.map_cells(grid.width * 2, grid.height * 2, |x, y| grid.get(x / 2, y / 2).clone())
    }

    fn fill_rect(&self, target: &mut Mask, origin: Point, width: usize, height: usize) {
        let x_end = (origin.x + width).min(target.width);
        let y_end = (origin.y + height).min(target.height);
        for y in origin.y..y_end {
            for x in origin.x..x_end {
                target.set(x, y, true);
            }
        }
    }

    fn clamp_values(
        &self,
        grid: &mut Tilemap<f32>,
        min: Option<f32>,
        max: Option<f32>,
    ) -> Result<()> {
        if min.is_none() && max.is_none() {
            return Err(LevelGenError::Config(
                "clamp_values needs at least one of `min` or `max`".to_string(),
            ));
        }
        self.update_cells(grid, |value| {
            if let Some(max) = max {
                *value = value.min(max);
            }
            if let Some(min) = min {
                *value = value.max(min);
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn mask_from_rows(rows: &[&str]) -> Mask {
        // Rows are written top-down, like they'd appear on screen.
        let height = rows.len();
        let width = rows[0].len();
        let mut mask = Mask::new(width, height);
        for (row, line) in rows.iter().enumerate() {
            let y = height - 1 - row;
            for (x, c) in line.chars().enumerate() {
                mask.set(x, y, c == '#');
            }
        }
        mask
    }

    #[test]
    fn test_outline_flags() {
        let mask = mask_from_rows(&["....", ".##.", ".##.", "...."]);
        let edges = CpuGridProcessor::new().outline(&mask);
        assert_eq!(*edges.get(1, 2), EdgeFlags::TOP_LEFT);
        assert_eq!(*edges.get(2, 2), EdgeFlags::TOP_RIGHT);
        assert_eq!(*edges.get(1, 1), EdgeFlags::BOTTOM_LEFT);
        assert_eq!(*edges.get(2, 1), EdgeFlags::BOTTOM_RIGHT);
        assert_eq!(*edges.get(0, 0), EdgeFlags::empty());
    }

    #[test]
    fn test_grid_border_counts_as_empty() {
        let mask = Mask::new_with(3, 3, true);
        let edges = CpuGridProcessor::new().outline(&mask);
        assert_eq!(*edges.get(1, 1), EdgeFlags::empty());
        assert_eq!(*edges.get(0, 1), EdgeFlags::LEFT);
        assert_eq!(*edges.get(2, 2), EdgeFlags::TOP_RIGHT);
    }

    #[test]
    fn test_expand_grows_four_neighborhood() {
        let mut mask = Mask::new(5, 5);
        mask.set(2, 2, true);
        let expanded = CpuGridProcessor::new().expand(&mask);
        assert_eq!(expanded.count_active(), 5);
        assert!(*expanded.get(2, 3));
        assert!(!*expanded.get(3, 3));
    }

    #[test]
    fn test_neighbors_with() {
        let a = mask_from_rows(&["##..", "##..", "....", "...."]);
        let b = mask_from_rows(&["..##", "..##", "..##", "...."]);
        let touching = CpuGridProcessor::new().neighbors_with(&a, &b).unwrap();
        assert_eq!(touching.count_active(), 2);
        assert!(*touching.get(2, 3));
        assert!(*touching.get(2, 2));
    }

    #[test]
    fn test_mask_ops() {
        let processor = CpuGridProcessor::new();
        let a = mask_from_rows(&["##", ".."]);
        let mut target = mask_from_rows(&["#.", "#."]);
        processor.intersect_add(&a, &mut target).unwrap();
        assert_eq!(target.count_active(), 3);
        processor.intersect_remove(&a, &mut target).unwrap();
        assert_eq!(target.count_active(), 1);
        processor.intersect(&a, &mut target).unwrap();
        assert_eq!(target.count_active(), 0);
        processor.invert(&mut target);
        assert_eq!(target.count_active(), 4);
    }

    #[test]
    fn test_mask_ops_reject_shape_mismatch() {
        let processor = CpuGridProcessor::new();
        let a = Mask::new(3, 3);
        let mut b = Mask::new(4, 3);
        assert!(matches!(
            processor.intersect(&a, &mut b),
            Err(LevelGenError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_flag_ops() {
        let processor = CpuGridProcessor::new();
        let mut edges = Tilemap::new_with(2, 1, EdgeFlags::TOP);
        edges.set(1, 0, EdgeFlags::TOP_LEFT);
        assert_eq!(processor.contains_flag(&edges, EdgeFlags::TOP).count_active(), 2);
        assert_eq!(processor.equals_flag(&edges, EdgeFlags::TOP).count_active(), 1);
        processor.add_flag(&mut edges, EdgeFlags::BOTTOM);
        assert_eq!(*edges.get(0, 0), EdgeFlags::TOP | EdgeFlags::BOTTOM);
        processor.remove_flag(&mut edges, EdgeFlags::TOP);
        assert_eq!(*edges.get(1, 0), EdgeFlags::BOTTOM_LEFT);
    }

    #[test]
    fn test_run_lengths() {
        let mask = mask_from_rows(&["###.", "##..", "####"]);
        let runs = CpuGridProcessor::new().run_lengths(&mask);
        let spans = |x, y| {
            let r: &RunLengths = runs.get(x, y);
            (r.right, r.left, r.up, r.down)
        };
        assert_eq!(spans(0, 0), (4, 1, 3, 1));
        assert_eq!(spans(1, 1), (1, 2, 2, 2));
        assert_eq!(*runs.get(3, 1), RunLengths::default());
    }

    #[test]
    fn test_areas_on_full_square() {
        let processor = CpuGridProcessor::new();
        let mask = Mask::new_with(5, 5, true);
        let runs = processor.run_lengths(&mask);
        let areas = processor.areas(&mask, &runs, [3, 1, 5, 6]).unwrap();
        assert_eq!(areas.get(0, 0)[0], 5);
        assert_eq!(areas.get(2, 1)[0], 3);
        assert_eq!(areas.get(0, 3)[0], 0);
        assert_eq!(areas.get(0, 0)[2], 5);
        assert_eq!(areas.get(0, 0)[3], 0);
    }

    #[test]
    fn test_areas_take_narrowest_row() {
        let processor = CpuGridProcessor::new();
        let mask = mask_from_rows(&["#####", "##...", "####."]);
        let runs = processor.run_lengths(&mask);
        let areas = processor.areas(&mask, &runs, [1, 2, 3, 4]).unwrap();
        assert_eq!(*areas.get(0, 0), [4, 2, 2, 0]);
    }

    #[test]
    fn test_double_resolution() {
        let processor = CpuGridProcessor::new();
        let grid = Tilemap::from_vec(2, 1, vec![1u8, 2]).unwrap();
        let doubled = processor.double_resolution(&grid);
        assert_eq!((doubled.width, doubled.height), (4, 2));
        assert_eq!(doubled.as_slice(), &[1, 1, 2, 2, 1, 1, 2, 2]);
    }

    #[test]
    fn test_random_active_position_empty() {
        let processor = CpuGridProcessor::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(processor.random_active_position(&Mask::new(4, 4), &mut rng).is_none());

        let mut mask = Mask::new(4, 4);
        mask.set(3, 1, true);
        assert_eq!(processor.random_active_position(&mask, &mut rng), Some(Point::new(3, 1)));
    }

    #[test]
    fn test_clamp_requires_a_bound() {
        let processor = CpuGridProcessor::new();
        let mut grid = Tilemap::from_vec(3, 1, vec![-1.0f32, 0.5, 2.0]).unwrap();
        assert!(processor.clamp_values(&mut grid, None, None).is_err());
        processor.clamp_values(&mut grid, Some(0.0), Some(1.0)).unwrap();
        assert_eq!(grid.as_slice(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_compare_grids() {
        let processor = CpuGridProcessor::new();
        let a = Tilemap::from_vec(3, 1, vec![1.0f32, 2.0, 3.0]).unwrap();
        let b = Tilemap::from_vec(3, 1, vec![2.0f32, 2.0, 2.0]).unwrap();
        let mask = processor.compare_grids(&a, &b, Comparison::GreaterOrEqual).unwrap();
        assert_eq!(mask.as_slice(), &[false, true, true]);
        assert!(processor.compare_grids(&a, &Tilemap::new(2, 1), Comparison::Equal).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let parallel = CpuGridProcessor::new();
        let sequential = CpuGridProcessor::sequential();
        let mask = parallel.noise_mask(37, 29, 0.6, &mut rng);

        assert_eq!(parallel.outline(&mask), sequential.outline(&mask));
        assert_eq!(parallel.expand(&mask), sequential.expand(&mask));
        let runs = parallel.run_lengths(&mask);
        assert_eq!(runs, sequential.run_lengths(&mask));
        assert_eq!(
            parallel.areas(&mask, &runs, [1, 2, 3, 4]).unwrap(),
            sequential.areas(&mask, &runs, [1, 2, 3, 4]).unwrap()
        );
        assert_eq!(parallel.active_count(&mask), sequential.active_count(&mask));
    }
}
