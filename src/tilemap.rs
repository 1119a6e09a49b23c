//! Fixed-size 2D grids shared by every generation stage.
//!
//! Cells are addressed by `(x, y)` with `y = 0` on the bottom row, so "up"
//! (TOP) is `y + 1`. Storage is row-major: `index = x + width * y`.

use crate::error::{LevelGenError, Result};

/// A bounded 2D grid of cell values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tilemap<T> {
    pub width: usize,
    pub height: usize,
    data: Vec<T>,
}

/// Occupancy grid: `true` = land/active.
pub type Mask = Tilemap<bool>;

impl<T> Default for Tilemap<T> {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }
}

impl<T: Clone + Default> Tilemap<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![T::default(); width * height],
        }
    }
}

impl<T: Clone> Tilemap<T> {
    pub fn new_with(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Fill the entire map with a value.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Tilemap<T> {
    /// Wrap a row-major buffer. Fails if the length doesn't match the dimensions.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(LevelGenError::BufferLength {
                len: data.len(),
                width,
                height,
            });
        }
        Ok(Self { width, height, data })
    }

    /// Caller guarantees `data.len() == width * height`.
    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.index(x, y)]
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.data[idx]
    }

    pub fn set(&mut self, x: usize, y: usize, value: T) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    /// Value of the cell at `(x + dx, y + dy)`, or `None` outside the grid.
    pub fn get_offset(&self, x: usize, y: usize, dx: i32, dy: i32) -> Option<&T> {
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        if self.in_bounds(nx, ny) {
            Some(self.get(nx as usize, ny as usize))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Fail fast when two grids that are combined cell-by-cell differ in size.
    pub fn ensure_same_shape<U>(&self, other: &Tilemap<U>) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(LevelGenError::ShapeMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: other.width,
                height: other.height,
            });
        }
        Ok(())
    }

    /// Iterate over all cells with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let width = self.width.max(1);
        self.data.iter().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }

    /// Iterate mutably over all cells with their coordinates.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, usize, &mut T)> {
        let width = self.width.max(1);
        self.data.iter_mut().enumerate().map(move |(idx, val)| {
            let x = idx % width;
            let y = idx / width;
            (x, y, val)
        })
    }
}

impl Tilemap<bool> {
    pub fn count_active(&self) -> usize {
        self.data.iter().filter(|&&active| active).count()
    }

    /// A filled rectangle leaving `padding` empty cells on every side.
    pub fn bordered(width: usize, height: usize, padding: usize) -> Self {
        let mut mask = Self::new(width, height);
        for (x, y, cell) in mask.iter_mut() {
            *cell = x >= padding
                && y >= padding
                && x + padding < width
                && y + padding < height;
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_layout() {
        let map = Tilemap::from_vec(3, 2, vec![0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(*map.get(0, 1), 3);
        assert_eq!(*map.get(2, 0), 2);
        assert_eq!(map.iter().nth(4).map(|(x, y, _)| (x, y)), Some((1, 1)));
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        let result = Tilemap::from_vec(3, 3, vec![0u8; 8]);
        assert!(matches!(result, Err(LevelGenError::BufferLength { len: 8, .. })));
    }

    #[test]
    fn test_get_offset_is_bounded() {
        let map: Tilemap<u8> = Tilemap::new(4, 4);
        assert!(map.get_offset(0, 0, -1, 0).is_none());
        assert!(map.get_offset(3, 3, 0, 1).is_none());
        assert!(map.get_offset(1, 1, 1, 1).is_some());
    }

    #[test]
    fn test_bordered_mask() {
        let mask = Mask::bordered(5, 4, 1);
        assert_eq!(mask.count_active(), 3 * 2);
        assert!(!*mask.get(0, 0));
        assert!(*mask.get(1, 1));
        assert!(!*mask.get(4, 2));
    }

    #[test]
    fn test_shape_mismatch() {
        let a: Mask = Tilemap::new(4, 4);
        let b: Mask = Tilemap::new(4, 5);
        assert!(a.ensure_same_shape(&b).is_err());
        assert!(a.ensure_same_shape(&a.clone()).is_ok());
    }
}
