//! Reusable scratch grids.
//!
//! Grids are handed out through a guard that puts them back when it goes out of
//! scope, so an early return never leaks a buffer.

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};

use crate::tilemap::Tilemap;

pub struct GridPool<T> {
    free: RefCell<Vec<Tilemap<T>>>,
}

impl<T> Default for GridPool<T> {
    fn default() -> Self {
        Self {
            free: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Clone + Default> GridPool<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a default-filled grid of the given size, reusing a pooled one if possible.
    pub fn acquire(&self, width: usize, height: usize) -> PooledGrid<'_, T> {
        let reused = {
            let mut free = self.free.borrow_mut();
            free.iter()
                .position(|grid| grid.width == width && grid.height == height)
                .map(|idx| free.swap_remove(idx))
        };
        let grid = match reused {
            Some(mut grid) => {
                grid.fill(T::default());
                grid
            }
            None => Tilemap::new(width, height),
        };
        PooledGrid { pool: self, grid }
    }

    /// Number of idle grids.
    pub fn available(&self) -> usize {
        self.free.borrow().len()
    }
}

pub struct PooledGrid<'a, T> {
    pool: &'a GridPool<T>,
    grid: Tilemap<T>,
}

impl<T> Deref for PooledGrid<'_, T> {
    type Target = Tilemap<T>;

    fn deref(&self) -> &Self::Target {
        &self.grid
    }
}

impl<T> DerefMut for PooledGrid<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.grid
    }
}

impl<T> Drop for PooledGrid<'_, T> {
    fn drop(&mut self) {
        let grid = std::mem::take(&mut self.grid);
        self.pool.free.borrow_mut().push(grid);
    }
}
