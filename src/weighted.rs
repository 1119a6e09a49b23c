//! Weighted random selection over a small discrete set.
//!
//! Weights are plain integers rather than percentages, so a config can say
//! "3 parts grass to 1 part dirt" without normalizing by hand. The same weights
//! double as coverage shares for terrain steps.

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedItem<T> {
    pub item: T,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightedSelection<T> {
    items: Vec<WeightedItem<T>>,
}

impl<T> Default for WeightedSelection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> WeightedSelection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: impl IntoIterator<Item = (T, u32)>) -> Self {
        Self {
            items: pairs
                .into_iter()
                .map(|(item, weight)| WeightedItem { item, weight })
                .collect(),
        }
    }

    pub fn push(&mut self, item: T, weight: u32) {
        self.items.push(WeightedItem { item, weight });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.items.iter().map(|w| w.weight as u64).sum()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index).map(|w| &w.item)
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.items.iter().map(|w| &w.item)
    }

    /// Each item's fraction of the total weight, in insertion order.
    /// All zeros when there is nothing to share.
    pub fn shares(&self) -> Vec<f32> {
        let total = self.total_weight();
        if total == 0 {
            return vec![0.0; self.items.len()];
        }
        self.items
            .iter()
            .map(|w| w.weight as f32 / total as f32)
            .collect()
    }

    /// Index of a randomly picked item, `None` if no item can be picked.
    pub fn select_index<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        let total = self.total_weight();
        if total == 0 {
            return None;
        }
        let roll = rng.gen_range(0..total);
        let mut cumulative = 0u64;
        for (idx, w) in self.items.iter().enumerate() {
            cumulative += w.weight as u64;
            if roll < cumulative {
                return Some(idx);
            }
        }
        None
    }
}

impl<T: Clone + Default> WeightedSelection<T> {
    /// Pick an item with probability `weight / total`.
    ///
    /// Returns `T::default()` for an empty or all-zero set; callers that care
    /// should check `total_weight()` first.
    pub fn select_random<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.select_index(rng)
            .map(|idx| self.items[idx].item.clone())
            .unwrap_or_default()
    }
}
