//! HeightIndex - O(log n) prefix sums and lower_bound via Fenwick tree
//!
//! Maps vertical pixel offsets to node positions for visible-range lookup.
//!
//! # Complexity
//!
//! - `from_heights`: O(n)
//! - `set`: O(log n)
//! - `prefix_sum`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `push`: O(log n) amortized
//! - `total`: O(1)

use crate::engine::anchor::Px;

/// Fenwick tree over node heights (0-indexed API).
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage, exactly `heights.len()` long.
    tree: Vec<i64>,
    /// Plain copy of each height for O(1) reads and rebuilds.
    heights: Vec<Px>,
    total: u64,
}

impl HeightIndex {
    /// Builds an index over `heights` in linear time.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatview::engine::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![3, 4, 5]);
    /// assert_eq!(index.prefix_sum(1), 7);
    /// assert_eq!(index.total(), 12);
    /// ```
    pub fn from_heights(heights: Vec<Px>) -> Self {
        let mut index = Self {
            tree: Vec::new(),
            heights,
            total: 0,
        };
        index.rebuild();
        index
    }

    fn rebuild(&mut self) {
        let n = self.heights.len();
        self.tree = self.heights.iter().map(|&h| i64::from(h)).collect();
        for i in 0..n {
            let parent = i | (i + 1);
            if parent < n {
                let value = self.tree[i];
                self.tree[parent] += value;
            }
        }
        self.total = self.heights.iter().map(|&h| u64::from(h)).sum();
    }

    /// Sets the height at the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set(&mut self, index: usize, height: Px) {
        let current = self.heights[index];
        let delta = i64::from(height) - i64::from(current);
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
            self.heights[index] = height;
            self.total = (self.total as i64 + delta) as u64;
        }
    }

    /// Height of one entry.
    pub fn height(&self, index: usize) -> Option<Px> {
        self.heights.get(index).copied()
    }

    /// Cumulative height up to and including `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> u64 {
        assert!(
            index < self.len(),
            "index {} out of bounds (len: {})",
            index,
            self.len()
        );
        fenwick::array::prefix_sum(&self.tree, index).max(0) as u64
    }

    /// Offset of the top edge of entry `index`.
    pub fn offset_of(&self, index: usize) -> u64 {
        if index == 0 {
            0
        } else {
            self.prefix_sum(index - 1)
        }
    }

    /// First index whose range `[offset_of(i), prefix_sum(i))` contains
    /// `value`. `None` when `value >= total()`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatview::engine::height_index::HeightIndex;
    /// let index = HeightIndex::from_heights(vec![10, 20, 15]);
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(1));
    /// assert_eq!(index.lower_bound(30), Some(2));
    /// assert_eq!(index.lower_bound(45), None);
    /// ```
    pub fn lower_bound(&self, value: u64) -> Option<usize> {
        if self.is_empty() || value >= self.total {
            return None;
        }
        let mut left = 0;
        let mut right = self.len();
        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > value {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        (left < self.len()).then_some(left)
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }

    /// Appends an entry. Growing rebuilds the tree so every node keeps
    /// covering its full range.
    pub fn push(&mut self, height: Px) {
        self.heights.push(height);
        self.rebuild();
    }

    pub fn clear(&mut self) {
        self.tree.clear();
        self.heights.clear();
        self.total = 0;
    }
}
