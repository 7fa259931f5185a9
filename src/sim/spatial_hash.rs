//! Broad-phase spatial hash
//!
//! A uniform grid folded into a fixed number of buckets. Each bucket holds an
//! unordered bag of `(rect, handle)` entries; an entry is stored in every
//! bucket its rect touches, so queries must deduplicate. Bucket membership is
//! only a coarse filter, the stored rect is checked exactly on query.
//!
//! `remove_object` must be given the rect the handle was inserted with.
//! A different rect leaves stale entries behind.

use glam::IVec2;

use super::rect::{Rect, overlaps};
use crate::cell_coord;
use crate::consts::{BUCKET_COUNT, HASH_CELL_SIZE, HASH_MUL_X, HASH_MUL_Y};

#[derive(Debug, Clone)]
struct Entry<T> {
    rect: Rect,
    handle: T,
}

/// Fixed-bucket uniform grid mapping footprints to handles
#[derive(Debug, Clone)]
pub struct SpatialHash<T> {
    cell_size: f32,
    buckets: Vec<Vec<Entry<T>>>,
}

impl<T: Copy + PartialEq> Default for SpatialHash<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + PartialEq> SpatialHash<T> {
    pub fn new() -> Self {
        Self::with_layout(HASH_CELL_SIZE, BUCKET_COUNT)
    }

    pub fn with_layout(cell_size: f32, bucket_count: usize) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");
        debug_assert!(bucket_count > 0, "need at least one bucket");
        Self {
            cell_size,
            buckets: (0..bucket_count.max(1)).map(|_| Vec::new()).collect(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total stored entries (a handle spanning several buckets counts once per bucket)
    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Store `handle` in every bucket touched by `rect`
    pub fn put_object(&mut self, rect: Rect, handle: T) {
        for index in self.touched_buckets(&rect) {
            self.buckets[index].push(Entry { rect, handle });
        }
    }

    /// Drop every entry of `handle` from the buckets touched by `rect`
    pub fn remove_object(&mut self, rect: Rect, handle: T) {
        let mut removed = 0;
        for index in self.touched_buckets(&rect) {
            let bucket = &mut self.buckets[index];
            let mut i = 0;
            while i < bucket.len() {
                if bucket[i].handle == handle {
                    bucket.swap_remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        }
        if removed == 0 {
            log::warn!("spatial hash: removing a rect that was never inserted: {rect:?}");
        }
        debug_assert!(removed > 0, "removed a rect that was never inserted: {rect:?}");
    }

    /// Handles whose stored rect overlaps `query`, each reported once
    pub fn get_objects_in_rect(&self, query: Rect) -> Vec<T> {
        let mut result: Vec<T> = Vec::new();

        for index in self.touched_buckets(&query) {
            for entry in &self.buckets[index] {
                // result stays tiny, a linear scan beats hashing here
                if overlaps(&entry.rect, &query) && !result.contains(&entry.handle) {
                    result.push(entry.handle);
                }
            }
        }

        result
    }

    /// Cell holding a world position
    pub fn cell_of(&self, x: f32, y: f32) -> IVec2 {
        IVec2::new(cell_coord(x, self.cell_size), cell_coord(y, self.cell_size))
    }

    /// Bucket a cell folds into
    pub fn bucket_of(&self, cell: IVec2) -> usize {
        let mixed = cell.x.wrapping_mul(HASH_MUL_X) ^ cell.y.wrapping_mul(HASH_MUL_Y);
        mixed.unsigned_abs() as usize % self.buckets.len()
    }

    /// Buckets covered by the cells of `rect`, corners inclusive.
    ///
    /// Spans wider than the table visit each bucket once instead.
    fn touched_buckets(&self, rect: &Rect) -> Vec<usize> {
        let min = self.cell_of(rect.min().x, rect.min().y);
        let max = self.cell_of(rect.max().x, rect.max().y);

        let cells_x = (max.x as i64 - min.x as i64 + 1).max(0);
        let cells_y = (max.y as i64 - min.y as i64 + 1).max(0);
        if cells_x.saturating_mul(cells_y) >= self.buckets.len() as i64 {
            return (0..self.buckets.len()).collect();
        }

        let mut buckets = Vec::with_capacity((cells_x * cells_y) as usize);
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                buckets.push(self.bucket_of(IVec2::new(x, y)));
            }
        }
        buckets
    }
}
