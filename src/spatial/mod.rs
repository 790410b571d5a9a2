//! Uniform-grid spatial hash.
//!
//! Both simulation cores share this accelerator: the grid engine indexes
//! particles for contact resolution, the curve engine indexes samples for
//! attraction-repulsion queries. The index is a snapshot of positions at
//! the most recent rebuild; callers that move items must clear and
//! re-insert before querying again.
//!
//! The payload is generic. Positions are captured at insert time, so the
//! index never holds references into the live entity arrays.

use glam::Vec2;
use std::collections::HashMap;

/// Packed 64-bit cell key for integer cell coordinates.
fn cell_key(ix: i32, iy: i32) -> i64 {
    ((ix as i64) << 32) ^ ((iy as i64) & 0xffff_ffff)
}

/// Uniform cell hash over 2D space.
///
/// Buckets preserve insertion order, and queries visit cells in a fixed
/// order, so results are deterministic for identical input sequences.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    buckets: HashMap<i64, Vec<(Vec2, T)>>,
    cell_size: f32,
    item_count: usize,
}

impl<T: Copy> SpatialIndex<T> {
    /// Create an index with the given cell edge length in world units.
    pub fn new(cell_size: f32) -> Self {
        Self {
            buckets: HashMap::new(),
            cell_size,
            item_count: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Drop all buckets.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.item_count = 0;
    }

    /// Append an item to the bucket covering `pos`.
    pub fn insert(&mut self, pos: Vec2, item: T) {
        let (ix, iy) = self.cell_of(pos);
        self.buckets.entry(cell_key(ix, iy)).or_default().push((pos, item));
        self.item_count += 1;
    }

    /// Collect every item in the 3x3 cell neighborhood around `pos`.
    ///
    /// Cells are visited in fixed (dx, dy) order and each bucket in
    /// insertion order.
    pub fn query_neighbors(&self, pos: Vec2, out: &mut Vec<(Vec2, T)>) {
        out.clear();
        let (ix, iy) = self.cell_of(pos);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.buckets.get(&cell_key(ix + dx, iy + dy)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Collect every item within `radius` of `(x, y)`.
    ///
    /// Scans ceil(radius / cell_size) cells in each direction, then filters
    /// by Euclidean distance.
    pub fn query_radius(&self, x: f32, y: f32, radius: f32, out: &mut Vec<(Vec2, T)>) {
        out.clear();
        let center = Vec2::new(x, y);
        let cell_radius = (radius / self.cell_size).ceil() as i32;
        let (ix, iy) = self.cell_of(center);
        let radius_sq = radius * radius;
        for dx in -cell_radius..=cell_radius {
            for dy in -cell_radius..=cell_radius {
                if let Some(bucket) = self.buckets.get(&cell_key(ix + dx, iy + dy)) {
                    for &(pos, item) in bucket {
                        if pos.distance_squared(center) <= radius_sq {
                            out.push((pos, item));
                        }
                    }
                }
            }
        }
    }

    /// Number of non-empty cells.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Total number of inserted items.
    pub fn len(&self) -> usize {
        self.item_count
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }
}
