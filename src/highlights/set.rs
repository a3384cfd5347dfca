use crate::world::{ChunkPos, PackedChunkPos, RegionPos};
use std::collections::{HashMap, HashSet};

/// Packed chunk coordinates bucketed by region.
///
/// Window queries only visit the buckets of regions inside the window, so the cost of a
/// snapshot follows the number of highlights near the viewer rather than the total.
#[derive(Debug, Default, Clone)]
pub struct RegionHighlights {
    regions: HashMap<RegionPos, HashSet<PackedChunkPos>>,
    len: usize,
}

impl RegionHighlights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if `pos` was not present yet.
    pub fn insert(&mut self, pos: ChunkPos) -> bool {
        let inserted = self
            .regions
            .entry(pos.region())
            .or_default()
            .insert(pos.pack());
        if inserted {
            self.len += 1;
        }
        inserted
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.regions
            .get(&pos.region())
            .is_some_and(|bucket| bucket.contains(&pos.pack()))
    }

    /// Every coordinate whose region lies in `[rx - size, rx + size] x [rz - size, rz + size]`.
    pub fn window(&self, region_x: i32, region_z: i32, size: i32) -> Vec<PackedChunkPos> {
        let size = size.max(0) as i64;
        let (min_x, max_x) = (region_x as i64 - size, region_x as i64 + size);
        let (min_z, max_z) = (region_z as i64 - size, region_z as i64 + size);
        let in_window = |region: &RegionPos| {
            (min_x..=max_x).contains(&(region.x as i64)) && (min_z..=max_z).contains(&(region.z as i64))
        };

        let area = (2 * size + 1).saturating_mul(2 * size + 1);
        let mut highlights = Vec::new();
        if area < self.regions.len() as i64 {
            for x in min_x..=max_x {
                for z in min_z..=max_z {
                    let region = RegionPos::new(x as i32, z as i32);
                    if let Some(bucket) = self.regions.get(&region) {
                        highlights.extend(bucket.iter().copied());
                    }
                }
            }
        } else {
            for (region, bucket) in &self.regions {
                if in_window(region) {
                    highlights.extend(bucket.iter().copied());
                }
            }
        }
        highlights
    }

    /// Adds packed coordinates, returning how many were new.
    pub fn extend(&mut self, packed: impl IntoIterator<Item = PackedChunkPos>) -> usize {
        packed
            .into_iter()
            .filter(|&p| self.insert(ChunkPos::unpack(p)))
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = PackedChunkPos> + '_ {
        self.regions.values().flat_map(|bucket| bucket.iter().copied())
    }

    pub fn to_vec(&self) -> Vec<PackedChunkPos> {
        self.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.len = 0;
    }
}
