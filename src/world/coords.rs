//! Chunk and region addressing.
//!
//! A chunk column is addressed by `(x, z)` in chunk units. For storage and for render
//! snapshots the pair is packed into a single `i64` with `x` in the high 32 bits and `z`
//! in the low 32 bits. A region is a 32x32 square of chunks.

use serde::{Deserialize, Serialize};

/// Packed form of a [`ChunkPos`]: `(x << 32) | (z & 0xFFFF_FFFF)`.
pub type PackedChunkPos = i64;

/// log2 of the region edge length in chunks.
pub const REGION_SHIFT: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub const fn pack(self) -> PackedChunkPos {
        ((self.x as i64) << 32) | (self.z as i64 & 0xFFFF_FFFF)
    }

    pub const fn unpack(packed: PackedChunkPos) -> Self {
        Self {
            x: (packed >> 32) as i32,
            z: packed as i32,
        }
    }

    pub const fn region(self) -> RegionPos {
        RegionPos {
            x: self.x >> REGION_SHIFT,
            z: self.z >> REGION_SHIFT,
        }
    }
}

impl From<PackedChunkPos> for ChunkPos {
    fn from(packed: PackedChunkPos) -> Self {
        ChunkPos::unpack(packed)
    }
}

impl From<ChunkPos> for PackedChunkPos {
    fn from(pos: ChunkPos) -> Self {
        pos.pack()
    }
}

/// A square of 32x32 chunks, the unit renderers batch their highlight queries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionPos {
    pub x: i32,
    pub z: i32,
}

impl RegionPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Lowest chunk coordinate on each axis that lies inside this region.
    pub const fn min_chunk(self) -> ChunkPos {
        ChunkPos {
            x: self.x << REGION_SHIFT,
            z: self.z << REGION_SHIFT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        assert_eq!(ChunkPos::new(1, 2).pack(), (1i64 << 32) | 2);
        assert_eq!(ChunkPos::new(0, -1).pack(), 0xFFFF_FFFF);
        assert_eq!(ChunkPos::new(-1, 0).pack(), -1i64 << 32);
    }

    #[test]
    fn test_unpack_inverts_pack_at_extremes() {
        let positions = [
            ChunkPos::new(0, 0),
            ChunkPos::new(-1, -1),
            ChunkPos::new(i32::MAX, i32::MIN),
            ChunkPos::new(i32::MIN, i32::MAX),
            ChunkPos::new(-1_875_000, 1_875_000),
        ];
        for pos in positions {
            assert_eq!(ChunkPos::unpack(pos.pack()), pos);
        }
    }

    #[test]
    fn test_region_of_negative_chunks() {
        assert_eq!(ChunkPos::new(0, 31).region(), RegionPos::new(0, 0));
        assert_eq!(ChunkPos::new(32, -1).region(), RegionPos::new(1, -1));
        assert_eq!(ChunkPos::new(-32, -33).region(), RegionPos::new(-1, -2));
    }

    #[test]
    fn test_region_min_chunk() {
        assert_eq!(RegionPos::new(-2, 3).min_chunk(), ChunkPos::new(-64, 96));
    }
}
