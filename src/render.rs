//! Pull interface the map renderer uses to draw highlights.

use crate::world::{DimensionId, PackedChunkPos};

/// Source of chunk highlights for one map overlay.
pub trait ChunkHighlightProvider: Send + Sync {
    /// Highlighted chunks whose region lies within `window_size` regions of
    /// `(window_region_x, window_region_z)`.
    fn highlights_in_window(
        &self,
        window_region_x: i32,
        window_region_z: i32,
        window_size: i32,
        dimension: &DimensionId,
    ) -> Vec<PackedChunkPos>;

    fn is_highlighted(&self, x: i32, z: i32, dimension: &DimensionId) -> bool;

    /// Overlay color as 32-bit ARGB.
    fn highlight_color(&self) -> u32;
}

pub const fn argb(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Replaces the alpha channel of `color`.
pub const fn color_with_alpha(color: u32, alpha: u8) -> u32 {
    (color & 0x00FF_FFFF) | (alpha as u32) << 24
}
