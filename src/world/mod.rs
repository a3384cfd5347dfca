pub mod chunk;
pub mod coords;
pub mod dimension;
pub mod palette;
pub mod registry;

pub use chunk::{ChunkColumn, ChunkSection};
pub use coords::{ChunkPos, PackedChunkPos, RegionPos};
pub use dimension::{DimensionClass, DimensionId, WorldId};
pub use palette::{BitStorage, Palette, PaletteKind, PaletteStrategy, PalettedContainer};
pub use registry::{BiomeRegistry, BlockRegistry, Registries};
