use crate::world::coords::ChunkPos;
use crate::world::palette::PalettedContainer;

/// One 16-block-tall slice of a chunk column as decoded from the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSection {
    /// Number of non-air blocks, as reported by the server.
    pub block_count: i16,
    pub states: PalettedContainer,
    pub biomes: PalettedContainer,
}

/// Section data of one chunk column, lowest section first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkColumn {
    pub pos: ChunkPos,
    pub sections: Vec<ChunkSection>,
}

impl ChunkColumn {
    pub fn new(pos: ChunkPos, sections: Vec<ChunkSection>) -> Self {
        Self { pos, sections }
    }

    pub fn lowest_section(&self) -> Option<&ChunkSection> {
        self.sections.first()
    }
}
