use crate::world::{ChunkColumn, ChunkPos, DimensionId};
use std::sync::Arc;

/// A chunk column received from the server.
#[derive(Debug, Clone)]
pub struct ChunkDataEvent {
    pub dimension: DimensionId,
    /// The client already held this chunk before this packet.
    pub seen_chunk: bool,
    pub chunk: Arc<ChunkColumn>,
}

impl ChunkDataEvent {
    pub fn new(dimension: DimensionId, seen_chunk: bool, chunk: ChunkColumn) -> Self {
        Self {
            dimension,
            seen_chunk,
            chunk: Arc::new(chunk),
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.chunk.pos
    }
}
