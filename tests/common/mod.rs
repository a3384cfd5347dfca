#![allow(dead_code)]

use futures::SinkExt;
use newchunks::protocol::{encode_packet, ChunkDataPacket, MinecraftPacketBuffer, PacketFrameCodec};
use newchunks::world::{
    ChunkColumn, ChunkPos, ChunkSection, PalettedContainer, Registries,
};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::codec::FramedWrite;
use uuid::Uuid;

pub const AIR: u32 = 0;
pub const STONE: u32 = 1;

/// Empty directory under the system temp dir, unique per call.
pub fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let seed = format!("{}-{}-{}", name, std::process::id(), nanos);
    let dir = std::env::temp_dir()
        .join("newchunks-it")
        .join(Uuid::new_v3(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string());
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn section(first_state: u32) -> ChunkSection {
    let registries = Registries::default();
    let states = registries.state_strategy();
    let plains = registries.biomes.id_of("plains").unwrap();
    let other = if first_state == AIR { STONE } else { AIR };
    let indices: Vec<u32> = (0..4096).map(|i| (i % 2) as u32).collect();
    ChunkSection {
        block_count: 2048,
        states: PalettedContainer::indirect(states, vec![first_state, other], &indices).unwrap(),
        biomes: PalettedContainer::single(registries.biome_strategy(), plains),
    }
}

/// Overworld column whose lowest palette starts with air.
pub fn new_column(x: i32, z: i32) -> ChunkColumn {
    ChunkColumn::new(ChunkPos::new(x, z), vec![section(AIR), section(STONE)])
}

/// Overworld column whose lowest palette starts with stone.
pub fn old_column(x: i32, z: i32) -> ChunkColumn {
    ChunkColumn::new(ChunkPos::new(x, z), vec![section(STONE)])
}

pub fn chunk_frame(column: &ChunkColumn) -> Vec<u8> {
    encode_packet(&ChunkDataPacket::from_column(column).unwrap()).unwrap()
}

/// Keep-alive frame, which the replay skips.
pub fn keep_alive_frame(id: i64) -> Vec<u8> {
    let mut buffer = MinecraftPacketBuffer::new();
    buffer.write_varint(0x23);
    buffer.write_i64(id);
    buffer.buffer
}

/// Chunk packet whose section data ends in the middle of a container.
pub fn truncated_chunk_frame(x: i32, z: i32) -> Vec<u8> {
    let mut packet = ChunkDataPacket::from_column(&new_column(x, z)).unwrap();
    packet.data.truncate(10);
    encode_packet(&packet).unwrap()
}

/// Writes `frames` as a length-prefixed capture file.
pub async fn write_capture(path: &Path, frames: Vec<Vec<u8>>) {
    let file = tokio::fs::File::create(path).await.unwrap();
    let mut sink = FramedWrite::new(file, PacketFrameCodec::new());
    for frame in frames {
        sink.send(frame).await.unwrap();
    }
    sink.close().await.unwrap();
}
