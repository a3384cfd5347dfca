pub mod chunk_data;
pub mod codec;
pub mod nbt;
pub mod packet;

pub use chunk_data::ChunkDataPacket;
pub use codec::PacketFrameCodec;
pub use packet::{encode_packet, MinecraftPacketBuffer, Packet};
