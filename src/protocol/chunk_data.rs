use crate::protocol::nbt::Tag;
use crate::protocol::packet::{MinecraftPacketBuffer, Packet};
use crate::world::{
    BitStorage, ChunkColumn, ChunkPos, ChunkSection, Palette, PaletteKind, PaletteStrategy,
    PalettedContainer, Registries,
};
use std::collections::HashMap;
use std::io;

/// Client-bound "Chunk Data and Update Light" packet.
///
/// Section data is kept as the raw blob the server sent: interpreting it needs the block
/// state and biome registry sizes, which only the receiving side knows. Use
/// [`ChunkDataPacket::to_column`] to decode it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDataPacket {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// Heightmaps compound, passed through untouched.
    pub heightmaps: Tag,
    /// Serialized sections, lowest first.
    pub data: Vec<u8>,
}

impl Packet for ChunkDataPacket {
    fn packet_id() -> i32 {
        0x24
    }

    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self> {
        let packet_id = buffer.read_varint()?;
        if packet_id != Self::packet_id() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Invalid packet ID: {}", packet_id),
            ));
        }

        let chunk_x = buffer.read_i32()?;
        let chunk_z = buffer.read_i32()?;
        let (_, heightmaps) = Tag::read(buffer)?;

        let size = buffer.read_length()?;
        let data = buffer.read_bytes(size)?;

        // Block entities and light data follow; nothing here needs them.
        Ok(ChunkDataPacket {
            chunk_x,
            chunk_z,
            heightmaps,
            data,
        })
    }

    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()> {
        buffer.write_varint(Self::packet_id());

        buffer.write_i32(self.chunk_x);
        buffer.write_i32(self.chunk_z);
        self.heightmaps.write(buffer, "")?;

        buffer.write_varint(self.data.len() as i32);
        buffer.write_bytes_raw(&self.data);

        // No block entities
        buffer.write_varint(0);
        // Empty light masks (sky, block, empty sky, empty block) and no light arrays
        for _ in 0..6 {
            buffer.write_varint(0);
        }
        Ok(())
    }
}

impl ChunkDataPacket {
    /// Builds the packet a server would send for `column`.
    pub fn from_column(column: &ChunkColumn) -> io::Result<Self> {
        let mut data = MinecraftPacketBuffer::new();
        for section in &column.sections {
            write_section(&mut data, section)?;
        }
        Ok(ChunkDataPacket {
            chunk_x: column.pos.x,
            chunk_z: column.pos.z,
            heightmaps: Tag::Compound(HashMap::new()),
            data: data.buffer,
        })
    }

    pub fn pos(&self) -> ChunkPos {
        ChunkPos::new(self.chunk_x, self.chunk_z)
    }

    /// Decodes the section blob using the registry sizes in `registries`.
    pub fn to_column(&self, registries: &Registries) -> io::Result<ChunkColumn> {
        let states = registries.state_strategy();
        let biomes = registries.biome_strategy();

        let mut buffer = MinecraftPacketBuffer::from_bytes(self.data.clone());
        let mut sections = Vec::new();
        while buffer.remaining() > 0 {
            let block_count = buffer.read_i16()?;
            let states = read_paletted_container(&mut buffer, states)?;
            let biomes = read_paletted_container(&mut buffer, biomes)?;
            sections.push(ChunkSection {
                block_count,
                states,
                biomes,
            });
        }
        Ok(ChunkColumn::new(self.pos(), sections))
    }
}

fn write_section(buffer: &mut MinecraftPacketBuffer, section: &ChunkSection) -> io::Result<()> {
    buffer.write_i16(section.block_count);
    write_paletted_container(buffer, &section.states)?;
    write_paletted_container(buffer, &section.biomes)
}

/// Reads one paletted container, building the palette the client would build for the
/// bits per entry the server sent.
pub fn read_paletted_container(
    buffer: &mut MinecraftPacketBuffer,
    strategy: PaletteStrategy,
) -> io::Result<PalettedContainer> {
    let bits = buffer.read_u8()?;
    let (kind, storage_bits) = strategy.configuration(bits);

    let palette = match kind {
        PaletteKind::SingleValue => {
            Palette::SingleValue(Some(read_registry_id(buffer, strategy)?))
        }
        PaletteKind::Linear => {
            let entries = read_palette_entries(buffer, strategy)?;
            let capacity = 1usize << storage_bits;
            if entries.len() > capacity {
                return Err(invalid_data(format!(
                    "Linear palette of {} entries exceeds its capacity of {}",
                    entries.len(),
                    capacity
                )));
            }
            Palette::Linear(entries)
        }
        PaletteKind::HashMap => Palette::HashMap(read_palette_entries(buffer, strategy)?),
        PaletteKind::Global => Palette::Global {
            size: strategy.registry_size(),
        },
    };

    let data = buffer.read_long_array()?;
    let storage = BitStorage::new(storage_bits, strategy.size(), data)
        .map_err(|e| invalid_data(e.to_string()))?;
    Ok(PalettedContainer::new(palette, storage))
}

pub fn write_paletted_container(
    buffer: &mut MinecraftPacketBuffer,
    container: &PalettedContainer,
) -> io::Result<()> {
    let storage = container.storage();
    buffer.write_u8(storage.bits());
    match container.palette() {
        Palette::SingleValue(Some(value)) => buffer.write_varint(*value as i32),
        Palette::SingleValue(None) => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Single value palette without a value",
            ))
        }
        Palette::Linear(entries) | Palette::HashMap(entries) => {
            buffer.write_varint(entries.len() as i32);
            for entry in entries {
                buffer.write_varint(*entry as i32);
            }
        }
        Palette::Global { .. } => {}
    }
    buffer.write_long_array(storage.raw());
    Ok(())
}

fn read_palette_entries(
    buffer: &mut MinecraftPacketBuffer,
    strategy: PaletteStrategy,
) -> io::Result<Vec<u32>> {
    let length = buffer.read_length()?;
    // Every entry takes at least one byte.
    if length > buffer.remaining() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("Not enough bytes for {} palette entries", length),
        ));
    }
    (0..length)
        .map(|_| read_registry_id(buffer, strategy))
        .collect()
}

fn read_registry_id(
    buffer: &mut MinecraftPacketBuffer,
    strategy: PaletteStrategy,
) -> io::Result<u32> {
    let id = buffer.read_varint()?;
    match u32::try_from(id) {
        Ok(id) if id < strategy.registry_size() => Ok(id),
        _ => Err(invalid_data(format!("Unknown registry id: {}", id))),
    }
}

fn invalid_data(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::packet::encode_packet;

    fn sample_column() -> ChunkColumn {
        let registries = Registries::default();
        let states = registries.state_strategy();
        let biomes = registries.biome_strategy();

        let indices: Vec<u32> = (0..4096).map(|i| (i % 3) as u32).collect();
        let lowest = ChunkSection {
            block_count: 2730,
            states: PalettedContainer::indirect(states, vec![0, 1, 9], &indices).unwrap(),
            biomes: PalettedContainer::indirect(biomes, vec![39, 1], &[0u32; 64]).unwrap(),
        };
        let entries: Vec<u32> = (0..20).collect();
        let wide: Vec<u32> = (0..4096).map(|i| (i % 20) as u32).collect();
        let upper = ChunkSection {
            block_count: 4096,
            states: PalettedContainer::indirect(states, entries, &wide).unwrap(),
            biomes: PalettedContainer::single(biomes, 39),
        };
        let global_values: Vec<u32> = (0..4096).map(|i| (i * 5) as u32).collect();
        let global = ChunkSection {
            block_count: 4096,
            states: PalettedContainer::new(
                Palette::Global {
                    size: states.registry_size(),
                },
                BitStorage::from_values(15, &global_values).unwrap(),
            ),
            biomes: PalettedContainer::single(biomes, 0),
        };
        ChunkColumn::new(ChunkPos::new(-3, 7), vec![lowest, upper, global])
    }

    #[test]
    fn test_packet_decodes_into_the_same_column() {
        let column = sample_column();
        let packet = ChunkDataPacket::from_column(&column).unwrap();
        let bytes = encode_packet(&packet).unwrap();

        let mut buffer = MinecraftPacketBuffer::from_bytes(bytes);
        let read = ChunkDataPacket::read_from_buffer(&mut buffer).unwrap();
        assert_eq!(read, packet);
        assert_eq!(read.pos(), ChunkPos::new(-3, 7));

        let decoded = read.to_column(&Registries::default()).unwrap();
        assert_eq!(decoded, column);
        assert_eq!(decoded.sections[1].states.palette().kind(), PaletteKind::HashMap);
        assert_eq!(decoded.sections[2].states.get(3).unwrap(), 15);
    }

    #[test]
    fn test_wrong_packet_id() {
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_varint(0x22);
        assert!(ChunkDataPacket::read_from_buffer(&mut buffer).is_err());
    }

    #[test]
    fn test_empty_section_data_gives_no_sections() {
        let packet = ChunkDataPacket {
            chunk_x: 0,
            chunk_z: 0,
            heightmaps: Tag::Compound(HashMap::new()),
            data: Vec::new(),
        };
        let column = packet.to_column(&Registries::default()).unwrap();
        assert!(column.sections.is_empty());
    }

    #[test]
    fn test_storage_length_mismatch_is_rejected() {
        let strategy = Registries::default().state_strategy();
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_u8(4);
        buffer.write_varint(1);
        buffer.write_varint(0);
        buffer.write_long_array(&[0; 255]);
        assert!(read_paletted_container(&mut buffer, strategy).is_err());
    }

    #[test]
    fn test_linear_palette_over_capacity_is_rejected() {
        let strategy = Registries::default().state_strategy();
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_u8(4);
        buffer.write_varint(17);
        for id in 0..17 {
            buffer.write_varint(id);
        }
        buffer.write_long_array(&[0; 256]);
        assert!(read_paletted_container(&mut buffer, strategy).is_err());
    }

    #[test]
    fn test_unknown_registry_id_is_rejected() {
        let strategy = Registries::default().biome_strategy();
        let mut buffer = MinecraftPacketBuffer::new();
        buffer.write_u8(0);
        buffer.write_varint(64);
        buffer.write_long_array(&[]);
        assert!(read_paletted_container(&mut buffer, strategy).is_err());
    }

    #[test]
    fn test_truncated_section_is_rejected() {
        let mut packet = ChunkDataPacket::from_column(&sample_column()).unwrap();
        packet.data.truncate(packet.data.len() - 1);
        assert!(packet.to_column(&Registries::default()).is_err());
    }
}
