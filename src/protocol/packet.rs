use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Packet trait. Contains the packet ID and the functions to write and read the packet.
pub trait Packet {
    /// Packet ID
    fn packet_id() -> i32
    where
        Self: Sized;

    /// Reads the packet, including its leading packet ID, from the buffer.
    fn read_from_buffer(buffer: &mut MinecraftPacketBuffer) -> io::Result<Self>
    where
        Self: Sized;

    /// Writes the packet, including its leading packet ID, to the buffer.
    fn write_to_buffer(&self, buffer: &mut MinecraftPacketBuffer) -> io::Result<()>;
}

/// Minecraft packet buffer. Contains the buffer and the cursor.
/// The cursor is used to keep track of the current read position in the buffer.
#[derive(Debug, Default)]
pub struct MinecraftPacketBuffer {
    pub buffer: Vec<u8>,
    cursor: usize,
}

impl MinecraftPacketBuffer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            cursor: 0,
        }
    }

    /// Creates a buffer that reads from `bytes`, starting at the first byte.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            buffer: bytes,
            cursor: 0,
        }
    }

    pub fn get_buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.cursor)
    }

    /// Writes a VarInt to the buffer.
    /// A VarInt is a variable-length integer. It is encoded using 7 bits per byte, with the most
    /// significant bit of each byte set to 1 unless it is the final byte in the encoded
    /// representation.
    pub fn write_varint(&mut self, value: i32) {
        let mut value = value as u32;
        while (value & !0x7F) != 0 {
            self.buffer.push(((value & 0x7F) as u8) | 0x80);
            value >>= 7;
        }
        self.buffer.push((value & 0x7F) as u8);
    }

    /// Reads a VarInt from the buffer
    pub fn read_varint(&mut self) -> io::Result<i32> {
        let mut result = 0;
        let mut shift = 0;

        loop {
            if self.cursor >= self.buffer.len() {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "EOF while reading VarInt",
                ));
            }

            let byte = self.buffer[self.cursor];
            self.cursor += 1;

            result |= ((byte & 0x7F) as i32) << shift;
            shift += 7;

            if (byte & 0x80) == 0 {
                break;
            }

            if shift >= 35 {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "VarInt too big"));
            }
        }

        Ok(result)
    }

    /// Reads a VarInt that is used as a length or count, rejecting negative values.
    pub fn read_length(&mut self) -> io::Result<usize> {
        let length = self.read_varint()?;
        usize::try_from(length).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Negative length: {}", length),
            )
        })
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        ReadBytesExt::read_u8(self)
    }

    // Write an i16 in network (big-endian) order.
    pub fn write_i16(&mut self, value: i16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    // Read an i16 in network (big-endian) order.
    pub fn read_i16(&mut self) -> io::Result<i16> {
        ReadBytesExt::read_i16::<BigEndian>(self)
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_i32(&mut self) -> io::Result<i32> {
        ReadBytesExt::read_i32::<BigEndian>(self)
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn read_i64(&mut self) -> io::Result<i64> {
        ReadBytesExt::read_i64::<BigEndian>(self)
    }

    /// Writes a VarInt-prefixed array of longs.
    pub fn write_long_array(&mut self, values: &[u64]) {
        self.write_varint(values.len() as i32);
        for value in values {
            // Infallible: writing into a Vec.
            let _ = WriteBytesExt::write_u64::<BigEndian>(&mut self.buffer, *value);
        }
    }

    /// Reads a VarInt-prefixed array of longs.
    pub fn read_long_array(&mut self) -> io::Result<Vec<u64>> {
        let length = self.read_length()?;
        if length.saturating_mul(8) > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Not enough bytes for {} longs", length),
            ));
        }
        (0..length)
            .map(|_| ReadBytesExt::read_u64::<BigEndian>(self))
            .collect()
    }

    pub fn write_bytes_raw(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Reads exactly `length` bytes.
    pub fn read_bytes(&mut self, length: usize) -> io::Result<Vec<u8>> {
        if length > self.remaining() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Not enough bytes to read {} bytes", length),
            ));
        }
        let bytes = self.buffer[self.cursor..self.cursor + length].to_vec();
        self.cursor += length;
        Ok(bytes)
    }
}

impl Read for MinecraftPacketBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let to_read = buf.len().min(self.remaining());
        buf[..to_read].copy_from_slice(&self.buffer[self.cursor..self.cursor + to_read]);
        self.cursor += to_read;
        Ok(to_read)
    }
}

impl Write for MinecraftPacketBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Serializes a packet into a standalone byte vector (packet ID + body, no length prefix).
pub fn encode_packet<T: Packet>(packet: &T) -> io::Result<Vec<u8>> {
    let mut buffer = MinecraftPacketBuffer::new();
    packet.write_to_buffer(&mut buffer)?;
    Ok(buffer.buffer)
}
