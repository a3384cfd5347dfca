use bytes::{Buf, BufMut, BytesMut};
use std::io;
use tokio_util::codec::{Decoder, Encoder};

/// Largest frame the protocol allows (a three byte VarInt).
pub const MAX_FRAME_LENGTH: usize = 2_097_151;

/// Splits a byte stream into VarInt length-prefixed frames.
///
/// Each decoded frame is one packet: packet ID followed by its body, as expected by
/// [`Packet::read_from_buffer`](crate::protocol::packet::Packet::read_from_buffer).
#[derive(Debug, Default, Clone, Copy)]
pub struct PacketFrameCodec;

impl PacketFrameCodec {
    pub fn new() -> Self {
        Self
    }
}

/// Reads a VarInt from the front of `src` without consuming it.
/// Returns the value and its encoded length, or `None` when more bytes are needed.
fn peek_frame_length(src: &[u8]) -> io::Result<Option<(usize, usize)>> {
    let mut value = 0usize;
    for (i, byte) in src.iter().take(3).enumerate() {
        value |= ((byte & 0x7F) as usize) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((value, i + 1)));
        }
    }
    if src.len() >= 3 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "Frame length VarInt longer than 3 bytes",
        ));
    }
    Ok(None)
}

impl Decoder for PacketFrameCodec {
    type Item = BytesMut;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<BytesMut>> {
        let (length, header) = match peek_frame_length(src)? {
            Some(frame) => frame,
            None => return Ok(None),
        };
        if length > MAX_FRAME_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Frame of {} bytes exceeds the protocol limit", length),
            ));
        }
        if src.len() < header + length {
            src.reserve(header + length - src.len());
            return Ok(None);
        }
        src.advance(header);
        Ok(Some(src.split_to(length)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> io::Result<Option<BytesMut>> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} trailing bytes do not form a complete frame", src.len()),
            )),
        }
    }
}

impl Encoder<Vec<u8>> for PacketFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, frame: Vec<u8>, dst: &mut BytesMut) -> io::Result<()> {
        if frame.len() > MAX_FRAME_LENGTH {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Frame of {} bytes exceeds the protocol limit", frame.len()),
            ));
        }
        let mut length = frame.len() as u32;
        dst.reserve(3 + frame.len());
        while length & !0x7F != 0 {
            dst.put_u8((length & 0x7F) as u8 | 0x80);
            length >>= 7;
        }
        dst.put_u8(length as u8);
        dst.extend_from_slice(&frame);
        Ok(())
    }
}
