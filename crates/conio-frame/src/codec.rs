use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{FrameError, Result};

/// Chunk header: one little-endian `u32` = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Bit carrying the closed flag (the most significant bit of the word).
pub const CLOSED_BIT: u32 = 1 << 31;

/// Largest payload a single chunk can announce: 2^31 - 1 bytes.
pub const MAX_CHUNK_SIZE: usize = (CLOSED_BIT - 1) as usize;

/// Header preceding every chunk on the wire.
///
/// Wire format:
/// ```text
/// ┌────────┬──────────────────────────────┬─────────────────────┐
/// │ bit 31 │ bits 0..=30                  │ Payload             │
/// │ closed │ size (u32 LE, shared word)   │ (size bytes)        │
/// └────────┴──────────────────────────────┴─────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    size: u32,
    closed: bool,
}

impl ChunkHeader {
    /// The end-of-stream marker, serialized as `00 00 00 80`.
    pub const CLOSED: ChunkHeader = ChunkHeader {
        size: 0,
        closed: true,
    };

    /// Create a header, rejecting sizes that do not fit in 31 bits.
    pub fn new(size: usize, closed: bool) -> Result<Self> {
        check_size(size, MAX_CHUNK_SIZE)?;
        Ok(Self {
            size: size as u32,
            closed,
        })
    }

    /// Create the header for a data chunk of `size` payload bytes.
    pub fn data(size: usize) -> Result<Self> {
        Self::new(size, false)
    }

    /// Payload length announced by this header.
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Whether this header marks the end of the framed stream.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Serialize into the 4-byte wire representation.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut word = self.size;
        if self.closed {
            word |= CLOSED_BIT;
        }
        word.to_le_bytes()
    }

    /// Parse a header from the first four bytes of `src`; the rest is ignored.
    pub fn from_bytes(src: &[u8]) -> Result<Self> {
        if src.len() < HEADER_SIZE {
            return Err(FrameError::HeaderTooShort { len: src.len() });
        }
        let mut word_bytes = [0u8; HEADER_SIZE];
        word_bytes.copy_from_slice(&src[..HEADER_SIZE]);
        Ok(Self::from_word(u32::from_le_bytes(word_bytes)))
    }

    fn from_word(word: u32) -> Self {
        Self {
            size: word & !CLOSED_BIT,
            closed: word & CLOSED_BIT != 0,
        }
    }
}

/// Reject sizes above `max` (itself capped at [`MAX_CHUNK_SIZE`]).
pub fn check_size(size: usize, max: usize) -> Result<()> {
    let max = max.min(MAX_CHUNK_SIZE);
    if size > max {
        return Err(FrameError::SizeOutOfRange { size, max });
    }
    Ok(())
}

/// Append the header to `dst`.
pub fn encode_header(header: &ChunkHeader, dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_slice(&header.to_bytes());
}

/// Decode a header from the front of `src`, consuming four bytes.
///
/// Returns `Ok(None)` if `src` doesn't hold a complete header yet.
pub fn decode_header(src: &mut BytesMut) -> Result<Option<ChunkHeader>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }
    Ok(Some(ChunkHeader::from_word(src.get_u32_le())))
}

/// Read exactly one header from `reader`.
///
/// An end of stream before the first byte is [`FrameError::MissingCloseMarker`];
/// one inside the header is [`FrameError::HeaderTooShort`].
pub fn read_header<R: Read + ?Sized>(reader: &mut R) -> Result<ChunkHeader> {
    let mut buf = [0u8; HEADER_SIZE];
    let mut filled = 0usize;
    while filled < HEADER_SIZE {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Err(FrameError::MissingCloseMarker),
            Ok(0) => return Err(FrameError::HeaderTooShort { len: filled }),
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Io(err)),
        }
    }
    ChunkHeader::from_bytes(&buf)
}

/// Write one header to `writer`, returning the number of bytes written.
pub fn write_header<W: Write + ?Sized>(writer: &mut W, header: &ChunkHeader) -> Result<usize> {
    writer.write_all(&header.to_bytes())?;
    Ok(HEADER_SIZE)
}

/// Limits applied by [`ChunkReader`](crate::ChunkReader) and
/// [`ChunkWriter`](crate::ChunkWriter).
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum payload per chunk. Default and ceiling: [`MAX_CHUNK_SIZE`].
    pub max_chunk_size: usize,
}

impl ChunkConfig {
    /// Effective chunk limit, never above [`MAX_CHUNK_SIZE`].
    pub fn chunk_limit(&self) -> usize {
        self.max_chunk_size.min(MAX_CHUNK_SIZE)
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
        }
    }
}
