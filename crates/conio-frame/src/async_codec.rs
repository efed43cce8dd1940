//! `tokio_util` codec for the chunk wire format.
//!
//! Yields whole chunks instead of a byte stream, so it pairs with
//! `FramedRead`/`FramedWrite` rather than with `AsyncRead` adapters.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{check_size, encode_header, ChunkConfig, ChunkHeader, HEADER_SIZE};
use crate::error::{FrameError, Result};

/// One decoded unit of a framed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// A chunk payload.
    Data(Bytes),
    /// The end-of-stream marker.
    Closed,
}

/// Codec mapping the chunk wire format to [`Chunk`] items.
#[derive(Debug, Clone, Default)]
pub struct ChunkCodec {
    config: ChunkConfig,
    closed: bool,
}

impl ChunkCodec {
    /// Create a codec with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with explicit configuration.
    pub fn with_config(config: ChunkConfig) -> Self {
        Self {
            config,
            closed: false,
        }
    }

    /// Whether [`Chunk::Closed`] has been decoded.
    ///
    /// Once closed, the decoder leaves any further bytes in the buffer.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn peek_header(&self, src: &BytesMut) -> Result<Option<ChunkHeader>> {
        if src.len() < HEADER_SIZE {
            return Ok(None);
        }
        let header = ChunkHeader::from_bytes(&src[..HEADER_SIZE])?;
        let max = self.config.chunk_limit();
        if !header.is_closed() && header.size() > max {
            return Err(FrameError::ChunkTooLarge {
                size: header.size(),
                max,
            });
        }
        Ok(Some(header))
    }
}

impl Decoder for ChunkCodec {
    type Item = Chunk;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Chunk>> {
        while !self.closed {
            let Some(header) = self.peek_header(src)? else {
                src.reserve(HEADER_SIZE - src.len());
                return Ok(None);
            };

            if header.is_closed() {
                src.advance(HEADER_SIZE);
                self.closed = true;
                return Ok(Some(Chunk::Closed));
            }

            if header.size() == 0 {
                src.advance(HEADER_SIZE);
                continue;
            }

            let total = HEADER_SIZE + header.size();
            if src.len() < total {
                src.reserve(total - src.len());
                return Ok(None);
            }

            src.advance(HEADER_SIZE);
            let payload = src.split_to(header.size()).freeze();
            return Ok(Some(Chunk::Data(payload)));
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Chunk>> {
        if let Some(chunk) = self.decode(src)? {
            return Ok(Some(chunk));
        }
        if self.closed {
            return Ok(None);
        }
        match self.peek_header(src)? {
            None if src.is_empty() => Err(FrameError::MissingCloseMarker),
            None => Err(FrameError::HeaderTooShort { len: src.len() }),
            Some(header) => Err(FrameError::TruncatedChunk {
                remaining: HEADER_SIZE + header.size() - src.len(),
            }),
        }
    }
}

impl Encoder<Chunk> for ChunkCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Chunk, dst: &mut BytesMut) -> Result<()> {
        match item {
            Chunk::Data(payload) => {
                <Self as Encoder<&[u8]>>::encode(self, payload.as_ref(), dst)
            }
            Chunk::Closed => {
                encode_header(&ChunkHeader::CLOSED, dst);
                Ok(())
            }
        }
    }
}

impl Encoder<&[u8]> for ChunkCodec {
    type Error = FrameError;

    fn encode(&mut self, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
        if payload.is_empty() {
            return Ok(());
        }
        check_size(payload.len(), self.config.chunk_limit())?;
        let header = ChunkHeader::data(payload.len())?;
        dst.reserve(HEADER_SIZE + payload.len());
        encode_header(&header, dst);
        dst.extend_from_slice(payload);
        Ok(())
    }
}
