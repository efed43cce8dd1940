//! Length-prefixed chunk framing over any byte stream.
//!
//! Every `write` on a [`ChunkWriter`] becomes one chunk on the wire:
//! - A 4-byte little-endian header: payload size in the low 31 bits,
//!   the "closed" flag in the top bit
//! - The payload itself
//!
//! [`ChunkWriter::close`] emits the `00 00 00 80` end-of-stream marker.
//! [`ChunkReader`] strips the headers again and reports end of stream at the
//! marker without consuming anything after it, so the same connection can be
//! used for unframed traffic afterwards.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    check_size, decode_header, encode_header, read_header, write_header, ChunkConfig,
    ChunkHeader, CLOSED_BIT, HEADER_SIZE, MAX_CHUNK_SIZE,
};
pub use error::{FrameError, Result};
pub use reader::ChunkReader;
pub use writer::ChunkWriter;

#[cfg(feature = "async")]
pub use async_codec::{Chunk, ChunkCodec};
