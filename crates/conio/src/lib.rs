//! Controlled I/O over any byte stream.
//!
//! conio frames a run of writes into length-prefixed chunks terminated by an
//! explicit close marker. The reading side stops exactly at that marker, so a
//! compressor or any other streaming encoder can be layered over a socket and
//! the socket reused for ordinary traffic afterwards.
//!
//! # Crate Structure
//!
//! - [`frame`]: chunk header codec, `ChunkReader` and `ChunkWriter`

/// Re-export frame types.
pub mod frame {
    pub use conio_frame::*;
}

pub use conio_frame::{ChunkReader, ChunkWriter, FrameError};
