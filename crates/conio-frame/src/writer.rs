use std::io::{self, Write};

use crate::codec::{check_size, write_header, ChunkConfig, ChunkHeader};
use crate::error::{FrameError, Result};

/// Writes each `write` call as one framed chunk to any `Write` stream.
///
/// The writer must be [`close`](Self::close)d (or [`finish`](Self::finish)ed)
/// to emit the end-of-stream marker. Closing does not close the inner stream.
pub struct ChunkWriter<T> {
    inner: T,
    closed: bool,
    config: ChunkConfig,
}

impl<T: Write> ChunkWriter<T> {
    /// Create a new chunk writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk writer with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            closed: false,
            config,
        }
    }

    /// Emit `payload` as a single chunk: header, then payload.
    ///
    /// Sizes are checked before anything is written. An empty payload writes
    /// nothing.
    pub fn write_chunk(&mut self, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            return Ok(());
        }
        if self.closed {
            return Err(FrameError::WriteAfterClose);
        }

        check_size(payload.len(), self.config.chunk_limit())?;
        let header = ChunkHeader::data(payload.len())?;

        write_header(&mut self.inner, &header)?;
        self.inner.write_all(payload)?;
        tracing::trace!(size = payload.len(), "chunk written");
        Ok(())
    }

    /// Emit the closed marker and flush the inner stream.
    ///
    /// Only the first successful call writes the marker; later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        write_header(&mut self.inner, &ChunkHeader::CLOSED).map_err(into_close_error)?;
        self.inner.flush().map_err(FrameError::Close)?;
        self.closed = true;
        tracing::debug!("chunk stream closed");
        Ok(())
    }

    /// Close the framed stream and return the inner stream.
    pub fn finish(mut self) -> Result<T> {
        self.close()?;
        Ok(self.inner)
    }

    /// Whether the closed marker has been written.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream, without closing.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current chunk writer configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }
}

impl<T: Write> Write for ChunkWriter<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn into_close_error(err: FrameError) -> FrameError {
    match err {
        FrameError::Io(io) => FrameError::Close(io),
        other => other,
    }
}
