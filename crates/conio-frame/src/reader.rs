use std::io::{self, Read};

use crate::codec::{read_header, ChunkConfig};
use crate::error::FrameError;

/// Reads the payload of framed chunks from any `Read` stream.
///
/// Headers are consumed internally at chunk boundaries; callers only see
/// payload bytes. `Ok(0)` is returned once the closed marker has been read,
/// and the inner stream is left positioned right after it, so it can be
/// recovered with [`into_inner`](Self::into_inner) to keep reading unframed data.
///
/// Framing failures are reported as `io::Error`s carrying a [`FrameError`];
/// use [`FrameError::from_io`] to inspect them. After a framing error the
/// reader no longer knows where the next header starts, so every later read
/// fails with [`FrameError::Desynchronized`].
pub struct ChunkReader<T> {
    inner: T,
    unread: usize,
    closed: bool,
    failed: bool,
    config: ChunkConfig,
}

impl<T: Read> ChunkReader<T> {
    /// Create a new chunk reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk reader with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            unread: 0,
            closed: false,
            failed: false,
            config,
        }
    }

    /// Whether the closed marker has been read.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a framing error has made the stream unreadable.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Payload bytes of the current chunk not yet delivered.
    pub fn remaining_in_chunk(&self) -> usize {
        self.unread
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current chunk reader configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Consume headers until a chunk with payload is current.
    ///
    /// Returns `false` when the closed marker was reached instead.
    fn next_chunk(&mut self) -> Result<bool, FrameError> {
        while self.unread == 0 {
            let header = read_header(&mut self.inner)?;
            if header.is_closed() {
                tracing::debug!("chunk stream closed by peer");
                self.closed = true;
                return Ok(false);
            }

            let max = self.config.chunk_limit();
            if header.size() > max {
                return Err(FrameError::ChunkTooLarge {
                    size: header.size(),
                    max,
                });
            }

            tracing::trace!(size = header.size(), "chunk header");
            self.unread = header.size();
        }
        Ok(true)
    }
}

impl<T: Read> Read for ChunkReader<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.failed {
            return Err(FrameError::Desynchronized.into());
        }
        if buf.is_empty() || self.closed {
            return Ok(0);
        }
        match self.next_chunk() {
            Ok(true) => {}
            Ok(false) => return Ok(0),
            Err(FrameError::Io(err)) => return Err(err),
            Err(err) => {
                tracing::debug!(error = %err, "chunk stream failed");
                self.failed = true;
                return Err(err.into());
            }
        }

        let limit = buf.len().min(self.unread);
        let n = self.inner.read(&mut buf[..limit])?;
        if n == 0 {
            self.failed = true;
            return Err(FrameError::TruncatedChunk {
                remaining: self.unread,
            }
            .into());
        }
        self.unread -= n;
        Ok(n)
    }
}
