use std::io;

/// Errors that can occur while encoding, decoding, reading or writing chunks.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A chunk size does not fit the header, or exceeds the configured limit.
    #[error("chunk size out of range ({size} bytes, max {max})")]
    SizeOutOfRange { size: usize, max: usize },

    /// Fewer than four bytes were available where a header was expected.
    #[error("chunk header too short ({len} of 4 bytes)")]
    HeaderTooShort { len: usize },

    /// The stream ended on a chunk boundary without a closed header.
    #[error("stream ended without close marker")]
    MissingCloseMarker,

    /// The stream ended in the middle of a chunk payload.
    #[error("stream ended inside a chunk ({remaining} payload bytes missing)")]
    TruncatedChunk { remaining: usize },

    /// A decoded header announces more payload than the reader accepts.
    #[error("chunk too large ({size} bytes, max {max})")]
    ChunkTooLarge { size: usize, max: usize },

    /// An earlier framing error left the reader out of step with the stream.
    #[error("chunk stream unusable after an earlier framing error")]
    Desynchronized,

    /// The writer was already closed.
    #[error("write after close")]
    WriteAfterClose,

    /// An I/O error occurred on the underlying stream.
    #[error("chunk I/O error: {0}")]
    Io(#[from] io::Error),

    /// Emitting the closed header failed.
    #[error("error closing writer: {0}")]
    Close(#[source] io::Error),
}

impl FrameError {
    /// Recover the framing error carried by an `io::Error` returned from
    /// [`ChunkReader`](crate::ChunkReader) or [`ChunkWriter`](crate::ChunkWriter).
    ///
    /// Underlying I/O errors are passed through unwrapped, so they yield `None`.
    pub fn from_io(err: &io::Error) -> Option<&FrameError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<FrameError>())
    }

    fn kind(&self) -> io::ErrorKind {
        match self {
            FrameError::SizeOutOfRange { .. } => io::ErrorKind::InvalidInput,
            FrameError::HeaderTooShort { .. }
            | FrameError::MissingCloseMarker
            | FrameError::TruncatedChunk { .. } => io::ErrorKind::UnexpectedEof,
            FrameError::ChunkTooLarge { .. } | FrameError::Desynchronized => {
                io::ErrorKind::InvalidData
            }
            FrameError::WriteAfterClose => io::ErrorKind::BrokenPipe,
            FrameError::Io(err) | FrameError::Close(err) => err.kind(),
        }
    }
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::Io(inner) => inner,
            other => io::Error::new(other.kind(), other),
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
