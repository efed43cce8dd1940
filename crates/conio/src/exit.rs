use std::fmt;
use std::io;

use conio_frame::FrameError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Map an I/O error, looking through to a framing error if it carries one.
pub fn io_error(context: &str, err: io::Error) -> CliError {
    if FrameError::from_io(&err).is_some() {
        return CliError::new(DATA_INVALID, format!("{context}: {err}"));
    }
    let code = match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::InvalidInput => USAGE,
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::Close(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        FrameError::SizeOutOfRange { .. }
        | FrameError::HeaderTooShort { .. }
        | FrameError::MissingCloseMarker
        | FrameError::TruncatedChunk { .. }
        | FrameError::ChunkTooLarge { .. }
        | FrameError::Desynchronized => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::WriteAfterClose => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

pub fn json_error(context: &str, err: serde_json::Error) -> CliError {
    if err.is_io() {
        return io_error(context, err.into());
    }
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}
