use std::fs::File;
use std::io::{self, BufReader, Read};

use conio_frame::{read_header, FrameError, HEADER_SIZE};
use serde::Serialize;

use crate::cmd::InspectArgs;
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.dump_file).map_err(|err| {
        io_error(
            &format!("failed opening {}", args.dump_file.display()),
            err,
        )
    })?;

    let report = scan(BufReader::new(file))?;
    tracing::info!(
        chunks = report.chunks.len(),
        payload_bytes = report.payload_bytes,
        trailing_bytes = report.trailing_bytes,
        "dump inspected"
    );
    print_report(&report, format);

    if !report.terminated {
        tracing::warn!("chunk stream has no close marker");
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ChunkEntry {
    pub index: usize,
    pub offset: u64,
    pub size: usize,
    pub closed: bool,
}

#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub chunks: Vec<ChunkEntry>,
    pub payload_bytes: u64,
    pub terminated: bool,
    pub trailing_bytes: u64,
}

impl Report for InspectReport {
    fn columns(&self) -> Vec<&'static str> {
        vec!["INDEX", "OFFSET", "SIZE", "CLOSED"]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.chunks
            .iter()
            .map(|chunk| {
                vec![
                    chunk.index.to_string(),
                    chunk.offset.to_string(),
                    chunk.size.to_string(),
                    chunk.closed.to_string(),
                ]
            })
            .collect()
    }
}

/// Walk the chunk headers of `src`, skipping payloads.
///
/// A stream that simply ends without a close marker is reported as
/// unterminated; a stream cut inside a header or payload is an error.
pub fn scan<R: Read>(mut src: R) -> CliResult<InspectReport> {
    let mut chunks = Vec::new();
    let mut offset = 0u64;
    let mut payload_bytes = 0u64;
    let mut terminated = false;

    loop {
        let header = match read_header(&mut src) {
            Ok(header) => header,
            Err(FrameError::MissingCloseMarker) => break,
            Err(err) => {
                return Err(frame_error(
                    &format!("bad chunk header at offset {offset}"),
                    err,
                ))
            }
        };

        chunks.push(ChunkEntry {
            index: chunks.len(),
            offset,
            size: header.size(),
            closed: header.is_closed(),
        });
        offset += HEADER_SIZE as u64;

        if header.is_closed() {
            terminated = true;
            break;
        }

        let size = header.size() as u64;
        let skipped = io::copy(&mut (&mut src).take(size), &mut io::sink())
            .map_err(|err| io_error("failed reading chunk payload", err))?;
        if skipped < size {
            return Err(frame_error(
                &format!("chunk at offset {} truncated", offset - HEADER_SIZE as u64),
                FrameError::TruncatedChunk {
                    remaining: (size - skipped) as usize,
                },
            ));
        }
        offset += size;
        payload_bytes += size;
    }

    let trailing_bytes = io::copy(&mut src, &mut io::sink())
        .map_err(|err| io_error("failed reading trailing bytes", err))?;

    Ok(InspectReport {
        chunks,
        payload_bytes,
        terminated,
        trailing_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_chunks_and_marker() {
        let wire = vec![2, 0, 0, 0, b'h', b'i', 1, 0, 0, 0, b'!', 0, 0, 0, 0x80];
        let report = scan(wire.as_slice()).unwrap();

        assert_eq!(
            report.chunks,
            vec![
                ChunkEntry {
                    index: 0,
                    offset: 0,
                    size: 2,
                    closed: false
                },
                ChunkEntry {
                    index: 1,
                    offset: 6,
                    size: 1,
                    closed: false
                },
                ChunkEntry {
                    index: 2,
                    offset: 11,
                    size: 0,
                    closed: true
                },
            ]
        );
        assert_eq!(report.payload_bytes, 3);
        assert!(report.terminated);
        assert_eq!(report.trailing_bytes, 0);
    }

    #[test]
    fn counts_trailing_bytes() {
        let wire = vec![0, 0, 0, 0x80, b'{', b'}'];
        let report = scan(wire.as_slice()).unwrap();

        assert!(report.terminated);
        assert_eq!(report.trailing_bytes, 2);
    }

    #[test]
    fn unterminated_stream_is_reported() {
        let wire = vec![1, 0, 0, 0, b'x'];
        let report = scan(wire.as_slice()).unwrap();

        assert!(!report.terminated);
        assert_eq!(report.chunks.len(), 1);
    }

    #[test]
    fn truncated_payload_is_error() {
        let wire = vec![9, 0, 0, 0, b'x'];
        let err = scan(wire.as_slice()).err().expect("truncation must fail");

        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("8 payload bytes missing"));
    }

    #[test]
    fn truncated_header_is_error() {
        let wire = vec![1, 0, 0, 0, b'x', 0x80];
        let err = scan(wire.as_slice()).err().expect("truncation must fail");

        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.contains("offset 5"));
    }
}
