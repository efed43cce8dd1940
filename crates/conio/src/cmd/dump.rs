use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::Path;

use conio_frame::ChunkWriter;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Serialize;

use crate::cmd::{DumpArgs, SAMPLE_DATA};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: DumpArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input = open_input(args.input.as_deref())?;
    let file = File::create(&args.dump_file).map_err(|err| {
        io_error(
            &format!("failed creating {}", args.dump_file.display()),
            err,
        )
    })?;

    let (_, stats) = write_framed(&mut input.reader, BufWriter::new(file), args.compress)?;
    let wire_bytes = fs::metadata(&args.dump_file)
        .map(|meta| meta.len())
        .map_err(|err| io_error("failed reading dump size", err))?;

    tracing::info!(
        bytes = stats.bytes,
        chunks = stats.chunks,
        wire_bytes,
        "dump written"
    );
    print_report(
        &TransferReport {
            command: "dump",
            source: input.name,
            destination: args.dump_file.display().to_string(),
            bytes: stats.bytes,
            chunks: Some(stats.chunks),
            wire_bytes,
            compressed: args.compress,
        },
        format,
    );
    Ok(SUCCESS)
}

/// Data to be framed, with a display name for reports.
pub struct Input {
    pub reader: Box<dyn Read + Send>,
    pub name: String,
    pub size: u64,
}

/// Open `path` (which must be a regular file), or fall back to the sample data.
pub fn open_input(path: Option<&Path>) -> CliResult<Input> {
    let Some(path) = path else {
        return Ok(Input {
            reader: Box::new(Cursor::new(SAMPLE_DATA)),
            name: "<sample>".to_string(),
            size: SAMPLE_DATA.len() as u64,
        });
    };

    let meta = fs::metadata(path)
        .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
    if !meta.is_file() {
        return Err(CliError::new(
            USAGE,
            format!("{} must be a regular file", path.display()),
        ));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;

    Ok(Input {
        reader: Box::new(file),
        name: path.display().to_string(),
        size: meta.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedStats {
    /// Bytes taken from the source, before compression.
    pub bytes: u64,
    /// Chunks emitted, not counting the closed marker.
    pub chunks: u64,
}

/// Copy `src` into `dst` as a closed chunk stream, gzip-compressed inside
/// the framing when `compress` is set. Returns `dst` for further use.
pub fn write_framed<R, W>(src: &mut R, dst: W, compress: bool) -> CliResult<(W, FramedStats)>
where
    R: Read + ?Sized,
    W: Write,
{
    let mut writer = ChunkCounter::new(ChunkWriter::new(dst));

    let bytes = if compress {
        let mut encoder = GzEncoder::new(&mut writer, Compression::default());
        let copied =
            io::copy(src, &mut encoder).map_err(|err| io_error("copy failed", err))?;
        encoder
            .finish()
            .map_err(|err| io_error("compression failed", err))?;
        copied
    } else {
        io::copy(src, &mut writer).map_err(|err| io_error("copy failed", err))?
    };

    let chunks = writer.chunks;
    let dst = writer
        .inner
        .finish()
        .map_err(|err| frame_error("close failed", err))?;
    Ok((dst, FramedStats { bytes, chunks }))
}

/// Counts the chunks a [`ChunkWriter`] emits: one per non-empty write.
struct ChunkCounter<W> {
    inner: ChunkWriter<W>,
    chunks: u64,
}

impl<W: Write> ChunkCounter<W> {
    fn new(inner: ChunkWriter<W>) -> Self {
        Self { inner, chunks: 0 }
    }
}

impl<W: Write> Write for ChunkCounter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if n > 0 {
            self.chunks += 1;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Debug, Serialize)]
pub struct TransferReport {
    pub command: &'static str,
    pub source: String,
    pub destination: String,
    pub bytes: u64,
    pub chunks: Option<u64>,
    pub wire_bytes: u64,
    pub compressed: bool,
}

impl Report for TransferReport {
    fn columns(&self) -> Vec<&'static str> {
        vec![
            "COMMAND",
            "SOURCE",
            "DESTINATION",
            "BYTES",
            "CHUNKS",
            "WIRE_BYTES",
            "COMPRESSED",
        ]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        vec![vec![
            self.command.to_string(),
            self.source.clone(),
            self.destination.clone(),
            self.bytes.to_string(),
            self.chunks
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string()),
            self.wire_bytes.to_string(),
            self.compressed.to_string(),
        ]]
    }
}
