use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};

use conio_frame::ChunkReader;
use flate2::read::GzDecoder;

use crate::cmd::dump::TransferReport;
use crate::cmd::RestoreArgs;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat};

pub fn run(args: RestoreArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.dump_file).map_err(|err| {
        io_error(
            &format!("failed opening {}", args.dump_file.display()),
            err,
        )
    })?;
    let wire_bytes = file
        .metadata()
        .map(|meta| meta.len())
        .map_err(|err| io_error("failed reading dump size", err))?;

    let Some(output) = &args.output else {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let (_, bytes) = read_framed(BufReader::new(file), &mut out, args.compress)?;
        out.flush()
            .map_err(|err| io_error("failed writing stdout", err))?;
        tracing::info!(bytes, wire_bytes, "dump restored to stdout");
        return Ok(SUCCESS);
    };

    let out = File::create(output)
        .map_err(|err| io_error(&format!("failed creating {}", output.display()), err))?;
    let mut out = BufWriter::new(out);
    let (_, bytes) = read_framed(BufReader::new(file), &mut out, args.compress)?;
    out.flush()
        .map_err(|err| io_error(&format!("failed writing {}", output.display()), err))?;

    tracing::info!(bytes, wire_bytes, "dump restored");
    print_report(
        &TransferReport {
            command: "restore",
            source: args.dump_file.display().to_string(),
            destination: output.display().to_string(),
            bytes,
            chunks: None,
            wire_bytes,
            compressed: args.compress,
        },
        format,
    );
    Ok(SUCCESS)
}

/// Copy the payload of the chunk stream in `src` to `dst`, gunzipping it when
/// `compress` is set. Stops at the closed marker and returns `src` positioned
/// right after it, along with the number of bytes written to `dst`.
pub fn read_framed<R, W>(src: R, dst: &mut W, compress: bool) -> CliResult<(R, u64)>
where
    R: Read,
    W: Write + ?Sized,
{
    let mut reader = ChunkReader::new(src);

    let bytes = if compress {
        let mut decoder = GzDecoder::new(&mut reader);
        io::copy(&mut decoder, dst).map_err(|err| io_error("decompression failed", err))?
    } else {
        io::copy(&mut reader, dst).map_err(|err| io_error("restore failed", err))?
    };

    if !reader.is_closed() {
        let ignored = io::copy(&mut reader, &mut io::sink())
            .map_err(|err| io_error("restore failed", err))?;
        if ignored > 0 {
            tracing::warn!(ignored, "framed bytes after end of compressed data");
        }
    }

    Ok((reader.into_inner(), bytes))
}
