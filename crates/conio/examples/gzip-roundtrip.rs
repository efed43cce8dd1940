//! Gzip a message through a chunk stream, then keep using the same buffer.
//!
//! Run with:
//!   cargo run --example gzip-roundtrip

use std::io::{self, Cursor, Read, Write};

use conio::{ChunkReader, ChunkWriter};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let message = "the quick brown fox ".repeat(200);

    let mut encoder = GzEncoder::new(ChunkWriter::new(Vec::new()), Compression::default());
    encoder.write_all(message.as_bytes())?;
    let mut wire = encoder.finish()?.finish()?;
    wire.extend_from_slice(b"plain trailer");
    eprintln!("{} bytes of text became {} bytes on the wire", message.len(), wire.len());

    let mut reader = ChunkReader::new(Cursor::new(wire));
    let mut decoded = String::new();
    GzDecoder::new(&mut reader).read_to_string(&mut decoded)?;
    // gzip may stop short of the marker; drain what is left of the framing.
    io::copy(&mut reader, &mut io::sink())?;
    assert_eq!(decoded, message);

    let mut trailer = String::new();
    reader.into_inner().read_to_string(&mut trailer)?;
    eprintln!("after the marker: {trailer:?}");
    Ok(())
}
