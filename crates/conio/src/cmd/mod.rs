use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod demo;
pub mod dump;
pub mod inspect;
pub mod restore;
pub mod version;

/// Payload used when no input file is given.
pub const SAMPLE_DATA: [u8; 4] = [16, 9, 19, 91];

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Frame a file (or sample data) into a dump file.
    Dump(DumpArgs),
    /// Reconstruct the original data from a dump file.
    Restore(RestoreArgs),
    /// List the chunks of a dump file.
    Inspect(InspectArgs),
    /// Round-trip data over a loopback connection shared with JSON messages.
    Demo(DemoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Dump(args) => dump::run(args, format),
        Command::Restore(args) => restore::run(args, format),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Demo(args) => demo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Regular file to frame. Default: built-in 4-byte sample.
    pub input: Option<PathBuf>,
    /// Dump file to create.
    #[arg(long, short = 'd', value_name = "FILE", default_value = "dump.bin")]
    pub dump_file: PathBuf,
    /// Gzip the data inside the framing.
    #[arg(long, short = 'z')]
    pub compress: bool,
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Dump file to read.
    #[arg(long, short = 'd', value_name = "FILE", default_value = "dump.bin")]
    pub dump_file: PathBuf,
    /// Reconstructed file. Default: stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
    /// The framed data is gzip-compressed.
    #[arg(long, short = 'z')]
    pub compress: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Dump file to read.
    #[arg(long, short = 'd', value_name = "FILE", default_value = "dump.bin")]
    pub dump_file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Regular file to send. Default: built-in 4-byte sample.
    pub input: Option<PathBuf>,
    /// Gzip the data inside the framing.
    #[arg(long, short = 'z')]
    pub compress: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}
