mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "conio", version, about = "Chunk-framed dumps and stream hand-back")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "CONIO_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dump_subcommand() {
        let cli = Cli::try_parse_from(["conio", "dump", "input.txt", "-d", "out.bin", "-z"])
            .expect("dump args should parse");

        let Command::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert_eq!(args.input.as_deref(), Some(std::path::Path::new("input.txt")));
        assert_eq!(args.dump_file, std::path::PathBuf::from("out.bin"));
        assert!(args.compress);
    }

    #[test]
    fn dump_defaults_to_sample_and_dump_bin() {
        let cli = Cli::try_parse_from(["conio", "dump"]).expect("dump args should parse");

        let Command::Dump(args) = cli.command else {
            panic!("expected dump");
        };
        assert!(args.input.is_none());
        assert_eq!(args.dump_file, std::path::PathBuf::from("dump.bin"));
        assert!(!args.compress);
    }

    #[test]
    fn parses_restore_with_output() {
        let cli = Cli::try_parse_from(["conio", "restore", "-o", "copy.txt", "--format", "json"])
            .expect("restore args should parse");

        assert!(matches!(cli.format, Some(OutputFormat::Json)));
        let Command::Restore(args) = cli.command else {
            panic!("expected restore");
        };
        assert_eq!(args.output, Some(std::path::PathBuf::from("copy.txt")));
    }

    #[test]
    fn parses_inspect_subcommand() {
        let cli = Cli::try_parse_from(["conio", "inspect", "--dump-file", "x.bin"])
            .expect("inspect args should parse");
        assert!(matches!(cli.command, Command::Inspect(_)));
    }

    #[test]
    fn parses_quiet_compact_logging() {
        let cli = Cli::try_parse_from(["conio", "--log-level", "off", "--log-format", "compact", "version"])
            .expect("logging args should parse");
        assert_eq!(cli.log_level, LogLevel::Off);
        assert!(matches!(cli.log_format, LogFormat::Compact));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["conio", "--log-level", "loud", "demo"])
            .expect_err("unknown level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
