use clap::ValueEnum;
use tracing::level_filters::LevelFilter;

/// Format of diagnostic output on stderr.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    /// One line per event, fields inline.
    Compact,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    /// Includes one event per chunk header read or written.
    Trace,
}

impl LogLevel {
    /// Chunk events come from `conio_frame` while command events come from
    /// `conio`; targets are only worth printing once the former show up.
    fn shows_frame_events(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install the stderr subscriber. Stdout stays reserved for command output,
/// which matters for `restore` writing payload bytes there.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    if level == LogLevel::Off {
        return;
    }

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(level.shows_frame_events());

    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_map_to_filters() {
        assert_eq!(LevelFilter::from(LogLevel::Off), LevelFilter::OFF);
        assert_eq!(LevelFilter::from(LogLevel::Warn), LevelFilter::WARN);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }

    #[test]
    fn targets_only_at_chunk_detail_levels() {
        assert!(!LogLevel::Info.shows_frame_events());
        assert!(LogLevel::Debug.shows_frame_events());
        assert!(LogLevel::Trace.shows_frame_events());
    }
}
