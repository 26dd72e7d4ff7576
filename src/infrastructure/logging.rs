//! Logging setup on top of `tracing`
//!
//! The engine only emits events; binaries and tests decide where they go by
//! calling one of the initializers here once at startup.

use std::path::Path;
use tracing::Level;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable
    Pretty,
    Compact,
    /// One JSON object per event
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogOutput {
    Stdout,
    Stderr,
    /// Daily rolling file `<directory>/<prefix>.<date>`
    File { directory: String, prefix: String },
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log span open/close events
    pub span_events: bool,
    /// Extra directives, e.g. "xmlcontract::performance=trace"
    pub filter: Option<String>,
    /// Color escapes on terminal outputs; files never get them
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::WARN, format: LogFormat::Compact, output: LogOutput::Stderr, span_events: false, filter: None, ansi: true }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the command line installs: warnings only, or debug output for
    /// `--verbose` with closure pass spans.
    pub fn for_cli(verbose: bool, color: bool) -> Self {
        let config = if verbose {
            Self::default().with_level(Level::DEBUG).with_span_events(true)
        } else {
            Self::default()
        };
        config.with_ansi(color)
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }
}

/// Install the global subscriber.
///
/// Keep the returned guard alive until exit so buffered events get flushed.
/// A second call leaves the first subscriber in place.
pub fn init_logging(config: LogConfig) -> Option<WorkerGuard> {
    let filter = build_filter(&config);
    let ansi = config.ansi && !matches!(config.output, LogOutput::File { .. });

    let (writer, guard) = match &config.output {
        LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LogOutput::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LogOutput::File { directory, prefix } => tracing_appender::non_blocking(rolling::daily(directory, prefix)),
    };

    let base = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_span_events(span_events_config(config.span_events));
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Json => base.json().boxed(),
    };

    if tracing_subscriber::registry().with(layer.with_filter(filter)).try_init().is_err() {
        tracing::debug!("global subscriber already installed");
    }
    Some(guard)
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let base = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xmlcontract={}", config.level)));

    match &config.filter {
        Some(directives) => directives
            .split(',')
            .filter_map(|directive| directive.trim().parse().ok())
            .fold(base, |filter, directive| filter.add_directive(directive)),
        None => base,
    }
}

fn span_events_config(enabled: bool) -> FmtSpan {
    if enabled {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    }
}

/// Verbose pretty output on stderr
pub fn init_dev_logging() -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::DEBUG,
        format: LogFormat::Pretty,
        output: LogOutput::Stderr,
        span_events: true,
        filter: None,
        ansi: true,
    })
}

/// JSON lines into a daily rolling file under `log_dir`
pub fn init_prod_logging(log_dir: impl AsRef<Path>) -> Option<WorkerGuard> {
    init_logging(LogConfig {
        level: Level::INFO,
        format: LogFormat::Json,
        output: LogOutput::File {
            directory: log_dir.as_ref().to_string_lossy().to_string(),
            prefix: "xmlcontract".to_string(),
        },
        span_events: false,
        filter: None,
        ansi: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = LogConfig::new()
            .with_level(Level::DEBUG)
            .with_format(LogFormat::Json)
            .with_span_events(true)
            .with_filter("xmlcontract::analysis=trace");

        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.span_events);
        assert_eq!(config.filter.as_deref(), Some("xmlcontract::analysis=trace"));
    }

    #[test]
    fn test_default_is_quiet() {
        let config = LogConfig::default();
        assert_eq!(config.level, Level::WARN);
        assert_eq!(config.output, LogOutput::Stderr);
    }

    #[test]
    fn test_cli_presets() {
        let quiet = LogConfig::for_cli(false, false);
        assert_eq!(quiet.level, Level::WARN);
        assert!(!quiet.ansi);

        let verbose = LogConfig::for_cli(true, true);
        assert_eq!(verbose.level, Level::DEBUG);
        assert!(verbose.span_events);
        assert!(verbose.ansi);
    }
}
