//! Application logging setup for ElJef tools.
//!
//! Console output goes to stdout, colorized by default. An optional log file
//! always receives debug output with timestamps and targets. `RUST_LOG`
//! overrides the console level when set.

use eljef_types::{EljefError, LogConfig, LogFormat, LogLevel, Result};
use std::path::Path;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize the logging system with default configuration.
pub fn init_default() -> Result<()> {
    init_from_config(&LogConfig::default())
}

/// Set up logging for an application: INFO on the console, or DEBUG when
/// `debug` is set, plus a debug-level log file when `log_file` is given.
pub fn setup_app_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let config = LogConfig {
        level: if debug { LogLevel::Debug } else { LogLevel::Info },
        file: log_file.map(Path::to_path_buf),
        ..LogConfig::default()
    };
    init_from_config(&config)
}

/// Initialize logging from configuration.
///
/// # Errors
///
/// Fails when the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_from_config(config: &LogConfig) -> Result<()> {
    let console_filter = EnvFilter::builder()
        .with_default_directive(level_filter(config.level).into())
        .from_env_lossy();

    let console = match config.format {
        LogFormat::Pretty => fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(config.color)
            .without_time()
            .with_target(false)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stdout)
            .with_ansi(config.color)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stdout)
            .boxed(),
    }
    .with_filter(console_filter);

    let file = match &config.file {
        Some(path) => {
            let appender = file_appender(path)?;
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_filter(LevelFilter::DEBUG),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| EljefError::Other(format!("Failed to initialize logging: {}", e)))
}

fn file_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let name = path
        .file_name()
        .ok_or_else(|| EljefError::Other(format!("Invalid log file path: {}", path.display())))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::NEVER)
        .filename_prefix(name.to_string_lossy())
        .build(dir)
        .map_err(|e| EljefError::Other(format!("Failed to open log file {}: {}", path.display(), e)))
}

/// Map a log level onto a tracing level filter.
pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::None => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
