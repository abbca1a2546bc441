use crate::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "station_sync.log";
const DEFAULT_DIRECTIVES: &str = "station_sync=info,warn";

/// Install the global subscriber: human-readable lines on stdout and JSON
/// lines in a daily-rotated file under `config.directory`. `RUST_LOG`
/// overrides the default filter.
///
/// File output is buffered; hold the returned guard until the process exits.
pub fn init_logging(config: &LoggingConfig) -> WorkerGuard {
    if let Err(e) = std::fs::create_dir_all(&config.directory) {
        eprintln!(
            "Could not create log directory {}: {}",
            config.directory.display(),
            e
        );
    }

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&config.directory, LOG_FILE_PREFIX));

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stdout))
        .init();

    guard
}
