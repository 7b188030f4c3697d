//! Logging setup for glidecore.
//!
//! Writes to `<directory>/glidecore.log`, truncated at session start, and to
//! stdout. The level defaults to `info` and can be overridden with
//! `RUST_LOG` (e.g. `RUST_LOG=glidecore::blackboard=debug`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "glidecore.log";

/// Keeps the file writer alive; dropping it flushes and closes the log.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Install the global subscriber.
///
/// Can only succeed once per process; later calls return an error from
/// the subscriber registry as `io::ErrorKind::AlreadyExists`.
pub fn init_logging(directory: &Path, file: &str) -> Result<LoggingGuard, io::Error> {
    let log_path = prepare_log_file(directory, file)?;
    tracing::trace!(path = %log_path.display(), "Log file prepared");

    let file_appender = tracing_appender::rolling::never(directory, file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::AlreadyExists, e.to_string()))?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create `directory` and truncate `directory/file`.
fn prepare_log_file(directory: &Path, file: &str) -> Result<PathBuf, io::Error> {
    fs::create_dir_all(directory)?;
    let path = directory.join(file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Default log directory: `~/.glidecore/logs`.
pub fn default_log_dir() -> PathBuf {
    crate::config::config_directory().join("logs")
}
