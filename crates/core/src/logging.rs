use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{AstrefError, Result};

pub const LOG_DIR: &str = ".astref/logs";

/// `~/.astref/logs`, or `./.astref/logs` without a home directory.
pub fn log_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LOG_DIR)
}

/// Installs the global subscriber and returns the guard that flushes the
/// log file; drop it only at exit.
///
/// Everything goes to `<log_dir>/<component>.log.<date>`. With `to_stderr`
/// the same events are also printed, colored and without targets.
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_logging(component: &str, to_stderr: bool, default_level: &str) -> Result<WorkerGuard> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::daily(&dir, format!("{component}.log"));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let file = fmt::layer().with_writer(writer).with_ansi(false);
    let stderr = to_stderr.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file)
        .with(stderr)
        .try_init()
        .map_err(|e| AstrefError::Config(format!("could not install logger: {e}")))?;

    Ok(guard)
}
