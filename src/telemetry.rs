//! Tracing subscriber setup for the two binaries.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
}

/// Log to stderr. Used by the chat client, whose stdout is the conversation.
pub fn init_stderr(log_level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .init();
}

/// Open `<dir>/<file_name>` for appending, creating `dir` if needed.
fn file_appender(dir: &Path, file_name: &str) -> Result<RollingFileAppender, TelemetryError> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)?;
    Ok(appender)
}

/// Log to `<dir>/<file_name>`. The game owns the terminal, so nothing may be
/// written to stdout or stderr while it runs.
///
/// The returned guard flushes the background writer on drop and must be held
/// for the lifetime of the program. On error no subscriber is installed and
/// tracing output is discarded.
pub fn init_file(
    log_level: &str,
    dir: &Path,
    file_name: &str,
) -> Result<WorkerGuard, TelemetryError> {
    let appender = file_appender(dir, file_name)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;

    Ok(guard)
}

/// Logging setup errors
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("cannot create log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot open log file: {0}")]
    Appender(#[from] InitError),

    #[error("a global subscriber is already installed: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_path_taken_by_a_directory_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir(dir.path().join("flappy.log")).expect("mkdir");

        let result = init_file("info", dir.path(), "flappy.log");
        assert!(matches!(result, Err(TelemetryError::Appender(_))));
    }

    #[test]
    fn log_dir_under_a_file_is_an_error() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").expect("write");

        let result = init_file("info", &blocker.join("logs"), "flappy.log");
        assert!(matches!(result, Err(TelemetryError::Io(_))));
    }

    #[test]
    fn appender_creates_missing_directories() {
        let dir = TempDir::new().expect("temp dir");
        let logs = dir.path().join("a").join("b");
        file_appender(&logs, "flappy.log").expect("appender");
        assert!(logs.join("flappy.log").exists());
    }
}
