//! Tracing subscriber setup.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const DEFAULT_FILTER: &str = "micmute=info";
const LOG_FILE_PREFIX: &str = "micmute.log";

/// `<data dir>/MicMute/logs`, if the platform has a data directory.
pub fn default_logs_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.data_dir().join("MicMute").join("logs"))
}

/// Install the global subscriber: console output plus a daily rolling file
/// when `logs_dir` can be created.
///
/// `RUST_LOG` overrides the default filter. The returned guard flushes the
/// file writer on drop and must be held for the life of the process.
pub fn init(logs_dir: Option<&Path>) -> Option<WorkerGuard> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_filter(env_filter());

    let file = logs_dir.and_then(|dir| match fs::create_dir_all(dir) {
        Ok(()) => Some(dir),
        Err(e) => {
            eprintln!("Failed to create log directory {}: {e}", dir.display());
            None
        }
    });

    let Some(dir) = file else {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
        tracing::info!("Logging initialized (console only)");
        return None;
    };

    let appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(env_filter());

    if tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!(logs_dir = ?dir, "Logging initialized with file output");
    }

    Some(guard)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
