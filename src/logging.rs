// ABOUTME: Tracing subscriber setup.
// ABOUTME: Filtered console output plus an append-only, timestamped log file.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

use crate::config::Settings;
use crate::error::{Error, Result};

/// Install the global subscriber. Keep the guard alive until exit so buffered
/// lines reach the log file.
pub fn init(settings: &Settings, verbose: bool) -> Result<WorkerGuard> {
    let console_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    let log_file = &settings.log_file;
    let (dir, file_name) = match (log_file.parent(), log_file.file_name()) {
        (Some(dir), Some(name)) => (dir, name),
        _ => {
            return Err(Error::InvalidConfig(format!(
                "log file {} has no file name",
                log_file.display()
            )));
        }
    };
    std::fs::create_dir_all(dir)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer)
                .with_filter(LevelFilter::INFO),
        )
        .try_init()
        .map_err(|e| Error::InvalidConfig(format!("failed to initialize logging: {e}")))?;

    Ok(guard)
}
