//! Tracing setup: stdout plus an optional daily-rolling log file.

use anyhow::Context;
use machma_core::config::{shellexpand, MachmaConfig};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "machma.log";

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. The returned guard flushes the
/// file writer on drop and must live until the process exits.
pub fn init(config: &MachmaConfig, sql_debug: bool) -> anyhow::Result<Option<WorkerGuard>> {
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    if sql_debug {
        filter = filter.add_directive("sqlx=debug".parse()?);
    }

    let stdout_layer = fmt::layer().with_target(false);

    let (file_layer, guard) = if config.log_to_file {
        let log_dir = PathBuf::from(shellexpand(&config.data_dir)).join("logs");
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;
        let appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
