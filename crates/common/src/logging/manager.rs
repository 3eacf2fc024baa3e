//! Logging initialization and shutdown management.

use std::sync::{Mutex, OnceLock};

use tracing::*;
use tracing_appender::{non_blocking::WorkerGuard, rolling::RollingFileAppender};
use tracing_subscriber::{
    fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use super::types::LoggerConfig;

/// Keeps the file writer alive until [`finalize`].
static FILE_GUARD: OnceLock<Mutex<Option<WorkerGuard>>> = OnceLock::new();

/// Builds the filter shared by all layers, `INFO` unless `RUST_LOG` says otherwise.
pub(crate) fn default_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy()
}

/// Initializes the logging subsystem with the provided config.
///
/// Must be called at most once per process.
pub fn init(config: LoggerConfig) {
    let filt = default_filter();

    let stdout_sub = if config.stdout_config.json_format {
        layer()
            .json()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed()
    } else {
        layer()
            .compact()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed()
    };

    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let file_appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );
        let (writer, guard) = tracing_appender::non_blocking(file_appender);
        let _ = FILE_GUARD.set(Mutex::new(Some(guard)));

        if file_config.json_format {
            layer()
                .json()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(stdout_sub)
        .with(file_layer)
        .init();

    info!(
        service_name = %config.service_name,
        service_version = ?config.service_version,
        file_logging = config.file_logging_config.is_some(),
        "logging initialized"
    );
}

/// Shuts down the logging subsystem, flushing buffered file output.
///
/// Should be called right before the process exits.
pub fn finalize() {
    info!("shutting down logging");

    let Some(guard) = FILE_GUARD.get() else {
        return;
    };
    match guard.lock() {
        Ok(mut guard) => drop(guard.take()),
        Err(e) => eprintln!("failed to flush log file: {e}"),
    }
}
