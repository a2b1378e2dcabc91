//! Logging for clip-poster.
//!
//! Two layers: a process-wide `tracing` subscriber, and a [`JobLogger`] per
//! run that writes the human-readable job log (stage lines, tool command
//! lines, tool output tail on failure) and echoes it to the console.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use clip_poster_core::logging::{JobLogger, LogConfig, OutputStream};
//! use clip_poster_core::models::StageStatus;
//!
//! let logger = JobLogger::create("TRIP_CLIP-20240617-152601", ".logs", LogConfig::default(), None)?;
//!
//! logger.stage_started("Render", "Render the fetched clip");
//! logger.tool_started("render", "aloha vehicle_param.pb.txt /tmp_data_1");
//! logger.tool_output(OutputStream::Stdout, "frame 1/300");
//! logger.tool_finished("render", Some(0), Duration::from_secs(12));
//! logger.stage_finished("Render", StageStatus::Succeeded, Duration::from_secs(12), None);
//! # Ok::<(), std::io::Error>(())
//! ```

mod job_logger;
mod types;

pub use job_logger::JobLogger;
pub(crate) use job_logger::file_stem;
pub use types::{ConsoleSink, LogConfig, LogLevel, OutputStream};

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File name of the application-wide log written by `init_tracing_with_file`.
pub const APP_LOG_FILE: &str = "clip-poster.log";

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr with timestamps
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Initialize tracing with stderr output plus a plain-text file in `logs_dir`.
///
/// The returned guard flushes the file writer on drop; keep it alive
/// until the process exits.
pub fn init_tracing_with_file(
    default_level: LogLevel,
    logs_dir: &Path,
) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let appender = tracing_appender::rolling::never(logs_dir, APP_LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(file_writer),
        )
        .with(filter)
        .init();

    Ok(guard)
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_to_filter_works() {
        assert_eq!(level_to_filter_str(LogLevel::Debug), "debug");
        assert_eq!(level_to_filter_str(LogLevel::Info), "info");
        assert_eq!(
            LogLevel::Warn.to_tracing_level(),
            tracing::Level::WARN
        );
    }
}
