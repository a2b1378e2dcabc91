//! Logging types and configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::LoggingSettings;

/// Log level for filtering messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level.
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// How a job log is written.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Minimum level written to the job log.
    pub level: LogLevel,
    /// Keep tool output out of the log unless the tool fails.
    pub compact: bool,
    /// Progress is only logged when it crosses a multiple of this step.
    pub progress_step: u32,
    /// Tool output lines kept for failure reports.
    pub error_tail: usize,
    /// Prefix lines with the wall-clock time.
    pub show_timestamps: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::from_settings(&LoggingSettings::default(), LogLevel::Info)
    }
}

impl LogConfig {
    /// Build a job log configuration from the `[logging]` settings.
    pub fn from_settings(settings: &LoggingSettings, level: LogLevel) -> Self {
        Self {
            level,
            compact: settings.compact,
            progress_step: settings.progress_step.max(1),
            error_tail: settings.error_tail as usize,
            show_timestamps: settings.show_timestamps,
        }
    }

    /// Everything at debug level, tool output inline, no timestamps.
    pub fn verbose() -> Self {
        Self {
            level: LogLevel::Debug,
            compact: false,
            progress_step: 1,
            error_tail: 50,
            show_timestamps: false,
        }
    }
}

/// Receives every formatted job log line (the CLI prints them).
pub type ConsoleSink = Box<dyn Fn(&str) + Send + Sync>;

/// Which pipe of a tool a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Leading tag of a job log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineTag {
    Stage,
    Command,
    Ok,
    Skip,
    Warn,
    Fail,
    Out(OutputStream),
    Plain,
}

impl LineTag {
    pub(crate) fn apply(self, message: &str) -> String {
        match self {
            LineTag::Stage => format!(">> {}", message),
            LineTag::Command => format!("$ {}", message),
            LineTag::Ok => format!("[ok] {}", message),
            LineTag::Skip => format!("[skip] {}", message),
            LineTag::Warn => format!("[warn] {}", message),
            LineTag::Fail => format!("[fail] {}", message),
            LineTag::Out(OutputStream::Stdout) => format!("  | {}", message),
            LineTag::Out(OutputStream::Stderr) => format!("  ! {}", message),
            LineTag::Plain => message.to_string(),
        }
    }
}
