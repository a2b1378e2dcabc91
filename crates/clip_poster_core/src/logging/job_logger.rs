//! Per-run job log.
//!
//! One file per run, named after the job id, plus an optional console echo.
//! The log knows about pipeline stages and external tools: stage start and
//! finish lines carry status and timing, tool output is kept in a bounded
//! tail that is replayed when a tool exits non-zero. Stage and tool events
//! are mirrored to `tracing` with structured fields.

use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{ConsoleSink, LineTag, LogConfig, LogLevel, OutputStream};
use crate::models::StageStatus;

struct Sinks {
    file: Option<BufWriter<File>>,
    console: Option<ConsoleSink>,
}

/// Log of one pipeline run.
pub struct JobLogger {
    job_id: String,
    log_path: PathBuf,
    manifest_path: PathBuf,
    config: LogConfig,
    sinks: Mutex<Sinks>,
    tail: Mutex<VecDeque<(OutputStream, String)>>,
    last_progress: Mutex<Option<u32>>,
}

impl JobLogger {
    /// Open `<log_dir>/<job_id>.log` for appending.
    ///
    /// An existing file is never truncated.
    pub fn create(
        job_id: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        console: Option<ConsoleSink>,
    ) -> io::Result<Self> {
        let job_id = job_id.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let stem = file_stem(&job_id);
        let log_path = log_dir.join(format!("{}.log", stem));
        let manifest_path = log_dir.join(format!("{}.state.json", stem));
        let file = OpenOptions::new().create(true).append(true).open(&log_path)?;

        Ok(Self {
            job_id,
            log_path,
            manifest_path,
            config,
            sinks: Mutex::new(Sinks {
                file: Some(BufWriter::new(file)),
                console,
            }),
            tail: Mutex::new(VecDeque::new()),
            last_progress: Mutex::new(None),
        })
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Where the run's state manifest goes.
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn info(&self, message: &str) {
        self.write(LogLevel::Info, LineTag::Plain, message);
    }

    pub fn debug(&self, message: &str) {
        self.write(LogLevel::Debug, LineTag::Plain, message);
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(job = %self.job_id, "{}", message);
        self.write(LogLevel::Warn, LineTag::Warn, message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(job = %self.job_id, "{}", message);
        self.write(LogLevel::Error, LineTag::Fail, message);
    }

    /// Header line for a stage.
    pub fn stage_started(&self, stage: &str, description: &str) {
        tracing::debug!(job = %self.job_id, stage, "stage started");
        self.write(LogLevel::Info, LineTag::Stage, &format!("{}: {}", stage, description));
    }

    /// Closing line for a stage with its status and duration.
    pub fn stage_finished(
        &self,
        stage: &str,
        status: StageStatus,
        elapsed: Duration,
        detail: Option<&str>,
    ) {
        let elapsed_ms = elapsed.as_millis() as u64;
        tracing::info!(job = %self.job_id, stage, %status, elapsed_ms, "stage finished");

        let mut line = format!("{} {} in {} ms", stage, status, elapsed_ms);
        if let Some(detail) = detail {
            line.push_str(": ");
            line.push_str(detail);
        }
        let (level, tag) = match status {
            StageStatus::Succeeded => (LogLevel::Info, LineTag::Ok),
            StageStatus::Skipped => (LogLevel::Info, LineTag::Skip),
            StageStatus::Failed => (LogLevel::Error, LineTag::Fail),
        };
        self.write(level, tag, &line);
    }

    /// Record the command line of a tool about to start; forgets earlier output.
    pub fn tool_started(&self, tool: &str, command_line: &str) {
        self.tail.lock().clear();
        tracing::debug!(job = %self.job_id, tool, command = command_line, "tool started");
        self.write(LogLevel::Info, LineTag::Command, command_line);
    }

    /// One line printed by a running tool.
    ///
    /// Kept in the tail; written to the log only outside compact mode.
    pub fn tool_output(&self, stream: OutputStream, line: &str) {
        if self.config.error_tail > 0 {
            let mut tail = self.tail.lock();
            while tail.len() >= self.config.error_tail {
                tail.pop_front();
            }
            tail.push_back((stream, line.to_string()));
        }
        if !self.config.compact {
            self.write(LogLevel::Debug, LineTag::Out(stream), line);
        }
    }

    /// Record how a tool exited. A non-zero exit replays the output tail.
    pub fn tool_finished(&self, tool: &str, exit_code: Option<i32>, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        match exit_code {
            Some(0) => {
                tracing::debug!(job = %self.job_id, tool, exit_code = 0, elapsed_ms, "tool finished");
                self.write(
                    LogLevel::Debug,
                    LineTag::Plain,
                    &format!("{} exited 0 after {} ms", tool, elapsed_ms),
                );
            }
            _ => {
                let code = exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                tracing::warn!(job = %self.job_id, tool, exit_code = %code, elapsed_ms, "tool failed");
                self.write(
                    LogLevel::Error,
                    LineTag::Fail,
                    &format!("{} exited with {} after {} ms", tool, code, elapsed_ms),
                );
                self.replay_tail(tool);
            }
        }
    }

    /// Overall pipeline progress; returns whether a line was written.
    pub fn progress(&self, percent: u32) -> bool {
        let step = self.config.progress_step.max(1);
        let mut last = self.last_progress.lock();
        if let Some(previous) = *last {
            if percent < 100 && percent / step <= previous / step {
                return false;
            }
        }
        *last = Some(percent);
        drop(last);

        self.write(LogLevel::Info, LineTag::Plain, &format!("progress {}%", percent));
        true
    }

    /// Current tool output tail, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.tail.lock().iter().map(|(_, line)| line.clone()).collect()
    }

    /// Flush and release the log file. Later lines only reach the console.
    pub fn close(&self) {
        let mut sinks = self.sinks.lock();
        if let Some(mut file) = sinks.file.take() {
            let _ = file.flush();
        }
    }

    fn replay_tail(&self, tool: &str) {
        let lines: Vec<_> = self.tail.lock().iter().cloned().collect();
        if lines.is_empty() {
            return;
        }
        self.emit(&format!("last {} line(s) from {}:", lines.len(), tool));
        for (stream, line) in &lines {
            self.emit(&LineTag::Out(*stream).apply(line));
        }
    }

    fn write(&self, level: LogLevel, tag: LineTag, message: &str) {
        if level < self.config.level {
            return;
        }
        self.emit(&tag.apply(message));
    }

    fn emit(&self, line: &str) {
        let line = if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), line)
        } else {
            line.to_string()
        };

        let mut sinks = self.sinks.lock();
        if let Some(ref mut file) = sinks.file {
            let _ = writeln!(file, "{}", line);
        }
        if let Some(ref console) = sinks.console {
            console(&line);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

/// Job id with path separators and shell-hostile characters replaced.
pub(crate) fn file_stem(job_id: &str) -> String {
    job_id
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_whitespace() => '_',
            c => c,
        })
        .collect()
}
