//! Command runner for external process execution.

use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::logging::{JobLogger, OutputStream};

/// A single external command: program, arguments, extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Short tool label used in logs and errors.
    pub tool: String,
    /// Program to execute (path or name looked up in PATH).
    pub program: String,
    /// Positional arguments.
    pub args: Vec<String>,
    /// Variables added on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Working directory (inherited when `None`).
    pub current_dir: Option<PathBuf>,
}

impl ToolInvocation {
    /// Create an invocation with no arguments.
    pub fn new(tool: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set an environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Run the child in `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Human-readable command line for logs.
    pub fn command_line(&self) -> String {
        let mut line = String::new();
        for (key, value) in &self.env {
            line.push_str(&format!("{}={} ", key, value));
        }
        line.push_str(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Result of running a tool to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
}

impl ToolOutcome {
    /// Whether the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Exit code for error reporting (-1 for signal termination).
    pub fn code_or_signal(&self) -> i32 {
        self.exit_code.unwrap_or(-1)
    }
}

/// Runs external tools.
///
/// Implementations must block until the tool exits. An `Err` means the tool
/// could not be started or waited on; a non-zero exit is a normal `Ok`.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation, logger: &JobLogger) -> io::Result<ToolOutcome>;
}

/// Spawns real child processes and streams their output into the job log.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation, logger: &JobLogger) -> io::Result<ToolOutcome> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = invocation.current_dir {
            command.current_dir(dir);
        }

        let started = Instant::now();
        let mut child = command.spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // stderr drains on its own thread so neither pipe can fill up and block the child
        thread::scope(|scope| {
            if let Some(stderr) = stderr {
                scope.spawn(move || pump(stderr, OutputStream::Stderr, logger));
            }
            if let Some(stdout) = stdout {
                pump(stdout, OutputStream::Stdout, logger);
            }
        });

        let status = child.wait()?;

        Ok(ToolOutcome {
            exit_code: status.code(),
            elapsed: started.elapsed(),
        })
    }
}

/// Forward a child pipe to the job log line by line until EOF.
///
/// Bytes that are not UTF-8 are replaced, never treated as end of output.
/// The pipe stays open until EOF so the child cannot die on a broken pipe.
fn pump<R: Read>(pipe: R, stream: OutputStream, logger: &JobLogger) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                logger.tool_output(stream, line.trim_end_matches(['\n', '\r']));
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!(job = logger.job_id(), %stream, "reading tool output failed: {}", e);
                let _ = io::copy(&mut reader, &mut io::sink());
                break;
            }
        }
    }
}
