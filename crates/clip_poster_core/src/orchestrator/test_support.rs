//! Fakes for exercising steps and the runner without real tools or storage.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tempfile::TempDir;

use crate::config::Settings;
use crate::logging::{self, JobLogger, LogConfig, OutputStream};
use crate::models::InputLocator;
use crate::storage::{ObjectUploader, StorageError, StorageResult, UploadReceipt};
use crate::tools::{ToolInvocation, ToolOutcome, ToolRunner};

use super::runner::JobRunner;
use super::types::{Context, JobState};

/// How the fake runner answers for one tool label.
#[derive(Debug, Clone, Copy)]
pub enum ScriptedResult {
    Exit(i32),
    LaunchError,
}

/// Records invocations and answers from a per-tool script (exit 0 otherwise).
#[derive(Default)]
pub struct FakeToolRunner {
    script: Mutex<HashMap<String, ScriptedResult>>,
    calls: Mutex<Vec<ToolInvocation>>,
}

impl FakeToolRunner {
    pub fn script(&self, tool: &str, result: ScriptedResult) {
        self.script.lock().insert(tool.to_string(), result);
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.calls.lock().clone()
    }
}

impl ToolRunner for FakeToolRunner {
    fn run(&self, invocation: &ToolInvocation, logger: &JobLogger) -> io::Result<ToolOutcome> {
        self.calls.lock().push(invocation.clone());
        let scripted = self.script.lock().get(&invocation.tool).copied();
        match scripted {
            Some(ScriptedResult::LaunchError) => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", invocation.program),
            )),
            Some(ScriptedResult::Exit(code)) => {
                logger.tool_output(
                    OutputStream::Stderr,
                    &format!("{} exiting with {}", invocation.tool, code),
                );
                Ok(ToolOutcome {
                    exit_code: Some(code),
                    elapsed: Duration::from_millis(5),
                })
            }
            None => Ok(ToolOutcome {
                exit_code: Some(0),
                elapsed: Duration::from_millis(5),
            }),
        }
    }
}

/// Records uploads; can be told to fail the next one.
#[derive(Default)]
pub struct FakeUploader {
    uploads: Mutex<Vec<(PathBuf, String, String)>>,
    fail_next: Mutex<bool>,
}

impl FakeUploader {
    pub fn uploads(&self) -> Vec<(PathBuf, String, String)> {
        self.uploads.lock().clone()
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock() = true;
    }
}

impl ObjectUploader for FakeUploader {
    fn upload_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> StorageResult<UploadReceipt> {
        if std::mem::take(&mut *self.fail_next.lock()) {
            return Err(StorageError::Store(object_store::Error::Generic {
                store: "fake",
                source: "gateway rejected request".into(),
            }));
        }
        self.uploads
            .lock()
            .push((local_path.to_path_buf(), bucket.to_string(), key.to_string()));
        Ok(UploadReceipt {
            endpoint: "http://10.199.199.83:8082/".to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes: 0,
            e_tag: Some("\"fake\"".to_string()),
            attempts: 1,
        })
    }
}

/// Scratch directories plus shared fakes.
pub struct TestHarness {
    dir: TempDir,
    pub tools: Arc<FakeToolRunner>,
    pub uploader: Arc<FakeUploader>,
}

impl TestHarness {
    pub fn new() -> Self {
        logging::init_test_tracing();
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            tools: Arc::new(FakeToolRunner::default()),
            uploader: Arc::new(FakeUploader::default()),
        }
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.dir.path().join("workspace")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    /// Default settings pointed at the scratch directories.
    pub fn settings(&self) -> Settings {
        let mut settings = Settings::default();
        settings.paths.workspace_dir = self.workspace_dir().to_string_lossy().into_owned();
        settings.paths.logs_folder = self.logs_dir().to_string_lossy().into_owned();
        settings
    }

    pub fn context(&self, locator: &str) -> (Context, JobState) {
        let locator = InputLocator::parse(locator).expect("non-empty locator");
        let job_name = locator.job_name();
        let job_id = format!("{}-test", job_name);
        let logger = JobLogger::create(&job_id, self.logs_dir(), LogConfig::verbose(), None)
            .expect("create job logger");
        let ctx = Context::new(
            self.settings(),
            locator.clone(),
            job_name.clone(),
            Arc::new(logger),
            self.tools.clone(),
            self.uploader.clone(),
        );
        let state = JobState::new(job_id, locator.as_str());
        (ctx, state)
    }

    pub fn runner(&self) -> JobRunner {
        self.runner_with(self.settings())
    }

    pub fn runner_with(&self, settings: Settings) -> JobRunner {
        JobRunner::new(settings, self.tools.clone(), self.uploader.clone())
    }
}
