//! Core types for the orchestrator pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;
use crate::models::{InputLocator, StageStatus};
use crate::storage::{ObjectUploader, UploadReceipt};
use crate::tools::ToolRunner;

/// Read-only context passed to pipeline steps.
///
/// Contains job configuration and the collaborators steps call out to.
/// Mutable state goes in `JobState`.
pub struct Context {
    /// Application settings.
    pub settings: Settings,
    /// Remote clip directory being processed.
    pub locator: InputLocator,
    /// Job name/identifier.
    pub job_name: String,
    /// Local workspace receiving the clip and artifacts.
    pub workspace: PathBuf,
    /// Per-job logger.
    pub logger: Arc<JobLogger>,
    /// Runs the fetch tool, renderer and video tool.
    pub tools: Arc<dyn ToolRunner>,
    /// Publishes the finished video.
    pub uploader: Arc<dyn ObjectUploader>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(
        settings: Settings,
        locator: InputLocator,
        job_name: impl Into<String>,
        logger: Arc<JobLogger>,
        tools: Arc<dyn ToolRunner>,
        uploader: Arc<dyn ObjectUploader>,
    ) -> Self {
        let workspace = PathBuf::from(&settings.paths.workspace_dir);
        Self {
            settings,
            locator,
            job_name: job_name.into(),
            workspace,
            logger,
            tools,
            uploader,
        }
    }

    /// Workspace path as passed on tool command lines.
    pub fn workspace_arg(&self) -> String {
        self.workspace.to_string_lossy().into_owned()
    }

    /// Video the video tool leaves in the workspace.
    pub fn output_path(&self) -> PathBuf {
        self.workspace.join(&self.settings.paths.output_filename)
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Serialized next to the job log as the run manifest. Each step's
/// output is stored in its own section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// Input locator as given.
    pub locator: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// When the pipeline returned.
    pub finished_at: Option<String>,
    /// Outcome of every stage, in pipeline order.
    #[serde(default)]
    pub stages: Vec<StageRecord>,
    /// Fetch results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<FetchOutput>,
    /// Render results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<ToolOutput>,
    /// Video results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<ToolOutput>,
    /// Publish results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<PublishOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>, locator: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            locator: locator.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Append a stage outcome.
    pub fn record_stage(
        &mut self,
        name: impl Into<String>,
        status: StageStatus,
        elapsed: Duration,
        detail: Option<String>,
    ) {
        self.stages.push(StageRecord {
            name: name.into(),
            status,
            elapsed_ms: elapsed.as_millis() as u64,
            detail,
        });
    }

    /// Recorded outcome of a stage by name.
    pub fn stage(&self, name: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.name == name)
    }

    /// Mark the run as finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(chrono::Local::now().to_rfc3339());
    }

    /// Check if the video has been published.
    pub fn has_publish(&self) -> bool {
        self.publish.is_some()
    }
}

/// Recorded outcome of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub name: String,
    pub status: StageStatus,
    pub elapsed_ms: u64,
    /// Error text for failures, reason for skips.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Output from the Fetch step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutput {
    /// Command that was run.
    pub command: String,
    /// Exit code (None when the tool could not start or was killed).
    pub exit_code: Option<i32>,
    /// Time spent in the tool.
    pub elapsed_ms: u64,
    /// The fetch failed but policy let the pipeline continue.
    pub tolerated_failure: bool,
    /// Launch error text, if the tool could not start.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_error: Option<String>,
}

/// Output from the Render and Video steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Command that was run.
    pub command: String,
    /// Exit code.
    pub exit_code: i32,
    /// Time spent in the tool.
    pub elapsed_ms: u64,
}

/// Output from the Publish step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishOutput {
    /// Local video that was uploaded.
    pub local_path: PathBuf,
    /// Browser-facing URL of the uploaded video.
    pub url_hint: String,
    /// Upload details.
    pub receipt: UploadReceipt,
}

/// Result of executing a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Step completed successfully.
    Success,
    /// Step was skipped (preconditions not met, but not an error).
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_records_stages() {
        let mut state = JobState::new("test-123", "s3://b/t/c/");
        assert!(!state.has_publish());

        state.record_stage("Fetch", StageStatus::Succeeded, Duration::from_millis(1500), None);
        state.record_stage(
            "Render",
            StageStatus::Failed,
            Duration::from_millis(20),
            Some("exit code 1".to_string()),
        );

        assert_eq!(state.stage("Fetch").unwrap().elapsed_ms, 1500);
        assert_eq!(state.stage("Render").unwrap().status, StageStatus::Failed);
        assert!(state.stage("Video").is_none());
    }

    #[test]
    fn job_state_serializes() {
        let mut state = JobState::new("test-456", "s3://b/t/c/");
        state.record_stage("Fetch", StageStatus::Skipped, Duration::ZERO, None);
        state.finish();

        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"test-456\""));
        assert!(json.contains("\"status\":\"skipped\""));
        assert!(!json.contains("\"publish\""));
    }
}
