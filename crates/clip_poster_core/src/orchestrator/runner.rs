//! Job runner: one input locator through the standard pipeline.
//!
//! The runner owns the collaborators (tool runner, uploader), creates the
//! per-job logger and writes the state manifest after the pipeline returns.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;

use crate::config::Settings;
use crate::logging::{self, ConsoleSink, JobLogger, LogConfig, LogLevel};
use crate::models::{InputLocator, StageStatus};
use crate::storage::ObjectUploader;
use crate::tools::ToolRunner;

use super::errors::{PipelineError, PipelineResult};
use super::pipeline::Pipeline;
use super::types::{Context, JobState};
use super::create_standard_pipeline;

/// Shared console sink; each job logger gets a forwarding clone.
pub type ConsoleCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// What a run produced.
#[derive(Debug, Clone)]
pub enum JobReport {
    /// The input locator was empty; nothing was done.
    NoInput,
    /// All stages ran and the video was published.
    Completed(JobSummary),
}

/// Summary of a completed job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Job ID that was processed.
    pub job_id: String,
    /// Published object key.
    pub key: String,
    /// Browser-facing URL of the video.
    pub url_hint: String,
    /// Gateway that accepted the upload.
    pub endpoint: String,
    /// Path to the job log.
    pub log_path: PathBuf,
    /// Path to the state manifest.
    pub state_path: PathBuf,
    /// Steps that completed.
    pub steps_completed: Vec<String>,
}

/// Runs jobs through a pipeline with injected collaborators.
///
/// # Example
///
/// ```ignore
/// let runner = JobRunner::new(settings, Arc::new(ProcessRunner::new()), Arc::new(uploader))
///     .with_console(Arc::new(|line| println!("{}", line)));
/// match runner.run(&input)? {
///     JobReport::NoInput => println!("nothing to do"),
///     JobReport::Completed(summary) => println!("{}", summary.url_hint),
/// }
/// ```
pub struct JobRunner {
    settings: Settings,
    tools: Arc<dyn ToolRunner>,
    uploader: Arc<dyn ObjectUploader>,
    pipeline: Pipeline,
    log_level: LogLevel,
    console: Option<ConsoleCallback>,
}

impl JobRunner {
    /// Create a runner using the standard Fetch → Render → Video → Publish pipeline.
    pub fn new(
        settings: Settings,
        tools: Arc<dyn ToolRunner>,
        uploader: Arc<dyn ObjectUploader>,
    ) -> Self {
        Self {
            settings,
            tools,
            uploader,
            pipeline: create_standard_pipeline(),
            log_level: LogLevel::Info,
            console: None,
        }
    }

    /// Replace the pipeline.
    pub fn with_pipeline(mut self, pipeline: Pipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Set the job log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Echo job log lines to `console`.
    pub fn with_console(mut self, console: ConsoleCallback) -> Self {
        self.console = Some(console);
        self
    }

    /// Settings used for every job.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Run one job.
    ///
    /// An empty `input` returns `JobReport::NoInput` before anything touches
    /// the filesystem. Every other run gets its own job id, log file and
    /// state manifest.
    pub fn run(&self, input: &str) -> PipelineResult<JobReport> {
        let locator = match InputLocator::parse(input) {
            Some(locator) => locator,
            None => {
                tracing::info!("No input locator given; nothing to do");
                return Ok(JobReport::NoInput);
            }
        };

        let job_name = locator.job_name();
        let logs_dir = Path::new(&self.settings.paths.logs_folder);
        let job_id = allocate_job_id(&job_name, logs_dir);
        tracing::info!(job = %job_id, "Starting job for {}", locator);

        let logger = Arc::new(self.create_logger(&job_id)?);
        logger.info(&format!("Job {}", job_id));
        logger.info(&format!("Input: {}", locator));

        let ctx = Context::new(
            self.settings.clone(),
            locator.clone(),
            job_name.clone(),
            Arc::clone(&logger),
            Arc::clone(&self.tools),
            Arc::clone(&self.uploader),
        );
        let mut state = JobState::new(job_id.clone(), locator.as_str());

        let result = self.pipeline.run(&ctx, &mut state);
        state.finish();

        let state_path = logger.manifest_path().to_path_buf();
        if let Err(e) = write_state(&state, &state_path) {
            logger.warn(&format!(
                "Could not write state manifest {}: {}",
                state_path.display(),
                e
            ));
        }

        let run_result = match result {
            Ok(run_result) => run_result,
            Err(e) => {
                tracing::error!(job = %job_id, "{}", e);
                logger.close();
                return Err(e);
            }
        };

        let publish = state.publish.as_ref().ok_or_else(|| {
            PipelineError::setup_failed(&job_name, "pipeline finished without publishing")
        })?;

        let failed = state
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Failed)
            .count();
        logger.info(&format!(
            "{} stage(s) completed, {} failed",
            run_result.steps_completed.len(),
            failed
        ));
        logger.close();

        Ok(JobReport::Completed(JobSummary {
            job_id,
            key: publish.receipt.key.clone(),
            url_hint: publish.url_hint.clone(),
            endpoint: publish.receipt.endpoint.clone(),
            log_path: logger.log_path().to_path_buf(),
            state_path,
            steps_completed: run_result.steps_completed,
        }))
    }

    fn create_logger(&self, job_id: &str) -> PipelineResult<JobLogger> {
        let config = LogConfig::from_settings(&self.settings.logging, self.log_level);
        let sink: Option<ConsoleSink> = self.console.as_ref().map(|console| {
            let console = Arc::clone(console);
            Box::new(move |line: &str| console(line)) as ConsoleSink
        });

        JobLogger::create(job_id, &self.settings.paths.logs_folder, config, sink).map_err(|e| {
            PipelineError::setup_failed(
                job_id,
                format!(
                    "creating job log in '{}': {}",
                    self.settings.paths.logs_folder, e
                ),
            )
        })
    }
}

/// `<job_name>-<timestamp>`, suffixed until no log of that name exists.
fn allocate_job_id(job_name: &str, logs_dir: &Path) -> String {
    let base = format!("{}-{}", job_name, Local::now().format("%Y%m%d-%H%M%S-%3f"));
    let taken = |id: &str| {
        logs_dir
            .join(format!("{}.log", logging::file_stem(id)))
            .exists()
    };

    let mut job_id = base.clone();
    let mut n = 2;
    while taken(&job_id) {
        job_id = format!("{}-{}", base, n);
        n += 1;
    }
    job_id
}

fn write_state(state: &JobState, path: &Path) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)
}
