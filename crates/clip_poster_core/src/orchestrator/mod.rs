//! Pipeline orchestrator for coordinating job execution.
//!
//! A job takes one input locator through a fixed sequence of steps. Each
//! step validates its preconditions, does its work and records its result
//! in the job state.
//!
//! # Architecture
//!
//! ```text
//! JobRunner
//!   └── Pipeline
//!         ├── Step: Fetch    (s3cmd get --recursive)
//!         ├── Step: Render   (simulation renderer)
//!         ├── Step: Video    (video tool on DISPLAY)
//!         └── Step: Publish  (S3 upload)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use clip_poster_core::orchestrator::{JobReport, JobRunner};
//!
//! let runner = JobRunner::new(settings, tools, uploader);
//! if let JobReport::Completed(summary) = runner.run(input)? {
//!     println!("{}", summary.url_hint);
//! }
//! ```

mod errors;
mod pipeline;
mod runner;
mod step;
pub mod steps;
mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use runner::{ConsoleCallback, JobReport, JobRunner, JobSummary};
pub use step::PipelineStep;
pub use steps::{FetchStep, PublishStep, RenderStep, VideoStep};
pub use types::{
    Context, FetchOutput, JobState, PublishOutput, StageRecord, StepOutcome, ToolOutput,
};

/// Create a standard pipeline with all steps in the correct order.
///
/// 1. Fetch - download the clip directory into the workspace
/// 2. Render - run the simulation renderer on the workspace
/// 3. Video - generate the video on the virtual display
/// 4. Publish - upload the video under the parsed-data key
pub fn create_standard_pipeline() -> Pipeline {
    Pipeline::new()
        .with_step(FetchStep::new())
        .with_step(RenderStep::new())
        .with_step(VideoStep::new())
        .with_step(PublishStep::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_pipeline_order() {
        let pipeline = create_standard_pipeline();
        assert_eq!(
            pipeline.step_names(),
            vec!["Fetch", "Render", "Video", "Publish"]
        );
    }
}
