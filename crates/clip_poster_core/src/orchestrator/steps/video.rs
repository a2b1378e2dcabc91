//! Video step - produces the clip video from the rendered workspace.

use std::path::PathBuf;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::tools::ToolInvocation;

use super::run_checked;

/// Runs the video tool on the virtual display.
///
/// The tool gets `DISPLAY` set to `tools.display` and leaves
/// `paths.output_filename` in the workspace.
pub struct VideoStep;

impl VideoStep {
    pub fn new() -> Self {
        Self
    }

    fn invocation(ctx: &Context) -> ToolInvocation {
        let tools = &ctx.settings.tools;
        let mut invocation = ToolInvocation::new("video", &tools.video_program)
            .args(tools.video_args.iter().cloned())
            .arg(ctx.workspace_arg())
            .env("DISPLAY", &tools.display);
        if let Some(ref dir) = tools.video_working_dir {
            invocation = invocation.current_dir(PathBuf::from(dir));
        }
        invocation
    }
}

impl Default for VideoStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for VideoStep {
    fn name(&self) -> &str {
        "Video"
    }

    fn description(&self) -> &str {
        "Generate the clip video on the virtual display"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.settings.tools.display.is_empty() {
            return Err(StepError::invalid_input("No display configured for video tool"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let output = run_checked(ctx, &Self::invocation(ctx))?;

        let video = ctx.output_path();
        if !video.exists() {
            ctx.logger.warn(&format!(
                "Video tool exited cleanly but {} is missing",
                video.display()
            ));
        }
        state.video = Some(output);

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.video.is_none() {
            return Err(StepError::invalid_output("Video result not recorded"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::{ScriptedResult, TestHarness};

    #[test]
    fn runs_with_display_set() {
        let harness = TestHarness::new();
        let (ctx, mut state) = harness.context("s3://datahub/collected_data/T/C/");

        VideoStep::new().execute(&ctx, &mut state).unwrap();

        let calls = harness.tools.calls();
        assert_eq!(calls[0].program, "node");
        assert_eq!(
            calls[0].args,
            vec!["index.js".to_string(), ctx.workspace_arg()]
        );
        assert_eq!(
            calls[0].env,
            vec![("DISPLAY".to_string(), ":99".to_string())]
        );
        assert!(calls[0].current_dir.is_none());
    }

    #[test]
    fn honors_working_dir() {
        let harness = TestHarness::new();
        let (mut ctx, mut state) = harness.context("s3://datahub/collected_data/T/C/");
        ctx.settings.tools.video_working_dir = Some("/app/clip_poster/video".to_string());

        VideoStep::new().execute(&ctx, &mut state).unwrap();

        assert_eq!(
            harness.tools.calls()[0].current_dir,
            Some(PathBuf::from("/app/clip_poster/video"))
        );
    }

    #[test]
    fn launch_failure_is_step_error() {
        let harness = TestHarness::new();
        harness.tools.script("video", ScriptedResult::LaunchError);
        let (ctx, mut state) = harness.context("s3://datahub/collected_data/T/C/");

        let err = VideoStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::LaunchFailed { .. }));
    }
}
