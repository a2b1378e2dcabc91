//! Fetch step - pulls the clip directory into the workspace with s3cmd.

use std::fs;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, FetchOutput, JobState, StepOutcome};
use crate::tools::ToolInvocation;

/// Recursive download of the clip directory.
///
/// A failed download does not stop the pipeline unless
/// `tools.fail_on_fetch_error` is set; the renderer then works with
/// whatever the workspace already holds.
pub struct FetchStep;

impl FetchStep {
    pub fn new() -> Self {
        Self
    }

    fn invocation(ctx: &Context) -> ToolInvocation {
        let tools = &ctx.settings.tools;
        ToolInvocation::new("fetch", &tools.fetch_program)
            .arg("-c")
            .arg(&tools.fetch_config)
            .args(["get", "--recursive"])
            .arg(ctx.locator.as_str())
            .arg(ctx.workspace_arg())
            .arg("--force")
    }
}

impl Default for FetchStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for FetchStep {
    fn name(&self) -> &str {
        "Fetch"
    }

    fn description(&self) -> &str {
        "Download the clip directory into the workspace"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        fs::create_dir_all(&ctx.workspace)
            .map_err(|e| StepError::io_error("creating workspace directory", e))
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let strict = ctx.settings.tools.fail_on_fetch_error;
        let invocation = Self::invocation(ctx);
        let command = invocation.command_line();

        ctx.logger.info(&format!(
            "Fetching {} into {}",
            ctx.locator,
            ctx.workspace.display()
        ));
        ctx.logger.tool_started(&invocation.tool, &command);

        match ctx.tools.run(&invocation, &ctx.logger) {
            Ok(outcome) => {
                ctx.logger
                    .tool_finished(&invocation.tool, outcome.exit_code, outcome.elapsed);
                let failed = !outcome.success();
                if failed {
                    if strict {
                        return Err(StepError::command_failed(
                            "fetch",
                            outcome.code_or_signal(),
                            format!("could not download {}", ctx.locator),
                        ));
                    }
                    ctx.logger.warn(&format!(
                        "Fetch exited with code {}; continuing with current workspace contents",
                        outcome.code_or_signal()
                    ));
                }
                state.fetch = Some(FetchOutput {
                    command,
                    exit_code: outcome.exit_code,
                    elapsed_ms: outcome.elapsed.as_millis() as u64,
                    tolerated_failure: failed,
                    launch_error: None,
                });
            }
            Err(e) => {
                if strict {
                    return Err(StepError::launch_failed(
                        "fetch",
                        &invocation.program,
                        e,
                    ));
                }
                ctx.logger.warn(&format!(
                    "Could not start {}: {}; continuing with current workspace contents",
                    invocation.program, e
                ));
                state.fetch = Some(FetchOutput {
                    command,
                    exit_code: None,
                    elapsed_ms: 0,
                    tolerated_failure: true,
                    launch_error: Some(e.to_string()),
                });
            }
        }

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.fetch.is_none() {
            return Err(StepError::invalid_output("Fetch result not recorded"));
        }
        Ok(())
    }
}
