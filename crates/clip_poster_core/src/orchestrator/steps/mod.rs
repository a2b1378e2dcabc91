//! Pipeline step implementations.
//!
//! Each step handles one stage of the clip pipeline: pull the clip,
//! render it, turn the render into a video and publish the video.

mod fetch;
mod publish;
mod render;
mod video;

pub use fetch::FetchStep;
pub use publish::PublishStep;
pub use render::RenderStep;
pub use video::VideoStep;

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::types::{Context, ToolOutput};
use crate::tools::ToolInvocation;

/// Run a tool that must exit with status 0.
///
/// Launch failures and non-zero exits both become step errors; the job log
/// replays the tail of the tool's output before the error is returned.
pub(crate) fn run_checked(ctx: &Context, invocation: &ToolInvocation) -> StepResult<ToolOutput> {
    let command = invocation.command_line();
    ctx.logger.tool_started(&invocation.tool, &command);

    let outcome = ctx
        .tools
        .run(invocation, &ctx.logger)
        .map_err(|e| StepError::launch_failed(&invocation.tool, &invocation.program, e))?;
    ctx.logger
        .tool_finished(&invocation.tool, outcome.exit_code, outcome.elapsed);

    if !outcome.success() {
        return Err(StepError::command_failed(
            &invocation.tool,
            outcome.code_or_signal(),
            format!("see {} output in {}", invocation.tool, ctx.logger.log_path().display()),
        ));
    }

    Ok(ToolOutput {
        command,
        exit_code: outcome.code_or_signal(),
        elapsed_ms: outcome.elapsed.as_millis() as u64,
    })
}
