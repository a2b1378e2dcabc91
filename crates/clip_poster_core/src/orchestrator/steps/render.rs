//! Render step - runs the simulation renderer against the workspace.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, StepOutcome};
use crate::tools::ToolInvocation;

use super::run_checked;

/// Invokes `<render_binary> <vehicle_config> <workspace>`.
pub struct RenderStep;

impl RenderStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RenderStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for RenderStep {
    fn name(&self) -> &str {
        "Render"
    }

    fn description(&self) -> &str {
        "Render the fetched clip with the vehicle configuration"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.settings.tools.render_binary.trim().is_empty() {
            return Err(StepError::invalid_input("No renderer binary configured"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let tools = &ctx.settings.tools;
        let invocation = ToolInvocation::new("render", &tools.render_binary)
            .arg(&tools.vehicle_config)
            .arg(ctx.workspace_arg());

        let output = run_checked(ctx, &invocation)?;
        ctx.logger
            .info(&format!("Render finished in {} ms", output.elapsed_ms));
        state.render = Some(output);

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if state.render.is_none() {
            return Err(StepError::invalid_output("Render result not recorded"));
        }
        Ok(())
    }
}
