//! Pipeline runner that executes steps in sequence.

use std::time::Instant;

use super::errors::{PipelineError, PipelineResult, StepError, StepResult};
use super::step::PipelineStep;
use super::types::{Context, JobState, StepOutcome};
use crate::models::StageStatus;

/// Pipeline that runs a sequence of steps.
///
/// Steps run strictly in order, each after the previous one returned.
/// The first failing step stops the run; it is recorded as failed and
/// every later step as skipped.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// Executes each step in order:
    /// 1. Run `validate_input`
    /// 2. Run `execute`
    /// 3. Run `validate_output` (if execute returned Success)
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
            steps_skipped: Vec::new(),
        };

        let total_steps = self.steps.len().max(1);

        for (i, step) in self.steps.iter().enumerate() {
            let step_name = step.name();
            ctx.logger.stage_started(step_name, step.description());
            ctx.logger.progress(((i * 100) / total_steps) as u32);

            let started = Instant::now();
            let outcome = match self.run_step(step.as_ref(), ctx, state) {
                Ok(outcome) => outcome,
                Err(e) => {
                    let elapsed = started.elapsed();
                    let detail = e.to_string();
                    ctx.logger
                        .stage_finished(step_name, StageStatus::Failed, elapsed, Some(&detail));
                    state.record_stage(step_name, StageStatus::Failed, elapsed, Some(detail));
                    for later in &self.steps[i + 1..] {
                        state.record_stage(
                            later.name(),
                            StageStatus::Skipped,
                            std::time::Duration::ZERO,
                            Some(format!("{} failed", step_name)),
                        );
                    }
                    return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
                }
            };

            match outcome {
                StepOutcome::Success => {
                    let elapsed = started.elapsed();
                    ctx.logger
                        .stage_finished(step_name, StageStatus::Succeeded, elapsed, None);
                    state.record_stage(step_name, StageStatus::Succeeded, elapsed, None);
                    result.steps_completed.push(step_name.to_string());
                }
                StepOutcome::Skipped(reason) => {
                    let elapsed = started.elapsed();
                    ctx.logger
                        .stage_finished(step_name, StageStatus::Skipped, elapsed, Some(&reason));
                    state.record_stage(step_name, StageStatus::Skipped, elapsed, Some(reason));
                    result.steps_skipped.push(step_name.to_string());
                }
            }
        }

        ctx.logger.progress(100);

        Ok(result)
    }

    fn run_step(
        &self,
        step: &dyn PipelineStep,
        ctx: &Context,
        state: &mut JobState,
    ) -> StepResult<StepOutcome> {
        ctx.logger.debug(&format!("Validating input for '{}'", step.name()));
        step.validate_input(ctx)?;

        ctx.logger.debug(&format!("Executing '{}'", step.name()));
        let outcome = step.execute(ctx, state)?;

        if outcome == StepOutcome::Success {
            ctx.logger
                .debug(&format!("Validating output for '{}'", step.name()));
            step.validate_output(ctx, state).map_err(|e| match e {
                StepError::InvalidOutput(_) => e,
                other => StepError::invalid_output(other.to_string()),
            })?;
        }

        Ok(outcome)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully.
    pub steps_completed: Vec<String>,
    /// Steps that were skipped.
    pub steps_skipped: Vec<String>,
}

impl PipelineRunResult {
    /// Check if all steps completed (none skipped).
    pub fn all_completed(&self) -> bool {
        self.steps_skipped.is_empty()
    }

    /// Total number of steps that ran.
    pub fn total_steps(&self) -> usize {
        self.steps_completed.len() + self.steps_skipped.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::TestHarness;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Behavior {
        Succeed,
        Skip,
        Fail,
        ForgetOutput,
    }

    struct ScriptedStep {
        name: &'static str,
        behavior: Behavior,
        execute_count: Arc<AtomicUsize>,
    }

    impl ScriptedStep {
        fn new(name: &'static str, behavior: Behavior) -> Self {
            Self {
                name,
                behavior,
                execute_count: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl PipelineStep for ScriptedStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<StepOutcome> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed | Behavior::ForgetOutput => Ok(StepOutcome::Success),
                Behavior::Skip => Ok(StepOutcome::Skipped("nothing to do".to_string())),
                Behavior::Fail => Err(StepError::command_failed("tool", 1, "boom")),
            }
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            match self.behavior {
                Behavior::ForgetOutput => Err(StepError::invalid_output("nothing recorded")),
                _ => Ok(()),
            }
        }
    }

    #[test]
    fn pipeline_builds_correctly() {
        let pipeline = Pipeline::new()
            .with_step(ScriptedStep::new("Step1", Behavior::Succeed))
            .with_step(ScriptedStep::new("Step2", Behavior::Succeed));

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn records_success_and_skip() {
        let harness = TestHarness::new();
        let (ctx, mut state) = harness.context("s3://b/collected_data/T/C/");

        let pipeline = Pipeline::new()
            .with_step(ScriptedStep::new("A", Behavior::Succeed))
            .with_step(ScriptedStep::new("B", Behavior::Skip));
        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_completed, vec!["A"]);
        assert_eq!(result.steps_skipped, vec!["B"]);
        assert!(!result.all_completed());
        assert_eq!(result.total_steps(), 2);
        assert_eq!(state.stage("A").unwrap().status, StageStatus::Succeeded);
        assert_eq!(state.stage("B").unwrap().status, StageStatus::Skipped);
    }

    #[test]
    fn failure_stops_pipeline_and_skips_rest() {
        let harness = TestHarness::new();
        let (ctx, mut state) = harness.context("s3://b/collected_data/T/C/");

        let last = ScriptedStep::new("C", Behavior::Succeed);
        let last_count = Arc::clone(&last.execute_count);
        let pipeline = Pipeline::new()
            .with_step(ScriptedStep::new("A", Behavior::Succeed))
            .with_step(ScriptedStep::new("B", Behavior::Fail))
            .with_step(last);

        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert_eq!(err.step_name(), Some("B"));
        assert_eq!(last_count.load(Ordering::SeqCst), 0);
        let statuses: Vec<_> = state.stages.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StageStatus::Succeeded, StageStatus::Failed, StageStatus::Skipped]
        );
    }

    #[test]
    fn missing_output_fails_step() {
        let harness = TestHarness::new();
        let (ctx, mut state) = harness.context("s3://b/collected_data/T/C/");

        let pipeline = Pipeline::new().with_step(ScriptedStep::new("A", Behavior::ForgetOutput));
        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert!(err.to_string().contains("Output validation failed"));
    }
}
