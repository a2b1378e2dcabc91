//! Publish step - uploads the finished video to the object store.

use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, PublishOutput, StepOutcome};

/// Uploads the workspace video to
/// `<key_prefix>/<trip>/<clip>/lidar/<output_filename>` in the bucket.
pub struct PublishStep;

impl PublishStep {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PublishStep {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser-facing URL for an uploaded key.
pub fn url_hint(public_url_base: &str, key: &str) -> String {
    format!("{}{}", public_url_base, key)
}

impl PipelineStep for PublishStep {
    fn name(&self) -> &str {
        "Publish"
    }

    fn description(&self) -> &str {
        "Upload the video to the parsed-data area"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if ctx.settings.storage.bucket.trim().is_empty() {
            return Err(StepError::invalid_input("No destination bucket configured"));
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let storage = &ctx.settings.storage;
        let key = ctx
            .locator
            .remote_key(&storage.key_prefix, &ctx.settings.paths.output_filename)?;
        let local_path = ctx.output_path();
        let url = url_hint(&storage.public_url_base, &key);

        // hint first, upload second
        ctx.logger.info(&format!("Publishing to {}", url));
        ctx.logger.debug(&format!(
            "Uploading {} to {}/{}",
            local_path.display(),
            storage.bucket,
            key
        ));

        let receipt = ctx
            .uploader
            .upload_file(&local_path, &storage.bucket, &key)?;

        ctx.logger.info(&format!(
            "Uploaded via {} after {} attempt(s)",
            receipt.endpoint, receipt.attempts
        ));
        tracing::info!(
            job = %ctx.job_name,
            endpoint = %receipt.endpoint,
            attempts = receipt.attempts,
            "published {}",
            url
        );

        state.publish = Some(PublishOutput {
            local_path,
            url_hint: url,
            receipt,
        });

        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        if !state.has_publish() {
            return Err(StepError::invalid_output("Publish result not recorded"));
        }
        Ok(())
    }
}
