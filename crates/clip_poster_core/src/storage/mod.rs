//! Object storage access.
//!
//! The gateway pool is a list of interchangeable S3-compatible endpoints.
//! One endpoint is picked per run through `EndpointPool::select` with an
//! injected random source, and the video is published through the
//! `ObjectUploader` trait.
//!
//! ```text
//! StorageSettings ──> EndpointPool ──select(rng)──> endpoint
//!                                                      │
//!                     RetryingUploader<S3Uploader> <───┘
//! ```

mod endpoint;
mod errors;
mod uploader;

pub use endpoint::{EndpointPool, ReachabilityCheck, TcpConnectCheck};
pub use errors::{StorageError, StorageResult};
pub use uploader::{
    ObjectUploader, RetryingUploader, S3Credentials, S3Uploader, UploadReceipt,
};

use rand::Rng;

use crate::config::StorageSettings;

/// Build the production uploader from settings.
///
/// Picks the gateway with `rng` and wraps the S3 client in the configured
/// retry policy.
pub fn build_uploader<R: Rng + ?Sized>(
    settings: &StorageSettings,
    rng: &mut R,
) -> StorageResult<RetryingUploader<S3Uploader>> {
    let pool = EndpointPool::from_settings(settings)?;
    let endpoint = pool.select(rng)?;
    tracing::info!(
        "Selected storage endpoint {} ({} policy, {} in pool)",
        endpoint,
        pool.policy(),
        pool.len()
    );

    let credentials = S3Credentials {
        access_key_id: settings.access_key_id.clone(),
        secret_access_key: settings.secret_access_key.clone(),
        region: settings.region.clone(),
    };
    let client = S3Uploader::new(endpoint, credentials, settings.allow_http)?;

    Ok(RetryingUploader::new(
        client,
        settings.max_attempts,
        std::time::Duration::from_millis(settings.retry_backoff_ms),
    ))
}
