//! Upload clients for S3-compatible gateways.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use serde::{Deserialize, Serialize};
use tokio::runtime::{Builder, Runtime};

use super::errors::{StorageError, StorageResult};

/// Outcome of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Gateway that accepted the object.
    pub endpoint: String,
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
    /// Bytes uploaded.
    pub size_bytes: u64,
    /// ETag returned by the gateway, if any.
    pub e_tag: Option<String>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Uploads one local file to a bucket/key.
///
/// Implementations block until the upload finished or failed.
pub trait ObjectUploader: Send + Sync {
    fn upload_file(&self, local_path: &Path, bucket: &str, key: &str)
        -> StorageResult<UploadReceipt>;
}

/// Static credentials for the gateway pool.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .finish()
    }
}

/// S3 client bound to one gateway endpoint.
///
/// `object_store` is async; the client owns a current-thread runtime and
/// blocks on each request.
pub struct S3Uploader {
    endpoint: String,
    credentials: S3Credentials,
    allow_http: bool,
    runtime: Runtime,
}

impl S3Uploader {
    /// Create a client for `endpoint` (path-style requests).
    pub fn new(
        endpoint: impl Into<String>,
        credentials: S3Credentials,
        allow_http: bool,
    ) -> StorageResult<Self> {
        let endpoint = endpoint.into();
        if endpoint.starts_with("http://") && !allow_http {
            return Err(StorageError::invalid_endpoint(
                endpoint,
                "plaintext endpoint but allow_http is false",
            ));
        }
        if credentials.access_key_id.is_empty() || credentials.secret_access_key.is_empty() {
            tracing::warn!("Storage credentials are empty; uploads will likely be rejected");
        }

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(StorageError::Runtime)?;

        Ok(Self {
            endpoint,
            credentials,
            allow_http,
            runtime,
        })
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn store_for(&self, bucket: &str) -> StorageResult<AmazonS3> {
        let store = AmazonS3Builder::new()
            .with_endpoint(self.endpoint.trim_end_matches('/'))
            .with_region(&self.credentials.region)
            .with_access_key_id(&self.credentials.access_key_id)
            .with_secret_access_key(&self.credentials.secret_access_key)
            .with_bucket_name(bucket)
            .with_allow_http(self.allow_http)
            .with_virtual_hosted_style_request(false)
            .build()?;
        Ok(store)
    }
}

impl ObjectUploader for S3Uploader {
    fn upload_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> StorageResult<UploadReceipt> {
        let store = self.store_for(bucket)?;

        let data = fs::read(local_path).map_err(|source| StorageError::ReadFile {
            path: PathBuf::from(local_path),
            source,
        })?;
        let size_bytes = data.len() as u64;
        let location = ObjectPath::from(key);

        tracing::debug!(
            "PUT {}/{}/{} ({} bytes)",
            self.endpoint.trim_end_matches('/'),
            bucket,
            location,
            size_bytes
        );
        let result = self
            .runtime
            .block_on(store.put(&location, PutPayload::from(data)))?;

        Ok(UploadReceipt {
            endpoint: self.endpoint.clone(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            size_bytes,
            e_tag: result.e_tag,
            attempts: 1,
        })
    }
}

/// Retries transient upload failures with a fixed backoff.
pub struct RetryingUploader<U> {
    inner: U,
    max_attempts: u32,
    backoff: Duration,
}

impl<U: ObjectUploader> RetryingUploader<U> {
    /// Wrap `inner`; `max_attempts` below 1 is treated as 1.
    pub fn new(inner: U, max_attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Configured attempt limit.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The wrapped uploader.
    pub fn inner(&self) -> &U {
        &self.inner
    }
}

impl<U: ObjectUploader> ObjectUploader for RetryingUploader<U> {
    fn upload_file(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> StorageResult<UploadReceipt> {
        let mut attempt = 1;
        loop {
            match self.inner.upload_file(local_path, bucket, key) {
                Ok(mut receipt) => {
                    receipt.attempts = attempt;
                    return Ok(receipt);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    tracing::warn!(
                        "Upload attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        self.max_attempts,
                        e,
                        self.backoff
                    );
                    thread::sleep(self.backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Fails with a store error a fixed number of times, then succeeds.
    struct FlakyUploader {
        failures_left: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl FlakyUploader {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }
    }

    impl ObjectUploader for FlakyUploader {
        fn upload_file(
            &self,
            _local_path: &Path,
            bucket: &str,
            key: &str,
        ) -> StorageResult<UploadReceipt> {
            *self.calls.lock() += 1;
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(StorageError::Store(object_store::Error::Generic {
                    store: "test",
                    source: "gateway unavailable".into(),
                }));
            }
            Ok(UploadReceipt {
                endpoint: "http://gw:8082/".to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                size_bytes: 0,
                e_tag: None,
                attempts: 1,
            })
        }
    }

    #[test]
    fn single_attempt_does_not_retry() {
        let uploader = RetryingUploader::new(FlakyUploader::new(1), 1, Duration::ZERO);
        let result = uploader.upload_file(Path::new("/x"), "datahub", "k");

        assert!(result.is_err());
        assert_eq!(*uploader.inner().calls.lock(), 1);
    }

    #[test]
    fn retries_transient_failures() {
        let uploader = RetryingUploader::new(FlakyUploader::new(2), 3, Duration::ZERO);
        let receipt = uploader
            .upload_file(Path::new("/x"), "datahub", "parsed_data/t/c/lidar/dv_default.mp4")
            .unwrap();

        assert_eq!(receipt.attempts, 3);
        assert_eq!(receipt.key, "parsed_data/t/c/lidar/dv_default.mp4");
    }

    #[test]
    fn zero_attempts_means_one() {
        let uploader = RetryingUploader::new(FlakyUploader::new(0), 0, Duration::ZERO);
        assert_eq!(uploader.max_attempts(), 1);
        assert!(uploader.upload_file(Path::new("/x"), "b", "k").is_ok());
    }

    #[test]
    fn s3_uploader_reports_missing_file_without_network() {
        let credentials = S3Credentials {
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-east-1".to_string(),
        };
        let uploader = S3Uploader::new("http://127.0.0.1:9/", credentials, true).unwrap();
        let err = uploader
            .upload_file(Path::new("/definitely/missing/dv_default.mp4"), "datahub", "k")
            .unwrap_err();

        assert!(matches!(err, StorageError::ReadFile { .. }));
    }

    #[test]
    fn plaintext_endpoint_requires_allow_http() {
        let credentials = S3Credentials {
            access_key_id: "key".to_string(),
            secret_access_key: "secret".to_string(),
            region: "us-east-1".to_string(),
        };
        let result = S3Uploader::new("http://10.199.199.83:8082/", credentials.clone(), false);
        assert!(matches!(result, Err(StorageError::InvalidEndpoint { .. })));
        assert!(!format!("{:?}", credentials).contains("secret\""));
    }
}
