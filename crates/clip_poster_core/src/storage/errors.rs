//! Error types for object storage access.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors from endpoint selection and uploads.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The configured endpoint pool is empty.
    #[error("No storage endpoints configured")]
    EmptyPool,

    /// An endpoint string is not a usable URL.
    #[error("Invalid storage endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    /// The local file could not be read.
    #[error("Failed to read '{path}' for upload: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The async runtime backing the client could not start.
    #[error("Failed to start storage runtime: {0}")]
    Runtime(#[source] io::Error),

    /// The object store rejected the request.
    #[error("Object store request failed: {0}")]
    Store(#[from] object_store::Error),
}

impl StorageError {
    /// Create an invalid endpoint error.
    pub fn invalid_endpoint(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Whether another attempt could succeed.
    ///
    /// Local file problems and configuration mistakes are permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Store(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_errors_are_permanent() {
        let err = StorageError::ReadFile {
            path: PathBuf::from("/tmp_data_1/dv_default.mp4"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("dv_default.mp4"));
    }
}
