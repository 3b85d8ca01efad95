use std::fmt;
use std::time::Duration;
use sync_core::Retryable;
use thiserror::Error;

/// Broad category of an object storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageErrorKind {
    /// The key does not exist in the bucket
    NotFound,
    /// The bucket itself does not exist
    NoSuchBucket,
    /// Credentials were rejected or lack permission
    AccessDenied,
    /// Throttling, timeouts, 5xx responses and network failures
    Transient,
    Other,
}

impl fmt::Display for StorageErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::NoSuchBucket => "no such bucket",
            Self::AccessDenied => "access denied",
            Self::Transient => "transient",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A failed get or put, with the location it was aimed at.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{operation} s3://{bucket}/{key} failed ({kind}): {message}")]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub operation: &'static str,
    pub bucket: String,
    pub key: String,
    pub message: String,
}

impl StorageError {
    pub fn new(
        kind: StorageErrorKind,
        operation: &'static str,
        bucket: &str,
        key: &str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.into(),
        }
    }

    /// An attempt that did not complete within the per-call timeout.
    pub fn timeout(operation: &'static str, bucket: &str, key: &str, after: Duration) -> Self {
        Self::new(
            StorageErrorKind::Transient,
            operation,
            bucket,
            key,
            format!("timed out after {after:?}"),
        )
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StorageErrorKind::NotFound
    }

    pub fn is_no_such_bucket(&self) -> bool {
        self.kind == StorageErrorKind::NoSuchBucket
    }
}

impl Retryable for StorageError {
    fn is_transient(&self) -> bool {
        self.kind == StorageErrorKind::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_location_and_kind() {
        let err = StorageError::new(
            StorageErrorKind::AccessDenied,
            "put",
            "bucket",
            "location/csv/last_extract.txt",
            "Access Denied",
        );
        assert_eq!(
            err.to_string(),
            "put s3://bucket/location/csv/last_extract.txt failed (access denied): Access Denied"
        );
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = StorageError::timeout("get", "b", "k", Duration::from_secs(30));
        assert!(err.is_transient());
        assert_eq!(err.message, "timed out after 30s");
    }
}
