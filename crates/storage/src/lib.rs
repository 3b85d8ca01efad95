//! Object storage abstraction for rds-sync.
//!
//! All persistent state of the extractor lives in object storage: CSV
//! artifacts, per-table watermark blobs and log summaries. This crate
//! provides the narrow interface both functions need plus two
//! implementations.
//!
//! # Implementations
//!
//! - **S3**: [`S3Store`], backed by the AWS SDK
//! - **Memory**: [`MemoryStore`], an in-process store with fault injection
//!   used by tests and local dry runs
//!
//! [`RetryingStore`] wraps either one so that every call is bounded by a
//! timeout and transient failures are retried with backoff.
//!
//! # Example
//!
//! ```ignore
//! use rds_sync_storage::{ObjectStore, RetryingStore, S3Store};
//! use sync_core::RetryPolicy;
//!
//! let store = RetryingStore::new(S3Store::from_env().await, RetryPolicy::default());
//! store.put_object("bucket", "location/csv/last_extract.txt", b"...".to_vec(), "text/plain").await?;
//! ```

mod error;
mod memory;
mod retrying;
mod s3;

use async_trait::async_trait;
use std::sync::Arc;

pub use error::{StorageError, StorageErrorKind};
pub use memory::MemoryStore;
pub use retrying::RetryingStore;
pub use s3::{classify_error_code, S3Store};

/// Content type used for CSV artifacts
pub const CONTENT_TYPE_CSV: &str = "text/csv";
/// Content type used for watermark blobs and log summaries
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Whole-object get and put against a bucket/key namespace.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read an entire object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or overwrite an entire object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).get_object(bucket, key).await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        (**self).put_object(bucket, key, body, content_type).await
    }
}

/// Render a location as an `s3://` URI for log and error messages.
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}
