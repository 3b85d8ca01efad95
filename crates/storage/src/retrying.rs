use crate::{s3_uri, ObjectStore, StorageError};
use async_trait::async_trait;
use sync_core::{retry_with_backoff, RetryPolicy};

/// Wraps an [`ObjectStore`] so every call has a timeout and transient
/// failures are retried.
///
/// Gets and whole-object puts are idempotent, so retrying them is safe.
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ObjectStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for RetryingStore<S> {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let operation = format!("get {}", s3_uri(bucket, key));
        retry_with_backoff(
            &self.policy,
            &operation,
            || self.inner.get_object(bucket, key),
            |after| StorageError::timeout("get", bucket, key, after),
        )
        .await
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let operation = format!("put {}", s3_uri(bucket, key));
        let body = &body;
        retry_with_backoff(
            &self.policy,
            &operation,
            || self.inner.put_object(bucket, key, body.clone(), content_type),
            |after| StorageError::timeout("put", bucket, key, after),
        )
        .await
    }
}
