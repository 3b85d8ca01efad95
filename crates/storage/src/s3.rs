//! S3 object store implementation

use crate::{s3_uri, ObjectStore, StorageError, StorageErrorKind};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;

/// Shared S3 client.
///
/// Creating an S3 client is relatively expensive, so one `S3Store` is built
/// per process and cloned into whatever needs it.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    /// Create a client from the ambient AWS configuration (environment,
    /// profile or execution role).
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(aws_sdk_s3::Client::new(&sdk_config))
    }

    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("get", bucket, key, e))?;

        let data = response.body.collect().await.map_err(|e| {
            StorageError::new(StorageErrorKind::Transient, "get", bucket, key, e.to_string())
        })?;
        let bytes = data.into_bytes().to_vec();

        tracing::debug!("Fetched {} bytes from {}", bytes.len(), s3_uri(bucket, key));
        Ok(bytes)
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let len = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_error("put", bucket, key, e))?;

        tracing::debug!("Wrote {} bytes to {}", len, s3_uri(bucket, key));
        Ok(())
    }
}

fn sdk_error<E, R>(
    operation: &'static str,
    bucket: &str,
    key: &str,
    err: SdkError<E, R>,
) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let kind = match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StorageErrorKind::Transient
        }
        SdkError::ServiceError(service) => classify_error_code(service.err().code()),
        _ => StorageErrorKind::Other,
    };
    StorageError::new(
        kind,
        operation,
        bucket,
        key,
        DisplayErrorContext(&err).to_string(),
    )
}

/// Map an S3 error code to a [`StorageErrorKind`].
pub fn classify_error_code(code: Option<&str>) -> StorageErrorKind {
    match code {
        Some("NoSuchKey") | Some("NotFound") => StorageErrorKind::NotFound,
        Some("NoSuchBucket") => StorageErrorKind::NoSuchBucket,
        Some("AccessDenied")
        | Some("InvalidAccessKeyId")
        | Some("SignatureDoesNotMatch")
        | Some("ExpiredToken") => StorageErrorKind::AccessDenied,
        Some("SlowDown")
        | Some("InternalError")
        | Some("ServiceUnavailable")
        | Some("RequestTimeout")
        | Some("Throttling") => StorageErrorKind::Transient,
        _ => StorageErrorKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_and_bucket_are_distinguished() {
        assert_eq!(classify_error_code(Some("NoSuchKey")), StorageErrorKind::NotFound);
        assert_eq!(
            classify_error_code(Some("NoSuchBucket")),
            StorageErrorKind::NoSuchBucket
        );
    }

    #[test]
    fn test_credential_errors_are_access_denied() {
        for code in ["AccessDenied", "InvalidAccessKeyId", "SignatureDoesNotMatch"] {
            assert_eq!(
                classify_error_code(Some(code)),
                StorageErrorKind::AccessDenied,
                "{code}"
            );
        }
    }

    #[test]
    fn test_throttling_is_transient() {
        assert_eq!(classify_error_code(Some("SlowDown")), StorageErrorKind::Transient);
        assert_eq!(
            classify_error_code(Some("ServiceUnavailable")),
            StorageErrorKind::Transient
        );
    }

    #[test]
    fn test_unknown_codes_are_other() {
        assert_eq!(classify_error_code(None), StorageErrorKind::Other);
        assert_eq!(
            classify_error_code(Some("InvalidObjectState")),
            StorageErrorKind::Other
        );
    }

    // Calls against real S3 need AWS credentials; the behaviour behind the
    // ObjectStore trait is covered through MemoryStore instead.
}
