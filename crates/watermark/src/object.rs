//! Object-storage-backed watermark store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use rds_sync_storage::{s3_uri, ObjectStore, StorageErrorKind, CONTENT_TYPE_TEXT};

use crate::store::{WatermarkRead, WatermarkStore};
use crate::Watermark;

/// Object name of the watermark blob inside a table's namespace.
pub const WATERMARK_FILE_NAME: &str = "last_extract.txt";

/// Key of a table's watermark blob: `{table}/csv/last_extract.txt`.
pub fn watermark_key(table: &str) -> String {
    format!("{table}/csv/{WATERMARK_FILE_NAME}")
}

/// Stores each table's watermark as a text object in one bucket.
pub struct ObjectWatermarkStore<S> {
    store: S,
    bucket: String,
}

impl<S: ObjectStore> ObjectWatermarkStore<S> {
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl<S: ObjectStore> WatermarkStore for ObjectWatermarkStore<S> {
    async fn read(&self, table: &str) -> WatermarkRead {
        let key = watermark_key(table);
        let body = match self.store.get_object(&self.bucket, &key).await {
            Ok(body) => body,
            Err(e) => {
                return match e.kind {
                    StorageErrorKind::NotFound => WatermarkRead::Missing,
                    StorageErrorKind::NoSuchBucket => WatermarkRead::BucketMissing,
                    _ => WatermarkRead::Unavailable(e.to_string()),
                }
            }
        };

        let text = String::from_utf8_lossy(&body);
        match text.parse::<Watermark>() {
            Ok(watermark) => WatermarkRead::Found(watermark),
            Err(_) => WatermarkRead::Corrupt(text.trim().to_string()),
        }
    }

    async fn write(&self, table: &str, watermark: &Watermark) -> Result<()> {
        let key = watermark_key(table);
        self.store
            .put_object(
                &self.bucket,
                &key,
                watermark.to_string().into_bytes(),
                CONTENT_TYPE_TEXT,
            )
            .await
            .with_context(|| {
                format!(
                    "Failed to write watermark to {}",
                    s3_uri(&self.bucket, &key)
                )
            })
    }
}
