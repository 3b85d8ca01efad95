//! CSV artifact writer.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rds_sync_storage::{ObjectStore, StorageError, CONTENT_TYPE_CSV};
use sync_core::Batch;
use thiserror::Error;
use tracing::{debug, info};

/// Timestamp layout embedded in artifact keys
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to render CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to finish CSV buffer: {0}")]
    Buffer(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Destination for extracted batches.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `batch` as a new artifact and return its key.
    async fn write(
        &self,
        batch: &Batch,
        table: &str,
        run_at: NaiveDateTime,
    ) -> Result<String, SinkError>;
}

/// `{table}/csv/{table}_data_{YYYYMMDD_HHMMSS}.csv`
pub fn artifact_key(table: &str, run_at: &NaiveDateTime) -> String {
    format!(
        "{table}/csv/{table}_data_{}.csv",
        run_at.format(ARTIFACT_TIMESTAMP_FORMAT)
    )
}

/// Header row followed by one record per row, columns in result-set order.
pub fn render_csv(batch: &Batch) -> Result<Vec<u8>, SinkError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(batch.columns())?;
    for row in batch.rows() {
        writer.write_record(row.iter().map(|cell| cell.to_csv_field()))?;
    }
    writer
        .into_inner()
        .map_err(|e| SinkError::Buffer(e.error().to_string()))
}

/// Writes CSV artifacts to an object store bucket.
pub struct CsvArtifactSink<S> {
    store: S,
    bucket: String,
}

impl<S: ObjectStore> CsvArtifactSink<S> {
    pub fn new(store: S, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl<S: ObjectStore> ArtifactSink for CsvArtifactSink<S> {
    async fn write(
        &self,
        batch: &Batch,
        table: &str,
        run_at: NaiveDateTime,
    ) -> Result<String, SinkError> {
        let key = artifact_key(table, &run_at);
        let body = render_csv(batch)?;
        debug!("Rendered {} rows of '{table}' into {} bytes", batch.len(), body.len());

        self.store
            .put_object(&self.bucket, &key, body, CONTENT_TYPE_CSV)
            .await?;
        info!(
            "Uploaded {} rows of '{table}' to {}",
            batch.len(),
            rds_sync_storage::s3_uri(&self.bucket, &key)
        );
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rds_sync_storage::{MemoryStore, StorageErrorKind};
    use sync_core::CellValue;

    fn run_at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap()
    }

    fn batch() -> Batch {
        let mut batch = Batch::new(vec!["id".into(), "name".into(), "modifiedDate".into()]);
        batch
            .push_row(vec![
                CellValue::Int(1),
                CellValue::Text("Main St, 5".into()),
                CellValue::DateTime(run_at()),
            ])
            .unwrap();
        batch
            .push_row(vec![CellValue::Int(2), CellValue::Text("Side".into()), CellValue::Null])
            .unwrap();
        batch
    }

    #[test]
    fn test_artifact_key_layout() {
        assert_eq!(
            artifact_key("customer", &run_at()),
            "customer/csv/customer_data_20240309_070501.csv"
        );
    }

    #[test]
    fn test_render_csv_quotes_and_nulls() {
        let csv = String::from_utf8(render_csv(&batch()).unwrap()).unwrap();
        assert_eq!(
            csv,
            "id,name,modifiedDate\n1,\"Main St, 5\",2024-03-09 07:05:01\n2,Side,\n"
        );
    }

    #[test]
    fn test_render_empty_batch_is_header_only() {
        let batch = Batch::new(vec!["id".into()]);
        assert_eq!(render_csv(&batch).unwrap(), b"id\n");
    }

    #[tokio::test]
    async fn test_write_uploads_csv() {
        let store = MemoryStore::with_bucket("bucket");
        let sink = CsvArtifactSink::new(store.clone(), "bucket");

        let key = sink.write(&batch(), "location", run_at()).await.unwrap();
        assert_eq!(key, "location/csv/location_data_20240309_070501.csv");
        assert!(store
            .object_string("bucket", &key)
            .unwrap()
            .starts_with("id,name,modifiedDate\n"));
        assert_eq!(store.content_type("bucket", &key).as_deref(), Some("text/csv"));
    }

    #[tokio::test]
    async fn test_write_reports_storage_failure() {
        let store = MemoryStore::with_bucket("bucket");
        store.fail_puts(StorageErrorKind::AccessDenied);
        let sink = CsvArtifactSink::new(store, "bucket");

        let err = sink.write(&batch(), "location", run_at()).await.unwrap_err();
        assert!(matches!(err, SinkError::Storage(_)));
    }
}
