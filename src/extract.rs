//! Incremental MySQL → object storage extraction.
//!
//! One invocation reads every configured table's watermark, selects the
//! rows that changed after it, uploads them as a CSV artifact and then
//! advances the watermark.

mod report;
mod runner;
mod sink;

pub use report::{RunReport, Stage, TableOutcome, TableReport};
pub use runner::{ExtractionRunner, TableError};
pub use sink::{
    artifact_key, render_csv, ArtifactSink, CsvArtifactSink, SinkError,
    ARTIFACT_TIMESTAMP_FORMAT,
};

use crate::config::{ExtractOpts, SourceOpts};
use crate::response::InvocationResponse;
use crate::secrets::SecretProvider;
use chrono::NaiveDateTime;
use rds_sync_mysql_source::{ConnectionOpts, MySQLChangeSource};
use rds_sync_storage::{ObjectStore, RetryingStore};
use std::sync::Arc;
use sync_core::{ChangeSource, RetryPolicy};
use tracing::{error, info, warn};
use watermark::ObjectWatermarkStore;

/// Everything an extraction invocation needs, built once per process.
pub struct Extractor<S> {
    store: RetryingStore<S>,
    secrets: Arc<dyn SecretProvider>,
    extract: ExtractOpts,
    source: SourceOpts,
    retry: RetryPolicy,
}

impl<S: ObjectStore + Clone> Extractor<S> {
    pub fn new(
        store: S,
        secrets: Arc<dyn SecretProvider>,
        extract: ExtractOpts,
        source: SourceOpts,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            store: RetryingStore::new(store, retry),
            secrets,
            extract,
            source,
            retry,
        }
    }

    /// Run one extraction against the configured MySQL database.
    ///
    /// Missing configuration and connection failures are reported as a 500
    /// response without touching any table.
    pub async fn invoke(&self, run_at: NaiveDateTime) -> InvocationResponse {
        let bucket = match self.bucket() {
            Ok(bucket) => bucket,
            Err(response) => return response,
        };

        let opts = match self.connection_opts().await {
            Ok(opts) => opts,
            Err(message) => {
                error!("{message}");
                return InvocationResponse::error(message);
            }
        };

        let mut source = match MySQLChangeSource::connect(&opts, self.retry).await {
            Ok(source) => source,
            Err(e) => {
                error!("Failed to connect to {}: {e}", opts.describe());
                return InvocationResponse::error(format!("Database connection failed: {e}"));
            }
        };

        let report = self.run_tables(&mut source, bucket, run_at).await;

        if let Err(e) = source.close().await {
            warn!("Failed to close database connection: {e:#}");
        }
        report.to_response()
    }

    /// Run one extraction against an already-open source.
    pub async fn invoke_with_source(
        &self,
        source: &mut dyn ChangeSource,
        run_at: NaiveDateTime,
    ) -> InvocationResponse {
        match self.bucket() {
            Ok(bucket) => self.run_tables(source, bucket, run_at).await.to_response(),
            Err(response) => response,
        }
    }

    async fn run_tables(
        &self,
        source: &mut dyn ChangeSource,
        bucket: &str,
        run_at: NaiveDateTime,
    ) -> RunReport {
        let watermarks = ObjectWatermarkStore::new(self.store.clone(), bucket);
        let sink = CsvArtifactSink::new(self.store.clone(), bucket);
        let tables = self.extract.table_descriptors();

        info!("Extracting {} tables into bucket {bucket}", tables.len());
        let report = ExtractionRunner::new(source, &watermarks, &sink)
            .run(&tables, run_at)
            .await;
        info!("Extraction finished:\n{}", report.summary());
        report
    }

    fn bucket(&self) -> Result<&str, InvocationResponse> {
        match self.extract.bucket.as_deref().map(str::trim) {
            Some(bucket) if !bucket.is_empty() => Ok(bucket),
            _ => {
                error!("No bucket configured for extraction");
                Err(InvocationResponse::error("No bucket configured"))
            }
        }
    }

    async fn connection_opts(&self) -> Result<ConnectionOpts, String> {
        let username = self
            .secrets
            .get_secret(&self.source.username_parameter)
            .await;
        let password = self
            .secrets
            .get_secret(&self.source.password_parameter)
            .await;
        if username.is_empty() || password.is_empty() {
            return Err("Failed to retrieve database credentials".to_string());
        }

        let host = match self.source.mysql_host.as_deref().map(str::trim) {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err("No database host configured".to_string()),
        };

        Ok(ConnectionOpts {
            host,
            port: self.source.mysql_port,
            database: self.source.mysql_database.clone(),
            username,
            password,
        })
    }
}
