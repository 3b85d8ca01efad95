//! Per-table extraction state machine.

use super::report::{RunReport, Stage, TableOutcome};
use super::sink::ArtifactSink;
use anyhow::anyhow;
use chrono::NaiveDateTime;
use sync_core::{ChangeFilter, ChangeSource, TableDescriptor};
use thiserror::Error;
use tracing::{error, info, warn};
use watermark::{Watermark, WatermarkStore};

/// A table extraction that stopped before completing.
#[derive(Debug, Error)]
#[error("Failed to {stage} for table '{table}': {error:#}")]
pub struct TableError {
    pub table: String,
    pub stage: Stage,
    /// Set when the artifact had already been uploaded
    pub artifact_key: Option<String>,
    pub error: anyhow::Error,
}

impl TableError {
    fn new(table: &TableDescriptor, stage: Stage, error: impl Into<anyhow::Error>) -> Self {
        Self {
            table: table.name.clone(),
            stage,
            artifact_key: None,
            error: error.into(),
        }
    }

    fn with_artifact(mut self, key: &str) -> Self {
        self.artifact_key = Some(key.to_string());
        self
    }

    fn into_outcome(self) -> TableOutcome {
        TableOutcome::Failed {
            stage: self.stage,
            error: format!("{:#}", self.error),
            artifact_key: self.artifact_key,
        }
    }
}

/// Runs every configured table through
/// read watermark → select → upload → persist watermark.
///
/// The watermark of a table is only written after its artifact upload has
/// succeeded, so an interrupted run re-extracts rather than skips rows.
pub struct ExtractionRunner<'a> {
    source: &'a mut dyn ChangeSource,
    watermarks: &'a dyn WatermarkStore,
    sink: &'a dyn ArtifactSink,
}

impl<'a> ExtractionRunner<'a> {
    pub fn new(
        source: &'a mut dyn ChangeSource,
        watermarks: &'a dyn WatermarkStore,
        sink: &'a dyn ArtifactSink,
    ) -> Self {
        Self {
            source,
            watermarks,
            sink,
        }
    }

    /// Extract every table in order. A failing table never stops the others.
    pub async fn run(&mut self, tables: &[TableDescriptor], run_at: NaiveDateTime) -> RunReport {
        let mut report = RunReport::default();
        for table in tables {
            let outcome = match self.extract_table(table, run_at).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("{e}");
                    e.into_outcome()
                }
            };
            report.push(table.name.clone(), outcome);
        }
        report
    }

    pub async fn extract_table(
        &mut self,
        table: &TableDescriptor,
        run_at: NaiveDateTime,
    ) -> Result<TableOutcome, TableError> {
        let last = self.watermarks.get(&table.name).await;
        info!(
            "Extracting table '{table}' from {} source changed after {last}",
            self.source.source_type()
        );

        let filter = ChangeFilter::after(last.timestamp());
        let batch = self
            .source
            .select_changes(table, &filter)
            .await
            .map_err(|e| TableError::new(table, Stage::SelectRows, e))?;

        if batch.is_empty() {
            info!("No new data for table '{table}'");
            return Ok(TableOutcome::Empty);
        }
        info!("Selected {} changed rows from '{table}'", batch.len());

        let max = batch
            .max_effective_change_time(table)
            .map_err(|e| TableError::new(table, Stage::Validate, e))?
            .ok_or_else(|| {
                TableError::new(table, Stage::Validate, anyhow!("batch has no change times"))
            })?;

        let artifact_key = self
            .sink
            .write(&batch, &table.name, run_at)
            .await
            .map_err(|e| TableError::new(table, Stage::Upload, e))?;

        let next = Watermark::new(max);
        let watermark = if next > last {
            self.watermarks
                .put(&table.name, &next)
                .await
                .map_err(|e| {
                    TableError::new(table, Stage::PersistWatermark, e).with_artifact(&artifact_key)
                })?;
            Some(next)
        } else {
            warn!(
                "Computed watermark {next} for table '{table}' does not advance past {last}, keeping it"
            );
            None
        };

        Ok(TableOutcome::Extracted {
            rows: batch.len(),
            artifact_key,
            watermark,
        })
    }
}
