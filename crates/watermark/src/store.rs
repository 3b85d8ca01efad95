//! Watermark storage trait and read outcomes.

use crate::Watermark;
use anyhow::Result;
use async_trait::async_trait;

/// Outcome of reading a table's watermark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkRead {
    /// A valid watermark was stored
    Found(Watermark),
    /// No watermark has been written for the table yet
    Missing,
    /// The configured bucket does not exist
    BucketMissing,
    /// The store could not be reached or refused the request
    Unavailable(String),
    /// A blob exists but does not hold a timestamp
    Corrupt(String),
}

/// Trait for watermark storage operations.
///
/// Implementations report what they found through [`WatermarkRead`]; the
/// provided [`get`](WatermarkStore::get) decides what each outcome means.
#[async_trait]
pub trait WatermarkStore: Send + Sync {
    /// Read the stored watermark for a table.
    async fn read(&self, table: &str) -> WatermarkRead;

    /// Overwrite the stored watermark for a table.
    async fn write(&self, table: &str, watermark: &Watermark) -> Result<()>;

    /// Watermark to extract from: the stored value, or the epoch default.
    ///
    /// Never fails. Every fallback is logged.
    async fn get(&self, table: &str) -> Watermark {
        match self.read(table).await {
            WatermarkRead::Found(watermark) => {
                tracing::info!("Last extract time for table '{table}': {watermark}");
                watermark
            }
            WatermarkRead::Missing => {
                tracing::info!(
                    "No watermark stored for table '{table}', extracting from {}",
                    Watermark::epoch()
                );
                Watermark::epoch()
            }
            WatermarkRead::BucketMissing => {
                tracing::error!(
                    "Watermark bucket does not exist, using default for table '{table}'"
                );
                Watermark::epoch()
            }
            WatermarkRead::Unavailable(reason) => {
                tracing::warn!(
                    "Could not read watermark for table '{table}': {reason}. Using default"
                );
                Watermark::epoch()
            }
            WatermarkRead::Corrupt(content) => {
                tracing::warn!(
                    "Stored watermark for table '{table}' is not a timestamp ('{content}'). Using default"
                );
                Watermark::epoch()
            }
        }
    }

    /// Persist a new watermark. Failure is returned to the caller.
    async fn put(&self, table: &str, watermark: &Watermark) -> Result<()> {
        self.write(table, watermark).await?;
        tracing::info!("Updated watermark for table '{table}' to {watermark}");
        Ok(())
    }
}
