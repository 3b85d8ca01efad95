//! The trait implemented by database sources.

use crate::filter::ChangeFilter;
use crate::row::Batch;
use crate::table::TableDescriptor;
use async_trait::async_trait;

/// A relational source that can list the rows changed after a watermark.
///
/// Implementations must return the complete result set for the filter,
/// ordered by ascending effective change time, and must use parameter
/// binding for the watermark value.
#[async_trait]
pub trait ChangeSource: Send {
    /// Short identifier used in logs (e.g. "mysql").
    fn source_type(&self) -> &'static str;

    /// Fetch every row of `table` matching `filter`.
    async fn select_changes(
        &mut self,
        table: &TableDescriptor,
        filter: &ChangeFilter,
    ) -> anyhow::Result<Batch>;
}
