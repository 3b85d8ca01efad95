//! Core types for the rds-sync framework.
//!
//! This crate provides the foundational types shared by the extraction
//! runner and the database sources:
//!
//! - [`CellValue`] - A single column value read from the source database
//! - [`Batch`] - An ordered, fully materialized set of changed rows
//! - [`TableDescriptor`] - A source table and its change-time columns
//! - [`ChangeFilter`] - The "changed strictly after the watermark" predicate
//! - [`ChangeSource`] - Trait implemented by database sources
//! - [`RetryPolicy`] - Bounded timeout plus exponential backoff for idempotent calls
//!
//! # Architecture
//!
//! ```text
//! sync-core (this crate)
//!    │
//!    ├─── rds-sync-storage       (retry policy for object storage calls)
//!    ├─── rds-sync-mysql-source  (implements ChangeSource for MySQL)
//!    └─── rds-sync               (extraction runner, sink writer)
//! ```
//!
//! # Effective change time
//!
//! Every row has an effective change time: the modified column if it is
//! non-null, otherwise the created column. [`ChangeFilter`] and
//! [`Batch::max_effective_change_time`] share [`effective_change_time`] so
//! the selection rule and the new-watermark rule can never drift apart.

pub mod filter;
pub mod retry;
pub mod row;
pub mod source;
pub mod table;
pub mod values;

pub use filter::{effective_change_time, ChangeFilter};
pub use retry::{retry_with_backoff, RetryPolicy, Retryable};
pub use row::{Batch, BatchError};
pub use source::ChangeSource;
pub use table::TableDescriptor;
pub use values::CellValue;
