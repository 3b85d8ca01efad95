//! rds-sync Library
//!
//! Two small serverless functions around an RDS MySQL database:
//!
//! - **Extraction**: incrementally copies the rows of each configured table
//!   that changed since the last run into CSV artifacts in S3, tracking a
//!   per-table watermark next to the artifacts.
//! - **Log summaries**: decodes CloudWatch Logs subscription events and
//!   stores their entries as plain text lines in S3.
//!
//! # Crates
//!
//! - `sync_core` - cell values, batches, the change filter and retry policy
//! - `rds_sync_mysql_source` - parameterized change selection from MySQL
//! - `watermark` - per-table watermark format and storage
//! - `rds_sync_storage` - S3 and in-memory object stores
//! - `rds_sync_log_parser` - CloudWatch Logs payload decoding
//!
//! # CLI Usage
//!
//! ```bash
//! # One extraction run
//! rds-sync extract --bucket my-bucket --mysql-host db.example.com --tables location,customer
//!
//! # Summarize a saved subscription event
//! rds-sync parse-logs --event event.json
//!
//! # Run as a Lambda function
//! rds-sync lambda extract --bucket my-bucket --mysql-host db.example.com
//! ```

pub mod config;
pub mod extract;
pub mod lambda;
pub mod logs;
pub mod response;
pub mod secrets;
pub mod testing;

pub use config::{ExtractOpts, LogSummaryOpts, RetryOpts, SourceOpts};
pub use extract::{ExtractionRunner, Extractor, RunReport, TableOutcome};
pub use logs::{LogSummaryWriter, SummaryTarget};
pub use response::InvocationResponse;
pub use secrets::{SecretProvider, SsmSecretProvider, StaticSecretProvider};
