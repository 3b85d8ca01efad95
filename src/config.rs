//! Command-line and environment configuration.

mod duration;

pub use duration::parse_duration;

use clap::Parser;
use rds_sync_mysql_source::DEFAULT_MYSQL_PORT;
use std::time::Duration;
use sync_core::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_OPERATION_TIMEOUT};
use sync_core::table::{DEFAULT_CREATED_COLUMN, DEFAULT_MODIFIED_COLUMN};
use sync_core::{RetryPolicy, TableDescriptor};

/// Default bucket for log summaries
pub const DEFAULT_SUMMARY_BUCKET: &str = "rds-to-s3-log-summaries-bucket";

/// What to extract and where to put it.
#[derive(Parser, Clone, Debug)]
pub struct ExtractOpts {
    /// Bucket receiving CSV artifacts and per-table watermarks
    #[arg(long, env = "RDS_SYNC_BUCKET")]
    pub bucket: Option<String>,

    /// Comma-separated tables to extract, processed in order
    #[arg(
        long,
        env = "RDS_SYNC_TABLES",
        value_delimiter = ',',
        default_value = "location,customer"
    )]
    pub tables: Vec<String>,

    /// Nullable column holding the last modification time
    #[arg(long, env = "RDS_SYNC_MODIFIED_COLUMN", default_value = DEFAULT_MODIFIED_COLUMN)]
    pub modified_column: String,

    /// Non-null column holding the creation time
    #[arg(long, env = "RDS_SYNC_CREATED_COLUMN", default_value = DEFAULT_CREATED_COLUMN)]
    pub created_column: String,
}

impl ExtractOpts {
    /// Table descriptors in configured order, skipping blank entries.
    pub fn table_descriptors(&self) -> Vec<TableDescriptor> {
        self.tables
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(|t| {
                TableDescriptor::new(t)
                    .with_change_columns(&self.modified_column, &self.created_column)
            })
            .collect()
    }
}

/// Source database location and the names of its credential parameters.
#[derive(Parser, Clone, Debug)]
pub struct SourceOpts {
    /// MySQL host name
    #[arg(long, env = "RDS_SYNC_MYSQL_HOST")]
    pub mysql_host: Option<String>,

    /// MySQL port
    #[arg(long, env = "RDS_SYNC_MYSQL_PORT", default_value_t = DEFAULT_MYSQL_PORT)]
    pub mysql_port: u16,

    /// MySQL database name
    #[arg(long, env = "RDS_SYNC_MYSQL_DATABASE", default_value = "food_test_db")]
    pub mysql_database: String,

    /// Parameter holding the database user name
    #[arg(
        long,
        env = "RDS_SYNC_USERNAME_PARAMETER",
        default_value = "/foodDelivery/rds/username"
    )]
    pub username_parameter: String,

    /// Parameter holding the database password
    #[arg(
        long,
        env = "RDS_SYNC_PASSWORD_PARAMETER",
        default_value = "/foodDelivery/rds/password"
    )]
    pub password_parameter: String,
}

/// Timeouts and retries applied to every remote call.
#[derive(Parser, Clone, Debug)]
pub struct RetryOpts {
    /// Attempts per call, first try included
    #[arg(long, env = "RDS_SYNC_MAX_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    /// Delay before the first retry, doubled on each further retry
    #[arg(long, env = "RDS_SYNC_RETRY_BASE_DELAY", default_value = "200ms", value_parser = parse_duration)]
    pub retry_base_delay: Duration,

    /// Upper bound on a single remote call
    #[arg(long, env = "RDS_SYNC_OPERATION_TIMEOUT", default_value = "30s", value_parser = parse_duration)]
    pub operation_timeout: Duration,
}

impl RetryOpts {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: self.retry_base_delay,
            operation_timeout: self.operation_timeout,
        }
    }
}

impl Default for RetryOpts {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_base_delay: DEFAULT_BASE_DELAY,
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }
}

/// Where log summaries are written.
#[derive(Parser, Clone, Debug)]
pub struct LogSummaryOpts {
    /// Bucket receiving log summaries
    #[arg(long, env = "RDS_SYNC_SUMMARY_BUCKET", default_value = DEFAULT_SUMMARY_BUCKET)]
    pub summary_bucket: String,

    /// Key prefix for per-invocation summary objects
    #[arg(long, env = "RDS_SYNC_SUMMARY_PREFIX", default_value = "log-summaries")]
    pub summary_prefix: String,

    /// Append every summary to this single object instead
    #[arg(long, env = "RDS_SYNC_SUMMARY_APPEND_KEY")]
    pub append_key: Option<String>,
}
