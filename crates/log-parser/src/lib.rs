//! Decoder and formatter for CloudWatch Logs subscription payloads.
//!
//! A subscription delivers `{"awslogs": {"data": "<base64>"}}` where the
//! data is a gzip-compressed JSON document holding a batch of log events.
//! [`decode_event`] unwraps the three layers and [`format_events`] renders
//! each event as one `YYYY-MM-DD HH:MM:SS - message` line.
//!
//! ```rust,ignore
//! use rds_sync_log_parser::{decode_event, format_events, CloudWatchLogsEvent};
//!
//! let event: CloudWatchLogsEvent = serde_json::from_str(&raw)?;
//! let data = decode_event(&event)?;
//! let summary = format_events(&data.log_events)?.join("\n");
//! ```

mod decode;
mod error;
mod format;

pub use decode::{decode_event, decode_payload, AwsLogs, CloudWatchLogsEvent, LogEvent, LogsData};
pub use error::LogParseError;
pub use format::{format_event, format_events, summarize, TIMESTAMP_FORMAT};

/// Message type of the control probe CloudWatch sends when a subscription
/// is created. It carries no application log lines.
pub const CONTROL_MESSAGE: &str = "CONTROL_MESSAGE";
