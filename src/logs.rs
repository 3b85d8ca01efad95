//! CloudWatch Logs subscription handler.
//!
//! Decodes a subscription event, renders each log entry as one line and
//! writes the lines to object storage. A payload that cannot be decoded is
//! a format error and nothing is written.

use crate::config::LogSummaryOpts;
use crate::response::InvocationResponse;
use anyhow::Context;
use chrono::{DateTime, Utc};
use rds_sync_log_parser::{decode_event, format_events, CloudWatchLogsEvent, LogParseError};
use rds_sync_storage::{s3_uri, ObjectStore, RetryingStore, CONTENT_TYPE_TEXT};
use sync_core::RetryPolicy;
use tracing::{error, info};

pub const FORMAT_ERROR_BODY: &str = "Log format error";
pub const NO_MESSAGES_BODY: &str = "No errors or warnings found in logs";

/// Where summaries go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryTarget {
    /// A new object per invocation under `prefix`
    PerInvocation { bucket: String, prefix: String },
    /// One object that every invocation appends to
    Append { bucket: String, key: String },
}

impl SummaryTarget {
    pub fn bucket(&self) -> &str {
        match self {
            SummaryTarget::PerInvocation { bucket, .. } | SummaryTarget::Append { bucket, .. } => {
                bucket
            }
        }
    }
}

impl LogSummaryOpts {
    pub fn target(&self) -> SummaryTarget {
        match &self.append_key {
            Some(key) if !key.trim().is_empty() => SummaryTarget::Append {
                bucket: self.summary_bucket.clone(),
                key: key.trim().to_string(),
            },
            _ => SummaryTarget::PerInvocation {
                bucket: self.summary_bucket.clone(),
                prefix: self.summary_prefix.clone(),
            },
        }
    }
}

/// `{prefix}/{YYYYMMDD_HHMMSS}_{uuid}.txt`
pub fn summary_key(prefix: &str, at: &DateTime<Utc>) -> String {
    let prefix = prefix.trim_end_matches('/');
    let name = format!("{}_{}.txt", at.format("%Y%m%d_%H%M%S"), uuid::Uuid::new_v4());
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    }
}

pub struct LogSummaryWriter<S> {
    store: RetryingStore<S>,
    target: SummaryTarget,
}

impl<S: ObjectStore> LogSummaryWriter<S> {
    pub fn new(store: S, target: SummaryTarget, retry: RetryPolicy) -> Self {
        Self {
            store: RetryingStore::new(store, retry),
            target,
        }
    }

    pub fn target(&self) -> &SummaryTarget {
        &self.target
    }

    /// Handle an event that has not been deserialized yet.
    pub async fn handle_raw_event(
        &self,
        event: serde_json::Value,
        now: DateTime<Utc>,
    ) -> InvocationResponse {
        match serde_json::from_value::<CloudWatchLogsEvent>(event) {
            Ok(event) => self.handle_log_event(&event, now).await,
            Err(e) => {
                error!("Event is not a CloudWatch Logs subscription event: {e}");
                InvocationResponse::error(FORMAT_ERROR_BODY)
            }
        }
    }

    pub async fn handle_log_event(
        &self,
        event: &CloudWatchLogsEvent,
        now: DateTime<Utc>,
    ) -> InvocationResponse {
        let lines = match decode_lines(event) {
            Ok(lines) => lines,
            Err(e) => {
                error!("Failed to decode log payload: {e}");
                return InvocationResponse::error(FORMAT_ERROR_BODY);
            }
        };

        if lines.is_empty() {
            info!("{NO_MESSAGES_BODY}");
            return InvocationResponse::ok(NO_MESSAGES_BODY);
        }

        match self.save(&lines, now).await {
            Ok(key) => {
                info!(
                    "Saved {} log messages to {}",
                    lines.len(),
                    s3_uri(self.target.bucket(), &key)
                );
                InvocationResponse::ok(format!("Saved {} messages to {key}", lines.len()))
            }
            Err(e) => {
                error!("Failed to save log summary: {e:#}");
                InvocationResponse::error(format!("Failed to save log summary: {e:#}"))
            }
        }
    }

    async fn save(&self, lines: &[String], now: DateTime<Utc>) -> anyhow::Result<String> {
        let summary = lines.join("\n");
        match &self.target {
            SummaryTarget::PerInvocation { bucket, prefix } => {
                let key = summary_key(prefix, &now);
                self.store
                    .put_object(bucket, &key, summary.into_bytes(), CONTENT_TYPE_TEXT)
                    .await?;
                Ok(key)
            }
            SummaryTarget::Append { bucket, key } => {
                let existing = match self.store.get_object(bucket, key).await {
                    Ok(body) => String::from_utf8_lossy(&body).into_owned(),
                    Err(e) if e.is_not_found() => String::new(),
                    Err(e) => {
                        return Err(e).context("Failed to read existing summary");
                    }
                };
                let content = if existing.is_empty() {
                    summary
                } else {
                    format!("{}\n{summary}", existing.trim_end_matches('\n'))
                };
                self.store
                    .put_object(bucket, key, content.into_bytes(), CONTENT_TYPE_TEXT)
                    .await?;
                Ok(key.clone())
            }
        }
    }
}

/// Read a raw event from a JSON file, or from stdin when `path` is `-`.
pub fn load_event(path: &str) -> anyhow::Result<serde_json::Value> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read event from stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file {path}"))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Event in {path} is not valid JSON"))
}

fn decode_lines(event: &CloudWatchLogsEvent) -> Result<Vec<String>, LogParseError> {
    let data = decode_event(event)?;
    format_events(&data.log_events)
}
