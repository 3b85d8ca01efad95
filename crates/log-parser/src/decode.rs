//! base64 → gzip → JSON decoding of subscription payloads.

use crate::error::LogParseError;
use crate::CONTROL_MESSAGE;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use tracing::debug;

/// The invocation event delivered by a CloudWatch Logs subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudWatchLogsEvent {
    pub awslogs: AwsLogs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsLogs {
    /// base64-encoded, gzip-compressed JSON
    pub data: String,
}

/// Decoded payload body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsData {
    #[serde(default)]
    pub message_type: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub log_group: Option<String>,
    #[serde(default)]
    pub log_stream: Option<String>,
    #[serde(default)]
    pub log_events: Vec<LogEvent>,
}

impl LogsData {
    pub fn is_control_message(&self) -> bool {
        self.message_type.as_deref() == Some(CONTROL_MESSAGE)
    }
}

/// A single log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub id: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub message: String,
}

/// Decode the `data` field of an event.
pub fn decode_event(event: &CloudWatchLogsEvent) -> Result<LogsData, LogParseError> {
    decode_payload(&event.awslogs.data)
}

/// Decode a base64 gzip JSON payload into its log events.
///
/// Control messages decode to an empty event list.
pub fn decode_payload(data: &str) -> Result<LogsData, LogParseError> {
    let compressed = STANDARD.decode(data.trim())?;

    let mut decoder = GzDecoder::new(compressed.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(LogParseError::Gzip)?;
    debug!(
        "Decompressed log payload {} -> {} bytes",
        compressed.len(),
        decompressed.len()
    );

    let json = String::from_utf8(decompressed)?;
    let mut logs: LogsData = serde_json::from_str(&json)?;

    if logs.is_control_message() {
        debug!("Received subscription control message, ignoring its events");
        logs.log_events.clear();
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn encode(json: &str) -> String {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(json.as_bytes()).unwrap();
        STANDARD.encode(encoder.finish().unwrap())
    }

    #[test]
    fn test_decode_data_message() {
        let payload = encode(
            r#"{
                "messageType": "DATA_MESSAGE",
                "owner": "123456789012",
                "logGroup": "/aws/rds/instance/food/error",
                "logStream": "food",
                "subscriptionFilters": ["all"],
                "logEvents": [
                    {"id": "1", "timestamp": 1700000000000, "message": "first"},
                    {"id": "2", "timestamp": 1700000001000, "message": "second"}
                ]
            }"#,
        );
        let logs = decode_payload(&payload).unwrap();
        assert_eq!(logs.log_group.as_deref(), Some("/aws/rds/instance/food/error"));
        assert_eq!(logs.log_events.len(), 2);
        assert_eq!(logs.log_events[1].message, "second");
        assert_eq!(logs.log_events[0].timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_missing_log_events_means_no_entries() {
        let logs = decode_payload(&encode(r#"{"logGroup": "g"}"#)).unwrap();
        assert!(logs.log_events.is_empty());
    }

    #[test]
    fn test_control_message_has_no_entries() {
        let payload = encode(
            r#"{"messageType": "CONTROL_MESSAGE",
                "logEvents": [{"id": "", "timestamp": 1, "message": "CWL CONTROL MESSAGE: Checking health of destination"}]}"#,
        );
        let logs = decode_payload(&payload).unwrap();
        assert!(logs.is_control_message());
        assert!(logs.log_events.is_empty());
    }

    #[test]
    fn test_non_json_body_is_a_format_error() {
        let err = decode_payload(&encode("this is not json")).unwrap_err();
        assert!(matches!(err, LogParseError::Json(_)));
    }

    #[test]
    fn test_invalid_base64_is_a_format_error() {
        let err = decode_payload("%%% not base64 %%%").unwrap_err();
        assert!(matches!(err, LogParseError::Base64(_)));
    }

    #[test]
    fn test_uncompressed_body_is_a_format_error() {
        let err = decode_payload(&STANDARD.encode(b"{\"logEvents\": []}")).unwrap_err();
        assert!(matches!(err, LogParseError::Gzip(_)));
    }

    #[test]
    fn test_event_envelope_deserializes() {
        let raw = format!(r#"{{"awslogs": {{"data": "{}"}}}}"#, encode(r#"{"logEvents": []}"#));
        let event: CloudWatchLogsEvent = serde_json::from_str(&raw).unwrap();
        assert!(decode_event(&event).unwrap().log_events.is_empty());
    }
}
