//! Rendering of log events as summary lines.

use crate::decode::LogEvent;
use crate::error::LogParseError;
use chrono::DateTime;

/// UTC timestamp layout at the start of each summary line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render one event as `"<UTC timestamp> - <message>"`.
///
/// Tabs in the message become single spaces and surrounding whitespace is
/// trimmed, so every event occupies exactly one line unless the message
/// itself contains newlines.
pub fn format_event(event: &LogEvent) -> Result<String, LogParseError> {
    let at = DateTime::from_timestamp_millis(event.timestamp)
        .ok_or(LogParseError::InvalidTimestamp(event.timestamp))?;
    let message = event.message.replace('\t', " ");
    Ok(format!(
        "{} - {}",
        at.format(TIMESTAMP_FORMAT),
        message.trim()
    ))
}

/// Render every event, preserving order. Fails on the first bad event so
/// that no partial summary is produced.
pub fn format_events(events: &[LogEvent]) -> Result<Vec<String>, LogParseError> {
    events.iter().map(format_event).collect()
}

/// Render events and join them with newlines.
pub fn summarize(events: &[LogEvent]) -> Result<String, LogParseError> {
    Ok(format_events(events)?.join("\n"))
}
