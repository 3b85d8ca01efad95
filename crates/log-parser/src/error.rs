use thiserror::Error;

/// Why a log payload could not be turned into summary lines.
///
/// Every variant is a format error: the payload is rejected as a whole and
/// nothing is written.
#[derive(Debug, Error)]
pub enum LogParseError {
    #[error("Payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Payload is not valid gzip: {0}")]
    Gzip(#[source] std::io::Error),

    #[error("Decompressed payload is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("Payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Log event timestamp {0} is out of range")]
    InvalidTimestamp(i64),
}
