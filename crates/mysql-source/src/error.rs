use mysql_async::Value;
use std::time::Duration;
use sync_core::{BatchError, Retryable};
use thiserror::Error;

/// MySQL server error: access denied for user
const ER_ACCESS_DENIED_ERROR: u16 = 1045;
/// MySQL server error: unknown database
const ER_BAD_DB_ERROR: u16 = 1049;

/// Error during MySQL value conversion.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Invalid UTF-8 in string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    #[error("Invalid date/time value: {0:?}")]
    InvalidDateTime(Value),
}

/// Errors raised by the MySQL change source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Access denied connecting to {target}: {message}")]
    AccessDenied { target: String, message: String },

    #[error("Unknown database at {target}: {message}")]
    UnknownDatabase { target: String, message: String },

    #[error("Failed to connect to MySQL at {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: mysql_async::Error,
    },

    #[error("Query against table '{table}' failed: {source}")]
    Query {
        table: String,
        #[source]
        source: mysql_async::Error,
    },

    #[error("Failed to convert column '{column}' of table '{table}': {source}")]
    Conversion {
        table: String,
        column: String,
        #[source]
        source: ConversionError,
    },

    #[error(transparent)]
    Batch(#[from] BatchError),

    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    #[error("MySQL call timed out after {0:?}")]
    Timeout(Duration),
}

impl SourceError {
    /// Classify a failure to open a connection.
    pub fn connect(target: &str, source: mysql_async::Error) -> Self {
        match &source {
            mysql_async::Error::Server(e) if e.code == ER_ACCESS_DENIED_ERROR => {
                Self::AccessDenied {
                    target: target.to_string(),
                    message: e.message.clone(),
                }
            }
            mysql_async::Error::Server(e) if e.code == ER_BAD_DB_ERROR => Self::UnknownDatabase {
                target: target.to_string(),
                message: e.message.clone(),
            },
            _ => Self::Connection {
                target: target.to_string(),
                source,
            },
        }
    }

    pub fn query(table: &str, source: mysql_async::Error) -> Self {
        Self::Query {
            table: table.to_string(),
            source,
        }
    }
}

impl Retryable for SourceError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Connection { source, .. } | Self::Query { source, .. } => {
                is_transient_driver_error(source)
            }
            Self::Timeout(_) => true,
            _ => false,
        }
    }
}

fn is_transient_driver_error(err: &mysql_async::Error) -> bool {
    match err {
        mysql_async::Error::Io(_) => true,
        mysql_async::Error::Server(e) => is_transient_server_code(e.code),
        _ => false,
    }
}

/// Server error codes worth retrying: lock wait timeout, deadlock,
/// too many connections, server gone away and lost connection.
pub(crate) fn is_transient_server_code(code: u16) -> bool {
    matches!(code, 1040 | 1205 | 1213 | 2006 | 2013)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_server_codes() {
        assert!(is_transient_server_code(1213));
        assert!(is_transient_server_code(1205));
        assert!(!is_transient_server_code(ER_ACCESS_DENIED_ERROR));
        assert!(!is_transient_server_code(ER_BAD_DB_ERROR));
        // syntax error
        assert!(!is_transient_server_code(1064));
    }

    #[test]
    fn test_timeout_is_transient() {
        assert!(SourceError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(!SourceError::InvalidIdentifier(String::new()).is_transient());
    }
}
