//! Column values read from the source database.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Datetime layout used for CSV cells and watermark text.
///
/// `%.f` prints nothing for whole seconds, so second-precision columns
/// render as plain `YYYY-MM-DD HH:MM:SS`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A single column value.
///
/// Source-specific crates convert their native values into `CellValue`
/// so the runner and sink writer stay database-agnostic.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// SQL NULL
    Null,

    /// Signed integer
    Int(i64),

    /// Unsigned integer
    UInt(u64),

    /// Floating point
    Float(f64),

    /// Text, decimals, enums, JSON documents and time-of-day values
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// Calendar date without time
    Date(NaiveDate),

    /// Date and time without timezone (MySQL DATETIME / TIMESTAMP)
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Interpret this value as a point in time.
    ///
    /// Dates are treated as midnight, and text is accepted in the
    /// `YYYY-MM-DD HH:MM:SS[.f]` layout (with either a space or `T`
    /// separator). Returns `None` for NULL and for values that are not
    /// timestamps.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Date(d) => Some(d.and_time(NaiveTime::MIN)),
            Self::Text(s) => parse_datetime(s),
            Self::Bytes(b) => std::str::from_utf8(b).ok().and_then(parse_datetime),
            _ => None,
        }
    }

    /// Render this value as a CSV field.
    ///
    /// NULL becomes an empty field; binary data is rendered as lossy UTF-8.
    pub fn to_csv_field(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(i) => i.to_string(),
            Self::UInt(u) => u.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Text(s) => s.clone(),
            Self::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::DateTime(dt) => format_datetime(dt),
        }
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(dt: NaiveDateTime) -> Self {
        Self::DateTime(dt)
    }
}

impl From<Option<NaiveDateTime>> for CellValue {
    fn from(dt: Option<NaiveDateTime>) -> Self {
        dt.map(Self::DateTime).unwrap_or(Self::Null)
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// Format a datetime the way it is written to CSV cells and watermark blobs.
pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a datetime written by [`format_datetime`], tolerating a `T`
/// separator and surrounding whitespace.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}
