//! Per-table extraction watermarks.
//!
//! A watermark is the highest effective change time that has been
//! successfully extracted for a table. It is stored as a small text blob
//! next to the table's artifacts and read at the start of every run.
//!
//! # Architecture
//!
//! - [`Watermark`] wraps the timestamp and defines its text format
//! - [`WatermarkStore`] is the storage-agnostic read/write interface
//! - [`ObjectWatermarkStore`] keeps watermarks in an object store
//!
//! Reads never fail: [`WatermarkStore::read`] returns a tagged
//! [`WatermarkRead`] and [`WatermarkStore::get`] turns every non-found
//! outcome into the epoch default, logging why. A missing watermark simply
//! means "extract everything".

mod object;
pub mod store;

#[cfg(test)]
mod tests;

pub use object::{watermark_key, ObjectWatermarkStore, WATERMARK_FILE_NAME};
pub use store::{WatermarkRead, WatermarkStore};

use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;
use std::str::FromStr;
use sync_core::values::{format_datetime, parse_datetime};
use thiserror::Error;

/// Error returned when watermark text cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid watermark '{0}': expected YYYY-MM-DD HH:MM:SS[.ffffff]")]
pub struct ParseWatermarkError(pub String);

/// The highest effective change time extracted for a table.
///
/// Text form is `YYYY-MM-DD HH:MM:SS`, followed by fractional seconds only
/// when the timestamp has them, so the stored value is exactly the maximum
/// change time and never rounds up past an unextracted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(NaiveDateTime);

impl Watermark {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at)
    }

    /// The default used when no watermark has been stored: `1970-01-01 00:00:00`.
    pub fn epoch() -> Self {
        Self(DateTime::<Utc>::UNIX_EPOCH.naive_utc())
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.0
    }
}

impl Default for Watermark {
    fn default() -> Self {
        Self::epoch()
    }
}

impl From<NaiveDateTime> for Watermark {
    fn from(at: NaiveDateTime) -> Self {
        Self(at)
    }
}

impl fmt::Display for Watermark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_datetime(&self.0))
    }
}

impl FromStr for Watermark {
    type Err = ParseWatermarkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_datetime(s)
            .map(Self)
            .ok_or_else(|| ParseWatermarkError(s.trim().to_string()))
    }
}
