//! Reverse conversion: MySQL values → CellValue
//!
//! This module converts MySQL's native values into sync-core's `CellValue`
//! for writing rows to CSV, and converts watermarks into bound parameters.

use crate::error::ConversionError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use mysql_async::consts::{ColumnFlags, ColumnType};
use mysql_async::Value;
use sync_core::values::parse_datetime;
use sync_core::CellValue;

/// Convert a MySQL value to a [`CellValue`] using its column metadata.
pub fn cell_from_mysql(
    value: Value,
    column_type: ColumnType,
    column_flags: ColumnFlags,
) -> Result<CellValue, ConversionError> {
    use ColumnType::*;

    match value {
        Value::NULL => Ok(CellValue::Null),
        Value::Int(i) => Ok(CellValue::Int(i)),
        Value::UInt(u) => Ok(CellValue::UInt(u)),
        // f32 Display keeps the stored digits
        Value::Float(f) => Ok(CellValue::Text(f.to_string())),
        Value::Double(d) => Ok(CellValue::Float(d)),
        Value::Date(_, month, day, ..) if month == 0 || day == 0 => Ok(CellValue::Null),
        Value::Date(..) => {
            let dt = extract_datetime(&value)?;
            if column_type == MYSQL_TYPE_DATE {
                Ok(CellValue::Date(dt.date()))
            } else {
                Ok(CellValue::DateTime(dt))
            }
        }
        Value::Time(negative, days, hours, minutes, seconds, micros) => Ok(CellValue::Text(
            format_time(negative, days, hours, minutes, seconds, micros),
        )),
        Value::Bytes(bytes) if is_temporal(column_type) && is_zero_date(&bytes) => {
            Ok(CellValue::Null)
        }
        Value::Bytes(bytes) => match column_type {
            MYSQL_TYPE_DATE => {
                let s = String::from_utf8(bytes)?;
                NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map(CellValue::Date)
                    .map_err(|_| ConversionError::InvalidDateTime(Value::Bytes(s.into_bytes())))
            }
            MYSQL_TYPE_DATETIME | MYSQL_TYPE_DATETIME2 | MYSQL_TYPE_TIMESTAMP
            | MYSQL_TYPE_TIMESTAMP2 => {
                let s = String::from_utf8(bytes)?;
                parse_datetime(&s)
                    .map(CellValue::DateTime)
                    .ok_or_else(|| ConversionError::InvalidDateTime(Value::Bytes(s.into_bytes())))
            }
            MYSQL_TYPE_GEOMETRY | MYSQL_TYPE_BIT => Ok(CellValue::Bytes(bytes)),
            MYSQL_TYPE_TINY_BLOB
            | MYSQL_TYPE_MEDIUM_BLOB
            | MYSQL_TYPE_BLOB
            | MYSQL_TYPE_LONG_BLOB
            | MYSQL_TYPE_STRING
            | MYSQL_TYPE_VAR_STRING
                if column_flags.contains(ColumnFlags::BINARY_FLAG) =>
            {
                Ok(CellValue::Bytes(bytes))
            }
            // DECIMAL, VARCHAR, TEXT, JSON, ENUM, SET
            _ => Ok(CellValue::Text(String::from_utf8(bytes)?)),
        },
    }
}

/// Bind a watermark as a MySQL DATETIME parameter, keeping microseconds.
pub fn datetime_to_mysql(dt: &NaiveDateTime) -> Value {
    // leap seconds carry nanos >= 1_000_000_000
    let micros = (dt.nanosecond() / 1_000).min(999_999);
    Value::Date(
        dt.year() as u16,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
        micros,
    )
}

fn is_temporal(column_type: ColumnType) -> bool {
    use ColumnType::*;
    matches!(
        column_type,
        MYSQL_TYPE_DATE
            | MYSQL_TYPE_NEWDATE
            | MYSQL_TYPE_DATETIME
            | MYSQL_TYPE_DATETIME2
            | MYSQL_TYPE_TIMESTAMP
            | MYSQL_TYPE_TIMESTAMP2
    )
}

/// Zero dates (`0000-00-00`, or a zero month or day) are allowed by lenient
/// `sql_mode` settings and have no calendar meaning; they become NULL.
fn is_zero_date(bytes: &[u8]) -> bool {
    let Ok(s) = std::str::from_utf8(bytes) else {
        return false;
    };
    let date = s.trim().split([' ', 'T']).next().unwrap_or_default();
    let mut parts = date.split('-').skip(1);
    matches!(
        (parts.next(), parts.next()),
        (Some(month), Some(day)) if month == "00" || day == "00"
    )
}

/// Extract datetime from MySQL Value.
fn extract_datetime(value: &Value) -> Result<NaiveDateTime, ConversionError> {
    match value {
        Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = NaiveDate::from_ymd_opt(*year as i32, *month as u32, *day as u32)
                .ok_or_else(|| ConversionError::InvalidDateTime(value.clone()))?;
            let time =
                NaiveTime::from_hms_micro_opt(*hour as u32, *min as u32, *sec as u32, *micro)
                    .ok_or_else(|| ConversionError::InvalidDateTime(value.clone()))?;
            Ok(NaiveDateTime::new(date, time))
        }
        _ => Err(ConversionError::InvalidDateTime(value.clone())),
    }
}

/// TIME columns are durations and may exceed 24 hours or be negative.
fn format_time(negative: bool, days: u32, hours: u8, minutes: u8, seconds: u8, micros: u32) -> String {
    let sign = if negative { "-" } else { "" };
    let total_hours = days * 24 + hours as u32;
    if micros == 0 {
        format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{sign}{total_hours:02}:{minutes:02}:{seconds:02}.{micros:06}")
    }
}
