//! Materialized result sets.

use crate::filter::effective_change_time;
use crate::table::TableDescriptor;
use crate::values::CellValue;
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors raised while building or inspecting a [`Batch`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("Column '{column}' not found in result set for table '{table}'")]
    MissingColumn { table: String, column: String },

    #[error("Row {row} has {actual} values but the result set has {expected} columns")]
    ArityMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Column '{column}' in row {row} is not a timestamp: {value}")]
    NotATimestamp {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Row {row} of table '{table}' has neither a modified nor a created time")]
    MissingChangeTime { table: String, row: usize },
}

/// An ordered set of rows sharing one column list.
///
/// Rows keep the order the source returned them in (ascending effective
/// change time), and every row has exactly one value per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Batch {
    /// Create an empty batch with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, rejecting rows whose arity differs from the header.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), BatchError> {
        if row.len() != self.columns.len() {
            return Err(BatchError::ArityMismatch {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Resolve the positions of the table's modified and created columns.
    pub fn validate_change_columns(
        &self,
        table: &TableDescriptor,
    ) -> Result<(usize, usize), BatchError> {
        let find = |column: &str| {
            self.column_index(column)
                .ok_or_else(|| BatchError::MissingColumn {
                    table: table.name.clone(),
                    column: column.to_string(),
                })
        };
        Ok((find(&table.modified_column)?, find(&table.created_column)?))
    }

    /// Effective change time of the row at `index`.
    pub fn effective_change_time(
        &self,
        table: &TableDescriptor,
        index: usize,
    ) -> Result<Option<NaiveDateTime>, BatchError> {
        let (modified_idx, created_idx) = self.validate_change_columns(table)?;
        let Some(row) = self.rows.get(index) else {
            return Ok(None);
        };
        let modified = timestamp_at(row, modified_idx, index, &table.modified_column)?;
        let created = timestamp_at(row, created_idx, index, &table.created_column)?;
        Ok(effective_change_time(modified, created))
    }

    /// Maximum effective change time across all rows.
    ///
    /// Returns `Ok(None)` for an empty batch. A row with no change time at
    /// all is an error: it could never have matched the change filter.
    pub fn max_effective_change_time(
        &self,
        table: &TableDescriptor,
    ) -> Result<Option<NaiveDateTime>, BatchError> {
        if self.rows.is_empty() {
            return Ok(None);
        }
        let (modified_idx, created_idx) = self.validate_change_columns(table)?;

        let mut max: Option<NaiveDateTime> = None;
        for (i, row) in self.rows.iter().enumerate() {
            let modified = timestamp_at(row, modified_idx, i, &table.modified_column)?;
            let created = timestamp_at(row, created_idx, i, &table.created_column)?;
            let t = effective_change_time(modified, created).ok_or_else(|| {
                BatchError::MissingChangeTime {
                    table: table.name.clone(),
                    row: i,
                }
            })?;
            max = Some(max.map_or(t, |m| m.max(t)));
        }
        Ok(max)
    }
}

fn timestamp_at(
    row: &[CellValue],
    idx: usize,
    row_num: usize,
    column: &str,
) -> Result<Option<NaiveDateTime>, BatchError> {
    match &row[idx] {
        CellValue::Null => Ok(None),
        value => value
            .as_datetime()
            .map(Some)
            .ok_or_else(|| BatchError::NotATimestamp {
                row: row_num,
                column: column.to_string(),
                value: value.to_csv_field(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn batch(rows: Vec<(i64, Option<&str>, &str)>) -> Batch {
        let mut batch = Batch::new(vec![
            "id".to_string(),
            "modifiedDate".to_string(),
            "createdDate".to_string(),
        ]);
        for (id, modified, created) in rows {
            batch
                .push_row(vec![
                    CellValue::Int(id),
                    modified.map(dt).into(),
                    CellValue::DateTime(dt(created)),
                ])
                .unwrap();
        }
        batch
    }

    #[test]
    fn test_push_row_rejects_wrong_arity() {
        let mut b = Batch::new(vec!["a".to_string(), "b".to_string()]);
        let err = b.push_row(vec![CellValue::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            BatchError::ArityMismatch {
                row: 0,
                expected: 2,
                actual: 1
            }
        );
        assert!(b.is_empty());
    }

    #[test]
    fn test_max_effective_change_time_mixes_modified_and_created() {
        let table = TableDescriptor::new("location");
        let b = batch(vec![
            (1, Some("2024-01-01 10:00:00"), "2023-01-01 00:00:00"),
            (2, None, "2024-01-03 09:00:00"),
            (3, Some("2024-01-02 08:00:00"), "2024-01-05 00:00:00"),
        ]);
        // row 3's created time is later, but its modified time wins
        assert_eq!(
            b.max_effective_change_time(&table).unwrap(),
            Some(dt("2024-01-03 09:00:00"))
        );
        assert_eq!(
            b.effective_change_time(&table, 2).unwrap(),
            Some(dt("2024-01-02 08:00:00"))
        );
    }

    #[test]
    fn test_empty_batch_has_no_max() {
        let table = TableDescriptor::new("location");
        assert_eq!(Batch::default().max_effective_change_time(&table), Ok(None));
    }

    #[test]
    fn test_missing_change_column_is_reported() {
        let table = TableDescriptor::new("customer").with_change_columns("updated", "created");
        let b = batch(vec![(1, None, "2024-01-01 00:00:00")]);
        let err = b.max_effective_change_time(&table).unwrap_err();
        assert_eq!(
            err,
            BatchError::MissingColumn {
                table: "customer".to_string(),
                column: "updated".to_string()
            }
        );
    }

    #[test]
    fn test_non_timestamp_change_column_is_reported() {
        let table = TableDescriptor::new("t");
        let mut b = Batch::new(vec!["modifiedDate".to_string(), "createdDate".to_string()]);
        b.push_row(vec![CellValue::Int(5), CellValue::Null]).unwrap();
        assert!(matches!(
            b.max_effective_change_time(&table),
            Err(BatchError::NotATimestamp { row: 0, .. })
        ));
    }

    #[test]
    fn test_row_without_any_change_time_is_reported() {
        let table = TableDescriptor::new("t");
        let mut b = Batch::new(vec!["modifiedDate".to_string(), "createdDate".to_string()]);
        b.push_row(vec![CellValue::Null, CellValue::Null]).unwrap();
        assert_eq!(
            b.max_effective_change_time(&table),
            Err(BatchError::MissingChangeTime {
                table: "t".to_string(),
                row: 0
            })
        );
    }
}
