//! Per-table outcomes of an extraction run.

use crate::response::InvocationResponse;
use std::fmt;
use watermark::Watermark;

/// Stage at which a table's extraction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SelectRows,
    Validate,
    Upload,
    PersistWatermark,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SelectRows => "select rows",
            Stage::Validate => "validate batch",
            Stage::Upload => "upload artifact",
            Stage::PersistWatermark => "persist watermark",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOutcome {
    /// Nothing changed since the watermark
    Empty,
    Extracted {
        rows: usize,
        artifact_key: String,
        /// The watermark written, or `None` when it did not advance
        watermark: Option<Watermark>,
    },
    Failed {
        stage: Stage,
        error: String,
        /// Set when the artifact was uploaded before the failure
        artifact_key: Option<String>,
    },
}

impl TableOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, TableOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableReport {
    pub table: String,
    pub outcome: TableOutcome,
}

impl fmt::Display for TableReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            TableOutcome::Empty => write!(f, "{}: no new data", self.table),
            TableOutcome::Extracted {
                rows,
                artifact_key,
                watermark,
            } => {
                write!(f, "{}: {rows} rows to {artifact_key}", self.table)?;
                match watermark {
                    Some(w) => write!(f, ", watermark {w}"),
                    None => write!(f, ", watermark unchanged"),
                }
            }
            TableOutcome::Failed {
                stage,
                error,
                artifact_key,
            } => {
                write!(f, "{}: failed to {stage}: {error}", self.table)?;
                if let Some(key) = artifact_key {
                    write!(f, " (artifact {key} was uploaded)")?;
                }
                Ok(())
            }
        }
    }
}

/// Outcomes of every configured table, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub tables: Vec<TableReport>,
}

impl RunReport {
    pub fn push(&mut self, table: impl Into<String>, outcome: TableOutcome) {
        self.tables.push(TableReport {
            table: table.into(),
            outcome,
        });
    }

    pub fn outcome(&self, table: &str) -> Option<&TableOutcome> {
        self.tables
            .iter()
            .find(|r| r.table == table)
            .map(|r| &r.outcome)
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|r| r.outcome.is_failed())
            .map(|r| r.table.as_str())
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.failed_tables().is_empty()
    }

    pub fn summary(&self) -> String {
        if self.tables.is_empty() {
            return "No tables configured".to_string();
        }
        self.tables
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn status_code(&self) -> u16 {
        if self.is_success() {
            200
        } else {
            500
        }
    }

    pub fn to_response(&self) -> InvocationResponse {
        InvocationResponse {
            status_code: self.status_code(),
            body: self.summary(),
        }
    }
}
