//! The change predicate: rows modified or created strictly after a watermark.

use chrono::NaiveDateTime;

/// Effective change time of a row: `modified` if present, else `created`.
///
/// Both the selection predicate and the new-watermark computation go
/// through this function.
pub fn effective_change_time(
    modified: Option<NaiveDateTime>,
    created: Option<NaiveDateTime>,
) -> Option<NaiveDateTime> {
    modified.or(created)
}

/// Selects rows whose effective change time is strictly greater than
/// the watermark.
///
/// Equivalent SQL:
///
/// ```text
/// (modified IS NOT NULL AND modified > W) OR (modified IS NULL AND created > W)
/// ```
///
/// The comparison is strict so the row that defined the previous
/// watermark is not extracted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeFilter {
    watermark: NaiveDateTime,
}

impl ChangeFilter {
    /// Build the filter for rows changed after `watermark`.
    pub fn after(watermark: NaiveDateTime) -> Self {
        Self { watermark }
    }

    /// The lower (exclusive) bound of the selection.
    pub fn watermark(&self) -> NaiveDateTime {
        self.watermark
    }

    /// Evaluate the predicate for a row's change-time columns.
    pub fn matches(
        &self,
        modified: Option<NaiveDateTime>,
        created: Option<NaiveDateTime>,
    ) -> bool {
        effective_change_time(modified, created).is_some_and(|t| t > self.watermark)
    }
}
