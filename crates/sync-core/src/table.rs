//! Source table descriptors.

/// Default name of the nullable "last modified" column.
pub const DEFAULT_MODIFIED_COLUMN: &str = "modifiedDate";
/// Default name of the non-null "created" column.
pub const DEFAULT_CREATED_COLUMN: &str = "createdDate";

/// Identifies a source relation and the columns that define its
/// effective change time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    /// Table name, also used as the storage namespace for its artifacts
    pub name: String,
    /// Nullable column updated on every modification
    pub modified_column: String,
    /// Non-null column set when the row is inserted
    pub created_column: String,
}

impl TableDescriptor {
    /// Create a descriptor using the default change-time column names.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modified_column: DEFAULT_MODIFIED_COLUMN.to_string(),
            created_column: DEFAULT_CREATED_COLUMN.to_string(),
        }
    }

    /// Override the change-time column names.
    pub fn with_change_columns(
        mut self,
        modified_column: impl Into<String>,
        created_column: impl Into<String>,
    ) -> Self {
        self.modified_column = modified_column.into();
        self.created_column = created_column.into();
        self
    }
}

impl std::fmt::Display for TableDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_change_columns() {
        let table = TableDescriptor::new("location");
        assert_eq!(table.name, "location");
        assert_eq!(table.modified_column, "modifiedDate");
        assert_eq!(table.created_column, "createdDate");
        assert_eq!(table.to_string(), "location");
    }

    #[test]
    fn test_custom_change_columns() {
        let table = TableDescriptor::new("customer").with_change_columns("updated_at", "created_at");
        assert_eq!(table.modified_column, "updated_at");
        assert_eq!(table.created_column, "created_at");
    }
}
