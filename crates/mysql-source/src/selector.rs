//! SQL rendering of the change predicate.

use crate::error::SourceError;
use crate::reverse::datetime_to_mysql;
use chrono::NaiveDateTime;
use mysql_async::Value;
use sync_core::TableDescriptor;

/// A parameterized statement and its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Back-quote an identifier, doubling embedded back-quotes.
pub fn quote_identifier(name: &str) -> Result<String, SourceError> {
    if name.is_empty() || name.contains('\0') {
        return Err(SourceError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Build the statement selecting rows of `table` changed after `watermark`.
///
/// The watermark is bound twice as a positional parameter; only
/// identifiers are interpolated, and those are quoted.
pub fn build_select(
    table: &TableDescriptor,
    watermark: NaiveDateTime,
) -> Result<SelectStatement, SourceError> {
    let name = quote_identifier(&table.name)?;
    let modified = quote_identifier(&table.modified_column)?;
    let created = quote_identifier(&table.created_column)?;

    let sql = format!(
        "SELECT * FROM {name} \
         WHERE ({modified} IS NOT NULL AND {modified} > ?) \
         OR ({modified} IS NULL AND {created} > ?) \
         ORDER BY COALESCE({modified}, {created})"
    );
    let bound = datetime_to_mysql(&watermark);

    Ok(SelectStatement {
        sql,
        params: vec![bound.clone(), bound],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    #[test]
    fn test_select_for_default_columns() {
        let stmt = build_select(&TableDescriptor::new("location"), dt("2024-01-02 03:04:05")).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM `location` \
             WHERE (`modifiedDate` IS NOT NULL AND `modifiedDate` > ?) \
             OR (`modifiedDate` IS NULL AND `createdDate` > ?) \
             ORDER BY COALESCE(`modifiedDate`, `createdDate`)"
        );
        assert_eq!(
            stmt.params,
            vec![
                Value::Date(2024, 1, 2, 3, 4, 5, 0),
                Value::Date(2024, 1, 2, 3, 4, 5, 0)
            ]
        );
    }

    #[test]
    fn test_fractional_watermark_is_bound_exactly() {
        let stmt = build_select(&TableDescriptor::new("t"), dt("2024-01-02 03:04:05.000250")).unwrap();
        assert_eq!(stmt.params[0], Value::Date(2024, 1, 2, 3, 4, 5, 250));
    }

    #[test]
    fn test_identifiers_are_quoted_not_interpolated() {
        let table = TableDescriptor::new("orders`; DROP TABLE x; --");
        let stmt = build_select(&table, dt("1970-01-01 00:00:00")).unwrap();
        assert!(stmt.sql.starts_with("SELECT * FROM `orders``; DROP TABLE x; --` WHERE"));
    }

    #[test]
    fn test_empty_identifier_is_rejected() {
        let table = TableDescriptor::new("t").with_change_columns("", "createdDate");
        assert!(matches!(
            build_select(&table, dt("1970-01-01 00:00:00")),
            Err(SourceError::InvalidIdentifier(_))
        ));
    }
}
