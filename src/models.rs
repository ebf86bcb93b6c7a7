//! Models module - the query contract consumed by the connection

use crate::value::Value;

/// Column name of SQLite's implicit row identifier
pub const ROW_ID: &str = "rowid";

/// A statement plus its positional arguments.
///
/// `RETURNS_ROWS` decides which first-step statuses count as success when the
/// query is executed.
pub trait AnyQuery {
    const RETURNS_ROWS: bool;

    fn statement(&self) -> &str;
    fn arguments(&self) -> &[Value];
}

/// Marker for queries whose results can be iterated row by row
pub trait RowReturningQuery: AnyQuery {}

/// A query that produces rows, such as `SELECT`
#[derive(Debug, Clone, PartialEq)]
pub struct RowQuery {
    pub statement: String,
    pub arguments: Vec<Value>,
}

impl RowQuery {
    pub fn new(statement: impl Into<String>, arguments: Vec<Value>) -> Self {
        RowQuery {
            statement: statement.into(),
            arguments,
        }
    }
}

impl AnyQuery for RowQuery {
    const RETURNS_ROWS: bool = true;

    fn statement(&self) -> &str {
        &self.statement
    }

    fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

impl RowReturningQuery for RowQuery {}

/// A query executed for its effect, such as `INSERT` or `CREATE TABLE`
#[derive(Debug, Clone, PartialEq)]
pub struct CommandQuery {
    pub statement: String,
    pub arguments: Vec<Value>,
}

impl CommandQuery {
    pub fn new(statement: impl Into<String>, arguments: Vec<Value>) -> Self {
        CommandQuery {
            statement: statement.into(),
            arguments,
        }
    }
}

impl AnyQuery for CommandQuery {
    const RETURNS_ROWS: bool = false;

    fn statement(&self) -> &str {
        &self.statement
    }

    fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// SQL expression extracting `key` from the JSON text stored in `field`
pub fn json_extract_expr(field: &str, key: &str) -> String {
    format!("json_extract({}, '$.{}')", field, key.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_kinds() {
        assert!(RowQuery::RETURNS_ROWS);
        assert!(!CommandQuery::RETURNS_ROWS);
    }

    #[test]
    fn test_json_extract_expr() {
        assert_eq!(json_extract_expr("location", "x"), "json_extract(location, '$.x')");
        assert_eq!(json_extract_expr("doc", "it's"), "json_extract(doc, '$.it''s')");
    }
}
