//! Database module - SQLite access through the C API

mod connection;
mod cursor;
mod params;
mod row;
mod statement;

pub use connection::{Connection, MEMORY_LOCATION};
pub use cursor::{QueryResult, ResultCursor, RowSequence, SequenceState};
pub use row::{FromColumn, Row};
pub use statement::{rewrite_statement, DATA_TYPE_TOKEN, PLACEHOLDER_TOKEN, TO_TIMESTAMP_TOKEN};
