//! SQLite driver for a generic, typed SQL abstraction.
//!
//! [`Connection`] prepares statements through the SQLite C API, binds
//! [`Value`] arguments, and hands back a [`QueryResult`] whose rows are
//! stepped lazily.
//!
//! ```
//! use sqlite_driver::{Connection, RowQuery, Value};
//!
//! let mut conn = Connection::in_memory();
//! conn.run("CREATE TABLE t (a INTEGER, b TEXT)", &[])?;
//! conn.run("INSERT INTO t VALUES (%@, %@)", &[Value::Int(1), Value::from("x")])?;
//!
//! let query = RowQuery::new("SELECT a, b FROM t", vec![]);
//! let mut result = conn.execute(&query)?;
//! let mut rows = result.rows();
//! while let Some(row) = rows.next() {
//!     let row = row?;
//!     assert_eq!(row.get::<i64>("a")?, Some(1));
//!     assert_eq!(row.data("b")?, Some(b"x".to_vec()));
//! }
//! # Ok::<_, sqlite_driver::Error>(())
//! ```

mod config;
pub mod db;
mod error;
mod models;
mod value;

pub use config::{ConnectionConfig, JournalMode};
pub use db::{
    Connection, FromColumn, QueryResult, ResultCursor, Row, RowSequence, SequenceState,
};
pub use error::{Error, Result, SqlError, UNKNOWN_ERROR};
pub use models::{json_extract_expr, AnyQuery, CommandQuery, RowQuery, RowReturningQuery, ROW_ID};
pub use value::{Point, Value, TIME_FORMAT};

/// Version of the linked SQLite library
pub fn sqlite_version() -> String {
    rusqlite::version().to_string()
}
