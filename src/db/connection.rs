//! Connection module - owns the native database handle and runs statements

use super::cursor::{QueryResult, ResultCursor};
use super::params::bind_arguments;
use super::statement::{prepare, rewrite_statement, PreparedExecution};
use crate::config::ConnectionConfig;
use crate::error::{Error, Result, SqlError};
use crate::models::AnyQuery;
use crate::value::Value;
use rusqlite::ffi;
use std::ffi::CString;
use std::os::raw::c_int;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use tracing::{debug, trace, warn};

/// Location that opens a private in-memory database
pub const MEMORY_LOCATION: &str = ":memory:";

const RUN_STATUSES: &[c_int] = &[ffi::SQLITE_ROW, ffi::SQLITE_DONE, ffi::SQLITE_OK];
const ROW_STATUSES: &[c_int] = &[ffi::SQLITE_ROW, ffi::SQLITE_DONE];
const COMMAND_STATUSES: &[c_int] = &[ffi::SQLITE_DONE, ffi::SQLITE_OK];

// libsqlite3-sys omits this from its prebuilt bindings; the bundled library
// still exports the symbol
extern "C" {
    fn sqlite3_close_v2(db: *mut ffi::sqlite3) -> c_int;
}

/// A SQLite database connection.
///
/// Starts disconnected; the first statement opens the database. The handle
/// is closed by [`Connection::disconnect`] or on drop.
#[derive(Debug)]
pub struct Connection {
    db: Option<NonNull<ffi::sqlite3>>,
    path: PathBuf,
    config: ConnectionConfig,
}

// SQLite is built threadsafe, so the handle may move between threads. Shared
// use is excluded because every statement-running method takes `&mut self`.
unsafe impl Send for Connection {}

impl Connection {
    /// A connection to the database at `path`, opened on first use.
    ///
    /// A path starting with `file:` is read as an SQLite URI filename, so
    /// query parameters such as `?mode=ro` apply.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, ConnectionConfig::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: ConnectionConfig) -> Self {
        Connection {
            db: None,
            path: path.into(),
            config,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_LOCATION)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_some()
    }

    fn raw(&self) -> *mut ffi::sqlite3 {
        self.db.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Open the database. Does nothing when already connected.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let location = self
            .path
            .to_str()
            .ok_or_else(|| open_error("database path is not valid UTF-8"))?;
        let c_location = CString::new(location)
            .map_err(|_| open_error("database path contains a NUL byte"))?;

        let flags = ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE | ffi::SQLITE_OPEN_URI;
        let mut raw: *mut ffi::sqlite3 = ptr::null_mut();
        let status =
            unsafe { ffi::sqlite3_open_v2(c_location.as_ptr(), &mut raw, flags, ptr::null()) };

        if status != ffi::SQLITE_OK {
            let err = unsafe { SqlError::from_native(raw, Some(status), None) };
            unsafe {
                ffi::sqlite3_close(raw);
            }
            debug!(path = %location, error = %err, "failed to open sqlite database");
            return Err(Error::Open(err));
        }

        let Some(db) = NonNull::new(raw) else {
            return Err(Error::Open(unsafe {
                SqlError::from_native(ptr::null_mut(), Some(ffi::SQLITE_NOMEM), None)
            }));
        };
        self.db = Some(db);
        debug!(path = %location, "opened sqlite database");

        if let Err(err) = self.configure() {
            warn!(path = %self.path.display(), error = %err, "failed to configure sqlite database");
            self.disconnect();
            return Err(Error::Open(err.detail().clone()));
        }
        Ok(())
    }

    fn configure(&mut self) -> Result<()> {
        let db = self.raw();
        unsafe {
            ffi::sqlite3_extended_result_codes(db, c_int::from(self.config.extended_result_codes));
        }
        if let Some(ms) = self.config.busy_timeout_ms {
            let ms = c_int::try_from(ms).unwrap_or(c_int::MAX);
            unsafe {
                ffi::sqlite3_busy_timeout(db, ms);
            }
        }
        for pragma in self.config.pragmas() {
            self.run(&pragma, &[])?;
        }
        Ok(())
    }

    /// Close the database if open. Never fails.
    pub fn disconnect(&mut self) {
        let Some(db) = self.db.take() else {
            return;
        };
        // Statements still alive elsewhere keep the handle as a zombie until
        // they are finalized
        let status = unsafe { sqlite3_close_v2(db.as_ptr()) };
        if status == ffi::SQLITE_OK {
            debug!(path = %self.path.display(), "closed sqlite database");
        } else {
            warn!(path = %self.path.display(), status, "sqlite3_close_v2 did not succeed");
        }
    }

    /// An error carrying `message` and the connection's latest diagnostic
    pub fn error(&self, message: &str) -> SqlError {
        unsafe { SqlError::from_native(self.raw(), None, Some(message)) }
    }

    /// Row id assigned by the most recent successful INSERT, or 0
    pub fn last_inserted_row_id(&self) -> i64 {
        match self.db {
            Some(db) => unsafe { ffi::sqlite3_last_insert_rowid(db.as_ptr()) },
            None => 0,
        }
    }

    /// Number of statements prepared on this connection and not yet finalized
    pub fn open_statement_count(&self) -> usize {
        let db = self.raw();
        if db.is_null() {
            return 0;
        }
        let mut count = 0;
        let mut stmt = unsafe { ffi::sqlite3_next_stmt(db, ptr::null_mut()) };
        while !stmt.is_null() {
            count += 1;
            stmt = unsafe { ffi::sqlite3_next_stmt(db, stmt) };
        }
        count
    }

    /// Run a statement and discard its result
    pub fn run(&mut self, statement: &str, arguments: &[Value]) -> Result<()> {
        self.execute_with(statement, arguments, RUN_STATUSES).map(drop)
    }

    /// Run `query` and return its result.
    ///
    /// Row-returning queries succeed on ROW or DONE, others on DONE or OK.
    pub fn execute<Q: AnyQuery>(&mut self, query: &Q) -> Result<QueryResult<'_, Q>> {
        let accepted = if Q::RETURNS_ROWS {
            ROW_STATUSES
        } else {
            COMMAND_STATUSES
        };
        let execution = self.execute_with(query.statement(), query.arguments(), accepted)?;
        Ok(QueryResult::new(ResultCursor::new(
            execution.handle,
            execution.status,
        )))
    }

    /// Prepare, bind and step once, then check the status against `accepted`.
    ///
    /// On every error path the statement handle is finalized before
    /// returning.
    fn execute_with(
        &mut self,
        statement: &str,
        arguments: &[Value],
        accepted: &[c_int],
    ) -> Result<PreparedExecution> {
        self.connect()?;
        let db = self.raw();

        let sql = rewrite_statement(statement);
        trace!(sql = %sql, arguments = arguments.len(), "preparing statement");

        let handle = unsafe { prepare(db, &sql)? };
        bind_arguments(&handle, arguments)?;
        let status = handle.step();

        if accepted.contains(&status) {
            Ok(PreparedExecution { status, handle })
        } else {
            let err = unsafe { SqlError::from_native(db, Some(status), None) };
            drop(handle);
            Err(Error::Execution(err))
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn open_error(message: &str) -> Error {
    Error::Open(SqlError::new(message))
}
