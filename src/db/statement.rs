//! Statement module - owned native statement handles and the prepare step

use crate::error::{Error, Result, SqlError};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::ffi;
use std::borrow::Cow;
use std::os::raw::{c_char, c_int};
use std::ptr::{self, NonNull};
use tracing::warn;

/// Positional placeholder emitted by the query layer
pub const PLACEHOLDER_TOKEN: &str = "%@";
/// Stand-in for the engine's timestamp conversion function
pub const TO_TIMESTAMP_TOKEN: &str = "====to_timestamp====";
/// Stand-in for the engine's binary data type name
pub const DATA_TYPE_TOKEN: &str = "====data_type====";

static REWRITE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        "{}|{}|{}",
        regex::escape(TO_TIMESTAMP_TOKEN),
        regex::escape(PLACEHOLDER_TOKEN),
        regex::escape(DATA_TYPE_TOKEN),
    ))
    .expect("rewrite tokens form a valid pattern")
});

/// Replace the query layer's reserved tokens with their SQLite spelling
pub fn rewrite_statement(sql: &str) -> Cow<'_, str> {
    REWRITE_REGEX.replace_all(sql, |caps: &regex::Captures| match &caps[0] {
        PLACEHOLDER_TOKEN => "?",
        TO_TIMESTAMP_TOKEN => "datetime",
        _ => "data",
    })
}

/// A prepared statement, finalized exactly once when dropped
pub(crate) struct StatementHandle {
    raw: NonNull<ffi::sqlite3_stmt>,
}

impl StatementHandle {
    pub(crate) fn as_ptr(&self) -> *mut ffi::sqlite3_stmt {
        self.raw.as_ptr()
    }

    /// Advance the statement by one step and return the native status
    pub(crate) fn step(&self) -> c_int {
        unsafe { ffi::sqlite3_step(self.as_ptr()) }
    }

    /// Connection that owns this statement
    pub(crate) fn db(&self) -> *mut ffi::sqlite3 {
        unsafe { ffi::sqlite3_db_handle(self.as_ptr()) }
    }
}

impl Drop for StatementHandle {
    fn drop(&mut self) {
        // The status repeats the last step's error, which was already reported
        unsafe {
            ffi::sqlite3_finalize(self.as_ptr());
        }
    }
}

/// Outcome of one prepare + bind + first step cycle
pub(crate) struct PreparedExecution {
    pub(crate) status: c_int,
    pub(crate) handle: StatementHandle,
}

/// Compile `sql` on `db`.
///
/// A partially built handle is finalized before the error is returned.
///
/// # Safety
/// `db` must be a live connection handle.
pub(crate) unsafe fn prepare(db: *mut ffi::sqlite3, sql: &str) -> Result<StatementHandle> {
    let len = c_int::try_from(sql.len()).map_err(|_| {
        Error::Prepare(SqlError::new(format!(
            "Error preparing statement: statement of {} bytes is too long",
            sql.len()
        )))
    })?;

    let mut raw: *mut ffi::sqlite3_stmt = ptr::null_mut();
    let status = ffi::sqlite3_prepare_v2(
        db,
        sql.as_ptr() as *const c_char,
        len,
        &mut raw,
        ptr::null_mut(),
    );

    if status != ffi::SQLITE_OK {
        let diagnostic = SqlError::from_native(db, Some(status), None).message;
        let err = SqlError {
            message: format!("Error preparing statement: {}", diagnostic),
            more_information: Some(diagnostic),
        };
        ffi::sqlite3_finalize(raw);
        return Err(Error::Prepare(err));
    }

    match NonNull::new(raw) {
        Some(raw) => Ok(StatementHandle { raw }),
        None => {
            warn!("statement contained no SQL");
            Err(Error::Prepare(SqlError::new(
                "Error preparing statement: statement contains no SQL",
            )))
        }
    }
}
