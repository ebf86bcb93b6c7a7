//! Error types and the translation of native status codes into messages

use rusqlite::ffi;
use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_int;
use thiserror::Error;

/// Primary text used when SQLite has no diagnostic to offer
pub const UNKNOWN_ERROR: &str = "Unknown Error";

pub type Result<T> = std::result::Result<T, Error>;

/// A message plus the native diagnostic that accompanied it, if any.
///
/// Status codes are never kept: they are turned into text as soon as the
/// error is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlError {
    pub message: String,
    pub more_information: Option<String>,
}

impl SqlError {
    pub fn new(message: impl Into<String>) -> Self {
        SqlError {
            message: message.into(),
            more_information: None,
        }
    }

    /// Build an error from the state of a native connection.
    ///
    /// With a caller `message` the native diagnostic becomes the supplementary
    /// text; without one the diagnostic itself is the message, falling back
    /// to [`UNKNOWN_ERROR`].
    ///
    /// # Safety
    /// `db` must be null or a live connection handle.
    pub(crate) unsafe fn from_native(
        db: *mut ffi::sqlite3,
        code: Option<c_int>,
        message: Option<&str>,
    ) -> Self {
        let diagnostic = native_diagnostic(db, code);
        match message {
            Some(message) => SqlError {
                message: message.to_string(),
                more_information: diagnostic,
            },
            None => SqlError {
                message: diagnostic.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
                more_information: None,
            },
        }
    }
}

impl fmt::Display for SqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        match &self.more_information {
            Some(more) if !self.message.contains(more.as_str()) => write!(f, ": {}", more),
            _ => Ok(()),
        }
    }
}

impl std::error::Error for SqlError {}

/// Failures surfaced by the driver, tagged by the stage that produced them
#[derive(Debug, Error)]
pub enum Error {
    /// The database file could not be opened or configured
    #[error("{0}")]
    Open(SqlError),

    /// SQLite rejected the statement text
    #[error("{0}")]
    Prepare(SqlError),

    /// An argument could not be bound to its placeholder
    #[error("{0}")]
    Bind(SqlError),

    /// The first step of a statement ended in an unexpected status
    #[error("{0}")]
    Execution(SqlError),

    /// A column could not be turned into the requested value
    #[error("{0}")]
    Decode(SqlError),

    /// Stepping to a later row failed
    #[error("{0}")]
    Iteration(SqlError),
}

impl Error {
    pub fn detail(&self) -> &SqlError {
        match self {
            Error::Open(e)
            | Error::Prepare(e)
            | Error::Bind(e)
            | Error::Execution(e)
            | Error::Decode(e)
            | Error::Iteration(e) => e,
        }
    }

    pub fn message(&self) -> &str {
        &self.detail().message
    }

    pub fn more_information(&self) -> Option<&str> {
        self.detail().more_information.as_deref()
    }
}

fn is_failure(code: c_int) -> bool {
    !matches!(code, ffi::SQLITE_OK | ffi::SQLITE_ROW | ffi::SQLITE_DONE)
}

/// The most specific diagnostic available: the connection's last error
/// message when it reports one, else the generic text for `code`.
unsafe fn native_diagnostic(db: *mut ffi::sqlite3, code: Option<c_int>) -> Option<String> {
    // sqlite3_step leaves ROW/DONE in the error code; those are not failures
    if !db.is_null() && is_failure(ffi::sqlite3_errcode(db)) {
        if let Some(text) = c_text(ffi::sqlite3_errmsg(db)) {
            return Some(text);
        }
    }
    match code {
        Some(code) if is_failure(code) => c_text(ffi::sqlite3_errstr(code)),
        _ => None,
    }
}

pub(crate) unsafe fn c_text(ptr: *const std::os::raw::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}
