//! Params module - binds typed values to statement placeholders

use super::statement::StatementHandle;
use crate::error::{Error, Result, SqlError};
use crate::value::{Value, TIME_FORMAT};
use rusqlite::ffi;
use std::os::raw::{c_char, c_int, c_uchar, c_void};

const BIND_ERROR: &str = "Error binding arguments";

/// Bind every argument positionally, starting at index 1
pub(crate) fn bind_arguments(handle: &StatementHandle, arguments: &[Value]) -> Result<()> {
    for (offset, argument) in arguments.iter().enumerate() {
        let index = c_int::try_from(offset + 1).map_err(|_| {
            Error::Bind(SqlError::new(format!(
                "{}: too many arguments ({})",
                BIND_ERROR,
                arguments.len()
            )))
        })?;
        bind_value(handle, index, argument)?;
    }
    Ok(())
}

/// Bind one value at the 1-based `index`.
///
/// Integers of 32 bits or less use `sqlite3_bind_int`; wider ones use
/// `sqlite3_bind_int64` so no value is narrowed. Text and blobs are copied
/// by SQLite before this returns.
pub(crate) fn bind_value(handle: &StatementHandle, index: c_int, value: &Value) -> Result<()> {
    let stmt = handle.as_ptr();
    let status = unsafe {
        match value {
            Value::Null => ffi::sqlite3_bind_null(stmt, index),
            Value::String(s) => bind_text(stmt, index, s),
            Value::Data(data) => ffi::sqlite3_bind_blob64(
                stmt,
                index,
                data.as_ptr() as *const c_void,
                data.len() as ffi::sqlite3_uint64,
                ffi::SQLITE_TRANSIENT(),
            ),
            Value::Bool(b) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*b)),
            Value::Float(f) => ffi::sqlite3_bind_double(stmt, index, f64::from(*f)),
            Value::Double(d) => ffi::sqlite3_bind_double(stmt, index, *d),
            Value::Int8(i) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*i)),
            Value::Int16(i) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*i)),
            Value::Int32(i) => ffi::sqlite3_bind_int(stmt, index, *i),
            Value::UInt8(i) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*i)),
            Value::UInt16(i) => ffi::sqlite3_bind_int(stmt, index, c_int::from(*i)),
            Value::Int(i) | Value::Int64(i) => ffi::sqlite3_bind_int64(stmt, index, *i),
            Value::UInt32(i) => ffi::sqlite3_bind_int64(stmt, index, i64::from(*i)),
            Value::UInt(i) | Value::UInt64(i) => match i64::try_from(*i) {
                Ok(i) => ffi::sqlite3_bind_int64(stmt, index, i),
                Err(_) => {
                    return Err(Error::Bind(SqlError::new(format!(
                        "{}: argument {} ({}) does not fit in a 64-bit signed integer",
                        BIND_ERROR, index, i
                    ))))
                }
            },
            Value::Point(point) => bind_text(stmt, index, &point.to_json_text()),
            Value::Time(time) => bind_text(stmt, index, &time.format(TIME_FORMAT).to_string()),
        }
    };

    if status == ffi::SQLITE_OK {
        Ok(())
    } else {
        Err(Error::Bind(unsafe {
            SqlError::from_native(handle.db(), Some(status), Some(BIND_ERROR))
        }))
    }
}

unsafe fn bind_text(stmt: *mut ffi::sqlite3_stmt, index: c_int, text: &str) -> c_int {
    ffi::sqlite3_bind_text64(
        stmt,
        index,
        text.as_ptr() as *const c_char,
        text.len() as ffi::sqlite3_uint64,
        ffi::SQLITE_TRANSIENT(),
        ffi::SQLITE_UTF8 as c_uchar,
    )
}
