//! Row module - a view of the cursor's current row and typed column decoding

use super::cursor::ResultCursor;
use crate::error::{Error, Result, SqlError};
use crate::value::{Point, TIME_FORMAT};
use base64::Engine;
use chrono::NaiveTime;
use rusqlite::ffi;
use serde_json::{Map, Number, Value as JsonValue};

/// The cursor's current row.
///
/// Columns are read from SQLite when asked for, never ahead of time.
pub struct Row<'c, 'conn> {
    cursor: &'c ResultCursor<'conn>,
}

impl<'c, 'conn> Row<'c, 'conn> {
    pub(crate) fn new(cursor: &'c ResultCursor<'conn>) -> Self {
        Row { cursor }
    }

    /// Column names in result order
    pub fn columns(&self) -> &[String] {
        self.cursor.column_names()
    }

    /// Raw bytes of column `name`; see [`ResultCursor::decode`]
    pub fn data(&self, name: &str) -> Result<Option<Vec<u8>>> {
        self.cursor.decode(name)
    }

    /// Decode column `name` into `T`; `Ok(None)` for NULL or missing columns
    pub fn get<T: FromColumn>(&self, name: &str) -> Result<Option<T>> {
        match self.data(name)? {
            Some(bytes) => T::from_column(name, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Convert the row to a JSON object keyed by column name.
    ///
    /// Numbers and text keep their native storage class; blobs are base64
    /// encoded.
    pub fn to_json(&self) -> Result<Map<String, JsonValue>> {
        let stmt = self.cursor.stmt();
        let mut map = Map::new();
        for name in self.columns() {
            let Some(ordinal) = self.cursor.ordinal(name) else {
                continue;
            };
            let value = match unsafe { ffi::sqlite3_column_type(stmt, ordinal) } {
                ffi::SQLITE_INTEGER => {
                    JsonValue::Number(unsafe { ffi::sqlite3_column_int64(stmt, ordinal) }.into())
                }
                ffi::SQLITE_FLOAT => {
                    let f = unsafe { ffi::sqlite3_column_double(stmt, ordinal) };
                    Number::from_f64(f).map(JsonValue::Number).unwrap_or(JsonValue::Null)
                }
                ffi::SQLITE_TEXT => {
                    let bytes = self.data(name)?.unwrap_or_default();
                    JsonValue::String(String::from_utf8_lossy(&bytes).into_owned())
                }
                ffi::SQLITE_BLOB => {
                    let bytes = self.data(name)?.unwrap_or_default();
                    JsonValue::String(base64::engine::general_purpose::STANDARD.encode(bytes))
                }
                _ => JsonValue::Null,
            };
            map.insert(name.clone(), value);
        }
        Ok(map)
    }
}

/// Types that can be rebuilt from the bytes SQLite reports for a column.
///
/// SQLite hands numbers back in their text form, so numeric types parse
/// that text.
pub trait FromColumn: Sized {
    fn from_column(name: &str, bytes: &[u8]) -> Result<Self>;
}

fn decode_error(name: &str, expected: &str) -> Error {
    Error::Decode(SqlError::new(format!(
        "Column '{}' does not hold a valid {}",
        name, expected
    )))
}

fn column_str<'b>(name: &str, bytes: &'b [u8]) -> Result<&'b str> {
    std::str::from_utf8(bytes).map_err(|_| decode_error(name, "UTF-8 string"))
}

impl FromColumn for Vec<u8> {
    fn from_column(_name: &str, bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl FromColumn for String {
    fn from_column(name: &str, bytes: &[u8]) -> Result<Self> {
        column_str(name, bytes).map(str::to_string)
    }
}

macro_rules! impl_from_column_parse {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromColumn for $ty {
                fn from_column(name: &str, bytes: &[u8]) -> Result<Self> {
                    column_str(name, bytes)?
                        .trim()
                        .parse()
                        .map_err(|_| decode_error(name, $expected))
                }
            }
        )*
    };
}

impl_from_column_parse! {
    i32 => "32-bit integer",
    i64 => "64-bit integer",
    u64 => "unsigned 64-bit integer",
    f64 => "floating-point number",
}

impl FromColumn for bool {
    fn from_column(name: &str, bytes: &[u8]) -> Result<Self> {
        i64::from_column(name, bytes)
            .map(|i| i != 0)
            .map_err(|_| decode_error(name, "boolean"))
    }
}

impl FromColumn for NaiveTime {
    fn from_column(name: &str, bytes: &[u8]) -> Result<Self> {
        NaiveTime::parse_from_str(column_str(name, bytes)?, TIME_FORMAT)
            .map_err(|_| decode_error(name, "time of day"))
    }
}

impl FromColumn for Point {
    fn from_column(name: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|_| decode_error(name, "point"))
    }
}
