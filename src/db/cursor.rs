//! Cursor module - result cursors and the row sequence that walks them

use super::connection::Connection;
use super::row::Row;
use super::statement::StatementHandle;
use crate::error::{c_text, Error, Result, SqlError};
use crate::models::{AnyQuery, RowReturningQuery};
use once_cell::unsync::OnceCell;
use rusqlite::ffi;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::os::raw::c_int;

/// Column names in ordinal order plus the name lookup built from them
#[derive(Debug, Default)]
pub(crate) struct ColumnMap {
    pub(crate) names: Vec<String>,
    ordinals: HashMap<String, c_int>,
}

/// Position of a [`RowSequence`] over its cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceState {
    /// The row fetched during execution has not been handed out yet
    FirstPending,
    /// At least one row was handed out; the next call steps the engine
    Iterating,
    /// Done or failed; no further rows
    Exhausted,
}

/// Owns an executed statement and reads columns of its current row
pub struct ResultCursor<'conn> {
    handle: StatementHandle,
    commit_status: c_int,
    state: SequenceState,
    failed: Option<SqlError>,
    columns: OnceCell<ColumnMap>,
    _connection: PhantomData<&'conn mut Connection>,
}

impl<'conn> ResultCursor<'conn> {
    pub(crate) fn new(handle: StatementHandle, commit_status: c_int) -> Self {
        ResultCursor {
            handle,
            commit_status,
            state: SequenceState::FirstPending,
            failed: None,
            columns: OnceCell::new(),
            _connection: PhantomData,
        }
    }

    /// Rows changed by the most recent INSERT, UPDATE or DELETE on the
    /// connection
    pub fn count_affected(&self) -> usize {
        let changes = unsafe { ffi::sqlite3_changes(self.handle.db()) };
        usize::try_from(changes).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        let count = unsafe { ffi::sqlite3_column_count(self.handle.as_ptr()) };
        usize::try_from(count).unwrap_or(0)
    }

    /// Status of the step performed during execution
    pub fn commit_status(&self) -> c_int {
        self.commit_status
    }

    pub(crate) fn column_map(&self) -> &ColumnMap {
        self.columns.get_or_init(|| {
            let stmt = self.handle.as_ptr();
            let count = unsafe { ffi::sqlite3_column_count(stmt) };
            let mut map = ColumnMap::default();
            for ordinal in 0..count {
                let Some(name) = (unsafe { c_text(ffi::sqlite3_column_name(stmt, ordinal)) })
                else {
                    continue;
                };
                map.ordinals.insert(name.clone(), ordinal);
                map.names.push(name);
            }
            map
        })
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_map().names
    }

    pub(crate) fn ordinal(&self, name: &str) -> Option<c_int> {
        self.column_map().ordinals.get(name).copied()
    }

    pub(crate) fn stmt(&self) -> *mut ffi::sqlite3_stmt {
        self.handle.as_ptr()
    }

    /// Raw bytes of column `name` in the current row.
    ///
    /// `Ok(None)` means the column does not exist or holds NULL;
    /// `Ok(Some(vec![]))` means it holds an empty (or zero-length) value.
    /// Once stepping has failed, every call returns that failure.
    pub fn decode(&self, name: &str) -> Result<Option<Vec<u8>>> {
        if let Some(err) = &self.failed {
            return Err(Error::Iteration(err.clone()));
        }
        let Some(ordinal) = self.ordinal(name) else {
            return Ok(None);
        };

        let stmt = self.stmt();
        match unsafe { ffi::sqlite3_column_type(stmt, ordinal) } {
            ffi::SQLITE_NULL => return Ok(None),
            ffi::SQLITE_INTEGER | ffi::SQLITE_FLOAT | ffi::SQLITE_TEXT | ffi::SQLITE_BLOB => {}
            _ => {
                return Err(Error::Decode(SqlError::new(format!(
                    "Unexpected type for column '{}'",
                    name
                ))))
            }
        }

        // The pointer must be fetched before the length
        let bytes = unsafe {
            let raw = ffi::sqlite3_column_blob(stmt, ordinal) as *const u8;
            let length = ffi::sqlite3_column_bytes(stmt, ordinal);
            match usize::try_from(length) {
                Ok(length) if length > 0 && !raw.is_null() => {
                    std::slice::from_raw_parts(raw, length).to_vec()
                }
                _ => Vec::new(),
            }
        };
        Ok(Some(bytes))
    }

    fn advance(&mut self) -> Option<Result<()>> {
        let status = match self.state {
            SequenceState::Exhausted => return None,
            SequenceState::FirstPending => self.commit_status,
            SequenceState::Iterating => self.handle.step(),
        };

        match status {
            ffi::SQLITE_ROW => {
                self.state = SequenceState::Iterating;
                Some(Ok(()))
            }
            ffi::SQLITE_DONE => {
                self.state = SequenceState::Exhausted;
                None
            }
            status => {
                self.state = SequenceState::Exhausted;
                let err = unsafe {
                    SqlError::from_native(
                        self.handle.db(),
                        Some(status),
                        Some("Error getting next row"),
                    )
                };
                self.failed = Some(err.clone());
                Some(Err(Error::Iteration(err)))
            }
        }
    }
}

/// The outcome of [`Connection::execute`].
///
/// Holds the executed statement until dropped; rows are available when `Q`
/// returns rows.
pub struct QueryResult<'conn, Q: AnyQuery> {
    cursor: ResultCursor<'conn>,
    _query: PhantomData<fn() -> Q>,
}

impl<'conn, Q: AnyQuery> QueryResult<'conn, Q> {
    pub(crate) fn new(cursor: ResultCursor<'conn>) -> Self {
        QueryResult {
            cursor,
            _query: PhantomData,
        }
    }

    pub fn count_affected(&self) -> usize {
        self.cursor.count_affected()
    }

    pub fn cursor(&self) -> &ResultCursor<'conn> {
        &self.cursor
    }
}

impl<'conn, Q: RowReturningQuery> QueryResult<'conn, Q> {
    /// Walk the result rows.
    ///
    /// The sequence is single-pass: calling this again continues where the
    /// previous sequence stopped.
    pub fn rows(&mut self) -> RowSequence<'_, 'conn> {
        RowSequence {
            cursor: &mut self.cursor,
        }
    }

    pub fn column_names(&self) -> &[String] {
        self.cursor.column_names()
    }
}

/// Forward-only walk over a [`ResultCursor`].
///
/// Each [`Row`] borrows the sequence, so it is gone before the engine moves
/// to the next row.
pub struct RowSequence<'c, 'conn> {
    cursor: &'c mut ResultCursor<'conn>,
}

impl<'c, 'conn> RowSequence<'c, 'conn> {
    /// The next row, `None` once the rows are exhausted, or the error that
    /// ended the walk (after which `None` is returned forever).
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<Result<Row<'_, 'conn>>> {
        match self.cursor.advance()? {
            Ok(()) => Some(Ok(Row::new(self.cursor))),
            Err(err) => Some(Err(err)),
        }
    }

    pub fn state(&self) -> SequenceState {
        self.cursor.state
    }

    /// Apply `f` to every remaining row, stopping at the first error
    pub fn try_for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&Row<'_, 'conn>) -> Result<()>,
    {
        while let Some(row) = self.next() {
            f(&row?)?;
        }
        Ok(())
    }
}
