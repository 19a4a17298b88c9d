//! Stream module - forward-only row cursor over an open statement

use std::sync::Arc;

use rusqlite::Rows;

use super::Row;
use crate::error::{Result, Status};

/// Forward-only cursor returned by [`Query::stream`](super::Query::stream).
///
/// The cursor mutably borrows its query, so the query cannot run anything
/// else until the cursor is exhausted, aborted or dropped. Dropping it resets
/// the underlying statement.
pub struct RowStream<'q> {
    rows: Rows<'q>,
    columns: Arc<[String]>,
    exhausted: bool,
}

impl<'q> RowStream<'q> {
    pub(crate) fn new(rows: Rows<'q>, columns: Arc<[String]>) -> Self {
        RowStream {
            rows,
            columns,
            exhausted: false,
        }
    }

    pub fn columns(&self) -> &Arc<[String]> {
        &self.columns
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next record, `None` once the statement is done.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.rows.next() {
            Ok(Some(row)) => Ok(Some(Row::from_sqlite(row, &self.columns)?)),
            Ok(None) => {
                self.exhausted = true;
                Ok(None)
            }
            Err(err) => {
                self.exhausted = true;
                Err(err.into())
            }
        }
    }

    /// Next record, or an empty [`Row`] once the statement is done.
    pub fn use_next(&mut self) -> Result<Row> {
        Ok(self.next_row()?.unwrap_or_default())
    }

    /// Stop iterating and release the statement.
    ///
    /// Always succeeds: the statement is reset when the cursor is dropped and
    /// a failed reset only repeats an error already returned by `use_next`.
    pub fn abort(self) -> Status {
        tracing::debug!(exhausted = self.exhausted, "Aborted row stream");
        drop(self);
        Status::OK
    }
}

impl Iterator for RowStream<'_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}
