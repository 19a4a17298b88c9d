//! Query module - reusable SQL statements with pending parameters

use std::sync::Arc;

use rusqlite::Statement;

use super::{Database, Field, ParamKey, Params, QueryPart, ResultSet, RowStream};
use crate::error::{Result, Status};

/// SQL text and parameters waiting for the next execution.
///
/// Executing "spends" the text: the next [`append`](Self::append) starts a new
/// statement instead of extending the one that already ran. Parameters are
/// consumed by the execution that uses them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingStatement {
    sql: String,
    spent: bool,
    params: Params,
}

impl PendingStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        PendingStatement {
            sql: sql.into(),
            spent: false,
            params: Params::new(),
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_sql(&mut self, sql: impl Into<String>) {
        self.sql = sql.into();
        self.spent = false;
    }

    pub fn append<P: QueryPart>(&mut self, part: P) {
        if self.spent {
            self.sql.clear();
            self.spent = false;
        }
        part.append_to(&mut self.sql, &mut self.params);
    }

    pub fn bind(&mut self, key: impl Into<ParamKey>, value: impl Into<Field>) {
        self.params.bind(key, value);
    }

    pub fn clear_params(&mut self) {
        self.params.clear();
    }

    /// Hand the parameters to an execution and mark the text as run.
    fn take_for_execution(&mut self) -> Params {
        self.spent = true;
        std::mem::take(&mut self.params)
    }
}

/// A statement bound to a connection, reusable across executions.
///
/// ```ignore
/// let mut q = Query::new(&db, "INSERT INTO test (data) VALUES (?1)");
/// q.bind(1, vec![0u8, 1, 2]);
/// assert!(q.exec().is_ok());
/// let id = q.insert_id();
/// ```
pub struct Query<'db> {
    db: &'db Database,
    pending: PendingStatement,
    cursor: Option<Statement<'db>>,
    insert_id: i64,
    affected_rows: u64,
    status: Status,
}

impl<'db> Query<'db> {
    pub fn new(db: &'db Database, sql: impl Into<String>) -> Self {
        Self::resume(db, PendingStatement::new(sql))
    }

    /// Pick up text and parameters prepared elsewhere.
    pub fn resume(db: &'db Database, pending: PendingStatement) -> Self {
        Query {
            db,
            pending,
            cursor: None,
            insert_id: 0,
            affected_rows: 0,
            status: Status::OK,
        }
    }

    /// Give back the text and any parameters not yet consumed.
    pub fn into_pending(self) -> PendingStatement {
        self.pending
    }

    pub fn sql(&self) -> &str {
        self.pending.sql()
    }

    /// Replace the pending SQL text. Bound parameters are kept.
    pub fn set_sql(&mut self, sql: impl Into<String>) -> &mut Self {
        self.pending.set_sql(sql);
        self
    }

    /// Extend the pending SQL text; see [`QueryPart`] for how each part lands.
    pub fn append<P: QueryPart>(&mut self, part: P) -> &mut Self {
        self.pending.append(part);
        self
    }

    pub fn bind(&mut self, key: impl Into<ParamKey>, value: impl Into<Field>) -> &mut Self {
        self.pending.bind(key, value);
        self
    }

    pub fn param_count(&self) -> usize {
        self.pending.params().len()
    }

    pub fn clear_params(&mut self) -> &mut Self {
        self.pending.clear_params();
        self
    }

    /// Rowid of the last insert, captured right after this query's last `exec`.
    pub fn insert_id(&self) -> i64 {
        self.insert_id
    }

    /// Rows changed by the last INSERT/UPDATE/DELETE, captured right after
    /// this query's last `exec`.
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn last_status(&self) -> &Status {
        &self.status
    }

    /// Run the pending statement to completion.
    ///
    /// Never fails with `Err`: malformed SQL, constraint violations and binding
    /// problems come back as a non-zero [`Status`]. Parameters are cleared
    /// either way.
    pub fn exec(&mut self) -> Status {
        self.cursor = None;
        let params = self.pending.take_for_execution();
        let status = match self.run(&params) {
            Ok(()) => Status::OK,
            Err(err) => Status::from_error(&err),
        };
        if status.is_ok() {
            tracing::debug!(sql = %self.pending.sql(), changes = self.affected_rows, "Executed query");
        } else {
            tracing::debug!(sql = %self.pending.sql(), code = status.code(), "Query failed");
        }
        self.status = status.clone();
        status
    }

    /// Replace the pending SQL with `sql`, then [`exec`](Self::exec).
    ///
    /// Any text assembled before is discarded; parameters already bound are
    /// used for the new statement.
    pub fn exec_sql(&mut self, sql: impl Into<String>) -> Status {
        self.pending.set_sql(sql);
        self.exec()
    }

    fn run(&mut self, params: &Params) -> Result<()> {
        let db = self.db;
        let conn = db.conn()?;
        let mut stmt = conn.prepare(self.pending.sql())?;
        params.bind_to(&mut stmt)?;
        if stmt.column_count() == 0 {
            stmt.raw_execute()?;
        } else {
            let mut rows = stmt.raw_query();
            while rows.next()?.is_some() {}
        }
        self.insert_id = conn.last_insert_rowid();
        self.affected_rows = conn.changes();
        Ok(())
    }

    /// Fetch every row of the pending statement.
    pub fn store(&mut self) -> Result<ResultSet> {
        let mut stream = self.stream()?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next_row()? {
            rows.push(row);
        }
        let columns = Arc::clone(stream.columns());
        tracing::debug!(rows = rows.len(), "Stored result set");
        Ok(ResultSet::new(columns, rows))
    }

    /// Start streaming the pending statement one row at a time.
    ///
    /// The first [`RowStream::use_next`] returns the first row. Fails with
    /// [`Error::Execution`](crate::Error::Execution) when the statement cannot be prepared or bound.
    pub fn stream(&mut self) -> Result<RowStream<'_>> {
        self.cursor = None;
        let params = self.pending.take_for_execution();
        let db = self.db;
        let conn = db.conn()?;
        let mut stmt = conn.prepare(self.pending.sql())?;
        params.bind_to(&mut stmt)?;
        let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();
        tracing::debug!(sql = %self.pending.sql(), "Streaming query");
        let stmt = self.cursor.insert(stmt);
        Ok(RowStream::new(stmt.raw_query(), columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_after_execution_starts_fresh() {
        let mut pending = PendingStatement::new("SELECT 1");
        pending.append(" WHERE 1");
        assert_eq!(pending.sql(), "SELECT 1 WHERE 1");

        let params = pending.take_for_execution();
        assert!(params.is_empty());
        pending.append("UPDATE test SET num=");
        pending.append(10);
        pending.append(" WHERE id=2");
        assert_eq!(pending.sql(), "UPDATE test SET num=10 WHERE id=2");
    }

    #[test]
    fn test_set_sql_keeps_params() {
        let mut pending = PendingStatement::new("THIS QUERY SHOULD GET DISCARDED");
        pending.bind(1, vec![1u8, 2, 3]);
        pending.set_sql("INSERT INTO test (data) VALUES (?1)");
        assert_eq!(pending.params().len(), 1);
        let params = pending.take_for_execution();
        assert_eq!(params.len(), 1);
        assert!(pending.params().is_empty());
    }
}
