//! Database module - provides the Database struct for SQLite connections

use std::time::Duration;

use rusqlite::{Connection, OpenFlags};

use super::{Query, Transaction, TransactionMode};
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Path that opens a transient in-memory database
pub const MEMORY: &str = ":memory:";

/// Database connection struct - owns one SQLite connection
///
/// Queries and transactions borrow the database, so it cannot be closed
/// while any of them is alive.
pub struct Database {
    conn: Option<Connection>,
    path: String,
}

impl Database {
    /// Open a database with the default configuration.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, &DatabaseConfig::default())
    }

    /// Open a database; `":memory:"` opens an in-memory one.
    ///
    /// Fails with [`Error::Connection`] if the engine cannot open the target
    /// or reject the configuration PRAGMAs.
    pub fn open_with(path: &str, config: &DatabaseConfig) -> Result<Self> {
        let connection_error = |err: rusqlite::Error| Error::Connection {
            path: path.to_string(),
            message: err.to_string(),
        };

        let in_memory = path == MEMORY;
        let conn = if in_memory {
            Connection::open_in_memory()
        } else if config.read_only {
            Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
        } else {
            Connection::open(path)
        }
        .map_err(connection_error)?;

        conn.execute_batch(&config.pragmas(in_memory))
            .map_err(connection_error)?;
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))
                .map_err(connection_error)?;
        }

        tracing::debug!(path, in_memory, read_only = config.read_only, "Opened database");
        Ok(Database {
            conn: Some(conn),
            path: path.to_string(),
        })
    }

    /// Open a transient in-memory database.
    pub fn memory() -> Result<Self> {
        Self::open(MEMORY)
    }

    pub(crate) fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Version string of the linked SQLite engine
    pub fn version(&self) -> &'static str {
        rusqlite::version()
    }

    /// Whether the connection is inside an explicit transaction.
    pub fn in_transaction(&self) -> bool {
        self.conn.as_ref().is_some_and(|c| !c.is_autocommit())
    }

    /// Rebuild the database file, e.g. after many deletes.
    pub fn vacuum(&self) -> Result<()> {
        self.conn()?.execute_batch("VACUUM")?;
        tracing::debug!(path = %self.path, "Vacuumed database");
        Ok(())
    }

    /// Execute one or more SQL statements without parameters
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    /// Close the connection. Closing twice is a no-op.
    ///
    /// On failure the connection stays open and [`Error::Connection`] is returned.
    pub fn close(&mut self) -> Result<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match conn.close() {
            Ok(()) => {
                tracing::debug!(path = %self.path, "Closed database");
                Ok(())
            }
            Err((conn, err)) => {
                self.conn = Some(conn);
                Err(Error::Connection {
                    path: self.path.clone(),
                    message: err.to_string(),
                })
            }
        }
    }

    /// Create a query bound to this database
    pub fn query(&self, sql: impl Into<String>) -> Query<'_> {
        Query::new(self, sql)
    }

    /// Begin a DEFERRED transaction
    pub fn transaction(&self) -> Result<Transaction<'_>> {
        Transaction::new(self)
    }

    /// Begin a transaction with the given mode
    pub fn transaction_with(&self, mode: TransactionMode) -> Result<Transaction<'_>> {
        Transaction::with_mode(self, mode)
    }

    /// Run `f` inside a transaction: commit when it returns `Ok` (unless it
    /// already resolved the transaction itself), roll back when it returns `Err`.
    pub fn transaction_scope<T, F>(&self, mode: TransactionMode, f: F) -> Result<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let mut tx = Transaction::with_mode(self, mode)?;
        let value = f(&mut tx)?;
        if tx.is_active() {
            tx.commit()?;
        }
        Ok(value)
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            tracing::warn!(path = %self.path, error = %err, "Failed to close database");
        }
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
