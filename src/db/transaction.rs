//! Transaction module - scoped SQLite transactions and savepoints

use std::fmt;

use super::Database;
use crate::error::{Error, Result};

/// How BEGIN acquires locks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    #[default]
    Deferred,
    Immediate,
    Exclusive,
}

impl TransactionMode {
    /// Modes: "deferred" (default), "immediate", "exclusive"
    pub fn parse(mode: Option<&str>) -> Self {
        match mode {
            Some("immediate") => TransactionMode::Immediate,
            Some("exclusive") => TransactionMode::Exclusive,
            _ => TransactionMode::Deferred,
        }
    }

    fn begin_sql(&self) -> &'static str {
        match self {
            TransactionMode::Deferred => "BEGIN DEFERRED",
            TransactionMode::Immediate => "BEGIN IMMEDIATE",
            TransactionMode::Exclusive => "BEGIN EXCLUSIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    NotStarted,
    Active,
    Committed,
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionState::NotStarted => "not started",
            TransactionState::Active => "active",
            TransactionState::Committed => "committed",
            TransactionState::RolledBack => "rolled back",
        })
    }
}

/// State machine behind [`Transaction`], also driven by the JS binding
/// which cannot hold a borrowed connection.
#[derive(Debug, Clone)]
pub(crate) struct Lifecycle {
    state: TransactionState,
    mode: TransactionMode,
}

impl Lifecycle {
    pub(crate) fn new(mode: TransactionMode) -> Self {
        Lifecycle {
            state: TransactionState::NotStarted,
            mode,
        }
    }

    pub(crate) fn state(&self) -> TransactionState {
        self.state
    }

    pub(crate) fn begin(&mut self, db: &Database) -> Result<()> {
        if self.state == TransactionState::Active {
            return Err(Error::State {
                operation: "begin",
                state: self.state,
            });
        }
        db.conn()?.execute_batch(self.mode.begin_sql())?;
        self.state = TransactionState::Active;
        tracing::debug!(mode = ?self.mode, "Began transaction");
        Ok(())
    }

    pub(crate) fn commit(&mut self, db: &Database) -> Result<()> {
        self.finish(db, "commit", "COMMIT", TransactionState::Committed)
    }

    pub(crate) fn rollback(&mut self, db: &Database) -> Result<()> {
        self.finish(db, "rollback", "ROLLBACK", TransactionState::RolledBack)
    }

    fn finish(
        &mut self,
        db: &Database,
        operation: &'static str,
        sql: &str,
        target: TransactionState,
    ) -> Result<()> {
        if self.state != TransactionState::Active {
            return Err(Error::State {
                operation,
                state: self.state,
            });
        }
        let conn = db.conn()?;
        match conn.execute_batch(sql) {
            Ok(()) => {
                self.state = target;
                tracing::debug!(state = %self.state, "Finished transaction");
                Ok(())
            }
            Err(err) => {
                // A failed COMMIT may already have rolled the engine back
                if conn.is_autocommit() {
                    self.state = TransactionState::RolledBack;
                }
                Err(err.into())
            }
        }
    }

    /// Roll back if still active; failures are logged, never raised.
    pub(crate) fn release(&mut self, db: &Database) {
        if self.state != TransactionState::Active {
            return;
        }
        match self.rollback(db) {
            Ok(()) => tracing::debug!("Rolled back unresolved transaction on scope exit"),
            Err(err) => tracing::warn!(error = %err, "Rollback on scope exit failed"),
        }
    }
}

/// A transaction tied to a scope.
///
/// Created active. If it is still active when it goes out of scope, by any
/// path including `?` and panics, it is rolled back.
pub struct Transaction<'db> {
    db: &'db Database,
    lifecycle: Lifecycle,
}

impl<'db> Transaction<'db> {
    /// Begin a DEFERRED transaction.
    pub fn new(db: &'db Database) -> Result<Self> {
        Self::with_mode(db, TransactionMode::Deferred)
    }

    pub fn with_mode(db: &'db Database, mode: TransactionMode) -> Result<Self> {
        let mut tx = Self::not_started(db, mode);
        tx.begin()?;
        Ok(tx)
    }

    /// A transaction object that has not issued BEGIN yet.
    pub fn not_started(db: &'db Database, mode: TransactionMode) -> Self {
        Transaction {
            db,
            lifecycle: Lifecycle::new(mode),
        }
    }

    pub fn state(&self) -> TransactionState {
        self.lifecycle.state()
    }

    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    /// Start again after a commit or rollback. Fails with
    /// [`Error::State`] while active.
    pub fn begin(&mut self) -> Result<()> {
        self.lifecycle.begin(self.db)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.lifecycle.commit(self.db)
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.lifecycle.rollback(self.db)
    }

    /// Open a nested savepoint inside this active transaction.
    pub fn savepoint(&mut self, name: &str) -> Result<Savepoint<'_>> {
        if !self.is_active() {
            return Err(Error::State {
                operation: "savepoint",
                state: self.state(),
            });
        }
        Savepoint::open(self.db, name)
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.lifecycle.release(self.db);
    }
}

/// A named savepoint; rolled back to and released when dropped unresolved.
pub struct Savepoint<'t> {
    db: &'t Database,
    name: String,
    state: TransactionState,
}

impl<'t> Savepoint<'t> {
    fn open(db: &'t Database, name: &str) -> Result<Self> {
        let name = quote_identifier(name);
        db.conn()?.execute_batch(&format!("SAVEPOINT {}", name))?;
        Ok(Savepoint {
            db,
            name,
            state: TransactionState::Active,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Keep the savepoint's changes in the enclosing transaction.
    pub fn release(&mut self) -> Result<()> {
        self.ensure_active("release")?;
        self.db
            .conn()?
            .execute_batch(&format!("RELEASE SAVEPOINT {}", self.name))?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Discard the savepoint's changes; the enclosing transaction stays open.
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_active("rollback")?;
        self.db.conn()?.execute_batch(&format!(
            "ROLLBACK TO SAVEPOINT {0}; RELEASE SAVEPOINT {0}",
            self.name
        ))?;
        self.state = TransactionState::RolledBack;
        Ok(())
    }

    fn ensure_active(&self, operation: &'static str) -> Result<()> {
        if self.state == TransactionState::Active {
            Ok(())
        } else {
            Err(Error::State {
                operation,
                state: self.state,
            })
        }
    }
}

impl Drop for Savepoint<'_> {
    fn drop(&mut self) {
        if self.state == TransactionState::Active {
            if let Err(err) = self.rollback() {
                tracing::warn!(savepoint = %self.name, error = %err, "Savepoint rollback on scope exit failed");
            }
        }
    }
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
