use std::sync::{Arc, Mutex};

use napi::Result;
use napi_derive::napi;

use super::{lock, JsQuery, JsTransaction, SharedDatabase};
use crate::config::DatabaseConfig;
use crate::db::{Database, Lifecycle, TransactionMode};

/// Database connection exposed to JS as `Database`
#[napi(js_name = "Database")]
pub struct JsDatabase {
    inner: SharedDatabase,
}

#[napi]
impl JsDatabase {
    /// Open a database; `config` is a partial `DatabaseConfig` object
    #[napi(constructor)]
    pub fn new(path: String, config: Option<serde_json::Value>) -> Result<Self> {
        let config = match config {
            Some(value) => DatabaseConfig::from_value(value)?,
            None => DatabaseConfig::default(),
        };
        let db = Database::open_with(&path, &config)?;
        Ok(JsDatabase {
            inner: Arc::new(Mutex::new(db)),
        })
    }

    #[napi]
    pub fn is_open(&self) -> Result<bool> {
        Ok(lock(&self.inner)?.is_open())
    }

    #[napi]
    pub fn version(&self) -> String {
        rusqlite::version().to_string()
    }

    #[napi]
    pub fn vacuum(&self) -> Result<()> {
        lock(&self.inner)?.vacuum()?;
        Ok(())
    }

    #[napi]
    pub fn close(&self) -> Result<()> {
        lock(&self.inner)?.close()?;
        Ok(())
    }

    /// Execute SQL directly, one or more statements, no parameters
    #[napi]
    pub fn exec(&self, sql: String) -> Result<()> {
        lock(&self.inner)?.execute_batch(&sql)?;
        Ok(())
    }

    /// Create a reusable query
    #[napi]
    pub fn query(&self, sql: Option<String>) -> JsQuery {
        JsQuery::new(self.inner.clone(), sql.unwrap_or_default())
    }

    /// Begin a transaction
    /// Modes: "deferred" (default), "immediate", "exclusive"
    #[napi]
    pub fn transaction(&self, mode: Option<String>) -> Result<JsTransaction> {
        let mut lifecycle = Lifecycle::new(TransactionMode::parse(mode.as_deref()));
        let db = lock(&self.inner)?;
        lifecycle.begin(&db)?;
        drop(db);
        Ok(JsTransaction::new(self.inner.clone(), lifecycle))
    }
}
