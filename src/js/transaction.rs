use napi::Result;
use napi_derive::napi;

use super::{lock, SharedDatabase};
use crate::db::Lifecycle;

/// Transaction exposed to JS as `Transaction`
///
/// Rolled back when garbage collected while still active.
#[napi(js_name = "Transaction")]
pub struct JsTransaction {
    db: SharedDatabase,
    lifecycle: Lifecycle,
}

impl JsTransaction {
    pub(crate) fn new(db: SharedDatabase, lifecycle: Lifecycle) -> Self {
        JsTransaction { db, lifecycle }
    }
}

#[napi]
impl JsTransaction {
    #[napi]
    pub fn begin(&mut self) -> Result<()> {
        let db = lock(&self.db)?;
        self.lifecycle.begin(&db)?;
        Ok(())
    }

    #[napi]
    pub fn commit(&mut self) -> Result<()> {
        let db = lock(&self.db)?;
        self.lifecycle.commit(&db)?;
        Ok(())
    }

    #[napi]
    pub fn rollback(&mut self) -> Result<()> {
        let db = lock(&self.db)?;
        self.lifecycle.rollback(&db)?;
        Ok(())
    }

    /// "not started", "active", "committed" or "rolled back"
    #[napi(getter)]
    pub fn state(&self) -> String {
        self.lifecycle.state().to_string()
    }
}

impl Drop for JsTransaction {
    fn drop(&mut self) {
        match self.db.lock() {
            Ok(db) => self.lifecycle.release(&db),
            Err(_) => tracing::warn!("DB Lock failed while releasing transaction"),
        }
    }
}
