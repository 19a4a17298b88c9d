//! Node.js bindings - N-API classes over the database module
//!
//! JS objects cannot hold borrows, so every class shares the connection
//! through `Arc<Mutex<Database>>` and locks it per call.

mod database;
mod query;
mod transaction;

use std::sync::{Arc, Mutex, MutexGuard};

use napi::{Error, Result};

use crate::db::Database;

pub use database::JsDatabase;
pub use query::JsQuery;
pub use transaction::JsTransaction;

pub(crate) type SharedDatabase = Arc<Mutex<Database>>;

pub(crate) fn lock(db: &SharedDatabase) -> Result<MutexGuard<'_, Database>> {
    db.lock().map_err(|_| Error::from_reason("DB Lock failed"))
}
