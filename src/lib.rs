use napi_derive::napi;

pub mod config;
pub mod db;
mod error;
pub mod js;
mod models;

pub use config::{DatabaseConfig, JournalMode, Synchronous};
pub use db::{
    ColumnIndex, Database, Field, FromField, ParamKey, Params, PendingStatement, Query, QueryPart,
    ResultSet, Row, RowStream, Savepoint, SqliteType, Transaction, TransactionMode,
    TransactionState, MEMORY,
};
pub use error::{to_napi_error, Error, Result, Status};
pub use js::{JsDatabase, JsQuery, JsTransaction};
pub use models::QueryResult;

/// Version string of the linked SQLite engine
pub fn sqlite_version() -> &'static str {
    rusqlite::version()
}

#[napi]
pub fn get_sqlite_version() -> String {
    sqlite_version().to_string()
}
