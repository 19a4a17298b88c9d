//! Database module - connections, queries, results and transactions over SQLite

mod database;
mod field;
mod params;
mod query;
mod result;
mod row;
mod stream;
mod transaction;

pub use database::{Database, MEMORY};
pub use field::{Field, FromField, SqliteType};
pub use params::{field_from_json, ParamKey, Params, QueryPart};
pub use query::{PendingStatement, Query};
pub use result::ResultSet;
pub use row::{ColumnIndex, Row};
pub use stream::RowStream;
pub(crate) use transaction::Lifecycle;
pub use transaction::{Savepoint, Transaction, TransactionMode, TransactionState};
