use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::error::Status;

/// Outcome of `Query.exec()` on the JS side
#[napi(object)]
#[derive(Serialize, Deserialize, Debug)]
pub struct QueryResult {
    pub status: i32,
    pub message: Option<String>,
    pub changes: i64,
    pub last_insert_rowid: i64,
}

impl QueryResult {
    pub(crate) fn new(status: &Status, changes: u64, last_insert_rowid: i64) -> Self {
        QueryResult {
            status: status.code(),
            message: status.message().map(str::to_string),
            changes: i64::try_from(changes).unwrap_or(i64::MAX),
            last_insert_rowid,
        }
    }
}
