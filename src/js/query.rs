use napi::bindgen_prelude::{Buffer, Either, Either3};
use napi::Result;
use napi_derive::napi;

use super::{lock, SharedDatabase};
use crate::db::{field_from_json, ParamKey, PendingStatement, Query};
use crate::models::QueryResult;

/// Reusable query exposed to JS as `Query`
#[napi(js_name = "Query")]
pub struct JsQuery {
    db: SharedDatabase,
    pending: PendingStatement,
    insert_id: i64,
    affected_rows: u64,
}

impl JsQuery {
    pub(crate) fn new(db: SharedDatabase, sql: String) -> Self {
        JsQuery {
            db,
            pending: PendingStatement::new(sql),
            insert_id: 0,
            affected_rows: 0,
        }
    }

    /// Run `f` against a core query holding this object's pending state.
    fn with_query<T>(&mut self, f: impl FnOnce(&mut Query<'_>) -> T) -> Result<T> {
        let db = lock(&self.db)?;
        let mut query = Query::resume(&db, std::mem::take(&mut self.pending));
        let out = f(&mut query);
        self.pending = query.into_pending();
        Ok(out)
    }
}

fn param_key(key: Either<u32, String>) -> ParamKey {
    match key {
        Either::A(position) => ParamKey::from(position),
        Either::B(name) => ParamKey::from(name),
    }
}

#[napi]
impl JsQuery {
    #[napi(getter)]
    pub fn sql(&self) -> String {
        self.pending.sql().to_string()
    }

    #[napi(setter, js_name = "sql")]
    pub fn set_sql(&mut self, sql: String) {
        self.pending.set_sql(sql);
    }

    /// Append text, a number rendered into the SQL, or a Buffer bound as
    /// the next positional parameter
    #[napi]
    pub fn append(&mut self, part: Either3<String, f64, Buffer>) {
        match part {
            Either3::A(text) => self.pending.append(text),
            Either3::B(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                self.pending.append(n as i64)
            }
            Either3::B(n) => self.pending.append(n),
            Either3::C(blob) => self.pending.append(blob.to_vec()),
        }
    }

    /// Bind a JSON value (number, string, boolean, null; arrays/objects as JSON text)
    #[napi]
    pub fn bind(&mut self, key: Either<u32, String>, value: serde_json::Value) {
        self.pending.bind(param_key(key), field_from_json(&value));
    }

    #[napi]
    pub fn bind_blob(&mut self, key: Either<u32, String>, value: Buffer) {
        self.pending.bind(param_key(key), value.to_vec());
    }

    /// Execute the pending statement, or `sql` in its place
    #[napi]
    pub fn exec(&mut self, sql: Option<String>) -> Result<QueryResult> {
        let (status, insert_id, affected_rows) = self.with_query(|query| {
            let status = match sql {
                Some(sql) => query.exec_sql(sql),
                None => query.exec(),
            };
            (status, query.insert_id(), query.affected_rows())
        })?;
        self.insert_id = insert_id;
        self.affected_rows = affected_rows;
        Ok(QueryResult::new(&status, affected_rows, insert_id))
    }

    #[napi(getter)]
    pub fn insert_id(&self) -> i64 {
        self.insert_id
    }

    #[napi(getter)]
    pub fn affected_rows(&self) -> i64 {
        i64::try_from(self.affected_rows).unwrap_or(i64::MAX)
    }

    /// Execute query and return all rows as objects
    #[napi]
    pub fn store(&mut self) -> Result<serde_json::Value> {
        let result = self.with_query(|query| query.store())??;
        Ok(result.to_json())
    }

    /// Execute query and return all rows as arrays (values)
    #[napi]
    pub fn values(&mut self) -> Result<serde_json::Value> {
        let result = self.with_query(|query| query.store())??;
        Ok(serde_json::Value::Array(
            result.iter().map(|row| row.to_json_array()).collect(),
        ))
    }
}
