//! Result module - fully materialized result sets

use std::sync::Arc;

use serde_json::Value;

use super::Row;
use crate::error::{Error, Result};

/// Every row of a query, fetched up front. Row and column counts never change.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    columns: Arc<[String]>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub(crate) fn new(columns: Arc<[String]>, rows: Vec<Row>) -> Self {
        ResultSet { columns, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Column count of the statement, known even when no rows came back.
    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Result<&Row> {
        self.rows.get(index).ok_or(Error::Index {
            index,
            len: self.rows.len(),
        })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Rows as JSON objects keyed by column name
    pub fn to_json(&self) -> Value {
        Value::Array(self.rows.iter().map(Row::to_json_object).collect())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}
