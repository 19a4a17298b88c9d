//! Row module - one record of typed fields addressable by position or column name

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{Field, FromField};
use crate::error::{Error, Result};

/// Something that selects a column: a 0-based position or a column name.
pub trait ColumnIndex {
    fn resolve(&self, columns: &[String], len: usize) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, _columns: &[String], len: usize) -> Result<usize> {
        if *self < len {
            Ok(*self)
        } else {
            Err(Error::Index { index: *self, len })
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, columns: &[String], _len: usize) -> Result<usize> {
        columns
            .iter()
            .position(|c| c == self)
            .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(self)))
            .ok_or_else(|| Error::Lookup(self.to_string()))
    }
}

impl ColumnIndex for &String {
    fn resolve(&self, columns: &[String], len: usize) -> Result<usize> {
        self.as_str().resolve(columns, len)
    }
}

/// A single row. Rows from one result share their column names.
///
/// An empty row (no fields) marks the end of a stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    fields: Vec<Field>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, fields: Vec<Field>) -> Self {
        debug_assert_eq!(columns.len(), fields.len());
        Row { columns, fields }
    }

    pub fn empty() -> Self {
        Row {
            columns: Arc::from(Vec::new()),
            fields: Vec::new(),
        }
    }

    /// Copy the current record out of an engine cursor.
    pub(crate) fn from_sqlite(row: &rusqlite::Row<'_>, columns: &Arc<[String]>) -> rusqlite::Result<Self> {
        let fields = (0..columns.len())
            .map(|i| row.get_ref(i).map(Field::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Row::new(Arc::clone(columns), fields))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Field by position or column name.
    ///
    /// Names match exactly first, then ASCII case-insensitively, the way
    /// SQLite compares identifiers.
    ///
    /// Fails with [`Error::Index`] for a position past the end and
    /// [`Error::Lookup`] for an unknown column name.
    pub fn field<I: ColumnIndex>(&self, index: I) -> Result<&Field> {
        let i = index.resolve(&self.columns, self.fields.len())?;
        Ok(&self.fields[i])
    }

    /// Typed read of one field.
    pub fn get<T: FromField, I: ColumnIndex>(&self, index: I) -> Result<T> {
        self.field(index)?.get()
    }

    pub fn is_null<I: ColumnIndex>(&self, index: I) -> Result<bool> {
        Ok(self.field(index)?.is_null())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.columns.iter().map(String::as_str).zip(self.fields.iter())
    }

    /// Row as a JSON object keyed by column name
    pub fn to_json_object(&self) -> Value {
        let mut map = Map::new();
        for (name, field) in self.iter() {
            map.insert(name.to_string(), field.to_json());
        }
        Value::Object(map)
    }

    /// Row as a JSON array of values in column order
    pub fn to_json_array(&self) -> Value {
        Value::Array(self.fields.iter().map(Field::to_json).collect())
    }
}

impl Default for Row {
    fn default() -> Self {
        Row::empty()
    }
}
