//! Params module - pending parameter sets and SQL text assembly parts

use rusqlite::Statement;
use serde_json::Value;

use super::Field;

/// Where a parameter goes: a 1-based position (`?1`, `?`) or a named token
/// (`@name`, `:name`, `$name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Position(usize),
    Name(String),
}

impl From<usize> for ParamKey {
    fn from(position: usize) -> Self {
        ParamKey::Position(position)
    }
}

// Integer literals default to i32, so `bind(1, ..)` lands here.
// Negative positions map to 0, which the engine rejects as out of range.
impl From<i32> for ParamKey {
    fn from(position: i32) -> Self {
        ParamKey::Position(usize::try_from(position).unwrap_or(0))
    }
}

impl From<u32> for ParamKey {
    fn from(position: u32) -> Self {
        ParamKey::Position(position as usize)
    }
}

impl From<&str> for ParamKey {
    fn from(name: &str) -> Self {
        ParamKey::Name(name.to_string())
    }
}

impl From<String> for ParamKey {
    fn from(name: String) -> Self {
        ParamKey::Name(name)
    }
}

/// Parameters waiting for the next execution, in binding order.
///
/// Binding the same key twice replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(ParamKey, Field)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: impl Into<ParamKey>, value: impl Into<Field>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Position following the highest positional parameter bound so far.
    pub fn next_position(&self) -> usize {
        self.entries
            .iter()
            .filter_map(|(key, _)| match key {
                ParamKey::Position(p) => Some(*p),
                ParamKey::Name(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1
    }

    pub fn get(&self, key: &ParamKey) -> Option<&Field> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &Field)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    /// Bind every pending value onto a freshly prepared statement.
    pub(crate) fn bind_to(&self, stmt: &mut Statement<'_>) -> rusqlite::Result<()> {
        for (key, value) in &self.entries {
            let index = match key {
                // the engine takes a C int; anything wider would wrap onto another slot
                ParamKey::Position(position) if i32::try_from(*position).is_err() => {
                    return Err(rusqlite::Error::InvalidParameterCount(
                        *position,
                        stmt.parameter_count(),
                    ));
                }
                ParamKey::Position(position) => *position,
                ParamKey::Name(name) => resolve_name(stmt, name)?,
            };
            stmt.raw_bind_parameter(index, value)?;
        }
        Ok(())
    }
}

/// Look a named parameter up as written, then with each SQLite prefix.
fn resolve_name(stmt: &Statement<'_>, name: &str) -> rusqlite::Result<usize> {
    if let Some(index) = stmt.parameter_index(name)? {
        return Ok(index);
    }
    if !name.starts_with([':', '@', '$']) {
        for prefix in [":", "@", "$"] {
            if let Some(index) = stmt.parameter_index(&format!("{}{}", prefix, name))? {
                return Ok(index);
            }
        }
    }
    Err(rusqlite::Error::InvalidParameterName(name.to_string()))
}

/// A piece appended to a query's SQL text.
///
/// Text is spliced in verbatim and numbers are rendered into the text.
/// Blobs have no textual form, so they are bound as the next positional
/// parameter instead.
pub trait QueryPart {
    fn append_to(self, sql: &mut String, params: &mut Params);
}

impl QueryPart for &str {
    fn append_to(self, sql: &mut String, _params: &mut Params) {
        sql.push_str(self);
    }
}

impl QueryPart for String {
    fn append_to(self, sql: &mut String, _params: &mut Params) {
        sql.push_str(&self);
    }
}

impl QueryPart for &String {
    fn append_to(self, sql: &mut String, _params: &mut Params) {
        sql.push_str(self);
    }
}

macro_rules! integer_part {
    ($($t:ty),*) => {
        $(impl QueryPart for $t {
            fn append_to(self, sql: &mut String, _params: &mut Params) {
                sql.push_str(&self.to_string());
            }
        })*
    };
}

integer_part!(i32, i64, u32, u64, usize);

// Debug keeps the decimal point, so `1.0` is not read back as an integer.
impl QueryPart for f64 {
    fn append_to(self, sql: &mut String, _params: &mut Params) {
        if self.is_finite() {
            sql.push_str(&format!("{:?}", self));
        } else {
            sql.push_str("NULL");
        }
    }
}

impl QueryPart for f32 {
    fn append_to(self, sql: &mut String, _params: &mut Params) {
        if self.is_finite() {
            sql.push_str(&format!("{:?}", self));
        } else {
            sql.push_str("NULL");
        }
    }
}

impl QueryPart for Vec<u8> {
    fn append_to(self, _sql: &mut String, params: &mut Params) {
        let position = params.next_position();
        params.bind(position, self);
    }
}

impl QueryPart for &Vec<u8> {
    fn append_to(self, _sql: &mut String, params: &mut Params) {
        let position = params.next_position();
        params.bind(position, self);
    }
}

impl QueryPart for &[u8] {
    fn append_to(self, _sql: &mut String, params: &mut Params) {
        let position = params.next_position();
        params.bind(position, self);
    }
}

/// Convert a JSON value to a field for binding.
///
/// Arrays and objects are stored as their JSON text.
pub fn field_from_json(v: &Value) -> Field {
    match v {
        Value::Null => Field::Null,
        Value::Bool(b) => Field::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Field::Integer(i)
            } else {
                Field::Real(n.as_f64().unwrap_or(0.0))
            }
        }
        Value::String(s) => Field::Text(s.clone()),
        Value::Array(_) | Value::Object(_) => Field::Text(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebinding_replaces_value() {
        let mut params = Params::new();
        params.bind(1, 10);
        params.bind("@name", "a");
        params.bind(1, 20);
        assert_eq!(params.len(), 2);
        assert_eq!(params.get(&ParamKey::Position(1)), Some(&Field::Integer(20)));
    }

    #[test]
    fn test_next_position_ignores_names() {
        let mut params = Params::new();
        assert_eq!(params.next_position(), 1);
        params.bind("@com", "x");
        assert_eq!(params.next_position(), 1);
        params.bind(2, 1.5);
        assert_eq!(params.next_position(), 3);
    }

    #[test]
    fn test_parts_render_into_text() {
        let mut sql = String::new();
        let mut params = Params::new();
        "VALUES(".append_to(&mut sql, &mut params);
        1000i32.append_to(&mut sql, &mut params);
        ",".append_to(&mut sql, &mut params);
        3.1415f32.append_to(&mut sql, &mut params);
        ",".append_to(&mut sql, &mut params);
        1.0f64.append_to(&mut sql, &mut params);
        ")".append_to(&mut sql, &mut params);
        assert_eq!(sql, "VALUES(1000,3.1415,1.0)");
        assert!(params.is_empty());
    }

    #[test]
    fn test_blob_part_binds_next_position() {
        let mut sql = String::from("INSERT INTO t (a, b) VALUES (?, ?)");
        let mut params = Params::new();
        vec![1u8, 2].append_to(&mut sql, &mut params);
        vec![3u8].append_to(&mut sql, &mut params);
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (?, ?)");
        assert_eq!(params.get(&ParamKey::Position(2)), Some(&Field::Blob(vec![3])));
    }

    #[test]
    fn test_field_from_json() {
        assert_eq!(field_from_json(&serde_json::json!(3)), Field::Integer(3));
        assert_eq!(field_from_json(&serde_json::json!(2.5)), Field::Real(2.5));
        assert_eq!(field_from_json(&serde_json::json!(true)), Field::Integer(1));
        assert_eq!(field_from_json(&serde_json::json!([1, 2])), Field::Text("[1,2]".into()));
        assert_eq!(field_from_json(&Value::Null), Field::Null);
    }
}
