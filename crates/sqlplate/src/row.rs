//! Rows, result cursors and row mapping traits

use crate::error::{DbError, DbResult};
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

/// One result row: column names (shared across the result set) plus values.
///
/// Lookups by name return the *last* column with that name, so a join that
/// selects two `id` columns behaves like an associative array.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a column by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .rposition(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Value of a column by position.
    pub fn get_index(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Typed access to a column, returning [`DbError::Decode`] on failure.
    pub fn try_get<T: FromValue>(&self, column: &str) -> DbResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| DbError::decode(column, "no such column"))?;
        T::from_value(value).map_err(|message| DbError::decode(column, message))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Column → value map; on duplicate names the later column wins.
    pub fn into_map(self) -> IndexMap<String, Value> {
        self.columns.iter().cloned().zip(self.values).collect()
    }
}

impl Serialize for Row {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Key of a keyed result (`select_key_pair`, `select_group`).
///
/// Keys follow associative-array rules: integers and integral text (`"42"`)
/// become [`RowKey::Int`], booleans become 0/1, floats truncate, `NULL` becomes
/// the empty string, and other text stays text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum RowKey {
    Int(i64),
    Text(String),
}

impl From<&Value> for RowKey {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RowKey::Text(String::new()),
            Value::Bool(b) => RowKey::Int(i64::from(*b)),
            Value::Int(i) => RowKey::Int(*i),
            Value::Float(_) => RowKey::Int(value.to_int()),
            Value::Text(s) => match integral_key(s) {
                Some(i) => RowKey::Int(i),
                None => RowKey::Text(s.clone()),
            },
        }
    }
}

impl From<i64> for RowKey {
    fn from(i: i64) -> Self {
        RowKey::Int(i)
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey::from(&Value::Text(s.to_string()))
    }
}

/// Canonical decimal integers only: `"42"`, `"-7"`; not `"042"`, `"+1"` or `" 1"`.
fn integral_key(s: &str) -> Option<i64> {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'))
        && s != "-0";
    if canonical { s.parse().ok() } else { None }
}

/// A materialized statement result.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    columns: Arc<[String]>,
    rows: Vec<Row>,
    affected_rows: u64,
    position: usize,
}

impl Cursor {
    /// Result of a row-returning statement.
    pub fn with_rows(columns: Arc<[String]>, rows: Vec<Row>) -> Self {
        Self {
            columns,
            rows,
            affected_rows: 0,
            position: 0,
        }
    }

    /// Result of a statement that returns no rows.
    pub fn affected(affected_rows: u64) -> Self {
        Self {
            affected_rows,
            ..Self::default()
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows changed by an `INSERT`/`UPDATE`/`DELETE`; for a `SELECT`, the number
    /// of rows returned.
    pub fn row_count(&self) -> u64 {
        if self.rows.is_empty() {
            self.affected_rows
        } else {
            self.rows.len() as u64
        }
    }

    /// Next row, advancing the cursor.
    pub fn fetch(&mut self) -> Option<Row> {
        let row = self.rows.get(self.position).cloned();
        if row.is_some() {
            self.position += 1;
        }
        row
    }

    /// All remaining rows.
    pub fn fetch_all(mut self) -> Vec<Row> {
        self.rows.split_off(self.position.min(self.rows.len()))
    }

    /// First column of the next row.
    pub fn fetch_column(&mut self) -> Option<Value> {
        self.fetch().and_then(|row| row.into_values().into_iter().next())
    }

    /// First column of every remaining row.
    pub fn fetch_column_all(self) -> Vec<Value> {
        self.fetch_all()
            .into_iter()
            .filter_map(|row| row.into_values().into_iter().next())
            .collect()
    }

    /// First column → second column. Later rows overwrite earlier ones with the
    /// same key. Requires exactly two columns.
    pub fn fetch_key_pair(self) -> DbResult<IndexMap<RowKey, Value>> {
        if self.columns.len() != 2 {
            return Err(DbError::decode(
                self.columns.first().map_or("", String::as_str),
                format!(
                    "key/value fetch needs exactly 2 columns, got {}",
                    self.columns.len()
                ),
            ));
        }
        Ok(self
            .fetch_all()
            .into_iter()
            .filter_map(|row| {
                let mut values = row.into_values().into_iter();
                let key = values.next()?;
                let value = values.next()?;
                Some((RowKey::from(&key), value))
            })
            .collect())
    }

    /// Rows grouped by their first column; the grouping column is removed from
    /// the grouped rows.
    pub fn fetch_group(self) -> IndexMap<RowKey, Vec<Row>> {
        let rest: Arc<[String]> = self.columns.iter().skip(1).cloned().collect();
        let mut groups: IndexMap<RowKey, Vec<Row>> = IndexMap::new();
        for row in self.fetch_all() {
            let mut values = row.into_values();
            if values.is_empty() {
                continue;
            }
            let key = RowKey::from(&values.remove(0));
            groups
                .entry(key)
                .or_default()
                .push(Row::new(Arc::clone(&rest), values));
        }
        groups
    }
}

impl Iterator for Cursor {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.fetch()
    }
}

/// Conversion from a single column value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Int(i) => Ok(*i),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("expected integer, got text {s:?}")),
            other => Err(format!("expected integer, got {}", other.type_name())),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let i = i64::from_value(value)?;
        i32::try_from(i).map_err(|_| format!("integer {i} out of range for i32"))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| format!("expected number, got text {s:?}")),
            other => Err(format!("expected number, got {}", other.type_name())),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Int(i) => Ok(*i != 0),
            other => Err(format!("expected bool, got {}", other.type_name())),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Text(s) => Ok(s.clone()),
            Value::Null => Err("expected text, got null".to_string()),
            other => Ok(other.to_string()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Trait for converting a result row into a Rust struct.
///
/// # Example
///
/// ```ignore
/// use sqlplate::{FromRow, Row, DbResult};
///
/// struct User {
///     id: i64,
///     email: Option<String>,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> DbResult<Self> {
///         Ok(Self {
///             id: row.try_get("id")?,
///             email: row.try_get("email")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a result row into Self
    fn from_row(row: &Row) -> DbResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> DbResult<Self> {
        Ok(row.clone())
    }
}
