//! Database-agnostic row and value types.
//!
//! This module contains:
//! - `Value` - A unified value type that can represent any engine value
//! - `Row` - An ordered sequence of values from one result row
//! - `ColumnInfo` - Metadata about a column in a result set
//! - `RowSet` - A materialized, read-only snapshot of a SELECT result

use serde::{Deserialize, Serialize};

/// A unified value type covering what the supported engines produce.
///
/// Engine-specific widths are collapsed into the closest member here: small
/// and unsigned integers become `Int64`, single-precision floats become
/// `Float64`, and anything without a natural mapping is carried as `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int64(i64),
    /// 64-bit floating point
    Float64(f64),
    /// Text/string value
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name for display purposes.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int64(_) => "int64",
            Value::Float64(_) => "float64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Convert this value to a display string.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => format!("\\x{}", hex::encode(b)),
        }
    }

    /// Try to extract as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to extract as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to extract as an f64 (will convert integers).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float64(v) => Some(*v),
            Value::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to extract as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to extract as a bytes reference.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int64(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Metadata about a column in a query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name
    pub name: String,
    /// Engine-specific type name
    pub type_name: String,
    /// Column position (0-indexed)
    pub ordinal: usize,
}

impl ColumnInfo {
    /// Create a new column info.
    pub fn new(name: String, type_name: String, ordinal: usize) -> Self {
        Self {
            name,
            type_name,
            ordinal,
        }
    }
}

/// A row of values from a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a new row from values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Get the number of values in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if this row is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Iterate over values.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// A materialized, read-only snapshot of a SELECT result.
///
/// The snapshot is captured once, when the statement completes; index access
/// and iteration never go back to the engine. Rows keep their engine order.
#[derive(Debug, Clone, Default)]
pub struct RowSet {
    columns: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

impl RowSet {
    /// Create a new row set.
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    /// Number of rows in the snapshot.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the snapshot has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column metadata, in result order.
    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    /// Get the row at `index`.
    pub fn item(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Visit every row in ascending index order.
    pub fn each<F>(&self, mut visitor: F)
    where
        F: FnMut(usize, &Row),
    {
        for (index, row) in self.rows.iter().enumerate() {
            visitor(index, row);
        }
    }

    /// Find the index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Get a cell by row index and column name.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> RowSet {
        RowSet::new(
            vec![
                ColumnInfo::new("id".to_string(), "INTEGER".to_string(), 0),
                ColumnInfo::new("text".to_string(), "TEXT".to_string(), 1),
            ],
            vec![
                Row::new(vec![Value::Int64(1), Value::Text("a".to_string())]),
                Row::new(vec![Value::Int64(2), Value::Text("b".to_string())]),
                Row::new(vec![Value::Int64(3), Value::Null]),
            ],
        )
    }

    #[test]
    fn test_value_null_check() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());
        assert!(!Value::Int64(42).is_null());
    }

    #[test]
    fn test_value_display_string() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int64(-123).to_display_string(), "-123");
        assert_eq!(Value::Float64(3.14).to_display_string(), "3.14");
        assert_eq!(Value::Text("hello".to_string()).to_display_string(), "hello");
        assert_eq!(
            Value::Bytes(vec![0xDE, 0xAD]).to_display_string(),
            "\\xdead"
        );
    }

    #[test]
    fn test_value_from_impls() {
        assert_eq!(Value::from(42i32), Value::Int64(42));
        assert_eq!(Value::from("a"), Value::Text("a".to_string()));
        assert_eq!(Value::from(Some(1i64)), Value::Int64(1));
        assert_eq!(Value::from(Option::<i64>::None), Value::Null);
    }

    #[test]
    fn test_value_extraction() {
        assert_eq!(Value::Int64(7).as_i64(), Some(7));
        assert_eq!(Value::Int64(7).as_f64(), Some(7.0));
        assert_eq!(Value::Text("x".to_string()).as_i64(), None);
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
    }

    #[test]
    fn test_rowset_item_random_access() {
        let set = sample_set();
        assert_eq!(set.len(), 3);

        // Access out of order; content must not depend on access order
        assert_eq!(set.item(2).unwrap().get(0), Some(&Value::Int64(3)));
        assert_eq!(set.item(0).unwrap().get(0), Some(&Value::Int64(1)));
        assert_eq!(set.item(1).unwrap().get(0), Some(&Value::Int64(2)));
        assert_eq!(set.item(0).unwrap().get(0), Some(&Value::Int64(1)));
        assert!(set.item(3).is_none());
    }

    #[test]
    fn test_rowset_each_visits_in_order() {
        let set = sample_set();
        let mut visited = Vec::new();
        set.each(|index, row| {
            visited.push((index, row.get(0).cloned().unwrap()));
        });

        assert_eq!(
            visited,
            vec![
                (0, Value::Int64(1)),
                (1, Value::Int64(2)),
                (2, Value::Int64(3)),
            ]
        );
    }

    #[test]
    fn test_rowset_named_access() {
        let set = sample_set();
        assert_eq!(set.column_index("text"), Some(1));
        assert_eq!(set.value(1, "text"), Some(&Value::Text("b".to_string())));
        assert_eq!(set.value(2, "text"), Some(&Value::Null));
        assert_eq!(set.value(0, "missing"), None);
    }
}
