//! Typed cell values and row batches

use chrono::{NaiveDate, NaiveDateTime};

/// A single typed cell value.
///
/// Decoders are responsible for type inference; downstream code treats these
/// as opaque and only maps them to destination column types.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The destination column type this value maps to, if any.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ColumnType::Bool),
            Value::Int(_) => Some(ColumnType::BigInt),
            Value::Float(_) => Some(ColumnType::Double),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
            Value::Date(_) => Some(ColumnType::Date),
        }
    }
}

/// Column types a destination table schema can be built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Bool,
    BigInt,
    Double,
    Text,
    Timestamp,
    Date,
}

/// Normalize a column name for the destination table: strip quote characters
/// and lower-case. Normalizing an already-normalized name is a no-op.
pub fn normalize_column_name(name: &str) -> String {
    name.replace(['"', '\''], "").to_lowercase()
}

/// An ordered set of rows sharing a common column list.
///
/// Column names are kept exactly as the decoder produced them until
/// [`RowBatch::normalize_columns`] is applied.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowBatch {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RowBatch {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// A batch with a column list but no rows.
    pub fn empty(columns: Vec<String>) -> Self {
        Self::new(columns, Vec::new())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows in the batch.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Apply [`normalize_column_name`] to every column.
    pub fn normalize_columns(&mut self) {
        for column in &mut self.columns {
            *column = normalize_column_name(column);
        }
    }

    /// Derive a destination schema from the batch contents.
    ///
    /// The schema is an emergent property of the batch: each column takes the
    /// type of its first non-null value. Columns with no non-null values (or
    /// no rows at all) fall back to [`ColumnType::Text`].
    pub fn column_types(&self) -> Vec<ColumnType> {
        (0..self.columns.len())
            .map(|i| {
                self.rows
                    .iter()
                    .find_map(|row| row.get(i).and_then(Value::column_type))
                    .unwrap_or(ColumnType::Text)
            })
            .collect()
    }
}
