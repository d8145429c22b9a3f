//! Result rows and the optional hydration seam.
//!
//! Executors hand back [`Row`]s: ordered column-name → [`Value`] mappings.
//! Callers that want domain objects implement [`FromRow`]; everything works
//! with plain rows when they don't.

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::value::Value;

/// One result row, preserving the executor's column order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from column/value pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Append a column.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Look up a column by name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Look up a column, erroring when absent.
    pub fn value(&self, column: &str) -> QueryResult<&Value> {
        self.get(column)
            .ok_or_else(|| QueryError::decode(column, "column not present in row"))
    }

    /// Fetch a column as text.
    pub fn get_str(&self, column: &str) -> QueryResult<&str> {
        match self.value(column)? {
            Value::Text(s) => Ok(s),
            other => Err(QueryError::decode(column, format!("expected text, got {other:?}"))),
        }
    }

    /// Fetch a column as an integer.
    pub fn get_i64(&self, column: &str) -> QueryResult<i64> {
        match self.value(column)? {
            Value::Int(i) => Ok(*i),
            other => Err(QueryError::decode(
                column,
                format!("expected integer, got {other:?}"),
            )),
        }
    }

    /// Fetch a column as a float; integers widen.
    pub fn get_f64(&self, column: &str) -> QueryResult<f64> {
        match self.value(column)? {
            Value::Float(f) => Ok(*f),
            Value::Int(i) => Ok(*i as f64),
            other => Err(QueryError::decode(
                column,
                format!("expected float, got {other:?}"),
            )),
        }
    }

    /// Fetch a column as a boolean.
    pub fn get_bool(&self, column: &str) -> QueryResult<bool> {
        match self.value(column)? {
            Value::Bool(b) => Ok(*b),
            other => Err(QueryError::decode(
                column,
                format!("expected boolean, got {other:?}"),
            )),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// True when the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate columns in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Hydrate a domain object from a row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> QueryResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> QueryResult<Self> {
        Ok(row.clone())
    }
}
