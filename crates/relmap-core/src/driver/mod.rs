//! Database access layer consumed by the catalog adapters.
//!
//! A [`Connection`] runs catalog queries and hands back plain rows. Adapters
//! never see driver types, so any database client can be plugged in.

#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::error::{Error, Result};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

/// A single value in a catalog row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Integer value.
    Integer(i64),
    /// Floating point value.
    Real(f64),
    /// Text value.
    Text(String),
    /// Binary value.
    Blob(Vec<u8>),
}

impl Value {
    /// Check if this is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form of the value; integers and reals are rendered, blobs are
    /// decoded lossily.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(i.to_string()),
            Value::Real(r) => Some(r.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
        }
    }

    /// Integer form of the value; numeric text is parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

/// One result row with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Create a row from parallel column names and values.
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value of `column`, matched case-insensitively.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .and_then(|idx| self.values.get(idx))
    }

    /// Text value of `column`; NULL and missing columns are `None`.
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(Value::as_text)
    }

    /// Text value of `column`, failing if it is NULL or missing.
    pub fn required_text(&self, column: &str) -> Result<String> {
        self.text(column)
            .ok_or_else(|| Error::Query(format!("catalog row is missing column {column}")))
    }

    /// Integer value of `column`.
    pub fn int(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(Value::as_i64)
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Column reported by a zero-row probe query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbedColumn {
    /// Column name as the driver reports it.
    pub name: String,
    /// Declared type, when the driver exposes one.
    pub declared_type: Option<String>,
}

/// A database connection able to answer catalog queries.
pub trait Connection {
    /// Driver name used to pick a catalog adapter (e.g. "sqlite", "mysql", "pg").
    fn driver_name(&self) -> &str;

    /// Run a query with positional text parameters and collect every row.
    fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>>;

    /// Run `SELECT * FROM <table> WHERE 1 = 0` and describe the result columns.
    ///
    /// `quoted_table` is already quoted for the backend.
    fn probe_columns(&self, quoted_table: &str) -> Result<Vec<ProbedColumn>>;

    /// Identifier quote character, if the driver knows it.
    fn identifier_quote(&self) -> Option<&str> {
        None
    }

    /// Separator between schema and object names, if the driver knows it.
    fn name_separator(&self) -> Option<&str> {
        None
    }
}
