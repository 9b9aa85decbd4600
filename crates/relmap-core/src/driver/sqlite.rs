//! SQLite connection backed by rusqlite.

use std::path::Path;

use rusqlite::types::ValueRef;

use super::{Connection, ProbedColumn, Row, Value};
use crate::error::Result;

/// A [`Connection`] over a rusqlite database handle.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Wrap an existing rusqlite connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Run one or more SQL statements without results.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the underlying rusqlite connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    fn query(&self, sql: &str, params: &[&str]) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                values.push(to_value(row.get_ref(idx)?));
            }
            out.push(Row::new(columns.clone(), values));
        }

        Ok(out)
    }

    fn probe_columns(&self, quoted_table: &str) -> Result<Vec<ProbedColumn>> {
        let sql = format!("SELECT * FROM {quoted_table} WHERE 1 = 0");
        let stmt = self.conn.prepare(&sql)?;
        Ok(stmt
            .columns()
            .into_iter()
            .map(|c| ProbedColumn {
                name: c.name().to_string(),
                declared_type: c.decl_type().map(String::from),
            })
            .collect())
    }

    fn identifier_quote(&self) -> Option<&str> {
        Some("\"")
    }

    fn name_separator(&self) -> Option<&str> {
        Some(".")
    }
}
