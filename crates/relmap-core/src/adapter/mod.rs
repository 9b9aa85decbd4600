//! Backend catalog adapters.
//!
//! Each adapter extracts raw metadata for one database vendor. Output is not
//! yet normalized: identifiers may still be quoted or mixed case, and foreign
//! keys carry no internal tokens. The [`crate::normalize`] module takes care
//! of that.

mod generic;
mod mysql;
mod postgres;
mod sqlite;

pub use generic::GenericAdapter;
pub use mysql::MysqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

use crate::catalog::{ColumnInfo, ForeignKeyRef, UniqueConstraint};
use crate::driver::{Connection, Row};
use crate::error::Result;

/// Metadata extraction contract implemented once per backend.
pub trait CatalogAdapter {
    /// Adapter name for logging.
    fn name(&self) -> &'static str;

    /// Names of all user tables visible to the connection.
    fn list_tables(&self, conn: &dyn Connection) -> Result<Vec<String>>;

    /// Columns of `table` in catalog order.
    fn columns(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Primary key columns of `table` in key order.
    fn primary_key(&self, conn: &dyn Connection, table: &str) -> Result<Vec<String>>;

    /// Unique constraints of `table`.
    fn unique_constraints(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<UniqueConstraint>>;

    /// Foreign keys where `table` is the referencing side.
    fn foreign_keys(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>>;
}

type AdapterCtor = fn(Option<String>) -> Box<dyn CatalogAdapter>;

fn sqlite_adapter(_: Option<String>) -> Box<dyn CatalogAdapter> {
    Box::new(SqliteAdapter)
}

fn mysql_adapter(schema: Option<String>) -> Box<dyn CatalogAdapter> {
    Box::new(MysqlAdapter::new(schema))
}

fn postgres_adapter(schema: Option<String>) -> Box<dyn CatalogAdapter> {
    Box::new(PostgresAdapter::new(schema))
}

const ADAPTERS: &[(&str, AdapterCtor)] = &[
    ("sqlite", sqlite_adapter),
    ("sqlite3", sqlite_adapter),
    ("mysql", mysql_adapter),
    ("mariadb", mysql_adapter),
    ("pg", postgres_adapter),
    ("postgres", postgres_adapter),
    ("postgresql", postgres_adapter),
];

/// Select the adapter for a driver name; unknown drivers get the
/// [`GenericAdapter`].
pub fn adapter_for(driver_name: &str, db_schema: Option<String>) -> Box<dyn CatalogAdapter> {
    match ADAPTERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(driver_name))
    {
        Some((_, ctor)) => ctor(db_schema),
        None => Box::new(GenericAdapter::new(db_schema)),
    }
}

/// Group rows by a key column, preserving first-seen order of keys.
pub(crate) fn group_rows(rows: Vec<Row>, key: &str) -> Result<Vec<(String, Vec<Row>)>> {
    let mut groups: Vec<(String, Vec<Row>)> = Vec::new();
    for row in rows {
        let group = row.required_text(key)?;
        match groups.iter_mut().find(|(k, _)| *k == group) {
            Some((_, members)) => members.push(row),
            None => groups.push((group, vec![row])),
        }
    }
    Ok(groups)
}

/// Parse the value list of `enum('a','b')` / `set('a','b')`.
///
/// Quotes inside values are doubled (`'it''s'`).
pub(crate) fn parse_enum_values(column_type: &str) -> Option<Vec<String>> {
    let lower = column_type.trim_start().to_lowercase();
    if !(lower.starts_with("enum(") || lower.starts_with("set(")) {
        return None;
    }

    let open = column_type.find('(')?;
    let close = column_type.rfind(')')?;
    let body = column_type.get(open + 1..close)?;

    let mut values = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, in_quote) {
            ('\'', true) if chars.peek() == Some(&'\'') => {
                current.push('\'');
                chars.next();
            }
            ('\'', true) => {
                in_quote = false;
                values.push(std::mem::take(&mut current));
            }
            ('\'', false) => in_quote = true,
            (c, true) => current.push(c),
            _ => {}
        }
    }

    Some(values)
}
