//! MySQL / MariaDB catalog adapter.

use super::{group_rows, parse_enum_values, CatalogAdapter};
use crate::catalog::{parse_declared_type, ColumnInfo, ForeignKeyRef, UniqueConstraint};
use crate::driver::{Connection, Row};
use crate::error::Result;

const LIST_TABLES: &str = "SELECT table_name AS table_name FROM information_schema.tables \
     WHERE table_schema = ? AND table_type = 'BASE TABLE' ORDER BY table_name";

const COLUMNS: &str = "SELECT column_name AS column_name, column_type AS column_type, \
     data_type AS data_type, is_nullable AS is_nullable, column_default AS column_default, \
     extra AS extra FROM information_schema.columns \
     WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position";

const PRIMARY_KEY: &str = "SELECT column_name AS column_name FROM information_schema.key_column_usage \
     WHERE table_schema = ? AND table_name = ? AND constraint_name = 'PRIMARY' \
     ORDER BY ordinal_position";

const UNIQUE_CONSTRAINTS: &str = "SELECT kcu.constraint_name AS constraint_name, \
     kcu.column_name AS column_name \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_schema = tc.constraint_schema \
      AND kcu.constraint_name = tc.constraint_name \
      AND kcu.table_name = tc.table_name \
     WHERE tc.table_schema = ? AND tc.table_name = ? AND tc.constraint_type = 'UNIQUE' \
     ORDER BY kcu.constraint_name, kcu.ordinal_position";

const FOREIGN_KEYS: &str = "SELECT constraint_name AS constraint_name, column_name AS column_name, \
     referenced_table_name AS referenced_table_name, \
     referenced_column_name AS referenced_column_name \
     FROM information_schema.key_column_usage \
     WHERE table_schema = ? AND table_name = ? AND referenced_table_name IS NOT NULL \
     ORDER BY constraint_name, ordinal_position";

/// Adapter for MySQL and MariaDB.
#[derive(Debug, Clone, Default)]
pub struct MysqlAdapter {
    schema: Option<String>,
}

impl MysqlAdapter {
    /// Create an adapter; without a schema the connection's current
    /// database is used.
    pub fn new(schema: Option<String>) -> Self {
        Self { schema }
    }

    fn schema(&self, conn: &dyn Connection) -> Result<String> {
        if let Some(schema) = &self.schema {
            return Ok(schema.clone());
        }
        conn.query("SELECT DATABASE() AS db", &[])?
            .first()
            .map(|row| row.required_text("db"))
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

fn column_from_row(row: &Row) -> Result<ColumnInfo> {
    let name = row.required_text("column_name")?;
    let column_type = row.text("column_type").unwrap_or_default();
    let nullable = row
        .text("is_nullable")
        .is_some_and(|v| v.eq_ignore_ascii_case("yes"));

    let (parsed_type, size) = parse_declared_type(&column_type);
    let data_type = row
        .text("data_type")
        .map(|t| t.to_lowercase())
        .unwrap_or(parsed_type);

    let mut column = ColumnInfo::new(name, data_type);
    column.nullable = nullable;
    column.size = size;
    column.default_value = row.text("column_default");
    column.extra.unsigned = column_type.to_lowercase().contains("unsigned");
    column.extra.auto_increment = row
        .text("extra")
        .is_some_and(|e| e.to_lowercase().contains("auto_increment"));
    column.extra.enum_values = parse_enum_values(&column_type);
    Ok(column)
}

impl CatalogAdapter for MysqlAdapter {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn list_tables(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        let schema = self.schema(conn)?;
        conn.query(LIST_TABLES, &[schema.as_str()])?
            .iter()
            .map(|row| row.required_text("table_name"))
            .collect()
    }

    fn columns(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ColumnInfo>> {
        let schema = self.schema(conn)?;
        conn.query(COLUMNS, &[schema.as_str(), table])?
            .iter()
            .map(column_from_row)
            .collect()
    }

    fn primary_key(&self, conn: &dyn Connection, table: &str) -> Result<Vec<String>> {
        let schema = self.schema(conn)?;
        conn.query(PRIMARY_KEY, &[schema.as_str(), table])?
            .iter()
            .map(|row| row.required_text("column_name"))
            .collect()
    }

    fn unique_constraints(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<UniqueConstraint>> {
        let schema = self.schema(conn)?;
        let rows = conn.query(UNIQUE_CONSTRAINTS, &[schema.as_str(), table])?;

        group_rows(rows, "constraint_name")?
            .into_iter()
            .map(|(name, rows)| {
                let columns = rows
                    .iter()
                    .map(|row| row.required_text("column_name"))
                    .collect::<Result<Vec<_>>>()?;
                Ok(UniqueConstraint { name, columns })
            })
            .collect()
    }

    fn foreign_keys(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>> {
        let schema = self.schema(conn)?;
        let rows = conn.query(FOREIGN_KEYS, &[schema.as_str(), table])?;

        group_rows(rows, "constraint_name")?
            .into_iter()
            .map(|(name, rows)| {
                let remote_table = rows
                    .first()
                    .map(|row| row.required_text("referenced_table_name"))
                    .transpose()?
                    .unwrap_or_default();
                let local_columns = rows
                    .iter()
                    .map(|row| row.required_text("column_name"))
                    .collect::<Result<Vec<_>>>()?;
                let remote_columns: Option<Vec<String>> = rows
                    .iter()
                    .map(|row| row.text("referenced_column_name"))
                    .collect();

                Ok(ForeignKeyRef {
                    local_table: table.to_string(),
                    local_columns,
                    remote_table,
                    remote_columns,
                    name: Some(name),
                    token: String::new(),
                })
            })
            .collect()
    }
}
