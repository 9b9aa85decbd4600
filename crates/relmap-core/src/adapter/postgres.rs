//! PostgreSQL catalog adapter.

use super::{group_rows, CatalogAdapter};
use crate::catalog::{ColumnInfo, ColumnSize, ForeignKeyRef, UniqueConstraint};
use crate::driver::{Connection, Row};
use crate::error::Result;

const DEFAULT_SCHEMA: &str = "public";

const LIST_TABLES: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name";

const COLUMNS: &str = "SELECT column_name, data_type, udt_name, is_nullable, column_default, \
     character_maximum_length, numeric_precision, numeric_scale \
     FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position";

const ENUM_VALUES: &str = "SELECT e.enumlabel FROM pg_catalog.pg_enum e \
     JOIN pg_catalog.pg_type t ON t.oid = e.enumtypid \
     WHERE t.typname = $1 ORDER BY e.enumsortorder";

const KEY_COLUMNS: &str = "SELECT kcu.constraint_name, kcu.column_name \
     FROM information_schema.table_constraints tc \
     JOIN information_schema.key_column_usage kcu \
       ON kcu.constraint_schema = tc.constraint_schema \
      AND kcu.constraint_name = tc.constraint_name \
     WHERE tc.table_schema = $1 AND tc.table_name = $2 AND tc.constraint_type = $3 \
     ORDER BY kcu.constraint_name, kcu.ordinal_position";

// The remote column is the one at the same position in the referenced
// unique constraint.
const FOREIGN_KEYS: &str = "SELECT kcu.constraint_name, kcu.column_name, \
     rcu.table_name AS remote_table, rcu.column_name AS remote_column \
     FROM information_schema.key_column_usage kcu \
     JOIN information_schema.referential_constraints rc \
       ON rc.constraint_schema = kcu.constraint_schema \
      AND rc.constraint_name = kcu.constraint_name \
     JOIN information_schema.key_column_usage rcu \
       ON rcu.constraint_schema = rc.unique_constraint_schema \
      AND rcu.constraint_name = rc.unique_constraint_name \
      AND rcu.ordinal_position = kcu.position_in_unique_constraint \
     WHERE kcu.table_schema = $1 AND kcu.table_name = $2 \
     ORDER BY kcu.constraint_name, kcu.ordinal_position";

/// Adapter for PostgreSQL.
#[derive(Debug, Clone, Default)]
pub struct PostgresAdapter {
    schema: Option<String>,
}

impl PostgresAdapter {
    /// Create an adapter; without a schema `public` is used.
    pub fn new(schema: Option<String>) -> Self {
        Self { schema }
    }

    fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    fn column(&self, conn: &dyn Connection, row: &Row) -> Result<ColumnInfo> {
        let name = row.required_text("column_name")?;
        let data_type = row
            .text("data_type")
            .unwrap_or_default()
            .to_lowercase();
        let nullable = row
            .text("is_nullable")
            .is_some_and(|v| v.eq_ignore_ascii_case("yes"));
        let default_value = row.text("column_default");

        let size = match (
            row.int("character_maximum_length"),
            row.int("numeric_precision"),
            row.int("numeric_scale"),
        ) {
            (Some(length), _, _) => u32::try_from(length).ok().map(ColumnSize::Length),
            (None, Some(precision), Some(scale)) if data_type == "numeric" => {
                match (u32::try_from(precision), u32::try_from(scale)) {
                    (Ok(precision), Ok(scale)) => Some(ColumnSize::Precision { precision, scale }),
                    _ => None,
                }
            }
            _ => None,
        };

        let mut column = ColumnInfo::new(name, data_type);
        column.nullable = nullable;
        column.size = size;
        column.extra.auto_increment = default_value
            .as_deref()
            .is_some_and(|d| d.starts_with("nextval("));
        column.default_value = default_value;

        if column.data_type == "user-defined" {
            if let Some(udt) = row.text("udt_name") {
                let labels: Vec<String> = conn
                    .query(ENUM_VALUES, &[udt.as_str()])?
                    .iter()
                    .filter_map(|r| r.text("enumlabel"))
                    .collect();
                if !labels.is_empty() {
                    column.data_type = "enum".to_string();
                    column.extra.enum_values = Some(labels);
                }
            }
        }

        Ok(column)
    }

    fn key_columns(
        &self,
        conn: &dyn Connection,
        table: &str,
        constraint_type: &str,
    ) -> Result<Vec<(String, Vec<String>)>> {
        let rows = conn.query(KEY_COLUMNS, &[self.schema(), table, constraint_type])?;
        group_rows(rows, "constraint_name")?
            .into_iter()
            .map(|(name, rows)| {
                let columns = rows
                    .iter()
                    .map(|row| row.required_text("column_name"))
                    .collect::<Result<Vec<_>>>()?;
                Ok((name, columns))
            })
            .collect()
    }
}

impl CatalogAdapter for PostgresAdapter {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn list_tables(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        conn.query(LIST_TABLES, &[self.schema()])?
            .iter()
            .map(|row| row.required_text("table_name"))
            .collect()
    }

    fn columns(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ColumnInfo>> {
        conn.query(COLUMNS, &[self.schema(), table])?
            .iter()
            .map(|row| self.column(conn, row))
            .collect()
    }

    fn primary_key(&self, conn: &dyn Connection, table: &str) -> Result<Vec<String>> {
        Ok(self
            .key_columns(conn, table, "PRIMARY KEY")?
            .into_iter()
            .next()
            .map(|(_, columns)| columns)
            .unwrap_or_default())
    }

    fn unique_constraints(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<UniqueConstraint>> {
        Ok(self
            .key_columns(conn, table, "UNIQUE")?
            .into_iter()
            .map(|(name, columns)| UniqueConstraint { name, columns })
            .collect())
    }

    fn foreign_keys(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>> {
        let rows = conn.query(FOREIGN_KEYS, &[self.schema(), table])?;

        group_rows(rows, "constraint_name")?
            .into_iter()
            .map(|(name, rows)| {
                let remote_table = rows
                    .first()
                    .map(|row| row.required_text("remote_table"))
                    .transpose()?
                    .unwrap_or_default();
                let local_columns = rows
                    .iter()
                    .map(|row| row.required_text("column_name"))
                    .collect::<Result<Vec<_>>>()?;
                let remote_columns: Option<Vec<String>> =
                    rows.iter().map(|row| row.text("remote_column")).collect();

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
