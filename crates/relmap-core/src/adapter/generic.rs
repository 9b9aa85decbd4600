//! Fallback adapter for drivers without a dedicated catalog reader.

use super::CatalogAdapter;
use crate::catalog::{ColumnInfo, ForeignKeyRef, UniqueConstraint};
use crate::driver::Connection;
use crate::error::{Error, Result};

/// Lists tables through `information_schema` and reports everything else as
/// unsupported, so columns come from a probe query and no keys are known.
#[derive(Debug, Clone, Default)]
pub struct GenericAdapter {
    schema: Option<String>,
}

impl GenericAdapter {
    pub fn new(schema: Option<String>) -> Self {
        Self { schema }
    }
}

fn unsupported<T>(capability: &'static str, table: &str) -> Result<T> {
    Err(Error::CatalogUnsupported {
        capability,
        table: table.to_string(),
    })
}

impl CatalogAdapter for GenericAdapter {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn list_tables(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        let rows = match &self.schema {
            Some(schema) => conn.query(
                "SELECT table_name FROM information_schema.tables \
                 WHERE table_schema = ? ORDER BY table_name",
                &[schema.as_str()],
            )?,
            None => conn.query(
                "SELECT table_name FROM information_schema.tables ORDER BY table_name",
                &[],
            )?,
        };
        rows.iter()
            .map(|row| row.required_text("table_name"))
            .collect()
    }

    fn columns(&self, _conn: &dyn Connection, table: &str) -> Result<Vec<ColumnInfo>> {
        unsupported("column_info", table)
    }

    fn primary_key(&self, _conn: &dyn Connection, table: &str) -> Result<Vec<String>> {
        unsupported("primary_key_info", table)
    }

    fn unique_constraints(
        &self,
        _conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<UniqueConstraint>> {
        unsupported("statistics_info", table)
    }

    fn foreign_keys(&self, _conn: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>> {
        unsupported("foreign_key_info", table)
    }
}
