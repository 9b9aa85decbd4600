//! Catalog normalization.
//!
//! Wraps a [`CatalogAdapter`] and turns its raw output into the canonical
//! [`catalog`](crate::catalog) records: identifiers are unquoted, stripped of
//! schema prefixes and lower-cased, missing capabilities degrade to empty
//! results, and unnamed foreign keys receive stable tokens.

use std::collections::HashSet;

use tracing::debug;

use crate::adapter::CatalogAdapter;
use crate::catalog::{ColumnInfo, ForeignKeyRef, TableMetadata, UniqueConstraint};
use crate::driver::Connection;
use crate::error::Result;

/// Quote character used when neither options nor driver supply one.
pub const DEFAULT_QUOTE: &str = "\"";
/// Schema separator used when neither options nor driver supply one.
pub const DEFAULT_SEPARATOR: &str = ".";

/// How a backend quotes and qualifies identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierStyle {
    quote: String,
    separator: String,
}

impl Default for IdentifierStyle {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTE, DEFAULT_SEPARATOR)
    }
}

impl IdentifierStyle {
    pub fn new(quote: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            separator: separator.into(),
        }
    }

    /// Pick the style from explicit settings, then the driver, then defaults.
    pub fn resolve(conn: &dyn Connection, quote: Option<&str>, separator: Option<&str>) -> Self {
        Self::new(
            quote
                .or_else(|| conn.identifier_quote())
                .unwrap_or(DEFAULT_QUOTE),
            separator
                .or_else(|| conn.name_separator())
                .unwrap_or(DEFAULT_SEPARATOR),
        )
    }

    pub fn quote_char(&self) -> &str {
        &self.quote
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Canonical form of an identifier.
    pub fn normalize(&self, ident: &str) -> String {
        normalize_identifier(ident, &self.quote, &self.separator)
    }

    /// Quote a bare identifier for use in SQL, doubling embedded closing
    /// quotes.
    pub fn quote(&self, ident: &str) -> String {
        let (open, close) = quote_pair(&self.quote);
        if close.is_empty() {
            return ident.to_string();
        }
        let doubled = format!("{close}{close}");
        format!("{open}{}{close}", ident.replace(close, &doubled))
    }
}

/// Open and close quotes of a quote setting. Two distinct characters
/// (`[]`) form a pair; anything else quotes both sides.
fn quote_pair(quote: &str) -> (&str, &str) {
    let mut chars = quote.char_indices();
    match (chars.next(), chars.next(), chars.next()) {
        (Some((_, open)), Some((idx, close)), None) if open != close => {
            (&quote[..idx], &quote[idx..])
        }
        _ => (quote, quote),
    }
}

/// Strip quotes, drop every qualifier before the last unquoted separator and
/// lower-case the rest. A doubled closing quote inside a quoted part stands
/// for itself.
///
/// `"Main"."CD"` with quote `"` and separator `.` becomes `cd`;
/// `[dbo].[Odd.Name]` with quote `[]` becomes `odd.name`.
pub fn normalize_identifier(ident: &str, quote: &str, separator: &str) -> String {
    let (open, close) = quote_pair(quote);
    let mut part = String::new();
    let mut quoted = false;
    let mut rest = ident;

    while let Some(c) = rest.chars().next() {
        if quoted {
            if let Some(after) = rest.strip_prefix(close) {
                match after.strip_prefix(close) {
                    Some(escaped) => {
                        part.push_str(close);
                        rest = escaped;
                    }
                    None => {
                        quoted = false;
                        rest = after;
                    }
                }
                continue;
            }
        } else if !open.is_empty() && rest.starts_with(open) {
            quoted = true;
            rest = &rest[open.len()..];
            continue;
        } else if !separator.is_empty() && rest.starts_with(separator) {
            part.clear();
            rest = &rest[separator.len()..];
            continue;
        }
        part.push(c);
        rest = &rest[c.len_utf8()..];
    }

    part.trim().to_lowercase()
}

/// A table as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogTable {
    /// Name exactly as the catalog returned it, used for further queries.
    pub raw: String,
    /// Normalized name.
    pub name: String,
}

/// Everything known about one table after normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIntrospection {
    pub metadata: TableMetadata,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

/// Normalizing front end over a catalog adapter.
pub struct Normalizer<'a> {
    conn: &'a dyn Connection,
    adapter: &'a dyn CatalogAdapter,
    style: IdentifierStyle,
}

impl<'a> Normalizer<'a> {
    pub fn new(
        conn: &'a dyn Connection,
        adapter: &'a dyn CatalogAdapter,
        style: IdentifierStyle,
    ) -> Self {
        Self {
            conn,
            adapter,
            style,
        }
    }

    pub fn style(&self) -> &IdentifierStyle {
        &self.style
    }

    /// List user tables with their normalized names.
    pub fn list_tables(&self) -> Result<Vec<CatalogTable>> {
        Ok(self
            .adapter
            .list_tables(self.conn)?
            .into_iter()
            .map(|raw| CatalogTable {
                name: self.style.normalize(&raw),
                raw,
            })
            .collect())
    }

    /// Columns, keys and foreign keys of one table.
    pub fn introspect(&self, table: &CatalogTable) -> Result<TableIntrospection> {
        let mut metadata = TableMetadata::new(table.name.clone())
            .with_columns(self.columns(table)?)
            .with_primary_key(self.primary_key(table)?);
        for constraint in self.unique_constraints(table)? {
            metadata.insert_unique(constraint);
        }
        let foreign_keys = self.foreign_keys(table)?;

        debug!(
            table = %table.name,
            adapter = self.adapter.name(),
            columns = metadata.columns.len(),
            primary_key = ?metadata.primary_key,
            foreign_keys = foreign_keys.len(),
            "introspected table"
        );

        Ok(TableIntrospection {
            metadata,
            foreign_keys,
        })
    }

    /// Column metadata, falling back to a zero-row probe when the catalog
    /// query fails.
    pub fn columns(&self, table: &CatalogTable) -> Result<Vec<ColumnInfo>> {
        match self.adapter.columns(self.conn, &table.raw) {
            Ok(columns) => Ok(columns
                .into_iter()
                .map(|mut column| {
                    column.name = self.style.normalize(&column.name);
                    column
                })
                .collect()),
            Err(err) => {
                debug!(table = %table.name, error = %err, "column catalog failed, probing");
                self.probe_columns(table)
            }
        }
    }

    fn probe_columns(&self, table: &CatalogTable) -> Result<Vec<ColumnInfo>> {
        let quoted = self.style.quote(&table.raw);
        let probed = self.conn.probe_columns(&quoted)?;
        Ok(probed
            .into_iter()
            .map(|column| {
                ColumnInfo::from_declared(
                    self.style.normalize(&column.name),
                    column.declared_type.as_deref().unwrap_or_default(),
                    true,
                )
            })
            .collect())
    }

    pub fn primary_key(&self, table: &CatalogTable) -> Result<Vec<String>> {
        let columns = recover_unsupported(self.adapter.primary_key(self.conn, &table.raw))?;
        Ok(columns.iter().map(|c| self.style.normalize(c)).collect())
    }

    pub fn unique_constraints(&self, table: &CatalogTable) -> Result<Vec<UniqueConstraint>> {
        let constraints =
            recover_unsupported(self.adapter.unique_constraints(self.conn, &table.raw))?;
        Ok(constraints
            .into_iter()
            .map(|u| UniqueConstraint {
                name: self.style.normalize(&u.name),
                columns: u.columns.iter().map(|c| self.style.normalize(c)).collect(),
            })
            .collect())
    }

    /// Foreign keys with normalized identifiers and a token on every key.
    ///
    /// Named keys use their name. Unnamed keys get `_1`, `_2`, ... in catalog
    /// order, skipping any ordinal a named key of the same table already uses.
    pub fn foreign_keys(&self, table: &CatalogTable) -> Result<Vec<ForeignKeyRef>> {
        let raw = recover_unsupported(self.adapter.foreign_keys(self.conn, &table.raw))?;
        let names: Vec<Option<String>> = raw
            .iter()
            .map(|fk| {
                fk.name
                    .as_deref()
                    .map(|n| self.style.normalize(n))
                    .filter(|n| !n.is_empty())
            })
            .collect();
        let mut taken: HashSet<String> = names.iter().flatten().cloned().collect();
        let mut ordinal = 0usize;

        Ok(raw
            .into_iter()
            .zip(names)
            .map(|(fk, name)| {
                let token = match &name {
                    Some(name) => name.clone(),
                    None => loop {
                        ordinal += 1;
                        let candidate = format!("_{ordinal}");
                        if taken.insert(candidate.clone()) {
                            break candidate;
                        }
                    },
                };

                ForeignKeyRef {
                    local_table: table.name.clone(),
                    local_columns: fk
                        .local_columns
                        .iter()
                        .map(|c| self.style.normalize(c))
                        .collect(),
                    remote_table: self.style.normalize(&fk.remote_table),
                    remote_columns: fk
                        .remote_columns
                        .map(|cols| cols.iter().map(|c| self.style.normalize(c)).collect()),
                    name,
                    token,
                }
            })
            .collect())
    }
}

fn recover_unsupported<T: Default>(result: Result<T>) -> Result<T> {
    match result {
        Err(err) if err.is_unsupported() => {
            debug!(error = %err, "capability unavailable, using empty result");
            Ok(T::default())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{GenericAdapter, MysqlAdapter};
    use crate::driver::Value;
    use crate::testing::{row, text, ScriptedConnection};

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(normalize_identifier("\"Main\".\"CD\"", "\"", "."), "cd");
        assert_eq!(normalize_identifier("`Artist`", "`", "."), "artist");
        assert_eq!(normalize_identifier("dbo.Track", "\"", "."), "track");
        assert_eq!(normalize_identifier("plain", "", ""), "plain");
    }

    #[test]
    fn test_normalize_identifier_with_quote_pair() {
        assert_eq!(normalize_identifier("[Artist]", "[]", "."), "artist");
        assert_eq!(normalize_identifier("[dbo].[Track]", "[]", "."), "track");
        assert_eq!(normalize_identifier("[a]]b]", "[]", "."), "a]b");
    }

    #[test]
    fn test_separator_inside_quotes_is_kept() {
        assert_eq!(normalize_identifier("\"main\".\"Odd.Name\"", "\"", "."), "odd.name");
        assert_eq!(normalize_identifier("[dbo].[Odd.Name]", "[]", "."), "odd.name");
        assert_eq!(normalize_identifier("\"we\"\"ird\"", "\"", "."), "we\"ird");
    }

    #[test]
    fn test_quote_doubles_embedded_quotes() {
        let style = IdentifierStyle::default();
        assert_eq!(style.quote("cd"), "\"cd\"");
        assert_eq!(style.quote("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(IdentifierStyle::new("", ".").quote("cd"), "cd");
        assert_eq!(IdentifierStyle::new("[]", ".").quote("a]b"), "[a]]b]");
    }

    #[test]
    fn test_style_resolution_order() {
        let conn = ScriptedConnection::new("mysql").with_quote("`");

        let style = IdentifierStyle::resolve(&conn, None, None);
        assert_eq!(style.quote_char(), "`");
        assert_eq!(style.separator(), DEFAULT_SEPARATOR);

        let style = IdentifierStyle::resolve(&conn, Some("["), Some(":"));
        assert_eq!(style.quote_char(), "[");
        assert_eq!(style.separator(), ":");

        let plain = ScriptedConnection::new("odbc");
        assert_eq!(
            IdentifierStyle::resolve(&plain, None, None),
            IdentifierStyle::default()
        );
    }

    #[test]
    fn test_generic_backend_probes_columns() {
        let conn = ScriptedConnection::new("odbc")
            .on(
                "information_schema.tables",
                &[],
                vec![row(&[("table_name", text("Stock"))])],
            )
            .with_probe("\"Stock\"", &[("SKU", Some("VARCHAR(12)")), ("Qty", None)]);
        let adapter = GenericAdapter::default();
        let normalizer = Normalizer::new(&conn, &adapter, IdentifierStyle::default());

        let tables = normalizer.list_tables().unwrap();
        assert_eq!(tables[0].raw, "Stock");
        assert_eq!(tables[0].name, "stock");

        let info = normalizer.introspect(&tables[0]).unwrap();
        assert_eq!(info.metadata.column_names().collect::<Vec<_>>(), vec!["sku", "qty"]);
        assert_eq!(info.metadata.columns[0].data_type, "varchar");
        assert!(info.metadata.columns[1].nullable);
        assert!(info.metadata.primary_key.is_empty());
        assert!(info.metadata.unique_constraints.is_empty());
        assert!(info.foreign_keys.is_empty());
    }

    #[test]
    fn test_probe_failure_is_fatal() {
        let conn = ScriptedConnection::new("odbc");
        let adapter = GenericAdapter::default();
        let normalizer = Normalizer::new(&conn, &adapter, IdentifierStyle::default());
        let table = CatalogTable {
            raw: "missing".into(),
            name: "missing".into(),
        };

        assert!(normalizer.introspect(&table).is_err());
    }

    #[test]
    fn test_foreign_key_tokens() {
        let fk_row = |name: &str, col: &str| {
            row(&[
                ("constraint_name", text(name)),
                ("column_name", text(col)),
                ("referenced_table_name", text("`Department`")),
                ("referenced_column_name", Value::Null),
            ])
        };
        let conn = ScriptedConnection::new("mysql").with_quote("`").on(
            "referenced_table_name IS NOT NULL",
            &["hr", "employee"],
            vec![fk_row("Emp_Dept", "Dept_Id"), fk_row("emp_backup", "backup_dept_id")],
        );
        let adapter = MysqlAdapter::new(Some("hr".into()));
        let style = IdentifierStyle::resolve(&conn, None, None);
        let normalizer = Normalizer::new(&conn, &adapter, style);
        let table = CatalogTable {
            raw: "employee".into(),
            name: "employee".into(),
        };

        let fks = normalizer.foreign_keys(&table).unwrap();
        assert_eq!(fks[0].token, "emp_dept");
        assert_eq!(fks[0].local_columns, vec!["dept_id"]);
        assert_eq!(fks[0].remote_table, "department");
        assert!(fks[0].references_primary_key());
        assert_eq!(fks[1].token, "emp_backup");
    }

    #[test]
    fn test_unnamed_foreign_keys_get_ordinal_tokens() {
        struct Unnamed;
        impl CatalogAdapter for Unnamed {
            fn name(&self) -> &'static str {
                "unnamed"
            }
            fn list_tables(&self, _: &dyn Connection) -> Result<Vec<String>> {
                Ok(vec!["employee".into()])
            }
            fn columns(&self, _: &dyn Connection, _: &str) -> Result<Vec<ColumnInfo>> {
                Ok(Vec::new())
            }
            fn primary_key(&self, _: &dyn Connection, _: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
            fn unique_constraints(
                &self,
                _: &dyn Connection,
                _: &str,
            ) -> Result<Vec<UniqueConstraint>> {
                Ok(Vec::new())
            }
            fn foreign_keys(&self, _: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>> {
                Ok(vec![
                    ForeignKeyRef::new(table, ["dept_id"], "department", ["id"]),
                    ForeignKeyRef::new(table, ["boss_id"], "employee", ["id"]).with_name("boss"),
                    ForeignKeyRef::new(table, ["backup_dept_id"], "department", ["id"]),
                ])
            }
        }

        let conn = ScriptedConnection::new("custom");
        let normalizer = Normalizer::new(&conn, &Unnamed, IdentifierStyle::default());
        let table = CatalogTable {
            raw: "employee".into(),
            name: "employee".into(),
        };

        let tokens: Vec<_> = normalizer
            .foreign_keys(&table)
            .unwrap()
            .into_iter()
            .map(|fk| fk.token)
            .collect();
        assert_eq!(tokens, vec!["_1", "boss", "_2"]);
    }

    #[test]
    fn test_ordinal_tokens_skip_catalog_names() {
        struct Keys;
        impl CatalogAdapter for Keys {
            fn name(&self) -> &'static str {
                "keys"
            }
            fn list_tables(&self, _: &dyn Connection) -> Result<Vec<String>> {
                Ok(vec!["payment".into()])
            }
            fn columns(&self, _: &dyn Connection, _: &str) -> Result<Vec<ColumnInfo>> {
                Ok(Vec::new())
            }
            fn primary_key(&self, _: &dyn Connection, _: &str) -> Result<Vec<String>> {
                Ok(Vec::new())
            }
            fn unique_constraints(
                &self,
                _: &dyn Connection,
                _: &str,
            ) -> Result<Vec<UniqueConstraint>> {
                Ok(Vec::new())
            }
            fn foreign_keys(&self, _: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>> {
                Ok(vec![
                    ForeignKeyRef::new(table, ["payer_id"], "customer", ["id"]).with_name("_1"),
                    ForeignKeyRef::new(table, ["payee_id"], "customer", ["id"]),
                    ForeignKeyRef::new(table, ["invoice_id"], "invoice", ["id"]),
                    ForeignKeyRef::new(table, ["order_id"], "orders", ["id"]).with_name("_3"),
                ])
            }
        }

        let conn = ScriptedConnection::new("custom");
        let normalizer = Normalizer::new(&conn, &Keys, IdentifierStyle::default());
        let table = CatalogTable {
            raw: "payment".into(),
            name: "payment".into(),
        };

        let tokens: Vec<_> = normalizer
            .foreign_keys(&table)
            .unwrap()
            .into_iter()
            .map(|fk| fk.token)
            .collect();
        assert_eq!(tokens, vec!["_1", "_2", "_4", "_3"]);
    }
}
