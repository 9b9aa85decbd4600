//! SQLite catalog adapter.
//!
//! Reads the schema through the `pragma_*` table-valued functions so every
//! table name is bound as a parameter instead of spliced into SQL.

use super::{group_rows, CatalogAdapter};
use crate::catalog::{ColumnInfo, ForeignKeyRef, UniqueConstraint};
use crate::driver::{Connection, Row};
use crate::error::{Error, Result};

const LIST_TABLES: &str = "SELECT name FROM sqlite_master \
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const TABLE_INFO: &str =
    "SELECT name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid";

const INDEX_LIST: &str = "SELECT name FROM pragma_index_list(?1) \
     WHERE \"unique\" = 1 AND origin <> 'pk' ORDER BY name";

const INDEX_INFO: &str = "SELECT name FROM pragma_index_info(?1) ORDER BY seqno";

// Pragma ids count down from the most recently declared key.
const FOREIGN_KEY_LIST: &str = "SELECT id, seq, \"table\", \"from\", \"to\" \
     FROM pragma_foreign_key_list(?1) ORDER BY id DESC, seq";

/// Adapter for SQLite databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteAdapter;

impl SqliteAdapter {
    fn table_info(&self, conn: &dyn Connection, table: &str) -> Result<Vec<Row>> {
        let rows = conn.query(TABLE_INFO, &[table])?;
        if rows.is_empty() {
            // An unknown table yields no rows instead of an error.
            return Err(Error::CatalogUnsupported {
                capability: "column_info",
                table: table.to_string(),
            });
        }
        Ok(rows)
    }
}

impl CatalogAdapter for SqliteAdapter {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn list_tables(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        conn.query(LIST_TABLES, &[])?
            .iter()
            .map(|row| row.required_text("name"))
            .collect()
    }

    fn columns(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = self.table_info(conn, table)?;
        let pk_count = rows
            .iter()
            .filter(|row| row.int("pk").unwrap_or(0) > 0)
            .count();

        rows.iter()
            .map(|row| {
                let name = row.required_text("name")?;
                let declared = row.text("type").unwrap_or_default();
                let in_pk = row.int("pk").unwrap_or(0) > 0;
                // A lone INTEGER PRIMARY KEY aliases the rowid.
                let rowid_alias = in_pk && pk_count == 1 && declared.eq_ignore_ascii_case("integer");
                let nullable = row.int("notnull").unwrap_or(0) == 0 && !rowid_alias;

                let mut column = ColumnInfo::from_declared(name, &declared, nullable);
                column.default_value = row.text("dflt_value");
                column.extra.auto_increment = rowid_alias;
                Ok(column)
            })
            .collect()
    }

    fn primary_key(&self, conn: &dyn Connection, table: &str) -> Result<Vec<String>> {
        let mut keyed: Vec<(i64, String)> = self
            .table_info(conn, table)?
            .iter()
            .filter_map(|row| {
                let position = row.int("pk").unwrap_or(0);
                (position > 0).then(|| row.text("name").map(|name| (position, name)))?
            })
            .collect();
        keyed.sort_by_key(|(position, _)| *position);
        Ok(keyed.into_iter().map(|(_, name)| name).collect())
    }

    fn unique_constraints(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<UniqueConstraint>> {
        let mut constraints = Vec::new();
        for index in conn.query(INDEX_LIST, &[table])? {
            let name = index.required_text("name")?;
            let columns: Option<Vec<String>> = conn
                .query(INDEX_INFO, &[name.as_str()])?
                .iter()
                .map(|row| row.text("name"))
                .collect();

            // Expression indexes report NULL column names.
            if let Some(columns) = columns.filter(|c| !c.is_empty()) {
                constraints.push(UniqueConstraint { name, columns });
            }
        }
        Ok(constraints)
    }

    fn foreign_keys(&self, conn: &dyn Connection, table: &str) -> Result<Vec<ForeignKeyRef>> {
        let rows = conn.query(FOREIGN_KEY_LIST, &[table])?;

        group_rows(rows, "id")?
            .into_iter()
            .map(|(_, rows)| {
                let remote_table = rows
                    .first()
                    .map(|row| row.required_text("table"))
                    .transpose()?
                    .unwrap_or_default();
                let local_columns = rows
                    .iter()
                    .map(|row| row.required_text("from"))
                    .collect::<Result<Vec<_>>>()?;
                let remote_columns: Option<Vec<String>> =
                    rows.iter().map(|row| row.text("to")).collect();

                Ok(ForeignKeyRef {
                    local_table: table.to_string(),
                    local_columns,
                    remote_table,
                    remote_columns,
                    name: None,
                    token: String::new(),
                })
            })
            .collect()
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::catalog::ColumnSize;
    use crate::driver::SqliteConnection;

    fn test_db() -> SqliteConnection {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE artist (
                 id INTEGER PRIMARY KEY,
                 name VARCHAR(100) NOT NULL,
                 rank INTEGER DEFAULT 13,
                 UNIQUE (name)
             );
             CREATE TABLE cd (
                 id INTEGER PRIMARY KEY,
                 artist INTEGER NOT NULL REFERENCES artist(id),
                 title TEXT NOT NULL,
                 year CHAR(4)
             );
             CREATE TABLE track (
                 cd INTEGER NOT NULL,
                 position INTEGER NOT NULL,
                 title TEXT,
                 PRIMARY KEY (cd, position),
                 FOREIGN KEY (cd) REFERENCES cd
             );
             CREATE TABLE tagged (
                 cd_id INTEGER,
                 cd_artist INTEGER,
                 FOREIGN KEY (cd_id, cd_artist) REFERENCES cd (id, artist)
             );",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_list_tables() {
        let conn = test_db();
        let tables = SqliteAdapter.list_tables(&conn).unwrap();
        assert_eq!(tables, vec!["artist", "cd", "tagged", "track"]);
    }

    #[test]
    fn test_columns() {
        let conn = test_db();
        let columns = SqliteAdapter.columns(&conn, "artist").unwrap();

        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].name, "id");
        assert!(columns[0].extra.auto_increment);
        assert!(!columns[0].nullable);
        assert_eq!(columns[1].data_type, "varchar");
        assert_eq!(columns[1].size, Some(ColumnSize::Length(100)));
        assert!(!columns[1].nullable);
        assert!(columns[2].nullable);
        assert_eq!(columns[2].default_value.as_deref(), Some("13"));
    }

    #[test]
    fn test_columns_of_unknown_table_is_unsupported() {
        let conn = test_db();
        let err = SqliteAdapter.columns(&conn, "nope").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_primary_keys() {
        let conn = test_db();
        assert_eq!(SqliteAdapter.primary_key(&conn, "artist").unwrap(), vec!["id"]);
        assert_eq!(
            SqliteAdapter.primary_key(&conn, "track").unwrap(),
            vec!["cd", "position"]
        );
        assert!(SqliteAdapter.primary_key(&conn, "tagged").unwrap().is_empty());
    }

    #[test]
    fn test_unique_constraints() {
        let conn = test_db();
        let uniques = SqliteAdapter.unique_constraints(&conn, "artist").unwrap();

        assert_eq!(uniques.len(), 1);
        assert_eq!(uniques[0].columns, vec!["name"]);
        assert!(SqliteAdapter.unique_constraints(&conn, "cd").unwrap().is_empty());
    }

    #[test]
    fn test_foreign_keys() {
        let conn = test_db();

        let fks = SqliteAdapter.foreign_keys(&conn, "cd").unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].local_columns, vec!["artist"]);
        assert_eq!(fks[0].remote_table, "artist");
        assert_eq!(fks[0].remote_columns, Some(vec!["id".to_string()]));
        assert!(fks[0].name.is_none());

        let implicit = SqliteAdapter.foreign_keys(&conn, "track").unwrap();
        assert_eq!(implicit.len(), 1);
        assert!(implicit[0].references_primary_key());

        let composite = SqliteAdapter.foreign_keys(&conn, "tagged").unwrap();
        assert_eq!(composite[0].local_columns, vec!["cd_id", "cd_artist"]);
        assert_eq!(
            composite[0].remote_columns,
            Some(vec!["id".to_string(), "artist".to_string()])
        );
    }
}
