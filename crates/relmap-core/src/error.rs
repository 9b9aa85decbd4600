//! Core error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Core loader errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A foreign key whose local and remote column lists differ in length.
    #[error(
        "schema inconsistency: foreign key {table} -> {remote_table} has {local} local column(s) but {remote} remote column(s)"
    )]
    SchemaInconsistency {
        /// Referencing table.
        table: String,
        /// Referenced table.
        remote_table: String,
        /// Number of local columns.
        local: usize,
        /// Number of remote columns.
        remote: usize,
    },

    /// The backend cannot supply a piece of catalog metadata.
    #[error("catalog does not support {capability} (table {table})")]
    CatalogUnsupported {
        /// Capability name (e.g. "column_info").
        capability: &'static str,
        /// Table being introspected.
        table: String,
    },

    /// A catalog query failed.
    #[error("catalog query failed: {0}")]
    Query(String),

    /// A relationship binding could not be applied to its class.
    #[error("failed to apply relationship {accessor} on {entity}: {reason}")]
    RelationshipApply {
        /// Owning class moniker.
        entity: String,
        /// Accessor being declared.
        accessor: String,
        /// Why the declaration was rejected.
        reason: String,
    },

    /// Two relationships with the same accessor on one class (strict mode only).
    #[error("accessor {accessor} is declared more than once on {entity}")]
    AccessorCollision {
        /// Owning class moniker.
        entity: String,
        /// Colliding accessor name.
        accessor: String,
    },

    /// A class extension exists but failed to load.
    #[error("extension for {moniker} failed to load: {source}")]
    ExtensionLoad {
        /// Class the extension belongs to.
        moniker: String,
        /// Underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Invalid table filter pattern.
    #[error("invalid table pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// SQLite driver error.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error means the backend lacks a capability.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::CatalogUnsupported { .. })
    }
}

/// Non-fatal conditions reported by a load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadWarning {
    /// The catalog returned no tables at all.
    NoTablesFound,
    /// Every table was removed by the constraint/exclude filters.
    AllTablesExcluded {
        /// Number of tables that were filtered out.
        count: usize,
    },
    /// A table has no discoverable primary key.
    NoPrimaryKey {
        /// Table name.
        table: String,
    },
    /// A foreign key points at a table that is not part of this load.
    DanglingForeignKey {
        /// Referencing table.
        table: String,
        /// Referenced table.
        remote_table: String,
    },
    /// A relationship was skipped in best-effort mode.
    RelationshipSkipped {
        /// Owning class moniker.
        entity: String,
        /// Accessor that was not declared.
        accessor: String,
        /// Why it failed.
        reason: String,
    },
    /// Several tables derived the same moniker.
    MonikerCollision {
        /// The shared moniker.
        moniker: String,
        /// Tables that map to it.
        tables: Vec<String>,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::NoTablesFound => write!(f, "no tables found in catalog"),
            LoadWarning::AllTablesExcluded { count } => {
                write!(f, "all {count} table(s) excluded by filters")
            }
            LoadWarning::NoPrimaryKey { table } => {
                write!(f, "table {table} has no primary key")
            }
            LoadWarning::DanglingForeignKey {
                table,
                remote_table,
            } => write!(
                f,
                "foreign key {table} -> {remote_table} skipped: {remote_table} is not loaded"
            ),
            LoadWarning::RelationshipSkipped {
                entity,
                accessor,
                reason,
            } => write!(f, "relationship {entity}.{accessor} skipped: {reason}"),
            LoadWarning::MonikerCollision { moniker, tables } => write!(
                f,
                "tables {} all map to moniker {moniker}",
                tables.join(", ")
            ),
        }
    }
}
