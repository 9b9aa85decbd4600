//! Canonical catalog model.
//!
//! Every backend adapter is normalized into these records: tables with their
//! columns, keys and unique constraints, plus foreign keys seen from the
//! referencing side.

mod column;
mod foreign_key;
mod table;

pub use column::{parse_declared_type, ColumnExtra, ColumnInfo, ColumnSize};
pub use foreign_key::ForeignKeyRef;
pub use table::{TableMetadata, UniqueConstraint};
