//! relmap core - catalog introspection and relationship inference.
//!
//! This crate reads a relational database's catalog through a [`Connection`],
//! derives one [`ClassDefinition`] per table, infers belongs-to and has-many
//! relationships from foreign keys, and registers the classes into a
//! [`ClassRegistry`].

pub mod adapter;
pub mod catalog;
pub mod class;
pub mod config;
pub mod driver;
pub mod error;
pub mod inflect;
pub mod loader;
pub mod moniker;
pub mod normalize;
pub mod registry;
pub mod relationship;

#[cfg(test)]
mod testing;

pub use adapter::{adapter_for, CatalogAdapter};
pub use catalog::{
    ColumnExtra, ColumnInfo, ColumnSize, ForeignKeyRef, TableMetadata, UniqueConstraint,
};
pub use class::{
    ClassDefinition, ClassExtension, ExtensionError, ExtensionSource, Materializer, Relationship,
};
pub use config::{AccessorPolicy, LoaderConfig, LoaderOptions};
pub use driver::{Connection, ProbedColumn, Row, Value};
pub use error::{Error, LoadWarning, Result};
pub use inflect::{Inflection, Inflector};
pub use loader::{LoadReport, LoadedSchema, SchemaLoader};
pub use moniker::{MonikerMapper, MonikerOverride};
pub use normalize::{normalize_identifier, IdentifierStyle, Normalizer};
pub use registry::{ClassRegistry, MemoryRegistry};
pub use relationship::{
    ColumnPair, JoinCondition, RelationshipBinding, RelationshipBuilder, RelationshipKind,
    RelationshipPlan,
};

// SQLite driver
#[cfg(feature = "sqlite")]
pub use driver::SqliteConnection;
