//! Foreign key references.

use serde::Serialize;

/// A foreign key where `local_table` is the referencing side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    /// Referencing table.
    pub local_table: String,
    /// Referencing columns, positionally matched with `remote_columns`.
    pub local_columns: Vec<String>,
    /// Referenced table.
    pub remote_table: String,
    /// Referenced columns. `None` when the catalog leaves them implicit,
    /// meaning the referenced table's primary key.
    pub remote_columns: Option<Vec<String>>,
    /// Constraint name supplied by the catalog.
    pub name: Option<String>,
    /// Stable internal identity: the constraint name, or a synthesized
    /// per-table ordinal for unnamed keys.
    #[serde(skip)]
    pub token: String,
}

impl ForeignKeyRef {
    /// Create an unnamed foreign key with explicit remote columns.
    pub fn new(
        local_table: impl Into<String>,
        local_columns: impl IntoIterator<Item = impl Into<String>>,
        remote_table: impl Into<String>,
        remote_columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            local_table: local_table.into(),
            local_columns: local_columns.into_iter().map(Into::into).collect(),
            remote_table: remote_table.into(),
            remote_columns: Some(remote_columns.into_iter().map(Into::into).collect()),
            name: None,
            token: String::new(),
        }
    }

    /// Create a foreign key that references the remote primary key implicitly.
    pub fn to_primary_key(
        local_table: impl Into<String>,
        local_columns: impl IntoIterator<Item = impl Into<String>>,
        remote_table: impl Into<String>,
    ) -> Self {
        Self {
            local_table: local_table.into(),
            local_columns: local_columns.into_iter().map(Into::into).collect(),
            remote_table: remote_table.into(),
            remote_columns: None,
            name: None,
            token: String::new(),
        }
    }

    /// Set the constraint name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Check if the referenced columns are implicit.
    pub fn references_primary_key(&self) -> bool {
        self.remote_columns.is_none()
    }
}
