//! Table metadata.

use super::column::ColumnInfo;
use serde::Serialize;

/// Canonical metadata for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableMetadata {
    /// Table name (lower-cased, unquoted).
    pub name: String,
    /// Columns in catalog order.
    pub columns: Vec<ColumnInfo>,
    /// Primary key columns in key order.
    pub primary_key: Vec<String>,
    /// Unique constraints, names unique per table.
    pub unique_constraints: Vec<UniqueConstraint>,
}

/// A named uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueConstraint {
    /// Constraint name.
    pub name: String,
    /// Columns in constraint order.
    pub columns: Vec<String>,
}

impl UniqueConstraint {
    /// Create a unique constraint.
    pub fn new(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl TableMetadata {
    /// Create empty metadata for a table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
        }
    }

    /// Add a column.
    pub fn with_column(mut self, column: ColumnInfo) -> Self {
        self.columns.push(column);
        self
    }

    /// Add multiple columns.
    pub fn with_columns(mut self, columns: impl IntoIterator<Item = ColumnInfo>) -> Self {
        self.columns.extend(columns);
        self
    }

    /// Set the primary key.
    pub fn with_primary_key(mut self, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a unique constraint, replacing one with the same name.
    pub fn with_unique(mut self, constraint: UniqueConstraint) -> Self {
        self.insert_unique(constraint);
        self
    }

    /// Insert a unique constraint, replacing one with the same name.
    pub fn insert_unique(&mut self, constraint: UniqueConstraint) {
        match self
            .unique_constraints
            .iter_mut()
            .find(|u| u.name == constraint.name)
        {
            Some(existing) => *existing = constraint,
            None => self.unique_constraints.push(constraint),
        }
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if the table has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.get_column(name).is_some()
    }

    /// Column names in catalog order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Check if a primary key was discovered.
    pub fn has_primary_key(&self) -> bool {
        !self.primary_key.is_empty()
    }
}
