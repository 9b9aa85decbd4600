//! Materialized class definitions.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::catalog::{ColumnInfo, UniqueConstraint};
use crate::config::AccessorPolicy;
use crate::error::{Error, Result};
use crate::relationship::{JoinCondition, RelationshipKind};

/// A relationship accessor declared on a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// Accessor name.
    pub accessor: String,
    pub kind: RelationshipKind,
    /// Moniker of the related class.
    pub target: String,
    pub condition: JoinCondition,
}

/// The column surface of a class, used to validate relationship conditions
/// against their target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSignature {
    pub moniker: String,
    pub columns: BTreeSet<String>,
}

impl ClassSignature {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }
}

/// An ORM class derived from one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDefinition {
    /// Class name.
    pub moniker: String,
    /// Backing table.
    pub table: String,
    /// Columns in table order.
    pub columns: Vec<ColumnInfo>,
    /// Primary key columns; empty when the table has none.
    pub primary_key: Vec<String>,
    pub unique_constraints: Vec<UniqueConstraint>,
    /// Components applied to the class, in order.
    pub mixins: Vec<String>,
    /// Relationship accessors in declaration order.
    pub relationships: Vec<Relationship>,
}

impl ClassDefinition {
    /// Create an empty class for `table`.
    pub fn new(moniker: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            moniker: moniker.into(),
            table: table.into(),
            columns: Vec::new(),
            primary_key: Vec::new(),
            unique_constraints: Vec::new(),
            mixins: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Declare columns; a column with an existing name replaces it.
    pub fn add_columns(&mut self, columns: impl IntoIterator<Item = ColumnInfo>) {
        for column in columns {
            match self.columns.iter_mut().find(|c| c.name == column.name) {
                Some(existing) => *existing = column,
                None => self.columns.push(column),
            }
        }
    }

    /// Declare the primary key. Every column must already be declared.
    pub fn set_primary_key(
        &mut self,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<()> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if let Some(missing) = columns.iter().find(|c| !self.has_column(c)) {
            return Err(Error::Config(format!(
                "primary key column {missing} is not a column of {}",
                self.moniker
            )));
        }
        self.primary_key = columns;
        Ok(())
    }

    /// Declare a unique constraint, replacing one with the same name.
    pub fn add_unique_constraint(&mut self, constraint: UniqueConstraint) {
        match self
            .unique_constraints
            .iter_mut()
            .find(|u| u.name == constraint.name)
        {
            Some(existing) => *existing = constraint,
            None => self.unique_constraints.push(constraint),
        }
    }

    /// Declare a many-to-one accessor. Condition pairs name target columns
    /// as `foreign` and columns of this class as `local`.
    pub fn belongs_to(
        &mut self,
        accessor: impl Into<String>,
        target: &ClassSignature,
        condition: JoinCondition,
        policy: AccessorPolicy,
    ) -> Result<()> {
        self.declare(accessor.into(), RelationshipKind::BelongsTo, target, condition, policy)
    }

    /// Declare a one-to-many accessor. Condition pairs name target columns
    /// as `foreign` and columns of this class as `local`.
    pub fn has_many(
        &mut self,
        accessor: impl Into<String>,
        target: &ClassSignature,
        condition: JoinCondition,
        policy: AccessorPolicy,
    ) -> Result<()> {
        self.declare(accessor.into(), RelationshipKind::HasMany, target, condition, policy)
    }

    fn declare(
        &mut self,
        accessor: String,
        kind: RelationshipKind,
        target: &ClassSignature,
        condition: JoinCondition,
        policy: AccessorPolicy,
    ) -> Result<()> {
        let reject = |reason: String| Error::RelationshipApply {
            entity: self.moniker.clone(),
            accessor: accessor.clone(),
            reason,
        };

        if accessor.is_empty() {
            return Err(reject("accessor name is empty".to_string()));
        }
        if condition.is_empty() {
            return Err(reject("join condition is empty".to_string()));
        }
        if let Some(column) = condition.foreign_columns().find(|c| !target.has_column(c)) {
            return Err(reject(format!("{} has no column {column}", target.moniker)));
        }
        if let Some(column) = condition.local_columns().find(|c| !self.has_column(c)) {
            return Err(reject(format!("{} has no column {column}", self.moniker)));
        }

        let relationship = Relationship {
            accessor,
            kind,
            target: target.moniker.clone(),
            condition,
        };

        match self
            .relationships
            .iter_mut()
            .find(|r| r.accessor == relationship.accessor)
        {
            Some(_) if policy == AccessorPolicy::Strict => Err(Error::AccessorCollision {
                entity: self.moniker.clone(),
                accessor: relationship.accessor,
            }),
            Some(existing) => {
                debug!(
                    moniker = %self.moniker,
                    accessor = %relationship.accessor,
                    replaced = %existing.target,
                    "accessor redeclared"
                );
                *existing = relationship;
                Ok(())
            }
            None => {
                self.relationships.push(relationship);
                Ok(())
            }
        }
    }

    /// Check if a column is declared.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Get a relationship by accessor.
    pub fn relationship(&self, accessor: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.accessor == accessor)
    }

    /// Column surface of this class.
    pub fn signature(&self) -> ClassSignature {
        ClassSignature {
            moniker: self.moniker.clone(),
            columns: self.columns.iter().map(|c| c.name.clone()).collect(),
        }
    }
}
