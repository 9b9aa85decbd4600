//! Foreign keys to named bidirectional relationships.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use super::binding::{JoinCondition, RelationshipBinding, RelationshipKind, RelationshipPair};
use crate::catalog::{ForeignKeyRef, TableMetadata};
use crate::error::{Error, Result};
use crate::inflect::Inflector;

/// A foreign key whose referenced table has been mapped to a moniker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedForeignKey {
    pub key: ForeignKeyRef,
    pub remote_moniker: String,
}

impl ResolvedForeignKey {
    pub fn new(key: ForeignKeyRef, remote_moniker: impl Into<String>) -> Self {
        Self {
            key,
            remote_moniker: remote_moniker.into(),
        }
    }
}

/// Bindings grouped by owning moniker, in generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipPlan {
    bindings: BTreeMap<String, Vec<RelationshipBinding>>,
}

impl RelationshipPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding to its owner's list.
    pub fn push(&mut self, binding: RelationshipBinding) {
        self.bindings
            .entry(binding.owner.clone())
            .or_default()
            .push(binding);
    }

    pub fn push_pair(&mut self, pair: RelationshipPair) {
        self.push(pair.forward);
        self.push(pair.reverse);
    }

    /// Bindings owned by `moniker`.
    pub fn bindings_for(&self, moniker: &str) -> &[RelationshipBinding] {
        self.bindings.get(moniker).map(Vec::as_slice).unwrap_or_default()
    }

    /// Owners that have at least one binding.
    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// All bindings, owners in moniker order.
    pub fn iter(&self) -> impl Iterator<Item = &RelationshipBinding> {
        self.bindings.values().flatten()
    }

    /// Total number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derives relationship names and conditions from foreign keys.
///
/// Needs the metadata of every loaded table, keyed by moniker, to resolve
/// implicit primary-key references and to check column names.
pub struct RelationshipBuilder<'a> {
    inflector: &'a Inflector,
    tables: &'a BTreeMap<String, TableMetadata>,
    verbose: bool,
}

impl<'a> RelationshipBuilder<'a> {
    pub fn new(inflector: &'a Inflector, tables: &'a BTreeMap<String, TableMetadata>) -> Self {
        Self {
            inflector,
            tables,
            verbose: false,
        }
    }

    /// Log every generated binding at info level instead of debug.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Build the plan for every source moniker.
    ///
    /// Sources are processed in moniker order and keys in catalog order.
    pub fn build(
        &self,
        foreign_keys: &BTreeMap<String, Vec<ResolvedForeignKey>>,
    ) -> Result<RelationshipPlan> {
        let mut plan = RelationshipPlan::new();
        for (moniker, keys) in foreign_keys {
            for pair in self.pairs_for(moniker, keys)? {
                plan.push_pair(pair);
            }
        }
        Ok(plan)
    }

    /// Relationship pairs for the foreign keys of one source moniker.
    pub fn pairs_for(
        &self,
        moniker: &str,
        keys: &[ResolvedForeignKey],
    ) -> Result<Vec<RelationshipPair>> {
        let mut counters: HashMap<&str, usize> = HashMap::new();
        for key in keys {
            *counters.entry(key.remote_moniker.as_str()).or_default() += 1;
        }

        keys.iter()
            .map(|key| {
                let shared = counters
                    .get(key.remote_moniker.as_str())
                    .copied()
                    .unwrap_or(1);
                self.pair(moniker, key, shared > 1)
            })
            .collect()
    }

    /// Resolve one foreign key into its forward and reverse bindings.
    ///
    /// `disambiguate` is set when the source has several keys to the same
    /// target; the reverse accessor then carries the local column names.
    pub fn pair(
        &self,
        moniker: &str,
        resolved: &ResolvedForeignKey,
        disambiguate: bool,
    ) -> Result<RelationshipPair> {
        let fk = &resolved.key;
        let remote = resolved.remote_moniker.as_str();

        let remote_columns = match &fk.remote_columns {
            Some(columns) => columns.clone(),
            None => self
                .tables
                .get(remote)
                .map(|t| t.primary_key.clone())
                .unwrap_or_default(),
        };

        if fk.local_columns.len() != remote_columns.len() {
            return Err(Error::SchemaInconsistency {
                table: fk.local_table.clone(),
                remote_table: fk.remote_table.clone(),
                local: fk.local_columns.len(),
                remote: remote_columns.len(),
            });
        }

        let condition = JoinCondition::zip(&remote_columns, &fk.local_columns);
        let local_table = fk.local_table.to_lowercase();

        let reverse_accessor = if disambiguate {
            self.inflector.pluralize(&format!(
                "{local_table}_{}",
                fk.local_columns.join("_")
            ))
        } else {
            self.inflector.pluralize(&local_table)
        };
        let forward_accessor = self.forward_accessor(moniker, fk);

        let forward = RelationshipBinding {
            owner: moniker.to_string(),
            accessor: forward_accessor,
            kind: RelationshipKind::BelongsTo,
            target: remote.to_string(),
            condition: condition.clone(),
            fk_token: fk.token.clone(),
        };
        let reverse = RelationshipBinding {
            owner: remote.to_string(),
            accessor: reverse_accessor,
            kind: RelationshipKind::HasMany,
            target: moniker.to_string(),
            condition: condition.reversed(),
            fk_token: fk.token.clone(),
        };

        for binding in [&forward, &reverse] {
            if self.verbose {
                info!(fk = %binding.fk_token, "{binding}");
            } else {
                debug!(fk = %binding.fk_token, "{binding}");
            }
        }

        Ok(RelationshipPair { forward, reverse })
    }

    fn forward_accessor(&self, moniker: &str, fk: &ForeignKeyRef) -> String {
        let [column] = fk.local_columns.as_slice() else {
            return self.inflector.singularize(&fk.remote_table.to_lowercase());
        };

        let local = self.tables.get(moniker);
        let stem = column
            .strip_suffix("_id")
            .filter(|stem| !stem.is_empty())
            .filter(|stem| !local.is_some_and(|t| t.has_column(stem)));

        self.inflector.singularize(stem.unwrap_or(column.as_str()))
    }
}
