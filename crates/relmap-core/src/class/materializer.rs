//! Table metadata to class definitions.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::{ClassDefinition, ExtensionSource};
use crate::catalog::TableMetadata;
use crate::config::{AccessorPolicy, LoaderOptions};
use crate::error::{Error, LoadWarning, Result};
use crate::relationship::{RelationshipBinding, RelationshipKind};

/// Builds class definitions and applies relationship bindings to them.
#[derive(Debug, Clone, Default)]
pub struct Materializer {
    mixins: Vec<String>,
    best_effort: bool,
    accessor_policy: AccessorPolicy,
}

impl Materializer {
    pub fn new(mixins: Vec<String>) -> Self {
        Self {
            mixins,
            ..Self::default()
        }
    }

    pub fn from_options(options: &LoaderOptions) -> Self {
        Self::new(options.mixins.clone())
            .with_best_effort(options.best_effort)
            .with_accessor_policy(options.accessor_policy)
    }

    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    pub fn with_accessor_policy(mut self, policy: AccessorPolicy) -> Self {
        self.accessor_policy = policy;
        self
    }

    /// Class for `table` with its columns, key, unique constraints and
    /// mixins. A table without a primary key gets a warning and no key.
    pub fn materialize(
        &self,
        table: &TableMetadata,
        moniker: &str,
        warnings: &mut Vec<LoadWarning>,
    ) -> Result<ClassDefinition> {
        let mut class = ClassDefinition::new(moniker, table.name.clone());
        class.add_columns(table.columns.iter().cloned());

        if table.has_primary_key() {
            class.set_primary_key(table.primary_key.iter().cloned())?;
        } else {
            warn!(table = %table.name, "table has no primary key");
            warnings.push(LoadWarning::NoPrimaryKey {
                table: table.name.clone(),
            });
        }

        for constraint in &table.unique_constraints {
            class.add_unique_constraint(constraint.clone());
        }
        class.mixins = self.mixins.clone();

        debug!(
            table = %table.name,
            moniker = %moniker,
            columns = class.columns.len(),
            "materialized class"
        );
        Ok(class)
    }

    /// Apply bindings in order. Returns the number applied.
    ///
    /// In best-effort mode a binding that fails validation is skipped and
    /// recorded as a warning.
    pub fn apply_relationships<'b>(
        &self,
        classes: &mut BTreeMap<String, ClassDefinition>,
        bindings: impl IntoIterator<Item = &'b RelationshipBinding>,
        warnings: &mut Vec<LoadWarning>,
    ) -> Result<usize> {
        let mut applied = 0;
        for binding in bindings {
            match self.apply_binding(classes, binding) {
                Ok(()) => applied += 1,
                Err(Error::RelationshipApply {
                    entity,
                    accessor,
                    reason,
                }) if self.best_effort => {
                    warn!(
                        moniker = %entity,
                        accessor = %accessor,
                        reason = %reason,
                        "skipping relationship"
                    );
                    warnings.push(LoadWarning::RelationshipSkipped {
                        entity,
                        accessor,
                        reason,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(applied)
    }

    /// Declare one binding on its owner class.
    pub fn apply_binding(
        &self,
        classes: &mut BTreeMap<String, ClassDefinition>,
        binding: &RelationshipBinding,
    ) -> Result<()> {
        let rejected = |reason: String| Error::RelationshipApply {
            entity: binding.owner.clone(),
            accessor: binding.accessor.clone(),
            reason,
        };

        let target = classes
            .get(&binding.target)
            .map(ClassDefinition::signature)
            .ok_or_else(|| rejected(format!("class {} is not loaded", binding.target)))?;
        let owner = classes
            .get_mut(&binding.owner)
            .ok_or_else(|| rejected(format!("class {} is not loaded", binding.owner)))?;

        let condition = binding.condition.clone();
        match binding.kind {
            RelationshipKind::BelongsTo => {
                owner.belongs_to(&binding.accessor, &target, condition, self.accessor_policy)
            }
            RelationshipKind::HasMany => {
                owner.has_many(&binding.accessor, &target, condition, self.accessor_policy)
            }
        }
    }

    /// Run the extension hook of every class that has one.
    pub fn run_extensions(
        &self,
        source: &dyn ExtensionSource,
        classes: &mut BTreeMap<String, ClassDefinition>,
    ) -> Result<()> {
        for (moniker, class) in classes.iter_mut() {
            let extension = source
                .load(moniker)
                .map_err(|err| Error::ExtensionLoad {
                    moniker: moniker.clone(),
                    source: err,
                })?;

            if let Some(extension) = extension {
                debug!(moniker = %moniker, "applying extension");
                extension.extend(class)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ColumnInfo, UniqueConstraint};
    use crate::class::{ClassExtension, ExtensionError};
    use crate::relationship::JoinCondition;

    fn classes() -> BTreeMap<String, ClassDefinition> {
        let materializer = Materializer::default();
        let mut warnings = Vec::new();
        let artist = TableMetadata::new("artist")
            .with_columns([ColumnInfo::new("id", "integer")])
            .with_primary_key(["id"]);
        let cd = TableMetadata::new("cd")
            .with_columns([
                ColumnInfo::new("id", "integer"),
                ColumnInfo::new("artist_id", "integer"),
            ])
            .with_primary_key(["id"]);

        [("Artist", artist), ("CD", cd)]
            .into_iter()
            .map(|(moniker, table)| {
                let class = materializer
                    .materialize(&table, moniker, &mut warnings)
                    .unwrap();
                (moniker.to_string(), class)
            })
            .collect()
    }

    fn binding(
        owner: &str,
        accessor: &str,
        target: &str,
        foreign: &str,
        local: &str,
    ) -> RelationshipBinding {
        RelationshipBinding {
            owner: owner.into(),
            accessor: accessor.into(),
            kind: RelationshipKind::BelongsTo,
            target: target.into(),
            condition: JoinCondition::zip(&[foreign], &[local]),
            fk_token: "_1".into(),
        }
    }

    #[test]
    fn test_materialize_table() {
        let table = TableMetadata::new("artist")
            .with_columns([ColumnInfo::new("id", "integer"), ColumnInfo::new("name", "text")])
            .with_primary_key(["id"])
            .with_unique(UniqueConstraint::new("artist_name", ["name"]));
        let mut warnings = Vec::new();

        let class = Materializer::new(vec!["Timestamps".into()])
            .materialize(&table, "Artist", &mut warnings)
            .unwrap();

        assert_eq!(class.moniker, "Artist");
        assert_eq!(class.table, "artist");
        assert_eq!(class.primary_key, vec!["id"]);
        assert_eq!(class.unique_constraints.len(), 1);
        assert_eq!(class.mixins, vec!["Timestamps"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_table_without_primary_key_warns() {
        let table = TableMetadata::new("log").with_columns([ColumnInfo::nullable("line", "text")]);
        let mut warnings = Vec::new();

        let class = Materializer::default()
            .materialize(&table, "Log", &mut warnings)
            .unwrap();

        assert!(class.primary_key.is_empty());
        assert_eq!(
            warnings,
            vec![LoadWarning::NoPrimaryKey {
                table: "log".into()
            }]
        );
    }

    #[test]
    fn test_failed_binding_is_fatal_by_default() {
        let mut classes = classes();
        let mut warnings = Vec::new();
        let bad = binding("CD", "artist", "Artist", "uuid", "artist_id");

        let err = Materializer::default()
            .apply_relationships(&mut classes, [&bad], &mut warnings)
            .unwrap_err();
        assert!(matches!(err, Error::RelationshipApply { .. }));
    }

    #[test]
    fn test_best_effort_skips_failed_bindings() {
        let mut classes = classes();
        let mut warnings = Vec::new();
        let bindings = [
            binding("CD", "label", "Label", "id", "label_id"),
            binding("CD", "artist", "Artist", "id", "artist_id"),
        ];

        let applied = Materializer::default()
            .with_best_effort(true)
            .apply_relationships(&mut classes, &bindings, &mut warnings)
            .unwrap();

        assert_eq!(applied, 1);
        assert!(classes["CD"].relationship("artist").is_some());
        assert!(matches!(
            &warnings[..],
            [LoadWarning::RelationshipSkipped { accessor, .. }] if accessor == "label"
        ));
    }

    struct Source;

    impl ExtensionSource for Source {
        fn load(
            &self,
            moniker: &str,
        ) -> std::result::Result<Option<Box<dyn ClassExtension>>, ExtensionError> {
            match moniker {
                "Artist" => Ok(Some(Box::new(|class: &mut ClassDefinition| -> Result<()> {
                    class.mixins.push("Searchable".to_string());
                    Ok(())
                }))),
                "Broken" => Err("syntax error in extension".into()),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn test_extensions() {
        let mut classes = classes();
        Materializer::default()
            .run_extensions(&Source, &mut classes)
            .unwrap();

        assert_eq!(classes["Artist"].mixins, vec!["Searchable"]);
        assert!(classes["CD"].mixins.is_empty());

        classes.insert("Broken".into(), ClassDefinition::new("Broken", "broken"));
        let err = Materializer::default()
            .run_extensions(&Source, &mut classes)
            .unwrap_err();
        assert!(matches!(err, Error::ExtensionLoad { ref moniker, .. } if moniker == "Broken"));
    }
}
