//! Schema loading pipeline.
//!
//! ```text
//! list tables -> filter -> monikers -> introspect -> materialize
//!             -> relationships -> extensions -> register
//! ```
//!
//! Everything up to registration is pure with respect to the registry:
//! [`SchemaLoader::plan`] produces an immutable [`LoadedSchema`] and
//! [`LoadedSchema::apply`] publishes it in one pass.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapter::{adapter_for, CatalogAdapter};
use crate::catalog::{ForeignKeyRef, TableMetadata};
use crate::class::{ClassDefinition, ExtensionSource, Materializer};
use crate::config::LoaderOptions;
use crate::driver::Connection;
use crate::error::{LoadWarning, Result};
use crate::moniker::MonikerMapper;
use crate::normalize::{CatalogTable, IdentifierStyle, Normalizer};
use crate::registry::ClassRegistry;
use crate::relationship::{RelationshipBuilder, RelationshipPlan, ResolvedForeignKey};

/// Outcome of a load or rescan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Table name → moniker for every table in the load.
    pub tables: BTreeMap<String, String>,
    /// Monikers registered by this call.
    pub monikers: Vec<String>,
    /// Monikers whose table was not seen by an earlier load.
    pub new_monikers: Vec<String>,
    /// Relationships declared by this call.
    pub relationships: usize,
    pub warnings: Vec<LoadWarning>,
}

/// A fully built schema that has not been registered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSchema {
    classes: BTreeMap<String, ClassDefinition>,
    plan: RelationshipPlan,
    tables: BTreeMap<String, String>,
    relationships: usize,
    warnings: Vec<LoadWarning>,
}

impl LoadedSchema {
    /// Classes keyed by moniker.
    pub fn classes(&self) -> &BTreeMap<String, ClassDefinition> {
        &self.classes
    }

    pub fn class(&self, moniker: &str) -> Option<&ClassDefinition> {
        self.classes.get(moniker)
    }

    /// Relationship bindings generated from foreign keys.
    pub fn plan(&self) -> &RelationshipPlan {
        &self.plan
    }

    /// Table name → moniker.
    pub fn tables(&self) -> &BTreeMap<String, String> {
        &self.tables
    }

    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Register every class.
    pub fn apply(&self, registry: &mut dyn ClassRegistry) -> LoadReport {
        for class in self.classes.values() {
            registry.register_class(class.clone());
        }

        let monikers: Vec<String> = self.classes.keys().cloned().collect();
        LoadReport {
            tables: self.tables.clone(),
            new_monikers: monikers.clone(),
            monikers,
            relationships: self.relationships,
            warnings: self.warnings.clone(),
        }
    }
}

/// Loads a database schema into a [`ClassRegistry`].
pub struct SchemaLoader<C> {
    conn: C,
    adapter: Box<dyn CatalogAdapter>,
    options: LoaderOptions,
    extensions: Option<Box<dyn ExtensionSource>>,
    known_tables: BTreeSet<String>,
}

impl<C: Connection> SchemaLoader<C> {
    /// Create a loader using the adapter registered for the connection's
    /// driver.
    pub fn new(conn: C, options: LoaderOptions) -> Self {
        let adapter = adapter_for(conn.driver_name(), options.db_schema.clone());
        Self::with_adapter(conn, adapter, options)
    }

    /// Create a loader with an explicit adapter.
    pub fn with_adapter(
        conn: C,
        adapter: Box<dyn CatalogAdapter>,
        options: LoaderOptions,
    ) -> Self {
        Self {
            conn,
            adapter,
            options,
            extensions: None,
            known_tables: BTreeSet::new(),
        }
    }

    /// Run per-class extensions from `source` during every load.
    pub fn with_extensions(mut self, source: Box<dyn ExtensionSource>) -> Self {
        self.extensions = Some(source);
        self
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    /// Tables registered by earlier loads.
    pub fn known_tables(&self) -> &BTreeSet<String> {
        &self.known_tables
    }

    /// Build classes and relationships without registering anything.
    pub fn plan(&self) -> Result<LoadedSchema> {
        let style = IdentifierStyle::resolve(
            &self.conn,
            self.options.identifier_quote.as_deref(),
            self.options.name_separator.as_deref(),
        );
        let normalizer = Normalizer::new(&self.conn, self.adapter.as_ref(), style);
        let mut warnings = Vec::new();

        let tables = self.select_tables(normalizer.list_tables()?, &mut warnings);
        let table_monikers = self.assign_monikers(&tables, &mut warnings);

        let mut metadata: BTreeMap<String, TableMetadata> = BTreeMap::new();
        let mut foreign_keys = BTreeMap::new();
        for table in &tables {
            let Some(moniker) = table_monikers.get(&table.name) else {
                continue;
            };
            let introspection = normalizer.introspect(table)?;
            metadata.insert(moniker.clone(), introspection.metadata);
            foreign_keys.insert(moniker.clone(), introspection.foreign_keys);
        }

        let materializer = Materializer::from_options(&self.options);
        let mut classes = BTreeMap::new();
        for (moniker, table) in &metadata {
            let class = materializer.materialize(table, moniker, &mut warnings)?;
            classes.insert(moniker.clone(), class);
        }

        let mut plan = RelationshipPlan::new();
        let mut relationships = 0;
        if self.options.relationships {
            let resolved = resolve_foreign_keys(foreign_keys, &table_monikers, &mut warnings);
            let inflector = self.options.inflector();
            plan = RelationshipBuilder::new(&inflector, &metadata)
                .with_verbose(self.options.debug)
                .build(&resolved)?;
            relationships =
                materializer.apply_relationships(&mut classes, plan.iter(), &mut warnings)?;
        }

        if let Some(source) = &self.extensions {
            materializer.run_extensions(source.as_ref(), &mut classes)?;
        }

        info!(
            adapter = self.adapter.name(),
            classes = classes.len(),
            relationships,
            warnings = warnings.len(),
            "schema planned"
        );

        Ok(LoadedSchema {
            classes,
            plan,
            tables: table_monikers,
            relationships,
            warnings,
        })
    }

    /// Load every table and register the resulting classes.
    pub fn load(&mut self, registry: &mut dyn ClassRegistry) -> Result<LoadReport> {
        let schema = self.plan()?;
        let report = schema.apply(registry);
        self.known_tables.extend(report.tables.keys().cloned());

        info!(
            classes = report.monikers.len(),
            relationships = report.relationships,
            "schema loaded"
        );
        Ok(report)
    }

    /// Register tables created since the last load.
    ///
    /// Classes already registered are not rebuilt; they only receive the
    /// relationships that involve a new table, and are then registered again.
    pub fn rescan(&mut self, registry: &mut dyn ClassRegistry) -> Result<LoadReport> {
        let schema = self.plan()?;
        let mut warnings = schema.warnings.clone();

        let new_monikers: BTreeSet<String> = schema
            .tables
            .iter()
            .filter(|(table, _)| !self.known_tables.contains(*table))
            .map(|(_, moniker)| moniker.clone())
            .collect();

        // Working set: fresh classes for new tables, registered ones for the
        // rest.
        let mut classes: BTreeMap<String, ClassDefinition> = BTreeMap::new();
        for (moniker, class) in &schema.classes {
            let current = if new_monikers.contains(moniker) {
                Some(class.clone())
            } else {
                registry.class(moniker).cloned()
            };
            if let Some(current) = current {
                classes.insert(moniker.clone(), current);
            }
        }

        let additions: Vec<_> = schema
            .plan
            .iter()
            .filter(|b| !new_monikers.contains(&b.owner) && new_monikers.contains(&b.target))
            .collect();
        let updated: BTreeSet<String> = additions.iter().map(|b| b.owner.clone()).collect();

        let materializer = Materializer::from_options(&self.options);
        let added = materializer.apply_relationships(&mut classes, additions, &mut warnings)?;

        let mut relationships = added;
        let mut monikers = Vec::new();
        for (moniker, class) in classes {
            if new_monikers.contains(&moniker) {
                relationships += class.relationships.len();
            } else if !updated.contains(&moniker) {
                continue;
            }
            debug!(moniker = %moniker, "registering rescanned class");
            monikers.push(moniker);
            registry.register_class(class);
        }

        self.known_tables.extend(schema.tables.keys().cloned());
        info!(
            new_classes = new_monikers.len(),
            relationships,
            "schema rescanned"
        );

        Ok(LoadReport {
            tables: schema.tables,
            monikers,
            new_monikers: new_monikers.into_iter().collect(),
            relationships,
            warnings,
        })
    }

    fn select_tables(
        &self,
        listed: Vec<CatalogTable>,
        warnings: &mut Vec<LoadWarning>,
    ) -> Vec<CatalogTable> {
        if listed.is_empty() {
            warn!("no tables found in catalog");
            warnings.push(LoadWarning::NoTablesFound);
            return listed;
        }

        let total = listed.len();
        let selected: Vec<CatalogTable> = listed
            .into_iter()
            .filter(|t| self.options.includes(&t.name))
            .collect();

        if selected.is_empty() {
            warn!(count = total, "all tables excluded by filters");
            warnings.push(LoadWarning::AllTablesExcluded { count: total });
        } else {
            debug!(selected = selected.len(), total, "tables selected");
        }
        selected
    }

    /// Table name → moniker. When several tables share a moniker only the
    /// last one keeps it.
    fn assign_monikers(
        &self,
        tables: &[CatalogTable],
        warnings: &mut Vec<LoadWarning>,
    ) -> BTreeMap<String, String> {
        let mapper = MonikerMapper::new(self.options.moniker_map.clone());
        let mut by_moniker: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for table in tables {
            by_moniker
                .entry(mapper.moniker(&table.name))
                .or_default()
                .push(table.name.clone());
        }

        let mut table_monikers = BTreeMap::new();
        for (moniker, names) in by_moniker {
            if names.len() > 1 {
                warn!(moniker = %moniker, tables = ?names, "tables share a moniker");
                warnings.push(LoadWarning::MonikerCollision {
                    moniker: moniker.clone(),
                    tables: names.clone(),
                });
            }
            if let Some(winner) = names.last() {
                table_monikers.insert(winner.clone(), moniker);
            }
        }
        table_monikers
    }
}

/// Map referenced tables to monikers, dropping keys whose target is not part
/// of the load.
fn resolve_foreign_keys(
    foreign_keys: BTreeMap<String, Vec<ForeignKeyRef>>,
    table_monikers: &BTreeMap<String, String>,
    warnings: &mut Vec<LoadWarning>,
) -> BTreeMap<String, Vec<ResolvedForeignKey>> {
    foreign_keys
        .into_iter()
        .map(|(moniker, keys)| {
            let resolved = keys
                .into_iter()
                .filter_map(|key| match table_monikers.get(&key.remote_table) {
                    Some(remote) => Some(ResolvedForeignKey::new(key, remote.clone())),
                    None => {
                        warn!(
                            table = %key.local_table,
                            remote_table = %key.remote_table,
                            "foreign key target is not loaded"
                        );
                        warnings.push(LoadWarning::DanglingForeignKey {
                            table: key.local_table,
                            remote_table: key.remote_table,
                        });
                        None
                    }
                })
                .collect();
            (moniker, resolved)
        })
        .collect()
}
