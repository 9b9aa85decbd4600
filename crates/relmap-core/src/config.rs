//! Loader configuration.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use crate::error::Result;
use crate::inflect::{Inflection, Inflector};
use crate::moniker::MonikerOverride;

/// What to do when one class receives two relationships with the same
/// accessor name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessorPolicy {
    /// The later declaration replaces the earlier one.
    #[default]
    LastWins,
    /// Fail with [`Error::AccessorCollision`](crate::Error::AccessorCollision).
    Strict,
}

/// Options controlling a schema load.
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Only tables matching this pattern are loaded.
    pub constraint: Option<Regex>,

    /// Tables matching this pattern are skipped.
    pub exclude: Option<Regex>,

    /// Table → moniker overrides.
    pub moniker_map: MonikerOverride,

    /// Plural inflection overrides.
    pub inflect_plural: Inflection,

    /// Singular inflection overrides.
    pub inflect_singular: Inflection,

    /// Components recorded on every class, in order.
    pub mixins: Vec<String>,

    /// Infer relationships from foreign keys.
    pub relationships: bool,

    /// Skip relationships that fail to apply instead of aborting.
    pub best_effort: bool,

    /// Accessor collision handling.
    pub accessor_policy: AccessorPolicy,

    /// Database schema to introspect; backends pick their own default.
    pub db_schema: Option<String>,

    /// Identifier quote; the driver's when unset. Two distinct characters
    /// (`"[]"`) give separate open and close quotes.
    pub identifier_quote: Option<String>,

    /// Schema/name separator; the driver's when unset.
    pub name_separator: Option<String>,

    /// Log generated relationships at info level.
    pub debug: bool,
}

impl LoaderOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self {
            constraint: None,
            exclude: None,
            moniker_map: MonikerOverride::None,
            inflect_plural: Inflection::Default,
            inflect_singular: Inflection::Default,
            mixins: Vec::new(),
            relationships: true,
            best_effort: false,
            accessor_policy: AccessorPolicy::LastWins,
            db_schema: None,
            identifier_quote: None,
            name_separator: None,
            debug: false,
        }
    }

    /// Keep only tables matching `pattern`.
    pub fn with_constraint(mut self, pattern: &str) -> Result<Self> {
        self.constraint = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Skip tables matching `pattern`.
    pub fn with_exclude(mut self, pattern: &str) -> Result<Self> {
        self.exclude = Some(Regex::new(pattern)?);
        Ok(self)
    }

    /// Set the moniker overrides.
    pub fn with_moniker_map(mut self, overrides: MonikerOverride) -> Self {
        self.moniker_map = overrides;
        self
    }

    /// Set the plural inflection overrides.
    pub fn with_inflect_plural(mut self, inflection: Inflection) -> Self {
        self.inflect_plural = inflection;
        self
    }

    /// Set the singular inflection overrides.
    pub fn with_inflect_singular(mut self, inflection: Inflection) -> Self {
        self.inflect_singular = inflection;
        self
    }

    /// Add a mixin.
    pub fn with_mixin(mut self, mixin: impl Into<String>) -> Self {
        self.mixins.push(mixin.into());
        self
    }

    /// Disable relationship inference.
    pub fn without_relationships(mut self) -> Self {
        self.relationships = false;
        self
    }

    /// Set best-effort mode.
    pub fn with_best_effort(mut self, best_effort: bool) -> Self {
        self.best_effort = best_effort;
        self
    }

    /// Set the accessor collision policy.
    pub fn with_accessor_policy(mut self, policy: AccessorPolicy) -> Self {
        self.accessor_policy = policy;
        self
    }

    /// Set the database schema.
    pub fn with_db_schema(mut self, schema: impl Into<String>) -> Self {
        self.db_schema = Some(schema.into());
        self
    }

    /// Set the identifier quote character.
    pub fn with_identifier_quote(mut self, quote: impl Into<String>) -> Self {
        self.identifier_quote = Some(quote.into());
        self
    }

    /// Set the schema/name separator.
    pub fn with_name_separator(mut self, separator: impl Into<String>) -> Self {
        self.name_separator = Some(separator.into());
        self
    }

    /// Set debug logging of relationships.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Check if `table` passes the constraint and exclude filters.
    pub fn includes(&self, table: &str) -> bool {
        self.constraint.as_ref().map_or(true, |re| re.is_match(table))
            && !self.exclude.as_ref().is_some_and(|re| re.is_match(table))
    }

    /// Inflector configured with the overrides.
    pub fn inflector(&self) -> Inflector {
        Inflector::new()
            .with_plural(self.inflect_plural.clone())
            .with_singular(self.inflect_singular.clone())
    }
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// File form of [`LoaderOptions`].
///
/// Callbacks have no file representation; moniker and inflection overrides
/// are plain maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub constraint: Option<String>,
    pub exclude: Option<String>,
    pub moniker_map: HashMap<String, String>,
    pub inflect_plural: HashMap<String, String>,
    pub inflect_singular: HashMap<String, String>,
    pub mixins: Vec<String>,
    pub relationships: Option<bool>,
    pub best_effort: bool,
    pub accessor_policy: AccessorPolicy,
    pub db_schema: Option<String>,
    pub identifier_quote: Option<String>,
    pub name_separator: Option<String>,
    pub debug: bool,
}

impl LoaderConfig {
    /// Read a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Compile patterns and install maps.
    pub fn into_options(self) -> Result<LoaderOptions> {
        let mut options = LoaderOptions::new();
        if let Some(pattern) = &self.constraint {
            options = options.with_constraint(pattern)?;
        }
        if let Some(pattern) = &self.exclude {
            options = options.with_exclude(pattern)?;
        }
        if !self.moniker_map.is_empty() {
            options.moniker_map = MonikerOverride::Map(self.moniker_map);
        }
        if !self.inflect_plural.is_empty() {
            options.inflect_plural = Inflection::Map(self.inflect_plural);
        }
        if !self.inflect_singular.is_empty() {
            options.inflect_singular = Inflection::Map(self.inflect_singular);
        }

        options.mixins = self.mixins;
        options.relationships = self.relationships.unwrap_or(true);
        options.best_effort = self.best_effort;
        options.accessor_policy = self.accessor_policy;
        options.db_schema = self.db_schema;
        options.identifier_quote = self.identifier_quote;
        options.name_separator = self.name_separator;
        options.debug = self.debug;
        Ok(options)
    }
}
