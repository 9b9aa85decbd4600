//! Table name to class moniker mapping.

use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Custom moniker callback. `None` or an empty string falls back to the
/// default mapping.
pub type MonikerFn = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Caller-supplied moniker overrides.
#[derive(Clone, Default)]
pub enum MonikerOverride {
    /// No overrides.
    #[default]
    None,
    /// Explicit table → moniker map.
    Map(HashMap<String, String>),
    /// Custom function.
    Function(MonikerFn),
}

impl fmt::Debug for MonikerOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonikerOverride::None => write!(f, "None"),
            MonikerOverride::Map(map) => f.debug_tuple("Map").field(map).finish(),
            MonikerOverride::Function(_) => write!(f, "Function(..)"),
        }
    }
}

impl MonikerOverride {
    /// Build a map override from (table, moniker) pairs.
    pub fn map<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        MonikerOverride::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a function override.
    pub fn function(f: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        MonikerOverride::Function(Arc::new(f))
    }
}

/// Maps table names to monikers.
#[derive(Debug, Clone, Default)]
pub struct MonikerMapper {
    overrides: MonikerOverride,
}

impl MonikerMapper {
    /// Create a mapper with the given overrides.
    pub fn new(overrides: MonikerOverride) -> Self {
        Self { overrides }
    }

    /// Moniker for `table`: the override if it resolves non-empty, otherwise
    /// the default camel-cased form.
    pub fn moniker(&self, table: &str) -> String {
        let explicit = match &self.overrides {
            MonikerOverride::None => None,
            MonikerOverride::Map(map) => map.get(table).cloned(),
            MonikerOverride::Function(f) => f(table),
        };

        explicit
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| default_moniker(table))
    }
}

static FRAGMENT_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\W_]+").expect("valid regex"));

/// Default moniker: lower-case, split on runs of non-word characters or
/// underscores, capitalize each fragment and concatenate.
///
/// `mysql_loader_test1` becomes `MysqlLoaderTest1`.
pub fn default_moniker(table: &str) -> String {
    let lower = table.to_lowercase();
    FRAGMENT_SPLIT
        .split(&lower)
        .filter(|f| !f.is_empty())
        .map(capitalize)
        .collect()
}

fn capitalize(fragment: &str) -> String {
    let mut chars = fragment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
