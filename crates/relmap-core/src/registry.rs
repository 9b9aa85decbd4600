//! Class registration.

use std::collections::BTreeMap;

use crate::class::{ClassDefinition, Relationship};

/// Receives finished classes from a load.
pub trait ClassRegistry {
    /// Register a class, replacing any class with the same moniker.
    fn register_class(&mut self, class: ClassDefinition);

    /// Look up a registered class.
    fn class(&self, moniker: &str) -> Option<&ClassDefinition>;

    /// Registered monikers.
    fn monikers(&self) -> Vec<String>;
}

/// In-memory registry ordered by moniker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRegistry {
    classes: BTreeMap<String, ClassDefinition>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Classes in moniker order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDefinition> {
        self.classes.values()
    }

    /// Relationships declared on `moniker`.
    pub fn relations_from(&self, moniker: &str) -> &[Relationship] {
        self.classes
            .get(moniker)
            .map(|c| c.relationships.as_slice())
            .unwrap_or_default()
    }

    /// Relationships on other classes that point at `moniker`, with their
    /// owner.
    pub fn relations_to<'a>(
        &'a self,
        moniker: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a Relationship)> + 'a {
        self.classes.values().flat_map(move |class| {
            class
                .relationships
                .iter()
                .filter(move |r| r.target == moniker)
                .map(move |r| (class.moniker.as_str(), r))
        })
    }
}

impl ClassRegistry for MemoryRegistry {
    fn register_class(&mut self, class: ClassDefinition) {
        self.classes.insert(class.moniker.clone(), class);
    }

    fn class(&self, moniker: &str) -> Option<&ClassDefinition> {
        self.classes.get(moniker)
    }

    fn monikers(&self) -> Vec<String> {
        self.classes.keys().cloned().collect()
    }
}
