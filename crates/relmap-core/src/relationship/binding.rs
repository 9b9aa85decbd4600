//! Relationship bindings between class monikers.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Direction of a relationship as seen from its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// Many-to-one: the owner holds the foreign key.
    BelongsTo,
    /// One-to-many: the target holds the foreign key.
    HasMany,
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipKind::BelongsTo => write!(f, "belongs_to"),
            RelationshipKind::HasMany => write!(f, "has_many"),
        }
    }
}

/// One column correspondence in a join condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnPair {
    /// Column on the target class.
    pub foreign: String,
    /// Column on the owning class.
    pub local: String,
}

impl ColumnPair {
    pub fn new(foreign: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            foreign: foreign.into(),
            local: local.into(),
        }
    }
}

/// Ordered column pairs joining an owner to its target.
///
/// Serializes as a `{"foreign.<col>": "self.<col>"}` map in pair order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JoinCondition {
    pairs: Vec<ColumnPair>,
}

impl JoinCondition {
    pub fn new(pairs: Vec<ColumnPair>) -> Self {
        Self { pairs }
    }

    /// Zip foreign and local column lists positionally.
    pub fn zip<F, L>(foreign: &[F], local: &[L]) -> Self
    where
        F: AsRef<str>,
        L: AsRef<str>,
    {
        Self::new(
            foreign
                .iter()
                .zip(local)
                .map(|(f, l)| ColumnPair::new(f.as_ref(), l.as_ref()))
                .collect(),
        )
    }

    pub fn pairs(&self) -> &[ColumnPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The same condition seen from the other side.
    pub fn reversed(&self) -> Self {
        Self::new(
            self.pairs
                .iter()
                .map(|p| ColumnPair::new(&p.local, &p.foreign))
                .collect(),
        )
    }

    pub fn foreign_columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.foreign.as_str())
    }

    pub fn local_columns(&self) -> impl Iterator<Item = &str> {
        self.pairs.iter().map(|p| p.local.as_str())
    }

    /// Rendered `("foreign.x", "self.y")` entries.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|p| (format!("foreign.{}", p.foreign), format!("self.{}", p.local)))
            .collect()
    }
}

impl fmt::Display for JoinCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (foreign, local)) in self.entries().into_iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "\"{foreign}\": \"{local}\"")?;
        }
        write!(f, "}}")
    }
}

impl Serialize for JoinCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (foreign, local) in self.entries() {
            map.serialize_entry(&foreign, &local)?;
        }
        map.end()
    }
}

/// A relationship declaration waiting to be applied to its owner class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipBinding {
    /// Moniker of the class receiving the accessor.
    pub owner: String,
    /// Accessor name.
    pub accessor: String,
    pub kind: RelationshipKind,
    /// Moniker of the related class.
    pub target: String,
    pub condition: JoinCondition,
    /// Token of the originating foreign key, for diagnostics only.
    #[serde(skip)]
    pub fk_token: String,
}

impl fmt::Display for RelationshipBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}(\"{}\", \"{}\", {})",
            self.owner, self.kind, self.accessor, self.target, self.condition
        )
    }
}

/// Both sides of one foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipPair {
    /// Belongs-to on the referencing class.
    pub forward: RelationshipBinding,
    /// Has-many on the referenced class.
    pub reverse: RelationshipBinding,
}
