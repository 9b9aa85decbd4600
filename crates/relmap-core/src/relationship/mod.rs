//! Relationship inference.
//!
//! Every foreign key becomes a pair of bindings: a belongs-to on the
//! referencing class and a has-many on the referenced class. Accessor names
//! are derived from table and column names through the [`Inflector`].
//!
//! [`Inflector`]: crate::inflect::Inflector

mod binding;
mod builder;

pub use binding::{ColumnPair, JoinCondition, RelationshipBinding, RelationshipKind, RelationshipPair};
pub use builder::{RelationshipBuilder, RelationshipPlan, ResolvedForeignKey};
