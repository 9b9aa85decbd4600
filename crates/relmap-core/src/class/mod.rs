//! Class materialization.
//!
//! Turns normalized table metadata into [`ClassDefinition`]s, declares the
//! inferred relationships on them and runs optional per-class extensions.

mod definition;
mod extension;
mod materializer;

pub use definition::{ClassDefinition, ClassSignature, Relationship};
pub use extension::{ClassExtension, ExtensionError, ExtensionSource};
pub use materializer::Materializer;
