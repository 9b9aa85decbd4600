//! Per-class extension hooks.

use super::ClassDefinition;
use crate::error::Result;

/// Error raised by an extension source that found an extension but could
/// not load it.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// Customization applied to a class after relationships are declared.
pub trait ClassExtension {
    fn extend(&self, class: &mut ClassDefinition) -> Result<()>;
}

impl<F> ClassExtension for F
where
    F: Fn(&mut ClassDefinition) -> Result<()>,
{
    fn extend(&self, class: &mut ClassDefinition) -> Result<()> {
        self(class)
    }
}

/// Looks up the extension for a moniker.
pub trait ExtensionSource {
    /// `Ok(None)` when no extension exists for `moniker`.
    fn load(
        &self,
        moniker: &str,
    ) -> std::result::Result<Option<Box<dyn ClassExtension>>, ExtensionError>;
}
