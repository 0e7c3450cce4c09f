//! Built-in database modules for the dico server.
//!
//! | Kind | Module |
//! |------|--------|
//! | `echo` | [`EchoModule`]: echoes queries back, or answers nothing |
//! | `dictionary` | [`DictionaryModule`]: in-memory headword store |
//! | `word` | [`WordModule`]: registers the `word` strategy |
//! | `substr` | [`SubstrModule`]: registers the `substr` strategy |
//! | `virtual` | [`VirtualModule`]: federates other databases |
//!
//! [`register_builtin`] makes all of them available to a
//! [`ModuleRegistry`].

mod dictionary;
mod echo;
mod options;
mod result;
mod strategies;
mod virtual_db;

use dico::{DatabaseModule, ModuleError, ModuleRegistry};

pub use dictionary::{DictionaryBackend, DictionaryModule};
pub use echo::{EchoBackend, EchoModule};
pub use result::TextResult;
pub use strategies::{SubstrModule, WordModule};
pub use virtual_db::{MemberCondition, VirtualBackend, VirtualMember, VirtualModule, VirtualResult};

pub(crate) const MODULES_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::modules");

/// Module kind of the federating module.
pub const VIRTUAL_KIND: &str = "virtual";

/// Registers every built-in module under its kind.
///
/// # Errors
///
/// Returns [`ModuleError::Duplicate`] when `registry` already holds one of
/// the kinds.
pub fn register_builtin(registry: &mut ModuleRegistry) -> Result<(), ModuleError> {
    registry.register("echo", || Box::new(EchoModule) as Box<dyn DatabaseModule>)?;
    registry.register("dictionary", || {
        Box::new(DictionaryModule) as Box<dyn DatabaseModule>
    })?;
    registry.register("word", || Box::new(WordModule) as Box<dyn DatabaseModule>)?;
    registry.register("substr", || Box::new(SubstrModule) as Box<dyn DatabaseModule>)?;
    registry.register(VIRTUAL_KIND, || {
        Box::new(VirtualModule) as Box<dyn DatabaseModule>
    })?;
    Ok(())
}
