//! Database module plugin framework.
//!
//! A module is a backend implementation described by a
//! [`ModuleDescriptor`]: the contract version it targets, capability bits
//! and the entry points it provides. Modules create one
//! [`DatabaseBackend`] per configured database; queries produce
//! [`ModuleResult`]s that the engine wraps in
//! [`ResultHandle`](crate::database::ResultHandle)s.

mod contract;
mod descriptor;
mod errors;
mod loader;

#[cfg(test)]
mod tests;

pub use self::contract::{DatabaseBackend, DatabaseModule, InitExtra, ModuleResult};
pub use self::descriptor::{
    Capabilities, ENGINE_VERSION, EntryPoint, EntryPoints, MIME_HEADER_VERSION, ModuleDescriptor,
    ModuleVersion,
};
pub use self::errors::{ModuleContractError, ModuleError};
pub use self::loader::{LoadedModule, ModuleFactory, ModuleLoader, ModuleRegistry};

pub(crate) const MODULE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::module");
