//! Core engine of the dico dictionary server.
//!
//! The crate holds everything a DICT server needs below the network
//! transport:
//!
//! - [`stream`]: the byte-stream abstraction, line buffering, transfer
//!   encoding filters, security layers and session transcripts.
//! - [`tokenize`]: splitting command lines into words.
//! - [`header`]: MIME header lists.
//! - [`strategy`]: matching strategies and their registry.
//! - [`module`]: the database module contract and loader.
//! - [`database`]: configured database instances and query results.
//!
//! The daemon crate wires these together with configuration, telemetry and
//! the listener; backend implementations live in `dico-modules`.

pub mod database;
pub mod header;
pub mod module;
pub mod strategy;
pub mod stream;
pub mod tokenize;

#[cfg(test)]
mod test_support;

pub use database::{
    DatabaseError, DatabaseFlags, DatabaseInstance, DatabaseSettings, Languages, ResultHandle,
};
pub use header::{HeaderList, HeaderParseError};
pub use module::{
    DatabaseBackend, DatabaseModule, LoadedModule, ModuleDescriptor, ModuleError, ModuleLoader,
    ModuleRegistry, ModuleResult,
};
pub use strategy::{MatchKey, Strategy, StrategyError, StrategyRegistry};
pub use stream::{ByteStream, StreamError};
