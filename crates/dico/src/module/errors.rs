//! Errors raised by modules and the module loader.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use super::{EntryPoint, ModuleVersion};

/// A module descriptor violates the contract. Fatal at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleContractError {
    /// The module targets a contract version this engine cannot serve.
    #[error("module '{module}' uses contract version {version}, engine implements {engine}")]
    IncompatibleVersion {
        /// Module instance name.
        module: String,
        /// Version declared by the module.
        version: ModuleVersion,
        /// Version implemented by the engine.
        engine: ModuleVersion,
    },
    /// A mandatory entry point is not declared.
    #[error("module '{module}' does not provide required entry point '{entry}'")]
    MissingEntryPoint {
        /// Module instance name.
        module: String,
        /// Missing entry point.
        entry: EntryPoint,
    },
    /// An entry point contradicting the module's capabilities is declared.
    #[error("module '{module}' declares '{entry}', which its capabilities exclude")]
    UnexpectedEntryPoint {
        /// Module instance name.
        module: String,
        /// Offending entry point.
        entry: EntryPoint,
    },
    /// Only one of `open` and `close` is declared.
    #[error("module '{module}' must declare open and close together")]
    UnpairedOpenClose {
        /// Module instance name.
        module: String,
    },
}

/// Errors raised by module operations.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// No implementation is known under the requested kind.
    #[error("unknown module kind '{kind}'")]
    UnknownKind {
        /// Requested kind.
        kind: String,
    },

    /// A module kind or instance name was registered twice.
    #[error("module '{name}' is already registered")]
    Duplicate {
        /// Conflicting name.
        name: String,
    },

    /// The module descriptor is invalid.
    #[error(transparent)]
    Contract(#[from] ModuleContractError),

    /// Arguments passed to `init`, `init_db` or `init_db_ext` were rejected.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Human-readable description.
        message: String,
    },

    /// Extra initialisation data was supplied to a module that cannot use it.
    #[error("module '{module}' does not accept extra initialisation data")]
    ExtraNotSupported {
        /// Module instance name.
        module: String,
    },

    /// The module does not implement the operation.
    #[error("entry point '{entry}' is not supported")]
    Unsupported {
        /// Entry point that was requested.
        entry: EntryPoint,
    },

    /// Reading backing storage failed.
    #[error("cannot read '{path}': {source}")]
    Io {
        /// File that was being read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The backend reported a failure.
    #[error("{message}")]
    Backend {
        /// Human-readable description.
        message: String,
    },
}

impl ModuleError {
    /// Convenience constructor for [`ModuleError::InvalidArguments`].
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Convenience constructor for [`ModuleError::Io`].
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source: Arc::new(source),
        }
    }
}
