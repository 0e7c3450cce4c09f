//! Traits implemented by database modules.

use std::any::Any;
use std::sync::Arc;

use crate::database::{DatabaseFlags, DatabaseInstance, Languages};
use crate::strategy::{MatchKey, Strategy, StrategyRegistry};
use crate::stream::{ByteStream, StreamError};

use super::{EntryPoint, ModuleDescriptor, ModuleError};

/// Extra data handed to `init_db_ext`. Its concrete type is agreed between
/// the module and whoever configures its databases.
pub type InitExtra = Box<dyn Any + Send>;

/// A pluggable backend implementation.
///
/// Entry points the module does not declare in its [`ModuleDescriptor`] are
/// never called; their default bodies report [`ModuleError::Unsupported`].
pub trait DatabaseModule: Send + Sync {
    /// Describes the module. Called once, before anything else.
    fn descriptor(&self) -> ModuleDescriptor;

    /// Module-wide initialisation. Strategy providers register here.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the arguments are unusable.
    fn init(
        &mut self,
        _args: &[String],
        _strategies: &mut StrategyRegistry,
    ) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Constructs a database backend.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the database cannot be created.
    fn init_db(
        &self,
        _name: &str,
        _args: &[String],
    ) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        Err(ModuleError::Unsupported {
            entry: EntryPoint::InitDb,
        })
    }

    /// Constructs a database backend from extra data.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the database cannot be created.
    fn init_db_ext(
        &self,
        _name: &str,
        _args: &[String],
        _extra: InitExtra,
    ) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        Err(ModuleError::Unsupported {
            entry: EntryPoint::InitDbExt,
        })
    }
}

/// One configured database as seen by its module. Dropping the backend
/// frees it.
pub trait DatabaseBackend: Send + Sync {
    /// Opens the database.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when backing storage is unavailable.
    fn open(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Closes the database.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when releasing backing storage fails.
    fn close(&mut self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Long, free-form information text.
    fn info(&self) -> Option<String> {
        None
    }

    /// One-line description.
    fn description(&self) -> Option<String> {
        None
    }

    /// Source and target languages.
    fn languages(&self) -> Languages {
        Languages::default()
    }

    /// Database flags.
    fn flags(&self) -> DatabaseFlags {
        DatabaseFlags::default()
    }

    /// MIME header text (`Key: value` lines) describing definitions.
    fn mime_header(&self) -> Option<String> {
        None
    }

    /// Finds headwords matching `key` under `strategy`. `Ok(None)` means no
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the backend fails.
    fn match_word(
        &self,
        strategy: &Strategy,
        key: &MatchKey<'_>,
    ) -> Result<Option<Box<dyn ModuleResult>>, ModuleError>;

    /// Looks up definitions of `key.word`. `Ok(None)` means no definitions.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the backend fails.
    fn define(&self, key: &MatchKey<'_>) -> Result<Option<Box<dyn ModuleResult>>, ModuleError>;

    /// Releases a result produced by this backend.
    fn free_result(&self, result: Box<dyn ModuleResult>) {
        drop(result);
    }
}

/// Outcome of one `match_word` or `define` call.
pub trait ModuleResult: Send {
    /// Number of items.
    fn count(&self) -> usize;

    /// Number of comparisons performed to produce the result.
    fn compare_count(&self) -> usize {
        0
    }

    /// Writes item `index`: the headword of a match result or the body of a
    /// definition.
    ///
    /// # Errors
    ///
    /// Propagates stream failures.
    fn output(&self, index: usize, out: &mut dyn ByteStream) -> Result<(), StreamError>;

    /// Database that produced item `index`, for results that federate
    /// several databases.
    fn result_db(&self, _index: usize) -> Option<Arc<DatabaseInstance>> {
        None
    }
}
