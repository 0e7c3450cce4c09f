//! Configured database instances.
//!
//! A [`DatabaseInstance`] ties a configured name to its module and backend.
//! Its lifecycle is create, open, any number of queries, close, and drop
//! (which frees the backend). Descriptive metadata is fetched from the
//! backend on first use and cached. Backends of modules without
//! [`Capabilities::REENTRANT`](crate::module::Capabilities::REENTRANT) see
//! one query at a time.

mod result;


use std::ops::BitOr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, warn};

use crate::header::HeaderList;
use crate::module::{
    DatabaseBackend, EntryPoint, InitExtra, LoadedModule, ModuleError, ModuleResult,
};
use crate::strategy::{MatchKey, Strategy};

pub use self::result::ResultHandle;

const DATABASE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::database");

/// Errors raised by database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The module could not construct the backend.
    #[error("cannot initialise database '{database}': {source}")]
    Init {
        /// Database name.
        database: String,
        /// Module failure.
        #[source]
        source: ModuleError,
    },
    /// The backend could not be opened.
    #[error("cannot open database '{database}': {source}")]
    Open {
        /// Database name.
        database: String,
        /// Module failure.
        #[source]
        source: ModuleError,
    },
    /// The backend failed while closing.
    #[error("cannot close database '{database}': {source}")]
    Close {
        /// Database name.
        database: String,
        /// Module failure.
        #[source]
        source: ModuleError,
    },
    /// A match or define call failed.
    #[error("query against database '{database}' failed: {source}")]
    Query {
        /// Database name.
        database: String,
        /// Module failure.
        #[source]
        source: ModuleError,
    },
    /// The database is not open.
    #[error("database '{database}' is not open")]
    NotOpen {
        /// Database name.
        database: String,
    },
    /// A backend call panicked earlier and left its lock poisoned.
    #[error("database '{database}' is unusable after an earlier failure")]
    Poisoned {
        /// Database name.
        database: String,
    },
}

/// Source and target languages of a database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Languages {
    /// Languages of the headwords.
    pub source: Vec<String>,
    /// Languages of the definitions.
    pub target: Vec<String>,
}

impl Languages {
    /// Creates a language pair.
    #[must_use]
    pub const fn new(source: Vec<String>, target: Vec<String>) -> Self {
        Self { source, target }
    }

    /// Returns `true` when neither side lists a language.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty() && self.target.is_empty()
    }

    /// Copies a side that is empty from the other one.
    #[must_use]
    pub fn completed(mut self) -> Self {
        if self.source.is_empty() {
            self.source.clone_from(&self.target);
        } else if self.target.is_empty() {
            self.target.clone_from(&self.source);
        }
        self
    }

    /// Both sides merged, without duplicates, source first.
    #[must_use]
    pub fn merged(&self) -> Vec<&str> {
        let mut all: Vec<&str> = Vec::new();
        for lang in self.source.iter().chain(&self.target) {
            if !all.contains(&lang.as_str()) {
                all.push(lang);
            }
        }
        all
    }
}

/// Flags reported for a database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DatabaseFlags(u32);

impl DatabaseFlags {
    /// Not listed and not searched by `!` or `*`; still addressable by name.
    pub const HIDDEN: Self = Self(0x01);
    /// Aggregates other databases; skipped by `!` and `*`.
    pub const VIRTUAL: Self = Self(0x02);

    /// No flags.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns `true` when every bit of `other` is set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for DatabaseFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Per-database settings supplied by the configuration. Set values take
/// precedence over what the module reports.
#[derive(Debug, Clone, Default)]
pub struct DatabaseSettings {
    /// Description override.
    pub description: Option<String>,
    /// Information text override.
    pub info: Option<String>,
    /// Language override.
    pub languages: Option<Languages>,
    /// Hide the database from listings and wildcard searches.
    pub hidden: bool,
    /// Headers used when the module supplies none.
    pub default_headers: HeaderList,
}

/// A configured, named database backed by a module.
pub struct DatabaseInstance {
    name: String,
    module: Arc<LoadedModule>,
    settings: DatabaseSettings,
    backend: RwLock<Box<dyn DatabaseBackend>>,
    serial: Option<Mutex<()>>,
    open: AtomicBool,
    description: OnceCell<Option<String>>,
    info: OnceCell<Option<String>>,
    languages: OnceCell<Languages>,
    flags: OnceCell<DatabaseFlags>,
    headers: OnceCell<HeaderList>,
}

impl DatabaseInstance {
    /// Constructs the backend through `module`.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Init`] when the module refuses the database.
    pub fn create(
        name: &str,
        module: Arc<LoadedModule>,
        args: &[String],
        extra: Option<InitExtra>,
        settings: DatabaseSettings,
    ) -> Result<Self, DatabaseError> {
        let backend = module
            .create_backend(name, args, extra)
            .map_err(|source| DatabaseError::Init {
                database: name.to_owned(),
                source,
            })?;
        let serial = (!module.is_reentrant()).then(|| Mutex::new(()));
        Ok(Self {
            name: name.to_owned(),
            module,
            settings,
            backend: RwLock::new(backend),
            serial,
            open: AtomicBool::new(false),
            description: OnceCell::new(),
            info: OnceCell::new(),
            languages: OnceCell::new(),
            flags: OnceCell::new(),
            headers: OnceCell::new(),
        })
    }

    /// Configured name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module serving the database.
    #[must_use]
    pub fn module(&self) -> &Arc<LoadedModule> {
        &self.module
    }

    fn declares(&self, entry: EntryPoint) -> bool {
        self.module.descriptor().declares(entry)
    }

    fn poisoned(&self) -> DatabaseError {
        DatabaseError::Poisoned {
            database: self.name.clone(),
        }
    }

    /// Opens the backend.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Open`] when the backend cannot be opened.
    pub fn open(&self) -> Result<(), DatabaseError> {
        if self.declares(EntryPoint::Open) {
            let mut backend = self.backend.write().map_err(|_| self.poisoned())?;
            backend.open().map_err(|source| DatabaseError::Open {
                database: self.name.clone(),
                source,
            })?;
        }
        self.open.store(true, Ordering::Release);
        debug!(target: DATABASE_TARGET, database = %self.name, "database opened");
        Ok(())
    }

    /// Closes the backend. Closing a database that is not open does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Close`] when the backend reports a failure.
    pub fn close(&self) -> Result<(), DatabaseError> {
        if !self.open.swap(false, Ordering::AcqRel) {
            return Ok(());
        }
        if self.declares(EntryPoint::Close) {
            let mut backend = self.backend.write().map_err(|_| self.poisoned())?;
            backend.close().map_err(|source| DatabaseError::Close {
                database: self.name.clone(),
                source,
            })?;
        }
        debug!(target: DATABASE_TARGET, database = %self.name, "database closed");
        Ok(())
    }

    /// Returns `true` between a successful `open` and `close`.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn fetch<T, F>(&self, entry: EntryPoint, fetch: F) -> Option<T>
    where
        F: FnOnce(&dyn DatabaseBackend) -> T,
    {
        if !self.declares(entry) {
            return None;
        }
        match self.backend.read() {
            Ok(backend) => Some(fetch(backend.as_ref())),
            Err(_) => {
                warn!(
                    target: DATABASE_TARGET,
                    database = %self.name,
                    entry = %entry,
                    "backend lock poisoned; metadata unavailable"
                );
                None
            }
        }
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        if let Some(configured) = &self.settings.description {
            return Some(configured);
        }
        self.description
            .get_or_init(|| self.fetch(EntryPoint::Descr, |b| b.description()).flatten())
            .as_deref()
    }

    /// Long information text.
    #[must_use]
    pub fn info(&self) -> Option<&str> {
        if let Some(configured) = &self.settings.info {
            return Some(configured);
        }
        self.info
            .get_or_init(|| self.fetch(EntryPoint::Info, |b| b.info()).flatten())
            .as_deref()
    }

    /// Source and target languages, each side filled from the other when
    /// only one is known.
    #[must_use]
    pub fn languages(&self) -> &Languages {
        self.languages.get_or_init(|| {
            self.settings
                .languages
                .clone()
                .or_else(|| self.fetch(EntryPoint::Lang, |b| b.languages()))
                .unwrap_or_default()
                .completed()
        })
    }

    /// Database flags, including the configured hidden bit.
    #[must_use]
    pub fn flags(&self) -> DatabaseFlags {
        *self.flags.get_or_init(|| {
            let reported = self
                .fetch(EntryPoint::Flags, |b| b.flags())
                .unwrap_or_default();
            if self.settings.hidden {
                reported | DatabaseFlags::HIDDEN
            } else {
                reported
            }
        })
    }

    /// Returns `true` when the database is hidden from listings.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags().contains(DatabaseFlags::HIDDEN)
    }

    /// Returns `true` when wildcard searches (`!`, `*`) include the database.
    #[must_use]
    pub fn is_searchable(&self) -> bool {
        let flags = self.flags();
        !flags.contains(DatabaseFlags::HIDDEN) && !flags.contains(DatabaseFlags::VIRTUAL)
    }

    /// MIME headers for definitions: the module's own when its contract
    /// version allows them and they parse, the configured defaults
    /// otherwise.
    #[must_use]
    pub fn mime_headers(&self) -> &HeaderList {
        self.headers.get_or_init(|| {
            let text = if self.module.descriptor().version.supports_mime_header() {
                self.fetch(EntryPoint::MimeHeader, |b| b.mime_header()).flatten()
            } else {
                None
            };
            let parsed = text.and_then(|text| match HeaderList::parse(&text) {
                Ok(list) => Some(list),
                Err(error) => {
                    warn!(
                        target: DATABASE_TARGET,
                        database = %self.name,
                        error = %error,
                        "cannot parse MIME headers; using defaults"
                    );
                    None
                }
            });
            parsed.unwrap_or_else(|| self.settings.default_headers.clone())
        })
    }

    fn query<F>(self: &Arc<Self>, run: F) -> Result<Option<ResultHandle>, DatabaseError>
    where
        F: FnOnce(&dyn DatabaseBackend) -> Result<Option<Box<dyn ModuleResult>>, ModuleError>,
    {
        if !self.is_open() {
            return Err(DatabaseError::NotOpen {
                database: self.name.clone(),
            });
        }
        let _serial = match &self.serial {
            Some(lock) => Some(lock.lock().map_err(|_| self.poisoned())?),
            None => None,
        };
        let backend = self.backend.read().map_err(|_| self.poisoned())?;
        let result = run(backend.as_ref()).map_err(|source| DatabaseError::Query {
            database: self.name.clone(),
            source,
        })?;
        drop(backend);
        Ok(result.map(|result| ResultHandle::new(Arc::clone(self), result)))
    }

    /// Matches `key` under `strategy`. `Ok(None)` means no matches.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the database is not open or the
    /// backend fails.
    pub fn match_word(
        self: &Arc<Self>,
        strategy: &Strategy,
        key: &MatchKey<'_>,
    ) -> Result<Option<ResultHandle>, DatabaseError> {
        self.query(|backend| backend.match_word(strategy, key))
    }

    /// Looks up definitions of `key.word`. `Ok(None)` means none.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError`] when the database is not open or the
    /// backend fails.
    pub fn define(
        self: &Arc<Self>,
        key: &MatchKey<'_>,
    ) -> Result<Option<ResultHandle>, DatabaseError> {
        self.query(|backend| backend.define(key))
    }

    pub(crate) fn free_result(&self, result: Box<dyn ModuleResult>) {
        match self.backend.read() {
            Ok(backend) => backend.free_result(result),
            Err(poisoned) => poisoned.into_inner().free_result(result),
        }
    }
}

impl Drop for DatabaseInstance {
    fn drop(&mut self) {
        if let Err(error) = self.close() {
            warn!(
                target: DATABASE_TARGET,
                database = %self.name,
                error = %error,
                "database close failed during shutdown"
            );
        }
    }
}

impl std::fmt::Debug for DatabaseInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseInstance")
            .field("name", &self.name)
            .field("module", &self.module.name())
            .field("open", &self.is_open())
            .finish_non_exhaustive()
    }
}
