//! Module resolution and validation.
//!
//! The engine never depends on how a module implementation is obtained. A
//! [`ModuleLoader`] turns a configured kind into a fresh [`DatabaseModule`];
//! the [`ModuleRegistry`] is the loader for statically linked modules.
//! [`LoadedModule::load`] validates the descriptor once and runs `init`, so
//! later calls can rely on the declared entry points.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::strategy::StrategyRegistry;

use super::{
    Capabilities, DatabaseBackend, DatabaseModule, EntryPoint, InitExtra, MODULE_TARGET,
    ModuleDescriptor, ModuleError,
};

/// Constructor of a module implementation.
pub type ModuleFactory = Arc<dyn Fn() -> Box<dyn DatabaseModule> + Send + Sync>;

/// Resolves module kinds to implementations.
pub trait ModuleLoader {
    /// Creates a new, uninitialised instance of the module `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::UnknownKind`] when `kind` cannot be resolved.
    fn load(&self, kind: &str) -> Result<Box<dyn DatabaseModule>, ModuleError>;
}

/// Registry of statically linked module implementations keyed by kind.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    factories: HashMap<String, ModuleFactory>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an implementation under `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Duplicate`] when `kind` is already taken.
    pub fn register<F>(&mut self, kind: &str, factory: F) -> Result<(), ModuleError>
    where
        F: Fn() -> Box<dyn DatabaseModule> + Send + Sync + 'static,
    {
        if self.factories.contains_key(kind) {
            return Err(ModuleError::Duplicate {
                name: kind.to_owned(),
            });
        }
        self.factories.insert(kind.to_owned(), Arc::new(factory));
        Ok(())
    }

    /// Returns `true` when `kind` is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load(&self, kind: &str) -> Result<Box<dyn DatabaseModule>, ModuleError> {
        self.factories
            .get(kind)
            .map(|factory| factory())
            .ok_or_else(|| ModuleError::UnknownKind {
                kind: kind.to_owned(),
            })
    }
}

/// A validated, initialised module instance shared by its databases.
pub struct LoadedModule {
    name: String,
    descriptor: ModuleDescriptor,
    module: Box<dyn DatabaseModule>,
}

impl LoadedModule {
    /// Resolves `kind`, validates its descriptor and runs `init` with
    /// `args`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError`] when the kind is unknown, the descriptor
    /// violates the contract or `init` fails.
    pub fn load(
        name: &str,
        kind: &str,
        args: &[String],
        loader: &dyn ModuleLoader,
        strategies: &mut StrategyRegistry,
    ) -> Result<Arc<Self>, ModuleError> {
        let mut module = loader.load(kind)?;
        let descriptor = module.descriptor();
        descriptor.validate(name)?;
        if descriptor.declares(EntryPoint::Init) {
            module.init(args, strategies)?;
        }
        info!(
            target: MODULE_TARGET,
            module = name,
            kind,
            version = %descriptor.version,
            "module loaded"
        );
        Ok(Arc::new(Self {
            name: name.to_owned(),
            descriptor,
            module,
        }))
    }

    /// Instance name from the configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor validated at load time.
    #[must_use]
    pub const fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    /// Returns `true` when queries may run concurrently.
    #[must_use]
    pub const fn is_reentrant(&self) -> bool {
        self.descriptor.has(Capabilities::REENTRANT)
    }

    /// Constructs a backend through the init flavour the module selected.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::Unsupported`] for strategy-only modules,
    /// [`ModuleError::ExtraNotSupported`] when `extra` is given to a module
    /// without [`Capabilities::INIT_EXT`], or the module's own error.
    pub fn create_backend(
        &self,
        database: &str,
        args: &[String],
        extra: Option<InitExtra>,
    ) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        if self.descriptor.has(Capabilities::NODB) {
            return Err(ModuleError::Unsupported {
                entry: EntryPoint::InitDb,
            });
        }
        debug!(
            target: MODULE_TARGET,
            module = %self.name,
            database,
            "creating database backend"
        );
        if self.descriptor.has(Capabilities::INIT_EXT) {
            let extra = extra.unwrap_or_else(|| Box::new(()));
            return self.module.init_db_ext(database, args, extra);
        }
        if extra.is_some() {
            return Err(ModuleError::ExtraNotSupported {
                module: self.name.clone(),
            });
        }
        self.module.init_db(database, args)
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedModule")
            .field("name", &self.name)
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
