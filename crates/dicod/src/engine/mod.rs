//! Everything sessions share: registries, databases and server settings.
//!
//! [`Engine::from_config`] runs the startup sequence. Module and capability
//! failures abort it; a database that cannot be created or opened is logged,
//! reported and left out while the rest keep serving. Once built, the engine
//! is read-only and shared between sessions behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use dico::header::{CONTENT_TRANSFER_ENCODING, CONTENT_TYPE};
use dico::module::InitExtra;
use dico::{
    DatabaseInstance, DatabaseSettings, HeaderList, Languages, LoadedModule, ModuleError,
    ModuleLoader, StrategyError, StrategyRegistry,
};
use dico_config::{Config, DatabaseDecl, MemberConditionDecl};
use dico_modules::{MemberCondition, VIRTUAL_KIND, VirtualMember};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::commands::{
    CapabilityError, CapabilitySet, CommandRegistry, core_commands, standard_capabilities,
};
use crate::health::HealthReporter;

const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::engine");

/// Fatal startup failures.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configured module could not be loaded.
    #[error("cannot load module '{module}': {source}")]
    Module {
        /// Module instance name.
        module: String,
        /// Loader failure.
        #[source]
        source: ModuleError,
    },
    /// A capability could not be enabled or initialised.
    #[error(transparent)]
    Capability(#[from] CapabilityError),
    /// The configured default strategy does not exist.
    #[error("cannot set default strategy: {0}")]
    DefaultStrategy(#[from] StrategyError),
}

/// Server-wide settings sessions read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    /// Host name announced in the banner.
    pub hostname: String,
    /// Greeting text of the banner.
    pub banner: String,
    /// `SHOW SERVER` text.
    pub server_info: String,
    /// `HELP` replacement or, with a leading `+`, addition.
    pub help_text: Option<String>,
    /// Initial Levenshtein threshold of each session.
    pub lev_distance: usize,
    /// Whether sessions are transcribed to the log.
    pub transcript: bool,
    /// Whether DEFINE and MATCH replies carry query statistics.
    pub timing: bool,
}

impl ServerSettings {
    fn from_config(config: &Config) -> Self {
        let hostname = config.hostname.clone().unwrap_or_else(system_hostname);
        let banner = config
            .banner
            .clone()
            .unwrap_or_else(|| format!("dicod {}", env!("CARGO_PKG_VERSION")));
        let server_info = config
            .server_info
            .clone()
            .unwrap_or_else(|| format!("dicod {} on {hostname}", env!("CARGO_PKG_VERSION")));
        Self {
            hostname,
            banner,
            server_info,
            help_text: config.help_text.clone(),
            lev_distance: config.lev_distance,
            transcript: config.transcript,
            timing: config.timing,
        }
    }
}

fn system_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "localhost".to_owned())
}

/// Shared, read-only server state.
#[derive(Debug)]
pub struct Engine {
    settings: ServerSettings,
    strategies: StrategyRegistry,
    commands: CommandRegistry,
    capabilities: CapabilitySet,
    databases: Vec<Arc<DatabaseInstance>>,
}

impl Engine {
    /// Builds the engine described by `config`, resolving module kinds
    /// through `loader`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when a module fails to load, a capability is
    /// unknown or fails to initialise, or the default strategy is unknown.
    pub fn from_config(
        config: &Config,
        loader: &dyn ModuleLoader,
        reporter: &dyn HealthReporter,
    ) -> Result<Self, EngineError> {
        let mut strategies = StrategyRegistry::with_builtins();
        let mut commands = core_commands();
        let mut capabilities = standard_capabilities();

        let modules = load_modules(config, loader, &mut strategies)?;

        for name in &config.capabilities {
            capabilities.enable(name)?;
        }
        let capabilities = capabilities.flush(&mut commands, &mut strategies)?;

        if let Some(name) = &config.default_strategy {
            strategies.set_default(name)?;
        }

        let created = create_databases(config, &modules, reporter);
        let databases = open_databases(created, reporter);
        info!(
            target: ENGINE_TARGET,
            databases = databases.len(),
            strategies = strategies.len(),
            capabilities = %capabilities.banner_marker(),
            "engine ready"
        );
        Ok(Self {
            settings: ServerSettings::from_config(config),
            strategies,
            commands,
            capabilities,
            databases,
        })
    }

    /// Server-wide settings.
    #[must_use]
    pub const fn settings(&self) -> &ServerSettings {
        &self.settings
    }

    /// Registered strategies.
    #[must_use]
    pub const fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Installed commands.
    #[must_use]
    pub const fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Enabled capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Open databases in configuration order.
    pub fn databases(&self) -> impl Iterator<Item = &Arc<DatabaseInstance>> {
        self.databases.iter()
    }

    /// Looks a database up by its exact name.
    #[must_use]
    pub fn database(&self, name: &str) -> Option<&Arc<DatabaseInstance>> {
        self.databases.iter().find(|database| database.name() == name)
    }

    /// Databases taking part in `!` and `*` searches.
    pub fn searchable(&self) -> impl Iterator<Item = &Arc<DatabaseInstance>> {
        self.databases.iter().filter(|database| database.is_searchable())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        while let Some(database) = self.databases.pop() {
            if let Err(error) = database.close() {
                warn!(
                    target: ENGINE_TARGET,
                    database = %database.name(),
                    error = %error,
                    "failed to close database"
                );
            }
        }
    }
}

fn load_modules(
    config: &Config,
    loader: &dyn ModuleLoader,
    strategies: &mut StrategyRegistry,
) -> Result<HashMap<String, Arc<LoadedModule>>, EngineError> {
    let mut modules = HashMap::new();
    for decl in &config.modules {
        let module = LoadedModule::load(&decl.name, decl.kind(), &decl.args, loader, strategies)
            .map_err(|source| EngineError::Module {
                module: decl.name.clone(),
                source,
            })?;
        modules.insert(decl.name.clone(), module);
    }
    let needs_virtual = config
        .databases()
        .any(|database| database.is_virtual() && database.handler.is_none());
    if needs_virtual && !modules.contains_key(VIRTUAL_KIND) {
        let module = LoadedModule::load(VIRTUAL_KIND, VIRTUAL_KIND, &[], loader, strategies)
            .map_err(|source| EngineError::Module {
                module: VIRTUAL_KIND.to_owned(),
                source,
            })?;
        modules.insert(VIRTUAL_KIND.to_owned(), module);
    }
    Ok(modules)
}

fn settings_for(decl: &DatabaseDecl) -> DatabaseSettings {
    let mut default_headers = HeaderList::new();
    default_headers.push(CONTENT_TYPE, decl.content_type.as_str());
    default_headers.push(CONTENT_TRANSFER_ENCODING, decl.transfer_encoding.as_str());
    DatabaseSettings {
        description: decl.description.clone(),
        info: decl.info.clone(),
        languages: decl
            .languages
            .as_ref()
            .map(|languages| Languages::new(languages.source.clone(), languages.target.clone())),
        hidden: decl.hidden,
        default_headers,
    }
}

const fn member_condition(condition: MemberConditionDecl) -> MemberCondition {
    match condition {
        MemberConditionDecl::Any => MemberCondition::Any,
        MemberConditionDecl::Mime => MemberCondition::Mime,
        MemberConditionDecl::NoMime => MemberCondition::NoMime,
    }
}

fn virtual_members(decl: &DatabaseDecl, created: &[Arc<DatabaseInstance>]) -> Vec<VirtualMember> {
    decl.members
        .iter()
        .filter_map(|member| {
            let found = created.iter().find(|database| database.name() == member.name);
            if found.is_none() {
                warn!(
                    target: ENGINE_TARGET,
                    database = %decl.name,
                    member = %member.name,
                    "member unavailable; left out of virtual database"
                );
            }
            found.map(|database| {
                VirtualMember::new(Arc::clone(database), member_condition(member.condition))
            })
        })
        .collect()
}

fn create_databases(
    config: &Config,
    modules: &HashMap<String, Arc<LoadedModule>>,
    reporter: &dyn HealthReporter,
) -> Vec<Arc<DatabaseInstance>> {
    let mut created: Vec<Arc<DatabaseInstance>> = Vec::new();
    for decl in config.databases() {
        let handler = decl.handler.as_deref().unwrap_or(VIRTUAL_KIND);
        let Some(module) = modules.get(handler) else {
            warn!(
                target: ENGINE_TARGET,
                database = %decl.name,
                handler,
                "no such module; database skipped"
            );
            continue;
        };
        let extra = decl
            .is_virtual()
            .then(|| Box::new(virtual_members(decl, &created)) as InitExtra);
        match DatabaseInstance::create(
            &decl.name,
            Arc::clone(module),
            &decl.args,
            extra,
            settings_for(decl),
        ) {
            Ok(database) => {
                debug!(target: ENGINE_TARGET, database = %decl.name, "database created");
                created.push(Arc::new(database));
            }
            Err(error) => {
                warn!(
                    target: ENGINE_TARGET,
                    database = %decl.name,
                    error = %error,
                    "database skipped"
                );
                reporter.database_failed(&decl.name, &error);
            }
        }
    }
    created
}

fn open_databases(
    created: Vec<Arc<DatabaseInstance>>,
    reporter: &dyn HealthReporter,
) -> Vec<Arc<DatabaseInstance>> {
    created
        .into_iter()
        .filter(|database| match database.open() {
            Ok(()) => {
                reporter.database_ready(database.name());
                true
            }
            Err(error) => {
                warn!(
                    target: ENGINE_TARGET,
                    database = %database.name(),
                    error = %error,
                    "database skipped"
                );
                reporter.database_failed(database.name(), &error);
                false
            }
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;
