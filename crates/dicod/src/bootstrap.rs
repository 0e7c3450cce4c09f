//! Server bootstrap orchestration.

use std::sync::Arc;

use dico::ModuleLoader;
use dico_config::{Cli, Config, ConfigError, SocketPreparationError};
use thiserror::Error;

use crate::engine::{Engine, EngineError};
use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{ListenerError, ListenerHandle, SessionHandler, SocketListener};

/// Trait abstracting configuration loading for testability.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigLoader: Send + Sync {
    /// Loads the server configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration cannot be read or is
    /// inconsistent.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Loader that reads the file named on the command line and applies the
/// command-line overrides.
#[derive(Debug, Clone)]
pub struct CliConfigLoader {
    cli: Cli,
}

impl CliConfigLoader {
    /// Wraps parsed command-line arguments.
    #[must_use]
    pub const fn new(cli: Cli) -> Self {
        Self { cli }
    }
}

impl ConfigLoader for CliConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        self.cli.load()
    }
}

/// Loader returning a configuration resolved earlier.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps an already loaded configuration.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// Socket preparation failed.
    #[error("failed to prepare listening socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
    /// Modules, capabilities or strategies could not be set up.
    #[error("failed to start the dictionary engine: {source}")]
    Engine {
        /// Underlying engine error.
        #[source]
        source: EngineError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    engine: Arc<Engine>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Shared engine sessions run against.
    #[must_use]
    pub const fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Binds the configured endpoint and starts accepting DICT sessions.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError`] when the endpoint cannot be bound or the
    /// accept thread cannot start.
    pub fn serve(&self) -> Result<ListenerHandle, ListenerError> {
        let listener = SocketListener::bind(&self.config.listen)?;
        listener.start(Arc::new(SessionHandler::new(Arc::clone(&self.engine))))
    }
}

/// Bootstraps the server using the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] naming the first step that failed; the
/// failure is also passed to `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    modules: &dyn ModuleLoader,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let fail = |error: BootstrapError| {
        reporter.bootstrap_failed(&error);
        error
    };

    let config = loader
        .load()
        .map_err(|source| fail(BootstrapError::Configuration { source }))?;

    let telemetry = telemetry::initialise(&config)
        .map_err(|source| fail(BootstrapError::Telemetry { source }))?;

    config
        .listen
        .prepare_filesystem()
        .map_err(|source| fail(BootstrapError::Socket { source }))?;

    let engine = Engine::from_config(&config, modules, reporter.as_ref())
        .map_err(|source| fail(BootstrapError::Engine { source }))?;

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        engine: Arc::new(engine),
        telemetry,
    })
}
