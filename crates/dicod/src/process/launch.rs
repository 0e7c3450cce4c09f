//! Supervises server launch sequencing and shutdown.

use std::sync::Arc;

use dico::{ModuleLoader, ModuleRegistry};
use dico_config::Cli;
use tracing::info;

use crate::bootstrap::{CliConfigLoader, ConfigLoader, bootstrap_with};
use crate::health::{HealthReporter, StructuredHealthReporter};

use super::PROCESS_TARGET;
use super::errors::LaunchError;
use super::shutdown::{ShutdownSignal, SystemShutdownSignal};

/// Collaborators required to launch the server.
pub(crate) struct LaunchPlan<'a, L, S> {
    pub(crate) loader: L,
    pub(crate) reporter: Arc<dyn HealthReporter>,
    pub(crate) modules: &'a dyn ModuleLoader,
    pub(crate) shutdown: S,
}

/// Runs the server in the foreground until a termination signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when bootstrap, the listener or signal handling
/// fails.
pub fn run_daemon(cli: Cli) -> Result<(), LaunchError> {
    let mut modules = ModuleRegistry::new();
    dico_modules::register_builtin(&mut modules)?;
    run_daemon_with(LaunchPlan {
        loader: CliConfigLoader::new(cli),
        reporter: Arc::new(StructuredHealthReporter::new()),
        modules: &modules,
        shutdown: SystemShutdownSignal::new(),
    })
}

/// Runs the server with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<'_, L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan {
        loader,
        reporter,
        modules,
        shutdown,
    } = plan;

    info!(target: PROCESS_TARGET, "starting server runtime");
    let daemon = bootstrap_with(&loader, reporter, modules)?;
    let listener = daemon.serve()?;
    info!(
        target: PROCESS_TARGET,
        endpoint = %daemon.config().listen,
        local_addr = ?listener.local_addr(),
        "accepting connections"
    );

    let waited = shutdown.wait();
    listener.shutdown();
    listener.join()?;
    waited?;
    info!(target: PROCESS_TARGET, "shutdown sequence completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::Arc;

    use dico_config::{Config, ConfigError, SocketEndpoint};
    use rstest::rstest;

    use super::*;
    use crate::bootstrap::{MockConfigLoader, StaticConfigLoader};
    use crate::process::shutdown::{MockShutdownSignal, ShutdownError};
    use crate::tests::support::{HealthEvent, RecordingHealthReporter, builtin_modules};

    fn loopback() -> StaticConfigLoader {
        StaticConfigLoader::new(Config {
            listen: SocketEndpoint::tcp("127.0.0.1", 0),
            log_filter: "off".to_owned(),
            ..Config::default()
        })
    }

    fn immediate_shutdown() -> MockShutdownSignal {
        let mut shutdown = MockShutdownSignal::new();
        shutdown.expect_wait().times(1).returning(|| Ok(()));
        shutdown
    }

    #[rstest]
    fn runs_until_shutdown_is_signalled() {
        let reporter = Arc::new(RecordingHealthReporter::default());
        let modules = builtin_modules();

        run_daemon_with(LaunchPlan {
            loader: loopback(),
            reporter: reporter.clone(),
            modules: &modules,
            shutdown: immediate_shutdown(),
        })
        .expect("server runs and stops");

        assert!(reporter.events().contains(&HealthEvent::BootstrapSucceeded));
    }

    #[rstest]
    fn bootstrap_failures_stop_the_launch() {
        let mut loader = MockConfigLoader::new();
        loader
            .expect_load()
            .returning(|| Err(ConfigError::LevDistance { value: 0 }));
        let mut shutdown = MockShutdownSignal::new();
        shutdown.expect_wait().never();
        let modules = builtin_modules();

        let error = run_daemon_with(LaunchPlan {
            loader,
            reporter: Arc::new(RecordingHealthReporter::default()),
            modules: &modules,
            shutdown,
        })
        .expect_err("bootstrap fails");

        assert!(matches!(error, LaunchError::Bootstrap { .. }));
    }

    #[rstest]
    fn signal_failures_still_stop_the_listener() {
        let mut shutdown = MockShutdownSignal::new();
        shutdown.expect_wait().returning(|| {
            Err(ShutdownError::Install {
                source: io::Error::other("signals unavailable"),
            })
        });
        let modules = builtin_modules();

        let error = run_daemon_with(LaunchPlan {
            loader: loopback(),
            reporter: Arc::new(RecordingHealthReporter::default()),
            modules: &modules,
            shutdown,
        })
        .expect_err("signal setup fails");

        assert!(matches!(error, LaunchError::Shutdown { .. }));
    }
}
