//! Waiting for the signal that stops the server.
//!
//! SIGTERM, SIGINT, SIGQUIT and SIGHUP all stop accepting connections and
//! close the databases. SIGHUP does not reload the configuration.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that end the server, with the names they are logged under.
const STOP_SIGNALS: [(i32, &str); 4] = [
    (SIGTERM, "SIGTERM"),
    (SIGINT, "SIGINT"),
    (SIGQUIT, "SIGQUIT"),
    (SIGHUP, "SIGHUP"),
];

fn signal_name(signal: i32) -> &'static str {
    STOP_SIGNALS
        .iter()
        .find(|(number, _)| *number == signal)
        .map_or("unknown", |&(_, name)| name)
}

/// Blocks the launching thread until the server should stop.
#[cfg_attr(test, mockall::automock)]
pub trait ShutdownSignal: Send + Sync {
    /// Returns once a stop has been requested.
    ///
    /// # Errors
    ///
    /// Returns [`ShutdownError`] when the notification source cannot be set
    /// up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failures of a [`ShutdownSignal`].
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("cannot watch for stop signals: {source}")]
    Install {
        /// Registration error.
        #[source]
        source: io::Error,
    },
}

/// [`ShutdownSignal`] backed by the process's stop signals.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Creates the listener; handlers are registered by [`ShutdownSignal::wait`].
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = Signals::new(STOP_SIGNALS.map(|(number, _)| number))
            .map_err(|source| ShutdownError::Install { source })?;
        if let Some(signal) = signals.forever().next() {
            info!(
                target: PROCESS_TARGET,
                signal = signal_name(signal),
                "stopping dictionary server"
            );
        }
        Ok(())
    }
}
