//! DICT protocol (RFC 2229) dictionary server.
//!
//! The server loads database modules, opens the databases named in its
//! configuration and answers `DEFINE`, `MATCH`, `SHOW` and the other DICT
//! commands over TCP or Unix domain sockets. Every accepted connection runs a
//! [`Session`] on its own thread against a shared, read-only [`Engine`].
//!
//! Start-up is split in two:
//!
//! 1. [`bootstrap_with`] loads configuration, installs telemetry, prepares
//!    the socket directory and builds the [`Engine`]. Health hooks report
//!    each step, and each database, so operators can see what was left out.
//! 2. [`run_daemon`] serves the bootstrapped engine until a termination
//!    signal arrives, then stops accepting and returns.
//!
//! Optional protocol extensions (`xlev`, `mime`, `lang`) are capabilities:
//! enabling one installs its commands and announces it in the banner.

mod bootstrap;
mod commands;
mod engine;
mod health;
mod output;
mod process;
mod session;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, CliConfigLoader, ConfigLoader, Daemon, StaticConfigLoader, bootstrap_with,
};
pub use commands::{
    CapabilityError, CapabilityInit, CapabilityRegistry, CapabilitySet, CommandDescriptor,
    CommandRegistry, Context, Handler, Resolution,
};
pub use engine::{Engine, EngineError, ServerSettings};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use output::OutputStream;
pub use process::{LaunchError, ShutdownError, ShutdownSignal, SystemShutdownSignal, run_daemon};
pub use session::{Session, SessionError, SessionState};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{
    ConnectionHandler, ConnectionStream, ListenerError, ListenerHandle, SessionHandler,
    SocketListener,
};

#[cfg(test)]
mod tests;
