//! Structured health reporting for server lifecycle events.

use std::sync::Arc;

use dico::DatabaseError;
use dico_config::Config;

use crate::bootstrap::BootstrapError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once a database is open and serving.
    fn database_ready(&self, name: &str);

    /// Invoked when a database is left out because it could not be created
    /// or opened.
    fn database_failed(&self, name: &str, error: &DatabaseError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter + ?Sized,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn database_ready(&self, name: &str) {
        (**self).database_ready(name);
    }

    fn database_failed(&self, name: &str, error: &DatabaseError) {
        (**self).database_failed(name, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            listen = %config.listen,
            log_filter = %config.log_filter,
            log_format = ?config.log_format,
            "server bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "server bootstrap failed"
        );
    }

    fn database_ready(&self, name: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "database_ready",
            database = name,
            "database ready"
        );
    }

    fn database_failed(&self, name: &str, error: &DatabaseError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "database_failed",
            database = name,
            error = %error,
            "database unavailable"
        );
    }
}
