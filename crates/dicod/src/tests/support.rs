//! Test doubles for the bootstrap and engine suites.

use std::sync::Mutex;

use dico::{DatabaseError, ModuleRegistry};
use dico_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Structured health events tracked during tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// A database opened.
    DatabaseReady(String),
    /// A database was left out.
    DatabaseFailed { name: String, message: String },
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub(crate) struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub(crate) fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn database_ready(&self, name: &str) {
        self.record(HealthEvent::DatabaseReady(name.to_owned()));
    }

    fn database_failed(&self, name: &str, error: &DatabaseError) {
        self.record(HealthEvent::DatabaseFailed {
            name: name.to_owned(),
            message: error.to_string(),
        });
    }
}

/// Module registry holding every built-in module.
pub(crate) fn builtin_modules() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    dico_modules::register_builtin(&mut registry).expect("built-in modules register once");
    registry
}
