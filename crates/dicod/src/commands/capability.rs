//! Optional protocol extensions.
//!
//! A capability bundles commands with an optional init callback. Capabilities
//! are registered at startup, enabled from the configuration and then flushed
//! once: flushing runs the init callbacks of the enabled ones in registration
//! order and installs their commands. Commands of capabilities that were
//! never enabled are never installed, so clients see them as unknown.

use dico::StrategyRegistry;
use thiserror::Error;
use tracing::debug;

use super::registry::{CommandDescriptor, CommandRegistry};
use super::COMMANDS_TARGET;

/// Startup hook of a capability.
pub type CapabilityInit = fn(&mut StrategyRegistry) -> Result<(), CapabilityError>;

/// Errors raised while enabling or flushing capabilities.
#[derive(Debug, Error)]
pub enum CapabilityError {
    /// The configuration enables a capability that does not exist.
    #[error("unknown capability '{name}'")]
    Unknown {
        /// Requested name.
        name: String,
    },
    /// An init callback refused to start.
    #[error("capability '{capability}' failed to initialise: {reason}")]
    Init {
        /// Capability whose callback failed.
        capability: &'static str,
        /// Explanation supplied by the callback.
        reason: String,
    },
}

#[derive(Debug)]
struct Capability {
    name: &'static str,
    commands: Vec<CommandDescriptor>,
    init: Option<CapabilityInit>,
    enabled: bool,
}

/// Capabilities known to the server, before flushing.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    entries: Vec<Capability>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Registers a capability. A later registration under the same name
    /// replaces the earlier one.
    pub fn register(
        &mut self,
        name: &'static str,
        commands: Vec<CommandDescriptor>,
        init: Option<CapabilityInit>,
    ) {
        let capability = Capability {
            name,
            commands,
            init,
            enabled: false,
        };
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => *entry = capability,
            None => self.entries.push(capability),
        }
    }

    /// Marks `name` for installation. Names are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [`CapabilityError::Unknown`] for unregistered names.
    pub fn enable(&mut self, name: &str) -> Result<(), CapabilityError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CapabilityError::Unknown {
                name: name.to_owned(),
            })?;
        entry.enabled = true;
        Ok(())
    }

    /// Names of all registered capabilities.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }

    /// Initialises the enabled capabilities and installs their commands.
    ///
    /// # Errors
    ///
    /// Returns the first [`CapabilityError::Init`]; nothing after it is
    /// installed.
    pub fn flush(
        self,
        commands: &mut CommandRegistry,
        strategies: &mut StrategyRegistry,
    ) -> Result<CapabilitySet, CapabilityError> {
        let mut enabled = Vec::new();
        for capability in self.entries.into_iter().filter(|entry| entry.enabled) {
            if let Some(init) = capability.init {
                init(strategies)?;
            }
            for command in capability.commands {
                commands.install(command);
            }
            debug!(
                target: COMMANDS_TARGET,
                capability = capability.name,
                "capability installed"
            );
            enabled.push(capability.name);
        }
        Ok(CapabilitySet { names: enabled })
    }
}

/// Capabilities in effect after flushing, in registration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    names: Vec<&'static str>,
}

impl CapabilitySet {
    /// Returns `true` when `name` was enabled.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|enabled| enabled.eq_ignore_ascii_case(name))
    }

    /// Enabled names in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.names.iter().copied()
    }

    /// Banner marker: the names joined with `.` inside angle brackets.
    #[must_use]
    pub fn banner_marker(&self) -> String {
        format!("<{}>", self.names.join("."))
    }
}
