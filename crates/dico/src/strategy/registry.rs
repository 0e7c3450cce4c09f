//! Strategy registry.

use tracing::debug;

use super::{STRATEGY_TARGET, Strategy, StrategyError, builtin_strategies};

/// Reserved name selecting the default strategy.
pub const DEFAULT_STRATEGY_ALIAS: &str = ".";

/// Ordered set of strategies with one designated default.
///
/// Registration order is the listing order. A second registration under an
/// existing name is ignored; the first one wins. Names are case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    strategies: Vec<Strategy>,
    default: Option<usize>,
}

impl StrategyRegistry {
    /// Creates an empty registry with no default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in strategies, with `lev` as the
    /// default.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for strategy in builtin_strategies() {
            registry.register(strategy);
        }
        registry.default = registry.position("lev");
        registry
    }

    /// Adds a strategy. Returns `false` when the name was already taken.
    pub fn register(&mut self, strategy: Strategy) -> bool {
        if self.position(strategy.name()).is_some() {
            debug!(
                target: STRATEGY_TARGET,
                strategy = strategy.name(),
                "duplicate strategy ignored"
            );
            return false;
        }
        self.strategies.push(strategy);
        true
    }

    /// Looks up a strategy. [`DEFAULT_STRATEGY_ALIAS`] resolves to the
    /// default strategy.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Strategy> {
        if name == DEFAULT_STRATEGY_ALIAS {
            return self.default_strategy();
        }
        self.position(name)
            .and_then(|index| self.strategies.get(index))
    }

    /// Returns `true` when `name` is registered under its own name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Designates the default strategy.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError::Unknown`] when `name` is not registered. The
    /// alias itself cannot be made the default.
    pub fn set_default(&mut self, name: &str) -> Result<(), StrategyError> {
        let index = self.position(name).ok_or_else(|| StrategyError::Unknown {
            name: name.to_owned(),
        })?;
        self.default = Some(index);
        Ok(())
    }

    /// The current default strategy.
    #[must_use]
    pub fn default_strategy(&self) -> Option<&Strategy> {
        self.default.and_then(|index| self.strategies.get(index))
    }

    /// Iterates strategies in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.iter()
    }

    /// Number of registered strategies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Returns `true` when no strategy is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        if name == DEFAULT_STRATEGY_ALIAS {
            return None;
        }
        self.strategies
            .iter()
            .position(|strategy| strategy.name() == name)
    }
}
