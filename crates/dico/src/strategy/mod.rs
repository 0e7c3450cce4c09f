//! Word-matching strategies.
//!
//! A [`Strategy`] is a named predicate with a three-phase lifecycle. A
//! [`Selector`] begins a query by building a [`Matcher`] that owns whatever
//! state the comparison needs (a folded query, a compiled pattern, a soundex
//! code). The matcher then runs once per candidate headword, and dropping it
//! ends the query. [`select`] drives that loop for backends.

mod levenshtein;
mod regex;
mod registry;
mod soundex;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

pub use self::levenshtein::{LevenshteinSelector, damerau_levenshtein, levenshtein};
pub use self::regex::{RegexSelector, RegexSyntax, translate, translate_basic};
pub use self::registry::{DEFAULT_STRATEGY_ALIAS, StrategyRegistry};
pub use self::soundex::{SoundexSelector, soundex};

const STRATEGY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::strategy");

/// Default maximum edit distance for the Levenshtein strategies.
pub const DEFAULT_LEV_DISTANCE: usize = 1;

/// Errors raised while starting a strategy.
#[derive(Debug, Error)]
pub enum StrategyError {
    /// The query could not be compiled as a pattern.
    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        /// The query as received.
        pattern: String,
        /// Compiler diagnostics.
        #[source]
        source: ::regex::Error,
    },
    /// A strategy name was not found in the registry.
    #[error("unknown strategy '{name}'")]
    Unknown {
        /// The requested name.
        name: String,
    },
}

/// The query side of a match request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchKey<'a> {
    /// Word supplied by the client.
    pub word: &'a str,
    /// Maximum edit distance for the Levenshtein family.
    pub lev_distance: usize,
    /// Whether the session asked for MIME headers.
    pub mime: bool,
}

impl<'a> MatchKey<'a> {
    /// Builds a key with the default Levenshtein distance.
    #[must_use]
    pub const fn new(word: &'a str) -> Self {
        Self {
            word,
            lev_distance: DEFAULT_LEV_DISTANCE,
            mime: false,
        }
    }

    /// Overrides the Levenshtein distance.
    #[must_use]
    pub const fn with_lev_distance(mut self, distance: usize) -> Self {
        self.lev_distance = distance;
        self
    }

    /// Records whether the session is in MIME mode.
    #[must_use]
    pub const fn with_mime(mut self, mime: bool) -> Self {
        self.mime = mime;
        self
    }
}

/// Per-query comparison state. Dropping it ends the query.
pub trait Matcher {
    /// Decides whether `candidate` matches the query.
    fn is_match(&mut self, candidate: &str) -> bool;
}

/// Factory for per-query matchers.
pub trait Selector: Send + Sync {
    /// Prepares the comparison for one query.
    ///
    /// # Errors
    ///
    /// Returns [`StrategyError`] when the query cannot be used, for example
    /// a pattern that does not compile.
    fn begin(&self, key: &MatchKey<'_>) -> Result<Box<dyn Matcher>, StrategyError>;
}

/// Predicate over a lower-cased query and a lower-cased candidate.
pub type FoldedPredicate = fn(query: &str, candidate: &str) -> bool;

/// Selector for stateless predicates over case-folded text.
#[derive(Debug, Clone, Copy)]
pub struct FoldedSelector {
    predicate: FoldedPredicate,
}

impl FoldedSelector {
    /// Wraps a predicate.
    #[must_use]
    pub const fn new(predicate: FoldedPredicate) -> Self {
        Self { predicate }
    }
}

struct FoldedMatcher {
    query: String,
    predicate: FoldedPredicate,
}

impl Matcher for FoldedMatcher {
    fn is_match(&mut self, candidate: &str) -> bool {
        (self.predicate)(&self.query, &candidate.to_lowercase())
    }
}

impl Selector for FoldedSelector {
    fn begin(&self, key: &MatchKey<'_>) -> Result<Box<dyn Matcher>, StrategyError> {
        Ok(Box::new(FoldedMatcher {
            query: key.word.to_lowercase(),
            predicate: self.predicate,
        }))
    }
}

/// A named, described matching strategy.
#[derive(Clone)]
pub struct Strategy {
    name: String,
    description: String,
    selector: Arc<dyn Selector>,
}

impl Strategy {
    /// Creates a strategy backed by `selector`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        selector: impl Selector + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            selector: Arc::new(selector),
        }
    }

    /// Creates a strategy from a case-folded predicate.
    pub fn folded(
        name: impl Into<String>,
        description: impl Into<String>,
        predicate: FoldedPredicate,
    ) -> Self {
        Self::new(name, description, FoldedSelector::new(predicate))
    }

    /// Strategy name as used on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Starts a query.
    ///
    /// # Errors
    ///
    /// See [`Selector::begin`].
    pub fn begin(&self, key: &MatchKey<'_>) -> Result<Box<dyn Matcher>, StrategyError> {
        self.selector.begin(key)
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strategy")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Outcome of running a strategy over a candidate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<T> {
    /// Matching items in candidate order.
    pub matches: Vec<T>,
    /// Number of comparisons performed.
    pub compared: usize,
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self {
            matches: Vec::new(),
            compared: 0,
        }
    }
}

/// Runs the begin/run/end loop of `strategy` over `items`.
///
/// Items are visited in iteration order and matches keep that order. A
/// strategy that fails to begin is logged and yields an empty selection.
pub fn select<T, I, F>(
    strategy: &Strategy,
    key: &MatchKey<'_>,
    items: I,
    headword: F,
) -> Selection<T>
where
    I: IntoIterator<Item = T>,
    F: Fn(&T) -> &str,
{
    let mut matcher = match strategy.begin(key) {
        Ok(matcher) => matcher,
        Err(error) => {
            warn!(
                target: STRATEGY_TARGET,
                strategy = strategy.name(),
                error = %error,
                "strategy could not start; no matches"
            );
            return Selection::default();
        }
    };
    let mut selection = Selection::default();
    for item in items {
        selection.compared += 1;
        if matcher.is_match(headword(&item)) {
            selection.matches.push(item);
        }
    }
    selection
}

fn exact(query: &str, candidate: &str) -> bool {
    query == candidate
}

fn prefix(query: &str, candidate: &str) -> bool {
    candidate.starts_with(query)
}

fn everything(_query: &str, _candidate: &str) -> bool {
    true
}

/// The strategies every server carries, in registration order.
#[must_use]
pub fn builtin_strategies() -> Vec<Strategy> {
    vec![
        Strategy::folded("exact", "Match words exactly", exact),
        Strategy::folded("prefix", "Match word prefixes", prefix),
        Strategy::new("soundex", "Match using SOUNDEX algorithm", SoundexSelector),
        Strategy::folded("all", "Match everything (experimental)", everything),
        Strategy::new(
            "lev",
            "Match headwords within given Levenshtein distance",
            LevenshteinSelector::plain(),
        ),
        Strategy::new(
            "dlev",
            "Match headwords within given Damerau-Levenshtein distance",
            LevenshteinSelector::damerau(),
        ),
        Strategy::new(
            "re",
            "POSIX 1003.2 (modern) regular expressions",
            RegexSelector::new(RegexSyntax::Extended),
        ),
        Strategy::new(
            "regexp",
            "Old (basic) regular expressions",
            RegexSelector::new(RegexSyntax::Basic),
        ),
    ]
}
