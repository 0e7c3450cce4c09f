//! Strategy-only modules: `word` and `substr`.

use dico::module::{Capabilities, EntryPoint, EntryPoints};
use dico::strategy::Strategy;
use dico::tokenize::tokenize;
use dico::{DatabaseModule, ModuleDescriptor, ModuleError, StrategyRegistry};

fn strategy_only() -> ModuleDescriptor {
    ModuleDescriptor::new(
        Capabilities::NODB,
        EntryPoints::empty().with(EntryPoint::Init),
    )
}

fn any_word(query: &str, candidate: &str) -> bool {
    tokenize(candidate).iter().any(|token| token == query)
}

fn substring(query: &str, candidate: &str) -> bool {
    candidate.contains(query)
}

/// Registers the `word` strategy: the query equals one of the words of the
/// headword.
#[derive(Debug, Default, Clone, Copy)]
pub struct WordModule;

impl DatabaseModule for WordModule {
    fn descriptor(&self) -> ModuleDescriptor {
        strategy_only()
    }

    fn init(&mut self, _args: &[String], strategies: &mut StrategyRegistry) -> Result<(), ModuleError> {
        strategies.register(Strategy::folded(
            "word",
            "Match a word anywhere in the headword",
            any_word,
        ));
        Ok(())
    }
}

/// Registers the `substr` strategy: the query occurs anywhere in the
/// headword.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstrModule;

impl DatabaseModule for SubstrModule {
    fn descriptor(&self) -> ModuleDescriptor {
        strategy_only()
    }

    fn init(&mut self, _args: &[String], strategies: &mut StrategyRegistry) -> Result<(), ModuleError> {
        strategies.register(Strategy::folded(
            "substr",
            "Match a substring anywhere in the headword",
            substring,
        ));
        Ok(())
    }
}
