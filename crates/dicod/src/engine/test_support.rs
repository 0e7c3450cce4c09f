//! Engine fixtures shared by the command, session and transport tests.

use dico_config::{
    Config, DatabaseDecl, LanguagesDecl, MemberConditionDecl, MemberDecl, ModuleDecl,
};

use super::Engine;
use crate::tests::support::{RecordingHealthReporter, builtin_modules};

/// Host name announced by fixture engines.
pub(crate) const HOSTNAME: &str = "dict.example.org";

/// Configuration with three dictionaries, a hidden one and a virtual one:
///
/// * `animals`: cat (twice), cow, dog; described, with info and languages
/// * `plants`: catnip, rose
/// * `secret`: hidden, cat
/// * `garden`: virtual over `animals` and `plants`
pub(crate) fn sample_config() -> Config {
    let mut animals = DatabaseDecl::new("animals", "dictionary").with_args([
        "entry=cat:A small domesticated feline.",
        "entry=cat:Short for catamaran.",
        "entry=cow:A large bovine.",
        "entry=dog:A loyal canine.",
    ]);
    animals.description = Some("Farm animals".to_owned());
    animals.info = Some("Animals found on a farm.".to_owned());
    animals.languages = Some(LanguagesDecl {
        source: vec!["en".to_owned()],
        target: vec!["en".to_owned(), "de".to_owned()],
    });

    let plants = DatabaseDecl::new("plants", "dictionary")
        .with_args(["entry=catnip:A plant cats like.", "entry=rose:A thorny flower."]);

    let mut secret =
        DatabaseDecl::new("secret", "dictionary").with_args(["entry=cat:A hidden cat."]);
    secret.hidden = true;

    let mut garden = DatabaseDecl::new("garden", "virtual");
    garden.handler = None;
    garden.members = ["animals", "plants"]
        .into_iter()
        .map(|name| MemberDecl {
            name: name.to_owned(),
            condition: MemberConditionDecl::Any,
        })
        .collect();

    Config {
        hostname: Some(HOSTNAME.to_owned()),
        banner: Some("test server".to_owned()),
        capabilities: vec!["xlev".to_owned(), "mime".to_owned(), "lang".to_owned()],
        modules: vec![ModuleDecl::new("dictionary")],
        databases: vec![animals, plants, secret, garden],
        ..Config::default()
    }
}

/// Builds an engine from `config` with the built-in modules.
pub(crate) fn engine_from(config: &Config) -> Engine {
    Engine::from_config(config, &builtin_modules(), &RecordingHealthReporter::default())
        .expect("fixture engine should start")
}

/// Engine over [`sample_config`].
pub(crate) fn sample_engine() -> Engine {
    engine_from(&sample_config())
}
