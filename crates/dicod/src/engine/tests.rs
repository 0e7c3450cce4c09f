use std::sync::Arc;

use dico::MatchKey;
use dico_config::{Config, DatabaseDecl, ModuleDecl};
use rstest::{fixture, rstest};

use super::test_support::{HOSTNAME, engine_from, sample_config, sample_engine};
use super::{Engine, EngineError};
use crate::tests::support::{HealthEvent, RecordingHealthReporter, builtin_modules};

#[fixture]
fn config() -> Config {
    sample_config()
}

fn names<'a>(databases: impl Iterator<Item = &'a Arc<dico::DatabaseInstance>>) -> Vec<&'a str> {
    databases.map(|database| database.name()).collect()
}

#[rstest]
fn databases_keep_declaration_order() {
    let engine = sample_engine();
    assert_eq!(
        names(engine.databases()),
        ["animals", "plants", "secret", "garden"]
    );
}

#[rstest]
fn wildcard_searches_skip_hidden_and_virtual_databases() {
    let engine = sample_engine();
    assert_eq!(names(engine.searchable()), ["animals", "plants"]);
}

#[rstest]
fn virtual_module_is_loaded_implicitly() {
    let engine = sample_engine();
    let garden = engine.database("garden").expect("garden is configured");
    let found = garden
        .define(&MatchKey::new("catnip"))
        .expect("query succeeds")
        .expect("plants defines catnip");
    assert_eq!(found.count(), 1);
    assert_eq!(found.database_for(0).name(), "plants");
}

#[rstest]
fn settings_come_from_configuration() {
    let engine = sample_engine();
    let settings = engine.settings();
    assert_eq!(settings.hostname, HOSTNAME);
    assert_eq!(settings.banner, "test server");
    assert!(settings.server_info.ends_with(HOSTNAME));
    assert_eq!(settings.lev_distance, 1);
    assert!(!settings.transcript);
}

#[rstest]
fn enabled_capabilities_are_announced(config: Config) {
    let engine = engine_from(&config);
    assert_eq!(engine.capabilities().banner_marker(), "<xlev.mime.lang>");
}

#[rstest]
fn default_strategy_is_configurable(mut config: Config) {
    config.default_strategy = Some("exact".to_owned());
    let engine = engine_from(&config);
    let default = engine.strategies().get(".").expect("default exists");
    assert_eq!(default.name(), "exact");
}

#[rstest]
fn unknown_default_strategy_is_fatal(mut config: Config) {
    config.default_strategy = Some("telepathic".to_owned());
    let error = Engine::from_config(
        &config,
        &builtin_modules(),
        &RecordingHealthReporter::default(),
    )
    .expect_err("unknown strategy");
    assert!(matches!(error, EngineError::DefaultStrategy(_)));
}

#[rstest]
fn unknown_capability_is_fatal(mut config: Config) {
    config.capabilities.push("teleport".to_owned());
    let error = Engine::from_config(
        &config,
        &builtin_modules(),
        &RecordingHealthReporter::default(),
    )
    .expect_err("unknown capability");
    assert!(matches!(error, EngineError::Capability(_)));
}

#[rstest]
fn unknown_module_kind_is_fatal(mut config: Config) {
    config.modules = vec![ModuleDecl {
        kind: Some("gdbm".to_owned()),
        ..ModuleDecl::new("dictionary")
    }];
    let error = Engine::from_config(
        &config,
        &builtin_modules(),
        &RecordingHealthReporter::default(),
    )
    .expect_err("unknown kind");
    assert!(
        matches!(&error, EngineError::Module { module, .. } if module == "dictionary"),
        "unexpected error: {error}"
    );
}

#[rstest]
fn broken_databases_are_skipped_and_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("missing.txt");
    let config = Config {
        modules: vec![ModuleDecl::new("dictionary")],
        databases: vec![
            DatabaseDecl::new("good", "dictionary").with_args(["entry=cat:A feline."]),
            DatabaseDecl::new("unreadable", "dictionary")
                .with_args([format!("file={}", missing.display())]),
            DatabaseDecl::new("malformed", "dictionary").with_args(["entry=no-colon"]),
        ],
        ..Config::default()
    };
    let reporter = RecordingHealthReporter::default();

    let engine = Engine::from_config(&config, &builtin_modules(), &reporter)
        .expect("engine starts without the broken databases");

    assert_eq!(names(engine.databases()), ["good"]);
    let events = reporter.events();
    assert!(events.contains(&HealthEvent::DatabaseReady("good".to_owned())));
    let failed: Vec<&str> = events
        .iter()
        .filter_map(|event| match event {
            HealthEvent::DatabaseFailed { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(failed, ["malformed", "unreadable"]);
}

#[rstest]
fn dropping_the_engine_closes_databases() {
    let engine = sample_engine();
    let animals = Arc::clone(engine.database("animals").expect("animals is configured"));
    assert!(animals.is_open());
    drop(engine);
    assert!(!animals.is_open());
}
