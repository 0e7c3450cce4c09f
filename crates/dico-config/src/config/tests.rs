use std::io::Write as _;

use rstest::rstest;

use super::*;
use crate::database::{MemberConditionDecl, MemberDecl};
use crate::defaults::{DEFAULT_CONTENT_TYPE, DEFAULT_LEV_DISTANCE, DEFAULT_PORT};

fn sample() -> &'static str {
    r#"{
        "listen": { "transport": "tcp", "host": "0.0.0.0", "port": 2629 },
        "log_format": "compact",
        "capabilities": ["xlev", "mime"],
        "default_strategy": "prefix",
        "modules": [
            { "name": "dict", "kind": "dictionary" },
            { "name": "echo" }
        ],
        "databases": [
            { "name": "animals", "handler": "dict",
              "args": ["entry=cat:a small feline"],
              "languages": { "source": ["en"], "target": ["en"] } },
            { "name": "parrot", "handler": "echo", "hidden": true },
            { "name": "all",
              "members": [{ "name": "animals" }, { "name": "parrot", "condition": "nomime" }] }
        ]
    }"#
}

// --- defaults -------------------------------------------------------------

#[test]
fn empty_document_yields_defaults() {
    let config = Config::from_json("{}").expect("parse");
    assert_eq!(config, Config::default());
    assert_eq!(config.listen, SocketEndpoint::tcp("127.0.0.1", DEFAULT_PORT));
    assert_eq!(config.log_filter, "info");
    assert_eq!(config.log_format, LogFormat::Json);
    assert_eq!(config.lev_distance, DEFAULT_LEV_DISTANCE);
    assert!(config.databases().next().is_none());
}

// --- parsing --------------------------------------------------------------

#[test]
fn parses_full_document() {
    let config = Config::from_json(sample()).expect("parse");
    assert_eq!(config.listen, SocketEndpoint::tcp("0.0.0.0", 2629));
    assert_eq!(config.log_format, LogFormat::Compact);
    assert_eq!(config.capabilities, ["xlev", "mime"]);
    assert_eq!(config.default_strategy.as_deref(), Some("prefix"));
    assert_eq!(
        config.modules.iter().map(ModuleDecl::kind).collect::<Vec<_>>(),
        ["dictionary", "echo"]
    );

    let names: Vec<_> = config.databases().map(|db| db.name.as_str()).collect();
    assert_eq!(names, ["animals", "parrot", "all"]);

    let animals = config.databases.first().expect("animals");
    assert_eq!(animals.content_type, DEFAULT_CONTENT_TYPE);
    assert_eq!(
        animals.languages.as_ref().map(|langs| langs.source.clone()),
        Some(vec!["en".to_owned()])
    );

    let all = config.databases.last().expect("virtual");
    assert!(all.is_virtual());
    assert_eq!(
        all.members,
        [
            MemberDecl {
                name: "animals".to_owned(),
                condition: MemberConditionDecl::Any,
            },
            MemberDecl {
                name: "parrot".to_owned(),
                condition: MemberConditionDecl::NoMime,
            },
        ]
    );
}

#[rstest]
#[case(r#"{ "colour": "blue" }"#)]
#[case(r#"{ "databases": [{ "name": "x", "handler": "y", "size": 3 }] }"#)]
#[case("{ not json")]
fn rejects_malformed_documents(#[case] text: &str) {
    let error = Config::from_json(text).expect_err("must fail");
    assert!(matches!(error, ConfigError::Parse { origin: None, .. }));
}

// --- validation -----------------------------------------------------------

#[rstest]
#[case(0)]
#[case(10)]
fn rejects_out_of_range_lev_distance(#[case] value: usize) {
    let config = Config {
        lev_distance: value,
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::LevDistance { value: reported }) if reported == value
    ));
}

#[test]
fn rejects_duplicate_modules() {
    let config = Config {
        modules: vec![ModuleDecl::new("echo"), ModuleDecl::new("echo")],
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Duplicate { what: "module", .. })
    ));
}

#[test]
fn rejects_duplicate_databases() {
    let config = Config {
        modules: vec![ModuleDecl::new("echo")],
        databases: vec![
            DatabaseDecl::new("parrot", "echo"),
            DatabaseDecl::new("parrot", "echo"),
        ],
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Duplicate { what: "database", name }) if name == "parrot"
    ));
}

#[rstest]
#[case("!")]
#[case("*")]
#[case("")]
fn rejects_reserved_database_names(#[case] name: &str) {
    let config = Config {
        modules: vec![ModuleDecl::new("echo")],
        databases: vec![DatabaseDecl::new(name, "echo")],
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ReservedName { .. })
    ));
}

#[test]
fn rejects_undeclared_handler() {
    let config = Config {
        databases: vec![DatabaseDecl::new("parrot", "echo")],
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::UnknownHandler { handler, .. }) if handler == "echo"
    ));
}

#[test]
fn rejects_database_without_handler_or_members() {
    let mut database = DatabaseDecl::new("orphan", "unused");
    database.handler = None;
    let config = Config {
        databases: vec![database],
        ..Config::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingHandler { database }) if database == "orphan"
    ));
}

#[test]
fn members_must_be_declared_first() {
    let text = r#"{
        "modules": [{ "name": "echo" }],
        "databases": [
            { "name": "all", "members": [{ "name": "parrot" }] },
            { "name": "parrot", "handler": "echo" }
        ]
    }"#;
    assert!(matches!(
        Config::from_json(text),
        Err(ConfigError::UnknownMember { member, .. }) if member == "parrot"
    ));
}

// --- files ----------------------------------------------------------------

#[test]
fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(sample().as_bytes()).expect("write");
    let path = Utf8Path::from_path(file.path()).expect("utf-8 temp path");
    let config = Config::from_file(path).expect("load");
    assert_eq!(config.databases.len(), 3);
}

#[test]
fn parse_errors_name_the_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"[]").expect("write");
    let path = Utf8Path::from_path(file.path()).expect("utf-8 temp path");
    let error = Config::from_file(path).expect_err("must fail");
    assert!(error.to_string().contains(path.as_str()));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = Utf8PathBuf::from_path_buf(dir.path().join("absent.json")).expect("utf-8 path");
    assert!(matches!(
        Config::from_file(&path),
        Err(ConfigError::Read { .. })
    ));
}
