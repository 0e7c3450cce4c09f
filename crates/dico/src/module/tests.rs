//! Unit tests for module descriptors and the loader.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rstest::{fixture, rstest};

use super::*;
use crate::strategy::{Strategy, StrategyRegistry};
use crate::test_support::WordListModule;

fn database_entry_points() -> EntryPoints {
    EntryPoints::DATABASE_REQUIRED.with(EntryPoint::InitDb)
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[rstest]
#[case(ModuleVersion::new(1, 0), true)]
#[case(ModuleVersion::new(1, 2), true)]
#[case(ModuleVersion::new(1, 3), false)]
#[case(ModuleVersion::new(2, 0), false)]
#[case(ModuleVersion::new(0, 9), false)]
fn version_compatibility(#[case] version: ModuleVersion, #[case] compatible: bool) {
    assert_eq!(version.is_compatible_with(ENGINE_VERSION), compatible);
}

#[rstest]
#[case(ModuleVersion::new(1, 0), false)]
#[case(ModuleVersion::new(1, 1), true)]
#[case(ModuleVersion::new(1, 2), true)]
fn mime_headers_need_version_1_1(#[case] version: ModuleVersion, #[case] supported: bool) {
    assert_eq!(version.supports_mime_header(), supported);
}

#[test]
fn version_displays_as_dotted_pair() {
    assert_eq!(ModuleVersion::new(1, 2).to_string(), "1.2");
}

// ---------------------------------------------------------------------------
// Descriptor validation
// ---------------------------------------------------------------------------

#[test]
fn minimal_database_module_is_valid() {
    let descriptor = ModuleDescriptor::new(Capabilities::empty(), database_entry_points());
    assert_eq!(descriptor.validate("m"), Ok(()));
}

#[test]
fn newer_minor_version_is_rejected() {
    let descriptor = ModuleDescriptor::new(Capabilities::empty(), database_entry_points())
        .with_version(ModuleVersion::new(1, 3));
    assert!(matches!(
        descriptor.validate("m"),
        Err(ModuleContractError::IncompatibleVersion { .. })
    ));
}

#[rstest]
#[case(EntryPoint::Match)]
#[case(EntryPoint::Define)]
#[case(EntryPoint::OutputResult)]
#[case(EntryPoint::ResultCount)]
#[case(EntryPoint::FreeResult)]
#[case(EntryPoint::InitDb)]
fn missing_required_entry_point_is_reported(#[case] missing: EntryPoint) {
    let entry_points = database_entry_points()
        .iter()
        .filter(|entry| *entry != missing)
        .collect();
    let descriptor = ModuleDescriptor::new(Capabilities::empty(), entry_points);
    assert_eq!(
        descriptor.validate("m"),
        Err(ModuleContractError::MissingEntryPoint {
            module: "m".to_owned(),
            entry: missing,
        })
    );
}

#[test]
fn init_ext_modules_need_the_extended_flavour() {
    let descriptor = ModuleDescriptor::new(Capabilities::INIT_EXT, database_entry_points());
    assert_eq!(
        descriptor.validate("m"),
        Err(ModuleContractError::MissingEntryPoint {
            module: "m".to_owned(),
            entry: EntryPoint::InitDbExt,
        })
    );
}

#[test]
fn declaring_both_init_flavours_is_rejected() {
    let descriptor = ModuleDescriptor::new(
        Capabilities::empty(),
        database_entry_points().with(EntryPoint::InitDbExt),
    );
    assert_eq!(
        descriptor.validate("m"),
        Err(ModuleContractError::UnexpectedEntryPoint {
            module: "m".to_owned(),
            entry: EntryPoint::InitDbExt,
        })
    );
}

#[rstest]
#[case(EntryPoint::Open)]
#[case(EntryPoint::Close)]
fn open_and_close_come_in_pairs(#[case] only: EntryPoint) {
    let descriptor =
        ModuleDescriptor::new(Capabilities::empty(), database_entry_points().with(only));
    assert!(matches!(
        descriptor.validate("m"),
        Err(ModuleContractError::UnpairedOpenClose { .. })
    ));
}

#[test]
fn strategy_only_modules_need_no_database_entry_points() {
    let descriptor = ModuleDescriptor::new(
        Capabilities::NODB,
        EntryPoints::empty().with(EntryPoint::Init),
    );
    assert_eq!(descriptor.validate("m"), Ok(()));
}

#[test]
fn entry_points_iterate_in_contract_order() {
    let entries: Vec<&str> = EntryPoints::empty()
        .with(EntryPoint::FreeResult)
        .with(EntryPoint::Init)
        .with(EntryPoint::Match)
        .iter()
        .map(EntryPoint::as_str)
        .collect();
    assert_eq!(entries, ["init", "match", "free_result"]);
}

// ---------------------------------------------------------------------------
// Registry and loading
// ---------------------------------------------------------------------------

/// Strategy provider recording whether `init` ran.
struct StrategyProvider {
    initialised: Arc<AtomicBool>,
}

impl DatabaseModule for StrategyProvider {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor::new(
            Capabilities::NODB,
            EntryPoints::empty().with(EntryPoint::Init),
        )
    }

    fn init(
        &mut self,
        args: &[String],
        strategies: &mut StrategyRegistry,
    ) -> Result<(), ModuleError> {
        if args.iter().any(|arg| arg == "reject") {
            return Err(ModuleError::invalid_arguments("rejected"));
        }
        self.initialised.store(true, Ordering::SeqCst);
        strategies.register(Strategy::folded("suffix", "Match word suffixes", |q, c| {
            c.ends_with(q)
        }));
        Ok(())
    }
}

/// Module selecting the extended init flavour.
struct ExtModule;

impl DatabaseModule for ExtModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor::new(
            Capabilities::INIT_EXT,
            EntryPoints::DATABASE_REQUIRED.with(EntryPoint::InitDbExt),
        )
    }

    fn init_db_ext(
        &self,
        name: &str,
        _args: &[String],
        extra: InitExtra,
    ) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        let words = extra
            .downcast::<Vec<&'static str>>()
            .map_err(|_| ModuleError::invalid_arguments(format!("{name}: no word list")))?;
        WordListModule::new(&words).init_db(name, &[])
    }
}

#[fixture]
fn registry() -> (ModuleRegistry, Arc<AtomicBool>) {
    let initialised = Arc::new(AtomicBool::new(false));
    let mut registry = ModuleRegistry::new();
    let flag = Arc::clone(&initialised);
    registry
        .register("strategies", move || {
            Box::new(StrategyProvider {
                initialised: Arc::clone(&flag),
            }) as Box<dyn DatabaseModule>
        })
        .expect("register strategies");
    registry
        .register("words", || {
            Box::new(WordListModule::new(&["apple"])) as Box<dyn DatabaseModule>
        })
        .expect("register words");
    registry
        .register("ext", || Box::new(ExtModule) as Box<dyn DatabaseModule>)
        .expect("register ext");
    (registry, initialised)
}

#[rstest]
fn duplicate_kinds_are_rejected(registry: (ModuleRegistry, Arc<AtomicBool>)) {
    let (mut registry, _) = registry;
    let result = registry.register("words", || {
        Box::new(WordListModule::new(&[])) as Box<dyn DatabaseModule>
    });
    assert!(matches!(result, Err(ModuleError::Duplicate { name }) if name == "words"));
    assert_eq!(registry.kinds(), ["ext", "strategies", "words"]);
}

#[rstest]
fn unknown_kind_fails_to_load(registry: (ModuleRegistry, Arc<AtomicBool>)) {
    let (registry, _) = registry;
    let mut strategies = StrategyRegistry::with_builtins();
    let result = LoadedModule::load("x", "gcide", &[], &registry, &mut strategies);
    assert!(matches!(result, Err(ModuleError::UnknownKind { kind }) if kind == "gcide"));
}

#[rstest]
fn loading_runs_init_and_registers_strategies(registry: (ModuleRegistry, Arc<AtomicBool>)) {
    let (registry, initialised) = registry;
    let mut strategies = StrategyRegistry::with_builtins();
    let module = LoadedModule::load("extra", "strategies", &[], &registry, &mut strategies)
        .expect("load strategy provider");
    assert!(initialised.load(Ordering::SeqCst));
    assert!(strategies.contains("suffix"));
    assert_eq!(module.name(), "extra");
    assert!(matches!(
        module.create_backend("db", &[], None),
        Err(ModuleError::Unsupported {
            entry: EntryPoint::InitDb
        })
    ));
}

#[rstest]
fn failing_init_aborts_loading(registry: (ModuleRegistry, Arc<AtomicBool>)) {
    let (registry, initialised) = registry;
    let mut strategies = StrategyRegistry::with_builtins();
    let args = vec!["reject".to_owned()];
    let result = LoadedModule::load("extra", "strategies", &args, &registry, &mut strategies);
    assert!(matches!(result, Err(ModuleError::InvalidArguments { .. })));
    assert!(!initialised.load(Ordering::SeqCst));
    assert!(!strategies.contains("suffix"));
}

#[rstest]
fn plain_modules_refuse_extra_data(registry: (ModuleRegistry, Arc<AtomicBool>)) {
    let (registry, _) = registry;
    let mut strategies = StrategyRegistry::with_builtins();
    let module = LoadedModule::load("w", "words", &[], &registry, &mut strategies)
        .expect("load words");
    assert!(module.is_reentrant());
    assert!(module.create_backend("db", &[], None).is_ok());
    let extra: InitExtra = Box::new(());
    assert!(matches!(
        module.create_backend("db", &[], Some(extra)),
        Err(ModuleError::ExtraNotSupported { module }) if module == "w"
    ));
}

#[rstest]
fn extended_modules_receive_extra_data(registry: (ModuleRegistry, Arc<AtomicBool>)) {
    let (registry, _) = registry;
    let mut strategies = StrategyRegistry::with_builtins();
    let module =
        LoadedModule::load("e", "ext", &[], &registry, &mut strategies).expect("load ext");
    assert!(!module.is_reentrant());
    let extra: InitExtra = Box::new(vec!["pear"]);
    assert!(module.create_backend("db", &[], Some(extra)).is_ok());
    assert!(matches!(
        module.create_backend("db", &[], None),
        Err(ModuleError::InvalidArguments { .. })
    ));
}
