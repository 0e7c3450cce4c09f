//! Test doubles shared by the unit tests of this crate.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::database::{DatabaseFlags, DatabaseInstance, DatabaseSettings, Languages};
use crate::module::{
    Capabilities, DatabaseBackend, DatabaseModule, EntryPoint, EntryPoints, LoadedModule,
    ModuleDescriptor, ModuleError, ModuleLoader, ModuleResult,
};
use crate::strategy::{MatchKey, Strategy, StrategyRegistry, select};
use crate::stream::{ByteStream, StreamError};

/// Calls observed by a [`WordListModule`] and its backends.
#[derive(Debug, Default)]
pub struct Calls {
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub counts: AtomicUsize,
    pub frees: AtomicUsize,
    pub descriptions: AtomicUsize,
    /// Matches currently running.
    pub active: AtomicUsize,
    /// Most matches ever running at once.
    pub peak: AtomicUsize,
}

impl Calls {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Module serving a fixed word list; every entry point is declared.
pub struct WordListModule {
    pub descriptor: ModuleDescriptor,
    pub words: Vec<String>,
    pub mime: Option<String>,
    pub flags: DatabaseFlags,
    pub calls: Arc<Calls>,
    /// Time each match spends inside the backend.
    pub pause: Option<Duration>,
}

impl WordListModule {
    pub fn new(words: &[&str]) -> Self {
        let entry_points = EntryPoint::ALL
            .into_iter()
            .filter(|entry| !matches!(entry, EntryPoint::InitDbExt | EntryPoint::ResultDb))
            .collect::<EntryPoints>();
        Self {
            descriptor: ModuleDescriptor::new(Capabilities::REENTRANT, entry_points),
            words: words.iter().map(|word| (*word).to_owned()).collect(),
            mime: None,
            flags: DatabaseFlags::empty(),
            calls: Arc::new(Calls::default()),
            pause: None,
        }
    }

    /// Drops the `REENTRANT` capability.
    pub fn non_reentrant(mut self) -> Self {
        self.descriptor.capabilities = Capabilities::empty();
        self
    }

    /// Makes every match sleep for `pause` while holding its slot.
    pub const fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = Some(pause);
        self
    }
}

impl DatabaseModule for WordListModule {
    fn descriptor(&self) -> ModuleDescriptor {
        self.descriptor
    }

    fn init_db(&self, name: &str, args: &[String]) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        if args.iter().any(|arg| arg == "fail") {
            return Err(ModuleError::invalid_arguments(format!("{name}: refused")));
        }
        Ok(Box::new(WordListBackend {
            name: name.to_owned(),
            words: self.words.clone(),
            mime: self.mime.clone(),
            flags: self.flags,
            fail_open: args.iter().any(|arg| arg == "fail-open"),
            calls: Arc::clone(&self.calls),
            pause: self.pause,
        }))
    }
}

pub struct WordListBackend {
    name: String,
    words: Vec<String>,
    mime: Option<String>,
    flags: DatabaseFlags,
    fail_open: bool,
    calls: Arc<Calls>,
    pause: Option<Duration>,
}

impl DatabaseBackend for WordListBackend {
    fn open(&mut self) -> Result<(), ModuleError> {
        self.calls.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open {
            return Err(ModuleError::Backend {
                message: "storage missing".to_owned(),
            });
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ModuleError> {
        self.calls.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn info(&self) -> Option<String> {
        Some(format!("Word list {}", self.name))
    }

    fn description(&self) -> Option<String> {
        self.calls.descriptions.fetch_add(1, Ordering::SeqCst);
        Some(format!("{} words", self.words.len()))
    }

    fn languages(&self) -> Languages {
        Languages::new(vec!["en".to_owned()], Vec::new())
    }

    fn flags(&self) -> DatabaseFlags {
        self.flags
    }

    fn mime_header(&self) -> Option<String> {
        self.mime.clone()
    }

    fn match_word(
        &self,
        strategy: &Strategy,
        key: &MatchKey<'_>,
    ) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        if let Some(pause) = self.pause {
            self.calls.enter();
            thread::sleep(pause);
            self.calls.leave();
        }
        let selection = select(strategy, key, self.words.iter().cloned(), String::as_str);
        if selection.matches.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(WordListResult {
            items: selection.matches,
            compared: selection.compared,
            calls: Arc::clone(&self.calls),
        })))
    }

    fn define(&self, key: &MatchKey<'_>) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        let items: Vec<String> = self
            .words
            .iter()
            .filter(|word| word.eq_ignore_ascii_case(key.word))
            .map(|word| format!("{word}: a word\n"))
            .collect();
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(WordListResult {
            items,
            compared: self.words.len(),
            calls: Arc::clone(&self.calls),
        })))
    }

    fn free_result(&self, result: Box<dyn ModuleResult>) {
        self.calls.frees.fetch_add(1, Ordering::SeqCst);
        drop(result);
    }
}

pub struct WordListResult {
    items: Vec<String>,
    compared: usize,
    calls: Arc<Calls>,
}

impl ModuleResult for WordListResult {
    fn count(&self) -> usize {
        self.calls.counts.fetch_add(1, Ordering::SeqCst);
        self.items.len()
    }

    fn compare_count(&self) -> usize {
        self.compared
    }

    fn output(&self, index: usize, out: &mut dyn ByteStream) -> Result<(), StreamError> {
        match self.items.get(index) {
            Some(item) => out.write_str(item),
            None => Ok(()),
        }
    }
}

/// Loader handing out one prepared module instance.
pub struct PreparedLoader(Mutex<Option<Box<dyn DatabaseModule>>>);

impl PreparedLoader {
    pub fn new(module: impl DatabaseModule + 'static) -> Self {
        Self(Mutex::new(Some(Box::new(module))))
    }
}

impl ModuleLoader for PreparedLoader {
    fn load(&self, kind: &str) -> Result<Box<dyn DatabaseModule>, ModuleError> {
        self.0
            .lock()
            .expect("loader lock")
            .take()
            .ok_or_else(|| ModuleError::UnknownKind {
                kind: kind.to_owned(),
            })
    }
}

/// Loads `module` under the instance name `name`.
pub fn load(name: &str, module: impl DatabaseModule + 'static) -> Arc<LoadedModule> {
    let mut strategies = StrategyRegistry::with_builtins();
    LoadedModule::load(name, "test", &[], &PreparedLoader::new(module), &mut strategies)
        .expect("module loads")
}

/// Creates and opens a database served by `module`.
pub fn open_database(
    name: &str,
    module: impl DatabaseModule + 'static,
    settings: DatabaseSettings,
) -> Arc<DatabaseInstance> {
    let database = DatabaseInstance::create(name, load(name, module), &[], None, settings)
        .expect("database is created");
    database.open().expect("database opens");
    Arc::new(database)
}
