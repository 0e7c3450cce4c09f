//! In-memory dictionary backend.
//!
//! Entries come from `entry=HEADWORD:DEFINITION` arguments and from an
//! optional tab-separated file given with `file=PATH`. The file is read when
//! the database is opened. Each line holds `headword<TAB>definition`;
//! definitions may use `\n`, `\t` and `\\` escapes. Blank lines and lines
//! starting with `#` are skipped.
//!
//! Further options: `description=TEXT`, `info=TEXT` and `lang=SRC:DST`,
//! where each side is a comma-separated language list.

use std::collections::HashMap;
use std::fs;

use camino::Utf8PathBuf;
use dico::module::{Capabilities, EntryPoint, EntryPoints};
use dico::strategy::{MatchKey, Strategy, select};
use dico::{
    DatabaseBackend, DatabaseModule, Languages, ModuleDescriptor, ModuleError, ModuleResult,
};
use tracing::debug;

use crate::MODULES_TARGET;
use crate::options;
use crate::result::TextResult;

/// The `dictionary` module.
#[derive(Debug, Default, Clone, Copy)]
pub struct DictionaryModule;

impl DatabaseModule for DictionaryModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor::new(
            Capabilities::REENTRANT,
            EntryPoints::DATABASE_REQUIRED
                .with(EntryPoint::InitDb)
                .with(EntryPoint::Open)
                .with(EntryPoint::Close)
                .with(EntryPoint::Info)
                .with(EntryPoint::Descr)
                .with(EntryPoint::Lang)
                .with(EntryPoint::CompareCount),
        )
    }

    fn init_db(&self, name: &str, args: &[String]) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        let mut backend = DictionaryBackend {
            name: name.to_owned(),
            ..DictionaryBackend::default()
        };
        for option in options::parse(args) {
            match option.key {
                "entry" => {
                    let (headword, definition) = option.value()?.split_once(':').ok_or_else(|| {
                        ModuleError::invalid_arguments("entry must be HEADWORD:DEFINITION")
                    })?;
                    backend.configured.push((headword.to_owned(), unescape(definition)));
                }
                "file" => backend.file = Some(Utf8PathBuf::from(option.value()?)),
                "description" => backend.description = Some(option.value()?.to_owned()),
                "info" => backend.info = Some(unescape(option.value()?)),
                "lang" => backend.languages = parse_languages(option.value()?),
                _ => return Err(option.unknown()),
            }
        }
        if backend.configured.is_empty() && backend.file.is_none() {
            return Err(ModuleError::invalid_arguments(format!(
                "{name}: no entries and no file given"
            )));
        }
        Ok(Box::new(backend))
    }
}

fn parse_languages(value: &str) -> Languages {
    let side = |text: &str| -> Vec<String> {
        text.split(',')
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_owned)
            .collect()
    };
    match value.split_once(':') {
        Some((source, target)) => Languages::new(side(source), side(target)),
        None => Languages::new(side(value), Vec::new()),
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Headwords in first-seen order with their definitions.
#[derive(Debug, Default, Clone)]
struct Store {
    headwords: Vec<String>,
    definitions: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Store {
    fn insert(&mut self, headword: &str, definition: String) {
        let key = headword.to_lowercase();
        if let Some(&slot) = self.index.get(&key) {
            if let Some(list) = self.definitions.get_mut(slot) {
                list.push(definition);
            }
            return;
        }
        self.index.insert(key, self.headwords.len());
        self.headwords.push(headword.to_owned());
        self.definitions.push(vec![definition]);
    }

    fn lookup(&self, word: &str) -> Option<&[String]> {
        self.index
            .get(&word.to_lowercase())
            .and_then(|slot| self.definitions.get(*slot))
            .map(Vec::as_slice)
    }
}

/// One dictionary database.
#[derive(Debug, Default, Clone)]
pub struct DictionaryBackend {
    name: String,
    configured: Vec<(String, String)>,
    file: Option<Utf8PathBuf>,
    description: Option<String>,
    info: Option<String>,
    languages: Languages,
    store: Store,
}

impl DictionaryBackend {
    fn load_file(&mut self, path: &Utf8PathBuf) -> Result<usize, ModuleError> {
        let text = fs::read_to_string(path).map_err(|error| ModuleError::io(path.as_str(), error))?;
        let mut loaded = 0;
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let (headword, definition) = line.split_once('\t').ok_or_else(|| ModuleError::Backend {
                message: format!("{path}:{}: expected HEADWORD<TAB>DEFINITION", number + 1),
            })?;
            self.store.insert(headword.trim(), unescape(definition));
            loaded += 1;
        }
        Ok(loaded)
    }
}

impl DatabaseBackend for DictionaryBackend {
    fn open(&mut self) -> Result<(), ModuleError> {
        let mut store = Store::default();
        for (headword, definition) in &self.configured {
            store.insert(headword, definition.clone());
        }
        self.store = store;
        if let Some(path) = self.file.clone() {
            let loaded = self.load_file(&path)?;
            debug!(
                target: MODULES_TARGET,
                database = %self.name,
                path = %path,
                entries = loaded,
                "dictionary file loaded"
            );
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ModuleError> {
        self.store = Store::default();
        Ok(())
    }

    fn info(&self) -> Option<String> {
        self.info.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn languages(&self) -> Languages {
        self.languages.clone()
    }

    fn match_word(
        &self,
        strategy: &Strategy,
        key: &MatchKey<'_>,
    ) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        let selection = select(strategy, key, self.store.headwords.iter(), |word| word.as_str());
        let items = selection.matches.into_iter().cloned().collect();
        Ok(TextResult::new(items, selection.compared).boxed())
    }

    fn define(&self, key: &MatchKey<'_>) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        let items = self
            .store
            .lookup(key.word)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        Ok(TextResult::new(items, self.store.headwords.len()).boxed())
    }
}
