//! Test backend that echoes every query, or answers nothing at all.
//!
//! Arguments: `null` switches to null mode, `prefix=TEXT` prepends `TEXT`
//! to every echoed word.

use dico::module::{Capabilities, EntryPoint, EntryPoints};
use dico::strategy::{MatchKey, Strategy};
use dico::{DatabaseBackend, DatabaseModule, ModuleDescriptor, ModuleError, ModuleResult};

use crate::options;
use crate::result::TextResult;

const ECHO_INFO: &str = "ECHO database.\n\nThis database echoes each query.\n";
const NULL_INFO: &str = "NULL database.\n\n\
    This database returns NULL (no result) to any match and define\nrequests.\n";
const MIME_HEADER: &str = "Content-Type: text/plain; charset=utf-8\n\
    Content-Transfer-Encoding: 8bit\n";

/// The `echo` module.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoModule;

impl DatabaseModule for EchoModule {
    fn descriptor(&self) -> ModuleDescriptor {
        ModuleDescriptor::new(
            Capabilities::empty(),
            EntryPoints::DATABASE_REQUIRED
                .with(EntryPoint::InitDb)
                .with(EntryPoint::Info)
                .with(EntryPoint::Descr)
                .with(EntryPoint::MimeHeader)
                .with(EntryPoint::CompareCount),
        )
    }

    fn init_db(&self, _name: &str, args: &[String]) -> Result<Box<dyn DatabaseBackend>, ModuleError> {
        let mut backend = EchoBackend::default();
        for option in options::parse(args) {
            match option.key {
                "null" => {
                    option.flag()?;
                    backend.null = true;
                }
                "prefix" => backend.prefix = Some(option.value()?.to_owned()),
                _ => return Err(option.unknown()),
            }
        }
        Ok(Box::new(backend))
    }
}

/// One echo database.
#[derive(Debug, Default, Clone)]
pub struct EchoBackend {
    null: bool,
    prefix: Option<String>,
}

impl EchoBackend {
    fn echo(&self, word: &str) -> Option<Box<dyn ModuleResult>> {
        if self.null {
            return None;
        }
        let text = format!("{}{word}", self.prefix.as_deref().unwrap_or_default());
        TextResult::new(vec![text], 1).boxed()
    }
}

impl DatabaseBackend for EchoBackend {
    fn info(&self) -> Option<String> {
        Some(if self.null { NULL_INFO } else { ECHO_INFO }.to_owned())
    }

    fn description(&self) -> Option<String> {
        if self.null {
            return Some("GNU Dico NULL database".to_owned());
        }
        Some(match &self.prefix {
            Some(prefix) => format!("GNU Dico ECHO database (prefix {prefix})"),
            None => "GNU Dico ECHO database".to_owned(),
        })
    }

    fn mime_header(&self) -> Option<String> {
        Some(MIME_HEADER.to_owned())
    }

    fn match_word(
        &self,
        _strategy: &Strategy,
        key: &MatchKey<'_>,
    ) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        Ok(self.echo(key.word))
    }

    fn define(&self, key: &MatchKey<'_>) -> Result<Option<Box<dyn ModuleResult>>, ModuleError> {
        Ok(self.echo(key.word))
    }
}
