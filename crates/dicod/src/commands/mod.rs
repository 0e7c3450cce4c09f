//! Protocol commands.
//!
//! Handlers receive the whole tokenised command line and a [`Context`]
//! giving access to the engine, the session state and the client stream.
//! Every handler writes exactly one final status line.

mod builtin;
mod capability;
mod extensions;
mod registry;
mod stats;

use dico::MatchKey;
use dico::stream::{ByteStream, StreamError};

use crate::engine::Engine;
use crate::output::OutputStream;
use crate::session::SessionState;

pub use self::capability::{CapabilityError, CapabilityInit, CapabilityRegistry, CapabilitySet};
pub use self::registry::{CommandDescriptor, CommandRegistry, Resolution};

pub(crate) const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Command implementation.
pub type Handler = fn(&mut Context<'_>, &[String]) -> Result<(), StreamError>;

/// What a handler may touch while running.
pub struct Context<'a> {
    pub(crate) engine: &'a Engine,
    pub(crate) state: &'a mut SessionState,
    pub(crate) out: &'a mut dyn ByteStream,
}

impl<'a> Context<'a> {
    /// Writes a single-line reply.
    pub(crate) fn reply(&mut self, code: u16, text: &str) -> Result<(), StreamError> {
        self.out.write_str(&format!("{code} {text}\r\n"))
    }

    /// Opens a multi-line body on the client stream.
    pub(crate) fn body(&mut self) -> OutputStream<&mut (dyn ByteStream + 'a)> {
        OutputStream::new(&mut *self.out)
    }

    /// Writes `code status`, one body line per item, the terminator and
    /// `250 ok`.
    pub(crate) fn list<I>(&mut self, code: u16, status: &str, lines: I) -> Result<(), StreamError>
    where
        I: IntoIterator<Item = String>,
    {
        self.reply(code, status)?;
        let mut body = self.body();
        for line in lines {
            body.write_str(&line)?;
            body.write_str("\r\n")?;
        }
        body.terminate()?;
        self.reply(250, "ok")
    }

    /// Query key for `word` under the session's settings.
    pub(crate) fn key<'w>(&self, word: &'w str) -> MatchKey<'w> {
        MatchKey::new(word)
            .with_lev_distance(self.state.lev_distance)
            .with_mime(self.state.mime)
    }
}

/// Commands every server answers.
#[must_use]
pub fn core_commands() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for command in builtin::COMMANDS {
        registry.install(command);
    }
    registry
}

/// Optional extensions, none of them enabled yet.
#[must_use]
pub fn standard_capabilities() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    extensions::register(&mut registry);
    registry
}
