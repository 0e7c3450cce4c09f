//! One client conversation.

use std::time::{SystemTime, UNIX_EPOCH};

use dico::stream::{BoxedStream, BufferedStream, ByteStream, StreamError};
use dico::tokenize::Tokenizer;
use thiserror::Error;
use tracing::debug;

use crate::commands::{Context, Resolution};
use crate::engine::Engine;

const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

/// Connection-fatal session failures. Protocol errors are replies, never
/// errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading from or writing to the client failed.
    #[error("client stream failed: {source}")]
    Stream {
        /// Underlying stream error.
        #[from]
        source: StreamError,
    },
}

impl SessionError {
    /// Returns `true` when the client simply went away.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Stream { source } => source.is_disconnect(),
        }
    }
}

/// Per-connection settings changed by commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Levenshtein threshold for this session.
    pub lev_distance: usize,
    /// Whether definitions carry MIME headers.
    pub mime: bool,
    /// Set by `QUIT`.
    pub quit: bool,
    /// Identification sent with `CLIENT`.
    pub client: Option<String>,
}

impl SessionState {
    /// Initial state for a new connection.
    #[must_use]
    pub const fn new(lev_distance: usize) -> Self {
        Self {
            lev_distance,
            mime: false,
            quit: false,
            client: None,
        }
    }
}

/// Command loop for one connection.
#[derive(Debug)]
pub struct Session<'e> {
    engine: &'e Engine,
    peer: &'e str,
    state: SessionState,
}

impl<'e> Session<'e> {
    /// Prepares a session for `peer`.
    #[must_use]
    pub const fn new(engine: &'e Engine, peer: &'e str) -> Self {
        Self {
            engine,
            peer,
            state: SessionState::new(engine.settings().lev_distance),
        }
    }

    /// Greets the client, then reads and answers commands until `QUIT` or
    /// end of input.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when the client stream fails; the session
    /// is over at that point.
    pub fn run(mut self, transport: BoxedStream) -> Result<(), SessionError> {
        let mut stream = BufferedStream::new(transport);
        stream.write_str(&format!("220 {}\r\n", self.banner()))?;
        stream.flush()?;

        let mut tokenizer = Tokenizer::new();
        let mut line = Vec::new();
        while !self.state.quit {
            line.clear();
            if stream.read_line(&mut line)? == 0 {
                debug!(target: SESSION_TARGET, peer = %self.peer, "end of input");
                break;
            }
            let text = String::from_utf8_lossy(&line);
            let args = tokenizer.tokenize(text.trim_end_matches(['\r', '\n']));
            if args.is_empty() {
                continue;
            }
            self.dispatch(&mut stream, args)?;
            stream.flush()?;
        }
        stream.close()?;
        Ok(())
    }

    fn banner(&self) -> String {
        let settings = self.engine.settings();
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        format!(
            "{host} {text} {capabilities} <{pid}.{seconds}@{host}>",
            host = settings.hostname,
            text = settings.banner,
            capabilities = self.engine.capabilities().banner_marker(),
            pid = std::process::id(),
        )
    }

    /// Current per-connection state.
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Answers one tokenised command line.
    pub(crate) fn dispatch(
        &mut self,
        out: &mut dyn ByteStream,
        args: &[String],
    ) -> Result<(), StreamError> {
        debug!(
            target: SESSION_TARGET,
            peer = %self.peer,
            command = args.first().map_or("", String::as_str),
            "command received"
        );
        let mut ctx = Context {
            engine: self.engine,
            state: &mut self.state,
            out,
        };
        match self.engine.commands().resolve(args) {
            Resolution::Unknown => ctx.reply(500, "unknown command"),
            Resolution::WrongArity => ctx.reply(501, "wrong number of arguments"),
            Resolution::NotImplemented => ctx.reply(502, "command is not yet implemented, sorry"),
            Resolution::Dispatch(handler) => handler(&mut ctx, args),
        }
    }
}

#[cfg(test)]
mod tests;
