//! Session transcript logging.

use tracing::debug;

use super::{ByteStream, StreamError};

/// `tracing` target transcript lines are logged under.
pub const TRANSCRIPT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transcript");

/// Stream that logs every complete line passing through it at debug level.
///
/// Input lines are tagged `C:` and output lines `S:`. Data is forwarded
/// unchanged.
pub struct TranscriptStream<S> {
    inner: S,
    peer: String,
    incoming: Vec<u8>,
    outgoing: Vec<u8>,
}

impl<S: ByteStream> TranscriptStream<S> {
    /// Wraps `inner`, labelling log records with `peer`.
    pub fn new(inner: S, peer: impl Into<String>) -> Self {
        Self {
            inner,
            peer: peer.into(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Releases the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn log_lines(peer: &str, direction: &str, pending: &mut Vec<u8>, data: &[u8]) {
    pending.extend_from_slice(data);
    while let Some(pos) = pending.iter().position(|byte| *byte == b'\n') {
        let line: Vec<u8> = pending.drain(..=pos).collect();
        let text = String::from_utf8_lossy(&line);
        debug!(
            target: TRANSCRIPT_TARGET,
            peer,
            "{direction} {}",
            text.trim_end_matches(['\r', '\n'])
        );
    }
}

impl<S: ByteStream> ByteStream for TranscriptStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let read = self.inner.read(buf)?;
        log_lines(
            &self.peer,
            "C:",
            &mut self.incoming,
            buf.get(..read).unwrap_or_default(),
        );
        Ok(read)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.inner.write(buf)?;
        log_lines(&self.peer, "S:", &mut self.outgoing, buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.inner.flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.inner.close()
    }
}
