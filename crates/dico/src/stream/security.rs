//! Security-layer transform streams.
//!
//! Once a client has negotiated an authentication mechanism with integrity
//! or confidentiality protection, all further traffic passes through the
//! mechanism's encode/decode functions. The negotiation itself happens
//! elsewhere; this module only applies the resulting transform.

use super::{ByteStream, StreamError};

const READ_CHUNK: usize = 4096;

/// Encode/decode pair produced by a negotiated security mechanism.
pub trait SecurityLayer: Send {
    /// Protects outgoing data.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Security`] when the mechanism refuses the data.
    fn encode(&mut self, input: &[u8]) -> Result<Vec<u8>, StreamError>;

    /// Unwraps incoming data. May return an empty vector while it waits for
    /// the rest of a protected frame.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Security`] when the data fails verification.
    fn decode(&mut self, input: &[u8]) -> Result<Vec<u8>, StreamError>;
}

/// Stream applying a [`SecurityLayer`] to everything passing through it.
///
/// The wrapper can carry other wrappers on top of it, so a codec filter can
/// run over a protected connection.
pub struct SecurityStream<S> {
    inner: S,
    layer: Box<dyn SecurityLayer>,
    decoded: Vec<u8>,
    owns_inner: bool,
    closed: bool,
}

impl<S: ByteStream> SecurityStream<S> {
    /// Wraps `inner`, taking ownership of it.
    pub fn new(inner: S, layer: Box<dyn SecurityLayer>) -> Self {
        Self {
            inner,
            layer,
            decoded: Vec::new(),
            owns_inner: true,
            closed: false,
        }
    }

    /// Keeps the wrapped stream open when this stream is closed.
    #[must_use]
    pub fn non_owning(mut self) -> Self {
        self.owns_inner = false;
        self
    }

    /// Releases the wrapped stream.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ByteStream> ByteStream for SecurityStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let mut raw = vec![0_u8; READ_CHUNK];
        while self.decoded.is_empty() {
            let read = self.inner.read(&mut raw)?;
            if read == 0 {
                return Ok(0);
            }
            let plain = self.layer.decode(raw.get(..read).unwrap_or_default())?;
            self.decoded.extend_from_slice(&plain);
        }
        let count = buf.len().min(self.decoded.len());
        for (target, byte) in buf.iter_mut().zip(self.decoded.drain(..count)) {
            *target = byte;
        }
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let protected = self.layer.encode(buf)?;
        self.inner.write(&protected)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.inner.flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.owns_inner {
            self.inner.close()
        } else {
            self.inner.flush()
        }
    }
}
