//! Composable byte streams.
//!
//! Every layer of the reply pipeline speaks [`ByteStream`]: the raw
//! transport, the line-buffered session stream, codec filters and security
//! transforms. Wrappers own the stream they decorate unless they are built
//! over a `&mut` borrow, in which case closing the wrapper leaves the inner
//! stream usable.

mod base64;
mod buffered;
mod filter;
mod linebuf;
mod memory;
mod qp;
mod security;
mod transcript;

use std::io::{self, Read, Write};

use thiserror::Error;

pub use self::base64::Base64Codec;
pub use self::buffered::BufferedStream;
pub use self::filter::{
    Codec, CodecFilterStream, FILTER_BUFFER_SIZE, FILTER_MAX_LINE, FILTER_MIN_LEVEL, FilterMode,
    LineState, codec_for,
};
pub use self::linebuf::{BufferMode, LineBuffer};
pub use self::memory::MemoryStream;
pub use self::qp::QuotedPrintableCodec;
pub use self::security::{SecurityLayer, SecurityStream};
pub use self::transcript::{TRANSCRIPT_TARGET, TranscriptStream};

/// Errors raised by stream operations.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The underlying transport failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] io::Error),
    /// The stream was used after [`ByteStream::close`].
    #[error("stream is closed")]
    Closed,
    /// The stream does not support the requested direction.
    #[error("stream does not support {operation}")]
    Unsupported {
        /// Operation that was attempted.
        operation: &'static str,
    },
    /// A security layer rejected the data it was asked to transform.
    #[error("security layer failed: {message}")]
    Security {
        /// Description supplied by the layer.
        message: String,
    },
}

impl StreamError {
    /// Returns `true` when the peer went away rather than the stream failing.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::Io(error) => matches!(
                error.kind(),
                io::ErrorKind::BrokenPipe
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::UnexpectedEof
            ),
            Self::Closed => true,
            Self::Unsupported { .. } | Self::Security { .. } => false,
        }
    }
}

/// Minimal read/write/flush/close abstraction over a transport.
///
/// `read` returns `Ok(0)` at end of input. `write` either transfers the whole
/// buffer or fails.
pub trait ByteStream {
    /// Reads up to `buf.len()` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] when the transport fails or the stream is
    /// closed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// Writes the whole buffer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] when the transport fails or the stream is
    /// closed.
    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError>;

    /// Pushes buffered output to the transport.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] when the transport fails.
    fn flush(&mut self) -> Result<(), StreamError>;

    /// Flushes and releases the stream. Further operations fail with
    /// [`StreamError::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`StreamError`] when the final flush fails.
    fn close(&mut self) -> Result<(), StreamError>;

    /// Writes UTF-8 text.
    ///
    /// # Errors
    ///
    /// See [`ByteStream::write`].
    fn write_str(&mut self, text: &str) -> Result<(), StreamError> {
        self.write(text.as_bytes())
    }
}

impl<S: ByteStream + ?Sized> ByteStream for &mut S {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        (**self).close()
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        (**self).write(buf)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        (**self).flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        (**self).close()
    }
}

/// Boxed stream used where the concrete layering is decided at runtime.
pub type BoxedStream = Box<dyn ByteStream + Send>;

/// Directions a stream accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Input only.
    Read,
    /// Output only.
    Write,
    /// Both directions.
    ReadWrite,
}

impl StreamMode {
    const fn readable(self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    const fn writable(self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// Adapts any [`Read`] + [`Write`] transport (sockets, pipes) to
/// [`ByteStream`].
#[derive(Debug)]
pub struct IoStream<T> {
    inner: T,
    mode: StreamMode,
    closed: bool,
}

impl<T> IoStream<T> {
    /// Wraps a bidirectional transport.
    pub const fn new(inner: T) -> Self {
        Self::with_mode(inner, StreamMode::ReadWrite)
    }

    /// Wraps a transport restricted to the given direction.
    pub const fn with_mode(inner: T, mode: StreamMode) -> Self {
        Self {
            inner,
            mode,
            closed: false,
        }
    }

    /// Borrows the transport.
    pub const fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Releases the transport.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write> ByteStream for IoStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if !self.mode.readable() {
            return Err(StreamError::Unsupported { operation: "read" });
        }
        loop {
            match self.inner.read(buf) {
                Ok(n) => return Ok(n),
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error.into()),
            }
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if !self.mode.writable() {
            return Err(StreamError::Unsupported { operation: "write" });
        }
        self.inner.write_all(buf)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.mode.writable() {
            self.inner.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        let result = self.flush();
        self.closed = true;
        result
    }
}
