//! Transfer-encoding filter streams.

use super::{Base64Codec, ByteStream, QuotedPrintableCodec, StreamError};

/// Size of the working buffer of a filter stream.
pub const FILTER_BUFFER_SIZE: usize = 2048;

/// Decoding pulls more input from the transport once the buffered raw input
/// drops below this many bytes.
pub const FILTER_MIN_LEVEL: usize = 4;

/// Maximum encoded line length.
pub const FILTER_MAX_LINE: usize = 76;

/// Direction of a filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Transform plain data into its transfer encoding on write.
    Encode,
    /// Transform encoded data back into plain data on read.
    Decode,
}

/// Line-length bookkeeping carried between transform calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineState {
    /// Maximum number of characters per output line.
    pub max_line: usize,
    /// Characters written on the current output line.
    pub line_len: usize,
}

impl LineState {
    /// Starts a fresh line with the given limit.
    #[must_use]
    pub const fn new(max_line: usize) -> Self {
        Self {
            max_line,
            line_len: 0,
        }
    }
}

impl Default for LineState {
    fn default() -> Self {
        Self::new(FILTER_MAX_LINE)
    }
}

/// A byte transform usable by [`CodecFilterStream`].
pub trait Codec: Send {
    /// Transforms a prefix of `input`, appending the result to `output`, and
    /// returns the number of input bytes consumed.
    ///
    /// Unconsumed bytes are offered again on the next call together with any
    /// newly arrived data. When `last` is set no more input will follow and
    /// the codec must consume everything it can, padding as required.
    fn xcode(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        line: &mut LineState,
        last: bool,
    ) -> usize;
}

/// Looks up a built-in codec by its `Content-Transfer-Encoding` name.
///
/// Recognises `base64` and `quoted-printable`, case-insensitively.
#[must_use]
pub fn codec_for(name: &str, mode: FilterMode) -> Option<Box<dyn Codec>> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("base64") {
        Some(Box::new(Base64Codec::new(mode)))
    } else if name.eq_ignore_ascii_case("quoted-printable") {
        Some(Box::new(QuotedPrintableCodec::new(mode)))
    } else {
        None
    }
}

/// Stream that runs data through a [`Codec`] on its way to or from the
/// wrapped stream.
///
/// In encode mode writes accumulate in a [`FILTER_BUFFER_SIZE`] working
/// buffer and are transformed when it fills, on `flush` and on `close`. In
/// decode mode reads pull raw data from the wrapped stream only when fewer
/// than [`FILTER_MIN_LEVEL`] bytes are pending.
pub struct CodecFilterStream<S> {
    inner: S,
    codec: Box<dyn Codec>,
    mode: FilterMode,
    pending: Vec<u8>,
    decoded: Vec<u8>,
    line: LineState,
    owns_inner: bool,
    eof: bool,
    closed: bool,
}

impl<S: ByteStream> CodecFilterStream<S> {
    /// Wraps `inner`, taking ownership: closing the filter closes `inner`.
    pub fn new(inner: S, codec: Box<dyn Codec>, mode: FilterMode) -> Self {
        Self {
            inner,
            codec,
            mode,
            pending: Vec::with_capacity(FILTER_BUFFER_SIZE),
            decoded: Vec::new(),
            line: LineState::default(),
            owns_inner: true,
            eof: false,
            closed: false,
        }
    }

    /// Builds a filter for a named transfer encoding.
    pub fn for_encoding(inner: S, name: &str, mode: FilterMode) -> Option<Self> {
        codec_for(name, mode).map(|codec| Self::new(inner, codec, mode))
    }

    /// Keeps the wrapped stream open when the filter is closed.
    #[must_use]
    pub fn non_owning(mut self) -> Self {
        self.owns_inner = false;
        self
    }

    /// Direction of the filter.
    pub const fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Releases the wrapped stream, discarding unconsumed state.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn transform_pending(&mut self, last: bool) -> Result<(), StreamError> {
        let mut out = Vec::with_capacity(self.pending.len() * 2);
        let consumed = self
            .codec
            .xcode(&self.pending, &mut out, &mut self.line, last);
        self.pending.drain(..consumed.min(self.pending.len()));
        if out.is_empty() {
            return Ok(());
        }
        self.inner.write(&out)
    }

    /// Encodes everything still buffered, including incomplete groups, and
    /// flushes the wrapped stream without closing it.
    ///
    /// # Errors
    ///
    /// Propagates write errors of the wrapped stream.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        if self.mode == FilterMode::Encode {
            self.transform_pending(true)?;
        }
        self.inner.flush()
    }

    fn fill_raw(&mut self) -> Result<(), StreamError> {
        let level = self.pending.len();
        self.pending.resize(level + FILTER_BUFFER_SIZE, 0);
        let result = match self.pending.get_mut(level..) {
            Some(spare) => self.inner.read(spare),
            None => Ok(0),
        };
        let read = *result.as_ref().unwrap_or(&0);
        self.pending.truncate(level + read);
        if read == 0 && result.is_ok() {
            self.eof = true;
        }
        result.map(|_| ())
    }
}

impl<S: ByteStream> ByteStream for CodecFilterStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.mode != FilterMode::Decode {
            return Err(StreamError::Unsupported { operation: "read" });
        }
        let mut starved = false;
        while self.decoded.is_empty() {
            if !self.eof && (starved || self.pending.len() < FILTER_MIN_LEVEL) {
                self.fill_raw()?;
            }
            let consumed =
                self.codec
                    .xcode(&self.pending, &mut self.decoded, &mut self.line, self.eof);
            self.pending.drain(..consumed.min(self.pending.len()));
            if self.decoded.is_empty() {
                if self.eof {
                    return Ok(0);
                }
                starved = true;
            }
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
        if self.mode != FilterMode::Encode {
            return Err(StreamError::Unsupported { operation: "write" });
        }
        self.pending.extend_from_slice(buf);
        if self.pending.len() >= FILTER_BUFFER_SIZE {
            self.transform_pending(false)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.mode == FilterMode::Encode {
            self.transform_pending(false)?;
        }
        self.inner.flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        let finished = self.finish();
        self.closed = true;
        if self.owns_inner {
            finished.and(self.inner.close())
        } else {
            finished
        }
    }
}
