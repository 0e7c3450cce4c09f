//! In-memory transport used by tests and by callers that render replies into
//! a buffer.

use std::io;

use super::{ByteStream, StreamError};

/// Bidirectional stream over byte vectors.
///
/// Reads drain the scripted input, optionally in chunks no larger than
/// `read_chunk`; writes accumulate in the output buffer.
#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    input: Vec<u8>,
    position: usize,
    output: Vec<u8>,
    read_chunk: Option<usize>,
    reads: usize,
    writes: usize,
    fail_writes: bool,
    closed: bool,
}

impl MemoryStream {
    /// Creates a stream that yields `input` and then end of input.
    #[must_use]
    pub fn new(input: impl Into<Vec<u8>>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Limits every read to at most `size` bytes.
    #[must_use]
    pub fn with_read_chunk(mut self, size: usize) -> Self {
        self.read_chunk = Some(size.max(1));
        self
    }

    /// Makes every write fail with a broken pipe.
    #[must_use]
    pub fn with_failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Bytes written so far.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Output decoded lossily as UTF-8.
    #[must_use]
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Number of read calls that reached this transport.
    #[must_use]
    pub const fn reads(&self) -> usize {
        self.reads
    }

    /// Number of write calls that reached this transport.
    #[must_use]
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Whether [`ByteStream::close`] was called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ByteStream for MemoryStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        self.reads += 1;
        let remaining = self.input.get(self.position..).unwrap_or_default();
        let limit = self.read_chunk.unwrap_or(usize::MAX).min(buf.len());
        let count = remaining.len().min(limit);
        let (target, _) = buf.split_at_mut(count);
        let (source, _) = remaining.split_at(count);
        target.copy_from_slice(source);
        self.position += count;
        Ok(count)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe).into());
        }
        self.writes += 1;
        self.output.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.closed = true;
        Ok(())
    }
}
