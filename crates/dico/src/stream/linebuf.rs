//! Line-discipline buffering for one direction of a stream.

use super::{ByteStream, StreamError};

/// Direction a [`LineBuffer`] serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMode {
    /// Filled from the transport, drained by `read_line`.
    Input,
    /// Filled by writers, drained one complete line at a time.
    Output,
}

/// Growable byte buffer that releases data at line boundaries.
///
/// The filled length (`level`) never exceeds the capacity, and appended data
/// is never dropped: when free space runs short the capacity grows by the
/// amount being added.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    buf: Vec<u8>,
    mode: BufferMode,
}

impl LineBuffer {
    /// Creates an empty buffer with the given initial capacity.
    #[must_use]
    pub fn new(mode: BufferMode, capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            mode,
        }
    }

    /// Direction of the buffer.
    #[must_use]
    pub const fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn level(&self) -> usize {
        self.buf.len()
    }

    /// Current capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Returns `true` when nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Returns `true` when a complete line is buffered.
    #[must_use]
    pub fn has_line(&self) -> bool {
        self.buf.contains(&b'\n')
    }

    /// Buffered bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn append(&mut self, data: &[u8]) {
        let free = self.buf.capacity() - self.buf.len();
        if free < data.len() {
            self.buf.reserve_exact(data.len());
        }
        self.buf.extend_from_slice(data);
    }

    /// Appends `data` and hands every completed line, newline included, to
    /// `emit`. Only the trailing partial line stays buffered.
    ///
    /// When `emit` fails the lines already emitted are discarded and the rest
    /// remains buffered.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `emit`.
    pub fn write_lines<F>(&mut self, data: &[u8], mut emit: F) -> Result<(), StreamError>
    where
        F: FnMut(&[u8]) -> Result<(), StreamError>,
    {
        self.append(data);
        let mut flushed = 0;
        let mut result = Ok(());
        while let Some(offset) = self
            .buf
            .get(flushed..)
            .and_then(|rest| rest.iter().position(|byte| *byte == b'\n'))
        {
            let end = flushed + offset + 1;
            if let Some(line) = self.buf.get(flushed..end)
                && let Err(error) = emit(line)
            {
                result = Err(error);
                break;
            }
            flushed = end;
        }
        self.buf.drain(..flushed);
        result
    }

    /// Hands any buffered partial line to `emit` and empties the buffer.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `emit`; the data stays buffered.
    pub fn flush_partial<F>(&mut self, mut emit: F) -> Result<(), StreamError>
    where
        F: FnMut(&[u8]) -> Result<(), StreamError>,
    {
        if self.buf.is_empty() {
            return Ok(());
        }
        emit(&self.buf)?;
        self.buf.clear();
        Ok(())
    }

    /// Performs exactly one read from `stream`, appending up to `chunk`
    /// bytes. Returns the number of bytes read; zero means end of input.
    ///
    /// # Errors
    ///
    /// Propagates the transport error.
    pub fn fill<S>(&mut self, stream: &mut S, chunk: usize) -> Result<usize, StreamError>
    where
        S: ByteStream + ?Sized,
    {
        let level = self.buf.len();
        let free = self.buf.capacity() - level;
        if free < chunk {
            self.buf.reserve_exact(chunk);
        }
        self.buf.resize(level + chunk, 0);
        let result = match self.buf.get_mut(level..) {
            Some(spare) => stream.read(spare),
            None => Ok(0),
        };
        let read = *result.as_ref().unwrap_or(&0);
        self.buf.truncate(level + read);
        result
    }

    /// Moves buffered bytes up to and including the first newline into
    /// `out`, or the whole buffer when no newline is present yet. Returns the
    /// number of bytes moved.
    pub fn read_line(&mut self, out: &mut Vec<u8>) -> usize {
        let end = self
            .buf
            .iter()
            .position(|byte| *byte == b'\n')
            .map_or(self.buf.len(), |pos| pos + 1);
        out.extend(self.buf.drain(..end));
        end
    }

    /// Moves up to `buf.len()` buffered bytes into `buf`.
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let count = buf.len().min(self.buf.len());
        for (target, byte) in buf.iter_mut().zip(self.buf.drain(..count)) {
            *target = byte;
        }
        count
    }
}
