//! Line-buffered bidirectional stream.

use super::{BufferMode, ByteStream, LineBuffer, StreamError};

const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Stream that buffers input and output through [`LineBuffer`]s.
///
/// Output is released to the transport one complete line per write call;
/// input is fetched with a single transport read whenever the buffer runs
/// dry.
#[derive(Debug)]
pub struct BufferedStream<S> {
    inner: S,
    input: LineBuffer,
    output: LineBuffer,
    chunk: usize,
    closed: bool,
}

impl<S: ByteStream> BufferedStream<S> {
    /// Wraps `inner` with the default buffer size.
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    /// Wraps `inner`, reading at most `chunk` bytes per transport read.
    pub fn with_capacity(inner: S, chunk: usize) -> Self {
        Self {
            inner,
            input: LineBuffer::new(BufferMode::Input, chunk),
            output: LineBuffer::new(BufferMode::Output, chunk),
            chunk: chunk.max(1),
            closed: false,
        }
    }

    /// Borrows the wrapped stream.
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrows the wrapped stream.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Reads one line, newline included, into `out`. Returns the number of
    /// bytes appended; zero means end of input. A final line lacking a
    /// newline is returned as-is.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn read_line(&mut self, out: &mut Vec<u8>) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let start = out.len();
        loop {
            self.input.read_line(out);
            if out.last() == Some(&b'\n') {
                break;
            }
            if self.input.fill(&mut self.inner, self.chunk)? == 0 {
                break;
            }
        }
        Ok(out.len() - start)
    }
}

impl<S: ByteStream> ByteStream for BufferedStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        if self.input.is_empty() && self.input.fill(&mut self.inner, self.chunk)? == 0 {
            return Ok(0);
        }
        Ok(self.input.read_into(buf))
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let inner = &mut self.inner;
        self.output.write_lines(buf, |line| inner.write(line))
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Err(StreamError::Closed);
        }
        let inner = &mut self.inner;
        self.output.flush_partial(|rest| inner.write(rest))?;
        self.inner.flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        if self.closed {
            return Ok(());
        }
        let flushed = self.flush();
        self.closed = true;
        let closed = self.inner.close();
        flushed.and(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::MemoryStream;

    #[test]
    fn reads_lines_across_partial_transport_reads() {
        let transport = MemoryStream::new(b"DEFINE * cat\r\nQUIT\r\n".to_vec()).with_read_chunk(4);
        let mut stream = BufferedStream::new(transport);
        let mut line = Vec::new();
        stream.read_line(&mut line).expect("first line");
        assert_eq!(line, b"DEFINE * cat\r\n");
        line.clear();
        stream.read_line(&mut line).expect("second line");
        assert_eq!(line, b"QUIT\r\n");
        line.clear();
        assert_eq!(stream.read_line(&mut line).expect("eof"), 0);
    }

    #[test]
    fn final_line_without_newline_is_returned() {
        let mut stream = BufferedStream::new(MemoryStream::new(b"HELP".to_vec()));
        let mut line = Vec::new();
        assert_eq!(stream.read_line(&mut line).expect("line"), 4);
        assert_eq!(line, b"HELP");
    }

    #[test]
    fn writes_reach_transport_line_by_line() {
        let mut stream = BufferedStream::new(MemoryStream::default());
        stream.write(b"250 ").expect("write prefix");
        assert_eq!(stream.get_ref().writes(), 0);
        stream.write(b"ok\r\n221 bye\r\n").expect("write rest");
        assert_eq!(stream.get_ref().writes(), 2);
        assert_eq!(stream.get_ref().output(), b"250 ok\r\n221 bye\r\n");
    }

    #[test]
    fn close_flushes_partial_output() {
        let mut stream = BufferedStream::new(MemoryStream::default());
        stream.write(b"no newline").expect("write");
        stream.close().expect("close");
        assert_eq!(stream.get_ref().output(), b"no newline");
        assert!(stream.get_ref().is_closed());
    }
}
