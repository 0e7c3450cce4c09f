//! Framing of multi-line reply bodies.
//!
//! Every body a handler emits goes through an [`OutputStream`]. It escapes
//! lines that begin with `.` so the client never mistakes them for the
//! terminator, writes MIME headers ahead of the first body byte when the
//! session asked for them, and switches to the transfer encoding those
//! headers name. [`OutputStream::terminate`] closes the body with the
//! `.` line.

use dico::HeaderList;
use dico::stream::{ByteStream, CodecFilterStream, FilterMode, StreamError, codec_for};

/// Line-start aware writer doubling a leading `.` on every line.
struct DotStuffing<S> {
    inner: S,
    at_line_start: bool,
}

impl<S: ByteStream> DotStuffing<S> {
    const fn new(inner: S) -> Self {
        Self {
            inner,
            at_line_start: true,
        }
    }

    /// Writes bytes that are protocol framing rather than body text.
    fn write_raw(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.inner.write(buf)?;
        if let Some(last) = buf.last() {
            self.at_line_start = *last == b'\n';
        }
        Ok(())
    }
}

impl<S: ByteStream> ByteStream for DotStuffing<S> {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, StreamError> {
        Err(StreamError::Unsupported { operation: "read" })
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        let mut rest = buf;
        while !rest.is_empty() {
            if self.at_line_start && rest.first() == Some(&b'.') {
                self.inner.write(b".")?;
            }
            match rest.iter().position(|byte| *byte == b'\n') {
                Some(end) => {
                    let (line, tail) = rest.split_at(end + 1);
                    self.inner.write(line)?;
                    self.at_line_start = true;
                    rest = tail;
                }
                None => {
                    self.inner.write(rest)?;
                    self.at_line_start = false;
                    rest = &[];
                }
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.inner.flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.inner.flush()
    }
}

enum Sink<S> {
    Plain(DotStuffing<S>),
    Encoded(CodecFilterStream<DotStuffing<S>>),
}

/// Body writer for one multi-line reply section.
pub struct OutputStream<S> {
    sink: Option<Sink<S>>,
    headers: Option<HeaderList>,
}

impl<S: ByteStream> OutputStream<S> {
    /// Frames a body written to `inner`.
    pub const fn new(inner: S) -> Self {
        Self {
            sink: Some(Sink::Plain(DotStuffing::new(inner))),
            headers: None,
        }
    }

    /// Precedes the body with `headers` and encodes it as their
    /// `Content-Transfer-Encoding` requests.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderList) -> Self {
        self.headers = Some(headers);
        self
    }

    fn sink(&mut self) -> Result<&mut Sink<S>, StreamError> {
        self.sink.as_mut().ok_or(StreamError::Closed)
    }

    fn emit_headers(&mut self) -> Result<(), StreamError> {
        let Some(headers) = self.headers.take() else {
            return Ok(());
        };
        let Some(Sink::Plain(mut plain)) = self.sink.take() else {
            return Err(StreamError::Closed);
        };
        for (name, value) in headers.iter() {
            plain.write_raw(format!("{name}: {value}\r\n").as_bytes())?;
        }
        plain.write_raw(b"\r\n")?;
        let codec = headers
            .transfer_encoding()
            .and_then(|name| codec_for(name, FilterMode::Encode));
        self.sink = Some(match codec {
            Some(codec) => Sink::Encoded(
                CodecFilterStream::new(plain, codec, FilterMode::Encode).non_owning(),
            ),
            None => Sink::Plain(plain),
        });
        Ok(())
    }

    /// Ends the body: drains the encoder and completes a partial last
    /// line. Headers still pending for an empty body are written first.
    fn end_body(&mut self) -> Result<(), StreamError> {
        self.emit_headers()?;
        let mut plain = match self.sink.take() {
            Some(Sink::Plain(plain)) => plain,
            Some(Sink::Encoded(mut encoder)) => {
                encoder.finish()?;
                encoder.into_inner()
            }
            None => return Err(StreamError::Closed),
        };
        if !plain.at_line_start {
            plain.write_raw(b"\r\n")?;
        }
        self.sink = Some(Sink::Plain(plain));
        Ok(())
    }

    /// Ends the body and writes the terminating `.` line.
    ///
    /// # Errors
    ///
    /// Propagates transport errors.
    pub fn terminate(mut self) -> Result<(), StreamError> {
        self.end_body()?;
        match self.sink.take() {
            Some(Sink::Plain(mut plain)) => {
                plain.write_raw(b".\r\n")?;
                plain.flush()
            }
            _ => Err(StreamError::Closed),
        }
    }
}

impl<S: ByteStream> ByteStream for OutputStream<S> {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, StreamError> {
        Err(StreamError::Unsupported { operation: "read" })
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        if buf.is_empty() {
            return Ok(());
        }
        self.emit_headers()?;
        match self.sink()? {
            Sink::Plain(plain) => plain.write(buf),
            Sink::Encoded(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        match self.sink()? {
            Sink::Plain(plain) => plain.flush(),
            Sink::Encoded(encoder) => encoder.flush(),
        }
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.end_body()
    }
}
