//! Accepted connections and the handler that runs DICT sessions on them.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use dico::stream::{BoxedStream, IoStream, TranscriptStream};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::session::Session;

use super::LISTENER_TARGET;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the listener.
#[derive(Debug)]
pub enum ConnectionStream {
    /// TCP client.
    Tcp(TcpStream),
    /// Unix domain socket client.
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Label identifying the peer in logs.
    #[must_use]
    pub fn peer(&self) -> String {
        match self {
            Self::Tcp(stream) => stream
                .peer_addr()
                .map_or_else(|_| "tcp".to_owned(), |addr| addr.to_string()),
            #[cfg(unix)]
            Self::Unix(_) => "unix".to_owned(),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection to completion. Must not panic.
    fn handle(&self, stream: ConnectionStream);
}

/// Runs one DICT session per connection against a shared [`Engine`].
#[derive(Debug, Clone)]
pub struct SessionHandler {
    engine: Arc<Engine>,
}

impl SessionHandler {
    /// Creates a handler serving `engine`.
    #[must_use]
    pub const fn new(engine: Arc<Engine>) -> Self {
        Self { engine }
    }
}

impl ConnectionHandler for SessionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let peer = stream.peer();
        debug!(target: LISTENER_TARGET, peer = %peer, "connection accepted");
        let transport: BoxedStream = if self.engine.settings().transcript {
            Box::new(TranscriptStream::new(IoStream::new(stream), peer.clone()))
        } else {
            Box::new(IoStream::new(stream))
        };
        let session = Session::new(&self.engine, &peer);
        match session.run(transport) {
            Ok(()) => debug!(target: LISTENER_TARGET, peer = %peer, "session finished"),
            Err(error) if error.is_disconnect() => debug!(
                target: LISTENER_TARGET,
                peer = %peer,
                error = %error,
                "client went away"
            ),
            Err(error) => warn!(
                target: LISTENER_TARGET,
                peer = %peer,
                error = %error,
                "session aborted"
            ),
        }
    }
}
