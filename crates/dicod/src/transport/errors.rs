//! Failures binding or running the DICT listener.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Listener failures. All of them abort startup except `ThreadPanic`,
/// which is reported on shutdown.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured host did not resolve.
    #[error("cannot resolve listen address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The host resolved to an empty address list.
    #[error("listen address {host}:{port} resolved to nothing")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// `bind(2)` on the TCP address failed.
    #[error("cannot listen on {addr}: {source}")]
    BindTcp {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking accepts failed.
    #[error("cannot poll the listening socket: {source}")]
    NonBlocking {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("endpoint {endpoint} needs unix socket support")]
    UnsupportedUnix {
        /// Configured endpoint.
        endpoint: String,
    },
    /// Binding the Unix socket failed.
    #[cfg(unix)]
    #[error("cannot listen on unix socket {path}: {source}")]
    BindUnix {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A live server already owns the socket path.
    #[cfg(unix)]
    #[error("another server is answering on {path}")]
    UnixInUse {
        /// Socket path.
        path: String,
    },
    /// The socket path is occupied by a regular file or directory.
    #[cfg(unix)]
    #[error("{path} exists and is not a socket")]
    UnixNotSocket {
        /// Socket path.
        path: String,
    },
    /// The existing socket file could not be inspected.
    #[cfg(unix)]
    #[error("cannot inspect {path}: {source}")]
    UnixMetadata {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Connecting to the existing socket failed with something other
    /// than "connection refused".
    #[cfg(unix)]
    #[error("cannot check existing socket {path}: {source}")]
    UnixConnect {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A stale socket file could not be removed.
    #[cfg(unix)]
    #[error("cannot remove stale socket {path}: {source}")]
    UnixCleanup {
        /// Socket path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be started.
    #[error("cannot spawn the accept thread: {source}")]
    Spawn {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The accept loop panicked.
    #[error("accept thread panicked")]
    ThreadPanic,
}
