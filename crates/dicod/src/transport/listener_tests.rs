//! Tests for the socket listener.

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use dico_config::SocketEndpoint;

use super::{ConnectionHandler, CountingHandler, SocketListener};

#[fixture]
fn loopback() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", 0)
}

fn wait_until_accepted(accepted: &AtomicUsize, expected: usize) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if accepted.load(Ordering::SeqCst) >= expected {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[rstest]
fn tcp_listener_hands_every_connection_to_the_handler(loopback: SocketEndpoint) {
    let listener = SocketListener::bind(&loopback).expect("bind tcp listener");
    let addr = listener.local_addr().expect("tcp listener has an address");
    let (accepted, handler) = CountingHandler::new();
    let handler: Arc<dyn ConnectionHandler> = handler;
    let handle = listener.start(handler).expect("start listener");
    assert_eq!(handle.local_addr(), Some(addr));

    let _first = TcpStream::connect(addr).expect("connect first client");
    let _second = TcpStream::connect(addr).expect("connect second client");

    assert!(wait_until_accepted(&accepted, 2), "expected two connections");
    handle.shutdown();
    handle.join().expect("join listener");
}

#[cfg(unix)]
mod unix {
    use std::os::unix::net::{UnixListener, UnixStream};

    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    use super::*;
    use crate::transport::ListenerError;

    #[fixture]
    fn socket_dir() -> TempDir {
        tempfile::tempdir().expect("temp dir")
    }

    fn socket_path(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join("dicod.sock")).expect("utf8 temp path")
    }

    #[rstest]
    fn stale_socket_is_replaced_and_removed_on_shutdown(socket_dir: TempDir) {
        let path = socket_path(&socket_dir);
        drop(UnixListener::bind(&path).expect("bind stale listener"));
        assert!(path.exists(), "stale socket should remain");

        let listener =
            SocketListener::bind(&SocketEndpoint::unix(path.clone())).expect("bind listener");
        let (accepted, handler) = CountingHandler::new();
        let handle = listener.start(handler).expect("start listener");
        assert_eq!(handle.local_addr(), None);

        let _client = UnixStream::connect(&path).expect("connect unix client");
        assert!(wait_until_accepted(&accepted, 1), "expected one connection");

        handle.shutdown();
        handle.join().expect("join listener");
        assert!(!path.exists(), "socket file removed on shutdown");
    }

    #[rstest]
    fn live_socket_is_not_stolen(socket_dir: TempDir) {
        let path = socket_path(&socket_dir);
        let _owner = UnixListener::bind(&path).expect("bind existing listener");

        let error = SocketListener::bind(&SocketEndpoint::unix(path))
            .expect_err("bind must fail while the socket is served");
        assert!(matches!(error, ListenerError::UnixInUse { .. }));
    }

    #[rstest]
    fn regular_file_is_not_replaced(socket_dir: TempDir) {
        let path = socket_path(&socket_dir);
        std::fs::write(&path, b"not a socket").expect("write file");

        let error = SocketListener::bind(&SocketEndpoint::unix(path.clone()))
            .expect_err("bind must fail over a regular file");
        assert!(matches!(error, ListenerError::UnixNotSocket { .. }));
        assert!(path.exists());
    }
}
