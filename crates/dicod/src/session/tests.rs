use std::sync::{Arc, Mutex};

use dico::stream::{ByteStream, MemoryStream, StreamError};
use rstest::{fixture, rstest};

use super::Session;
use crate::engine::Engine;
use crate::engine::test_support::{HOSTNAME, sample_engine};

/// Memory transport the test keeps a handle to after the session owns it.
#[derive(Clone)]
struct SharedStream(Arc<Mutex<MemoryStream>>);

impl SharedStream {
    fn new(stream: MemoryStream) -> Self {
        Self(Arc::new(Mutex::new(stream)))
    }

    fn output(&self) -> String {
        self.0.lock().expect("stream mutex").output_text()
    }

    fn is_closed(&self) -> bool {
        self.0.lock().expect("stream mutex").is_closed()
    }
}

impl ByteStream for SharedStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        self.0.lock().expect("stream mutex").read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), StreamError> {
        self.0.lock().expect("stream mutex").write(buf)
    }

    fn flush(&mut self) -> Result<(), StreamError> {
        self.0.lock().expect("stream mutex").flush()
    }

    fn close(&mut self) -> Result<(), StreamError> {
        self.0.lock().expect("stream mutex").close()
    }
}

#[fixture]
fn engine() -> Engine {
    sample_engine()
}

/// Runs a whole session over `input` and returns the replies after the
/// banner.
fn replies(engine: &Engine, input: &str) -> String {
    let stream = SharedStream::new(MemoryStream::new(input));
    Session::new(engine, "test")
        .run(Box::new(stream.clone()))
        .expect("session runs to completion");
    let output = stream.output();
    output
        .split_once("\r\n")
        .map(|(_, rest)| rest.to_owned())
        .unwrap_or_default()
}

#[rstest]
fn banner_announces_host_capabilities_and_message_id(engine: Engine) {
    let stream = SharedStream::new(MemoryStream::new(""));
    Session::new(&engine, "test")
        .run(Box::new(stream.clone()))
        .expect("session runs");
    let output = stream.output();

    assert!(output.starts_with(&format!("220 {HOSTNAME} test server <xlev.mime.lang> <")));
    assert!(output.contains(&format!("<{}.", std::process::id())));
    assert!(output.ends_with(&format!("@{HOSTNAME}>\r\n")));
    assert!(stream.is_closed());
}

#[rstest]
fn blank_lines_are_ignored(engine: Engine) {
    assert_eq!(replies(&engine, "\r\n   \r\n\nQUIT\r\n"), "221 bye\r\n");
}

#[rstest]
fn quit_ends_the_session(engine: Engine) {
    assert_eq!(replies(&engine, "QUIT\r\nSHOW DB\r\n"), "221 bye\r\n");
}

#[rstest]
fn end_of_input_ends_the_session(engine: Engine) {
    assert_eq!(replies(&engine, "XLEV TELL\r\n"), "280 1\r\n");
}

#[rstest]
#[case("DEFINE animals \"dog\"\r\n")]
#[case("DEFINE 'animals' dog\n")]
#[case("define animals dog")]
fn command_lines_are_tokenised(engine: Engine, #[case] input: &str) {
    assert!(replies(&engine, input).starts_with("150 1 definitions found"));
}

#[rstest]
fn errors_do_not_end_the_session(engine: Engine) {
    assert_eq!(
        replies(&engine, "FROBNICATE\r\nDEFINE animals\r\nQUIT\r\n"),
        "500 unknown command\r\n501 wrong number of arguments\r\n221 bye\r\n"
    );
}

#[rstest]
fn session_state_starts_from_server_settings(engine: Engine) {
    let session = Session::new(&engine, "test");
    assert_eq!(session.state().lev_distance, engine.settings().lev_distance);
    assert!(!session.state().mime);
    assert!(session.state().client.is_none());
}

#[rstest]
fn write_failures_are_disconnects(engine: Engine) {
    let stream = MemoryStream::new("SHOW DB\r\n").with_failing_writes();
    let error = Session::new(&engine, "test")
        .run(Box::new(stream))
        .expect_err("writes fail");
    assert!(error.is_disconnect());
}
