//! Test helpers for the transport module.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use super::{ConnectionHandler, ConnectionStream};

/// Handler that only counts the connections it is given.
pub(crate) struct CountingHandler {
    accepted: Arc<AtomicUsize>,
}

impl CountingHandler {
    pub(crate) fn new() -> (Arc<AtomicUsize>, Arc<Self>) {
        let accepted = Arc::new(AtomicUsize::new(0));
        let handler = Arc::new(Self {
            accepted: Arc::clone(&accepted),
        });
        (accepted, handler)
    }
}

impl ConnectionHandler for CountingHandler {
    fn handle(&self, stream: ConnectionStream) {
        drop(stream);
        self.accepted.fetch_add(1, Ordering::SeqCst);
    }
}
